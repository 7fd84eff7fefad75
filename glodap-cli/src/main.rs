use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glodap::{RawParams, load_dataset, run_cruise_query, run_sample_query};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "glodap", version, arg_required_else_help = true)]
struct Cli {
    /// Directory holding cruises.csv and samples.csv
    #[arg(long, global = true, default_value = "data")]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query cruise metadata
    Cruise(CruiseArgs),
    /// Query discrete bottle samples
    Sample(SampleArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

impl OutputFormat {
    fn as_param(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

#[derive(Parser)]
struct CruiseArgs {
    /// Expocode/alias patterns, comma-separated, '*' wildcard (e.g. '*ARK*')
    #[arg(long)]
    cruise: Option<String>,

    /// Keep cruises starting on or after this date (YYYY-MM-DD)
    #[arg(long)]
    start: Option<String>,

    /// Keep cruises ending on or before this date (YYYY-MM-DD)
    #[arg(long)]
    end: Option<String>,

    /// PI name patterns, comma-separated (e.g. 'Kelly*,Schlosser')
    #[arg(long)]
    pi: Option<String>,

    /// PI fields to report (e.g. 'chief,carbon'), 'all', or 'false'
    #[arg(long)]
    field: Option<String>,

    /// Region pattern (e.g. 'pacific*')
    #[arg(long)]
    region: Option<String>,

    /// Ship name pattern (e.g. 'Polarstern', 'Arctic*')
    #[arg(long)]
    ship: Option<String>,

    /// Measurement-summary pattern (e.g. 'CTD*')
    #[arg(long)]
    measurement: Option<String>,

    /// Attachment sections: file,qc,map,metadata,ref / 'all' / 'false'
    #[arg(long)]
    append: Option<String>,

    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Parser)]
struct SampleArgs {
    /// Expocodes, comma-separated (required unless lon0/lat0 given)
    #[arg(long)]
    cruise: Option<String>,

    /// Bounding-box corner / exact-match longitude
    #[arg(long)]
    lon0: Option<f64>,

    /// Bounding-box corner / exact-match latitude
    #[arg(long)]
    lat0: Option<f64>,

    /// Opposite bounding-box corner longitude
    #[arg(long)]
    lon1: Option<f64>,

    /// Opposite bounding-box corner latitude
    #[arg(long)]
    lat1: Option<f64>,

    /// Minimum sampling depth in meters (inclusive)
    #[arg(long)]
    dep0: Option<f64>,

    /// Maximum sampling depth in meters (inclusive)
    #[arg(long)]
    dep1: Option<f64>,

    /// Start datetime (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)
    #[arg(long)]
    start: Option<String>,

    /// End datetime
    #[arg(long)]
    end: Option<String>,

    /// Variables to append, '*' wildcards allowed (e.g. 'cfc*,nitrate')
    #[arg(long)]
    append: Option<String>,

    /// Include WOCE flags of appended variables
    #[arg(long)]
    flag: bool,

    /// Include QC flags of appended variables
    #[arg(long)]
    qc: bool,

    /// Exclude the citation DOI column
    #[arg(long)]
    no_doi: bool,

    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let dataset = load_dataset(&cli.data)
        .with_context(|| format!("failed to load dataset from {:?}", cli.data))?;

    let output = match cli.command {
        Commands::Cruise(args) => run_cruise_query(&dataset, &cruise_params(args))?,
        Commands::Sample(args) => run_sample_query(&dataset, &sample_params(args))?,
    };
    println!("{output}");
    Ok(())
}

fn cruise_params(args: CruiseArgs) -> RawParams {
    let mut params = RawParams::new();
    set(&mut params, "cruise", args.cruise);
    set(&mut params, "start", args.start);
    set(&mut params, "end", args.end);
    set(&mut params, "pi", args.pi);
    set(&mut params, "field", args.field);
    set(&mut params, "region", args.region);
    set(&mut params, "ship", args.ship);
    set(&mut params, "measurement", args.measurement);
    set(&mut params, "append", args.append);
    params.insert("format", args.format.as_param());
    params
}

fn sample_params(args: SampleArgs) -> RawParams {
    let mut params = RawParams::new();
    set(&mut params, "cruise", args.cruise);
    set(&mut params, "lon0", args.lon0.map(|v| v.to_string()));
    set(&mut params, "lat0", args.lat0.map(|v| v.to_string()));
    set(&mut params, "lon1", args.lon1.map(|v| v.to_string()));
    set(&mut params, "lat1", args.lat1.map(|v| v.to_string()));
    set(&mut params, "dep0", args.dep0.map(|v| v.to_string()));
    set(&mut params, "dep1", args.dep1.map(|v| v.to_string()));
    set(&mut params, "start", args.start);
    set(&mut params, "end", args.end);
    set(&mut params, "append", args.append);
    if args.flag {
        params.insert("flag", "true");
    }
    if args.qc {
        params.insert("qc", "true");
    }
    if args.no_doi {
        params.insert("doi", "false");
    }
    params.insert("format", args.format.as_param());
    params
}

fn set(params: &mut RawParams, key: &str, value: Option<String>) {
    if let Some(value) = value {
        params.insert(key, value);
    }
}
