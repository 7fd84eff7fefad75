//! # GLODAP v2.2023 query service
//!
//! Structured queries over the GLODAP v2.2023 oceanographic dataset:
//! cruise metadata and discrete bottle measurements, filtered and
//! field-projected, rendered as JSON or CSV.
//!
//! ```rust,no_run
//! use glodap::{RawParams, load_dataset, run_sample_query};
//!
//! fn main() -> glodap::Result<()> {
//!     let dataset = load_dataset(std::path::Path::new("data"))?;
//!
//!     let mut params = RawParams::new();
//!     params.insert("cruise", "21OR19910626");
//!     params.insert("append", "temperature,salinity");
//!
//!     let json = run_sample_query(&dataset, &params)?;
//!     println!("{json}");
//!     Ok(())
//! }
//! ```
//!
//! The dataset is loaded once and immutable afterwards; queries borrow it
//! and run fully in parallel with no shared mutable state. The decision
//! logic lives in the [`glodap_query`] core (resolver + engine); this
//! crate supplies the collaborators around it: the CSV loader and the
//! JSON/CSV renderer.

mod error;
pub mod load;
pub mod render;

pub use error::{Error, Result};
pub use glodap_query as query;
pub use glodap_api::{
    AttachmentLinks, Cruise, Dataset, DatasetError, Measurement, PiField, Sample,
};
pub use glodap_query::{
    CruiseQuery, OutputFormat, RawParams, Record, SampleQuery, Value, query_cruises,
    query_samples, resolve_cruise_query, resolve_sample_query,
};
pub use load::load_dataset;
pub use render::{to_csv, to_json};

/// Resolves, runs, and renders one cruise-metadata query.
pub fn run_cruise_query(dataset: &Dataset, params: &RawParams) -> Result<String> {
    let query = resolve_cruise_query(params)?;
    let records = query_cruises(dataset, &query);
    render::render(&records, query.format)
}

/// Resolves, runs, and renders one bottle-sample query.
pub fn run_sample_query(dataset: &Dataset, params: &RawParams) -> Result<String> {
    let query = resolve_sample_query(params, dataset.variables())?;
    let records = query_samples(dataset, &query);
    render::render(&records, query.format)
}
