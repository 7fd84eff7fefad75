use std::fmt;

/// The error type for GLODAP dataset loading and rendering.
#[derive(Debug)]
pub enum Error {
    /// IO error interacting with the filesystem.
    Io(std::io::Error),
    /// Malformed CSV in a dataset file.
    Csv(csv::Error),
    /// A dataset file violates the table contract (bad cell, missing
    /// column, broken invariant). Carries file and row context.
    Load(String),
    /// JSON rendering failure.
    Json(serde_json::Error),
    /// Query resolution failure, forwarded from the core.
    Query(glodap_query::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "IO error: {e}"),
            Error::Csv(e) => write!(f, "CSV error: {e}"),
            Error::Load(msg) => write!(f, "dataset load error: {msg}"),
            Error::Json(e) => write!(f, "JSON error: {e}"),
            Error::Query(e) => write!(f, "query error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Csv(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::Query(e) => Some(e),
            Error::Load(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Csv(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl From<glodap_query::Error> for Error {
    fn from(e: glodap_query::Error) -> Self {
        Error::Query(e)
    }
}

impl From<glodap_api::DatasetError> for Error {
    fn from(e: glodap_api::DatasetError) -> Self {
        Error::Load(e.to_string())
    }
}

/// A specialized Result type for GLODAP operations.
pub type Result<T> = std::result::Result<T, Error>;
