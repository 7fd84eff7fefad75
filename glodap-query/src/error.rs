use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Validation failures raised while resolving raw query parameters.
///
/// Every variant names the offending parameter so callers can report a
/// precise failure. Resolution is deterministic and stateless; none of
/// these are retryable, and none are fatal to the serving process.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("parameter '{param}': invalid date '{value}' (expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)")]
    InvalidDateFormat { param: String, value: String },

    #[error("parameter '{param}': {reason}")]
    InvalidRange { param: String, reason: String },

    #[error("parameter 'append': unknown section token '{token}'")]
    UnknownAppendToken { token: String },

    #[error("parameter 'append': unknown variable '{name}'")]
    UnknownVariable { name: String },

    #[error("sample query needs either a cruise list or lon0/lat0")]
    MissingRequiredLocator,

    #[error("parameter 'field': unknown PI field '{token}'")]
    UnknownPiField { token: String },

    #[error("parameter '{param}': '{value}' is not a number")]
    InvalidNumber { param: String, value: String },

    #[error("parameter '{param}': '{value}' is not a boolean")]
    InvalidBool { param: String, value: String },

    #[error("parameter 'format': unknown output format '{value}'")]
    UnknownFormat { value: String },
}
