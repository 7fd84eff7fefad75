//! GLODAP query core: filter resolver and read-only query engine.
//!
//! Two dependency-ordered components:
//! - [`resolve`] turns raw string-keyed parameters into a typed, validated
//!   query spec, rejecting malformed input with a parameter-precise error.
//! - [`engine`] applies a spec against the immutable [`glodap_api::Dataset`]
//!   and produces the ordered, projected record sequence.
//!
//! Serialization of the result (JSON or CSV) is the caller's concern; the
//! engine output is format-agnostic.

pub mod engine;
pub mod error;
pub mod params;
pub mod pattern;
pub mod resolve;
pub mod spec;

pub use engine::{Record, Value, query_cruises, query_samples};
pub use error::{Error, Result};
pub use params::RawParams;
pub use resolve::{resolve_cruise_query, resolve_sample_query};
pub use spec::{CruiseQuery, OutputFormat, SampleQuery};
