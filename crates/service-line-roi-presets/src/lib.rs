//! Service-line preset catalog for the ROI calculator.
//!
//! Presets supply the default parameter values for a service line (capacity,
//! rates, referral partition, locum terms). A catalog is read from a JSON or
//! TOML document; when the document is missing or malformed the built-in
//! hospitalist preset is used instead.

pub mod catalog;
pub mod loader;

pub use catalog::*;
pub use loader::*;
