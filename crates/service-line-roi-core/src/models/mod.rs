//! Domain models for the service-line ROI calculator.

mod coverage;
mod parameters;
mod report;
mod request;
mod results;

pub use coverage::*;
pub use parameters::*;
pub use report::*;
pub use request::*;
pub use results::*;
