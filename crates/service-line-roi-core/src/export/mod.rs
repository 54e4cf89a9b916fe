//! Export of comparison results for the presentation layer.

mod scenario;

pub use scenario::*;
