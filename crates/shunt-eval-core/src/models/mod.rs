//! Domain models for shunt evaluation.

mod measurement;
mod record;

pub use measurement::*;
pub use record::*;
