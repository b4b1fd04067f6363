//! Calculation and classification engine.
//!
//! Pipeline: FV / RI / diameter → Formula Engine → derived parameters → Scoring Engine
//!
//! Both stages are pure and total; they never return errors.

mod formula;
mod scoring;

pub use formula::*;
pub use scoring::*;
