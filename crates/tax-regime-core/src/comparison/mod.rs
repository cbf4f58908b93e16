//! Side-by-side comparison of the three regimes for one entity.

pub mod advisory;
pub mod engine;
pub mod inputs;
pub mod ranking;

pub use engine::{ComparisonEngine, ComparisonResult};
pub use inputs::{EntityInputs, RegimeRequest};
pub use ranking::{ExcludedRegime, FlatRegimeRecord, RankedRegime};
