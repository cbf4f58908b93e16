pub mod activity;
pub mod config;
pub mod error;
pub mod jurisdiction;
pub mod levies;
pub mod regime;
pub mod types;

#[cfg(feature = "simplified")]
pub mod simplified;

#[cfg(feature = "presumed")]
pub mod presumed;

#[cfg(feature = "actual")]
pub mod actual;

#[cfg(feature = "comparison")]
pub mod comparison;

pub use error::TaxRegimeError;
pub use types::*;

/// Standard result type for all tax-regime operations
pub type TaxRegimeResult<T> = Result<T, TaxRegimeError>;
