//! Activity classification: activity code or declared category to annex,
//! presumption percentages and local tax type.

pub mod category;
pub mod classifier;
pub mod table;

pub use category::{ActivityCategory, TaxType};
pub use classifier::{ActivityClassifier, ActivityProfile, ClassificationMatch};
