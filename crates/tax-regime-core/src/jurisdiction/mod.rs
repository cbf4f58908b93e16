//! Per-state tax profiles: raw sources, the path-driven normalizer and the
//! canonical [`JurisdictionProfile`].

pub mod normalizer;
pub mod paths;
pub mod profile;
pub mod sources;

pub use normalizer::{normalize_record, JurisdictionNormalizer};
pub use profile::{
    JurisdictionProfile, RegionalIncentive, RegionalSurcharge, ServicesTaxRange, SourceQuality,
};
pub use sources::JurisdictionSources;
