use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::paths::DEFAULTED_ATTRIBUTES;
use crate::config::{FederalOverrides, JurisdictionDefaults};
use crate::types::*;

/// Whether every attribute came from the raw source or some were substituted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceQuality {
    Authoritative,
    Fallback,
}

/// State poverty-fund surcharge levied on top of ICMS (FCP/FECP).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionalSurcharge {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub rate: Rate,
}

/// ISS bounds for the jurisdiction and the rate of its reference municipality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicesTaxRange {
    pub min_rate: Rate,
    pub max_rate: Rate,
    pub reference_rate: Rate,
}

/// A regional tax-incentive programme (e.g. SUDENE/SUDAM IRPJ reduction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalIncentive {
    pub active: bool,
    /// Fractional reduction of IRPJ (0.75 = 75%)
    pub reduction: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// Canonical per-jurisdiction tax profile. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JurisdictionProfile {
    pub code: String,
    pub tax_year: i32,
    pub goods_tax_standard_rate: Rate,
    pub surcharge: RegionalSurcharge,
    pub services_tax: ServicesTaxRange,
    pub simplified_sublimit: Money,
    pub incentives: BTreeMap<String, RegionalIncentive>,
    #[serde(default)]
    pub federal_overrides: FederalOverrides,
    pub source_quality: SourceQuality,
    /// Attributes that were substituted with documented defaults
    #[serde(default)]
    pub fallback_fields: Vec<String>,
}

impl JurisdictionProfile {
    /// Fully-defaulted profile for a jurisdiction with no usable source record.
    pub fn fallback(code: &str, tax_year: i32, defaults: &JurisdictionDefaults) -> Self {
        JurisdictionProfile {
            code: code.to_string(),
            tax_year,
            goods_tax_standard_rate: defaults.goods_tax_rate,
            surcharge: RegionalSurcharge::default(),
            services_tax: ServicesTaxRange {
                min_rate: defaults.services_min_rate,
                max_rate: defaults.services_max_rate,
                reference_rate: defaults.services_reference_rate,
            },
            simplified_sublimit: defaults.simplified_sublimit,
            incentives: BTreeMap::new(),
            federal_overrides: FederalOverrides::default(),
            source_quality: SourceQuality::Fallback,
            fallback_fields: DEFAULTED_ATTRIBUTES
                .iter()
                .map(|spec| spec.attribute.to_string())
                .collect(),
        }
    }

    /// ICMS rate including the surcharge when the jurisdiction levies one.
    pub fn goods_tax_rate_with_surcharge(&self) -> Rate {
        self.goods_tax_standard_rate + self.surcharge_rate()
    }

    pub fn surcharge_rate(&self) -> Rate {
        if self.surcharge.exists {
            self.surcharge.rate
        } else {
            Decimal::ZERO
        }
    }

    /// The largest active IRPJ reduction, if any. Reductions do not stack.
    pub fn best_active_incentive(&self) -> Option<(&str, &RegionalIncentive)> {
        self.incentives
            .iter()
            .filter(|(_, i)| i.active && i.reduction > Decimal::ZERO)
            .max_by(|a, b| a.1.reduction.cmp(&b.1.reduction))
            .map(|(name, i)| (name.as_str(), i))
    }

    /// A copy of this profile with the named programmes switched on.
    ///
    /// Names are matched case-insensitively; unknown names are ignored.
    pub fn with_activated_incentives(&self, names: &[String]) -> JurisdictionProfile {
        let mut profile = self.clone();
        for name in names {
            let wanted = name.trim().to_lowercase();
            if let Some(incentive) = profile.incentives.get_mut(&wanted) {
                incentive.active = true;
            }
        }
        profile
    }

    pub fn is_authoritative(&self) -> bool {
        self.source_quality == SourceQuality::Authoritative
    }
}
