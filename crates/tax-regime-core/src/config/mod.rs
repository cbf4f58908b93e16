//! Reference tables consumed by every calculator.
//!
//! A [`TaxTables`] value is built once (from the built-in defaults or a
//! configuration file) and handed to each calculator at construction time.

pub mod national;
pub mod simplified_tables;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::TaxRegimeError;
use crate::types::*;
use crate::TaxRegimeResult;

pub use national::{FederalOverrides, NationalRates};
pub use simplified_tables::{AnnexTable, Bracket, SimplifiedAnnex, SimplifiedTables};

/// Jurisdiction-independent constants substituted when a raw record omits a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JurisdictionDefaults {
    /// Modal internal ICMS rate
    pub goods_tax_rate: Rate,
    /// ISS rate assumed for the reference municipality
    pub services_reference_rate: Rate,
    /// Constitutional ISS floor
    pub services_min_rate: Rate,
    /// Constitutional ISS ceiling
    pub services_max_rate: Rate,
    /// National simplified-regime sublimit for ICMS/ISS
    pub simplified_sublimit: Money,
}

impl Default for JurisdictionDefaults {
    fn default() -> Self {
        JurisdictionDefaults {
            goods_tax_rate: dec!(0.18),
            services_reference_rate: dec!(0.05),
            services_min_rate: dec!(0.02),
            services_max_rate: dec!(0.05),
            simplified_sublimit: dec!(3_600_000),
        }
    }
}

/// Proximity bands used when generating advisories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryThresholds {
    /// Warn when revenue is within this fraction below a ceiling
    pub ceiling_proximity: Rate,
    /// Warn when the payroll ratio is within this many points of the threshold
    pub payroll_ratio_band: Rate,
}

impl Default for AdvisoryThresholds {
    fn default() -> Self {
        AdvisoryThresholds {
            ceiling_proximity: dec!(0.05),
            payroll_ratio_band: dec!(0.03),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxTables {
    pub tax_year: i32,
    #[serde(default)]
    pub national: NationalRates,
    #[serde(default)]
    pub simplified: SimplifiedTables,
    #[serde(default)]
    pub jurisdiction_defaults: JurisdictionDefaults,
    #[serde(default)]
    pub thresholds: AdvisoryThresholds,
}

impl Default for TaxTables {
    fn default() -> Self {
        TaxTables {
            tax_year: 2025,
            national: NationalRates::default(),
            simplified: SimplifiedTables::default(),
            jurisdiction_defaults: JurisdictionDefaults::default(),
            thresholds: AdvisoryThresholds::default(),
        }
    }
}

impl TaxTables {
    /// Parse and validate a JSON table set.
    pub fn from_json_str(json: &str) -> TaxRegimeResult<Self> {
        let tables: TaxTables = serde_json::from_str(json)?;
        tables.validate()?;
        Ok(tables)
    }

    /// Check internal consistency of the tables.
    pub fn validate(&self) -> TaxRegimeResult<()> {
        let n = &self.national;
        let rates = [
            ("national.irpj_rate", n.irpj_rate),
            ("national.irpj_surtax_rate", n.irpj_surtax_rate),
            ("national.csll_rate", n.csll_rate),
            ("national.pis_cumulative_rate", n.pis_cumulative_rate),
            ("national.cofins_cumulative_rate", n.cofins_cumulative_rate),
            ("national.pis_non_cumulative_rate", n.pis_non_cumulative_rate),
            ("national.cofins_non_cumulative_rate", n.cofins_non_cumulative_rate),
            ("national.loss_compensation_cap", n.loss_compensation_cap),
            ("national.jcp_withholding_rate", n.jcp_withholding_rate),
            ("national.jcp_net_income_limit", n.jcp_net_income_limit),
            ("national.jcp_retained_earnings_limit", n.jcp_retained_earnings_limit),
            ("national.employer_payroll_rate", n.employer_payroll_rate),
            ("national.rat_rate", n.rat_rate),
            ("national.third_party_payroll_rate", n.third_party_payroll_rate),
            ("national.payroll_ratio_threshold", n.payroll_ratio_threshold),
            (
                "jurisdiction_defaults.goods_tax_rate",
                self.jurisdiction_defaults.goods_tax_rate,
            ),
            (
                "jurisdiction_defaults.services_reference_rate",
                self.jurisdiction_defaults.services_reference_rate,
            ),
        ];
        for (field, rate) in rates {
            check_unit_rate(field, rate)?;
        }

        if n.depreciation_credit_months == 0 {
            return Err(TaxRegimeError::ConfigError(
                "national.depreciation_credit_months must be at least 1".into(),
            ));
        }
        if n.simplified_ceiling <= Decimal::ZERO || n.presumed_ceiling < n.simplified_ceiling {
            return Err(TaxRegimeError::ConfigError(
                "ceilings must be positive and presumed_ceiling >= simplified_ceiling".into(),
            ));
        }
        if self.jurisdiction_defaults.simplified_sublimit > n.simplified_ceiling {
            return Err(TaxRegimeError::ConfigError(
                "jurisdiction_defaults.simplified_sublimit exceeds the simplified ceiling".into(),
            ));
        }

        for table in &self.simplified.annexes {
            if table.brackets.is_empty() {
                return Err(TaxRegimeError::ConfigError(format!(
                    "annex {:?} has no brackets",
                    table.annex
                )));
            }
            let mut prev = Decimal::ZERO;
            for (i, b) in table.brackets.iter().enumerate() {
                if b.upper_bound <= prev {
                    return Err(TaxRegimeError::ConfigError(format!(
                        "annex {:?} bracket {} upper bound is not increasing",
                        table.annex,
                        i + 1
                    )));
                }
                check_unit_rate("simplified.nominal_rate", b.nominal_rate)?;
                check_unit_rate("simplified.local_tax_share", b.local_tax_share)?;
                if b.deduction < Decimal::ZERO {
                    return Err(TaxRegimeError::ConfigError(format!(
                        "annex {:?} bracket {} has a negative deduction",
                        table.annex,
                        i + 1
                    )));
                }
                prev = b.upper_bound;
            }
        }
        for annex in [
            SimplifiedAnnex::I,
            SimplifiedAnnex::II,
            SimplifiedAnnex::III,
            SimplifiedAnnex::IV,
            SimplifiedAnnex::V,
        ] {
            if self.simplified.annex(annex).is_none() {
                return Err(TaxRegimeError::ConfigError(format!(
                    "simplified tables are missing annex {:?}",
                    annex
                )));
            }
        }
        Ok(())
    }
}

fn check_unit_rate(field: &str, rate: Rate) -> TaxRegimeResult<()> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(TaxRegimeError::OutOfRange {
            field: field.to_string(),
            value: rate,
            expected: "a fraction between 0 and 1".into(),
        });
    }
    Ok(())
}
