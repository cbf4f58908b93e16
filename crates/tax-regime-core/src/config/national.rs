//! Federal rates and statutory limits that do not vary by jurisdiction.

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Jurisdiction-independent federal constants.
///
/// A jurisdiction may carry [`FederalOverrides`]; calculators resolve the
/// effective set with [`NationalRates::with_overrides`] and never consult
/// the raw profile for federal figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NationalRates {
    /// IRPJ normal rate (15%)
    pub irpj_rate: Rate,
    /// IRPJ surtax rate on the excess over the monthly threshold (10%)
    pub irpj_surtax_rate: Rate,
    /// Surtax threshold per month of the period (R$20,000)
    pub irpj_surtax_monthly_threshold: Money,
    /// CSLL rate for non-financial entities (9%)
    pub csll_rate: Rate,
    /// PIS under the cumulative system (presumed profit)
    pub pis_cumulative_rate: Rate,
    /// COFINS under the cumulative system (presumed profit)
    pub cofins_cumulative_rate: Rate,
    /// PIS under the non-cumulative system (actual profit)
    pub pis_non_cumulative_rate: Rate,
    /// COFINS under the non-cumulative system (actual profit)
    pub cofins_non_cumulative_rate: Rate,
    /// Per-period cap on loss compensation as a share of adjusted income
    pub loss_compensation_cap: Rate,
    /// Withholding on capital remuneration paid to equity holders
    pub jcp_withholding_rate: Rate,
    /// Share of pre-deduction net income available for capital remuneration
    pub jcp_net_income_limit: Rate,
    /// Share of retained earnings and profit reserves available
    pub jcp_retained_earnings_limit: Rate,
    /// Statutory fixed fraction for depreciation credits (1/48 per month)
    pub depreciation_credit_months: u32,
    /// Employer social-security contribution on payroll
    pub employer_payroll_rate: Rate,
    /// Workplace accident insurance (RAT x FAP), average
    pub rat_rate: Rate,
    /// Third-party entity contributions (Sistema S, salario-educacao)
    pub third_party_payroll_rate: Rate,
    /// Simplified-regime annual revenue ceiling
    pub simplified_ceiling: Money,
    /// Presumed-profit annual revenue ceiling
    pub presumed_ceiling: Money,
    /// Payroll-to-revenue ratio at which the favorable annex applies
    pub payroll_ratio_threshold: Rate,
}

impl Default for NationalRates {
    fn default() -> Self {
        NationalRates {
            irpj_rate: dec!(0.15),
            irpj_surtax_rate: dec!(0.10),
            irpj_surtax_monthly_threshold: dec!(20_000),
            csll_rate: dec!(0.09),
            pis_cumulative_rate: dec!(0.0065),
            cofins_cumulative_rate: dec!(0.03),
            pis_non_cumulative_rate: dec!(0.0165),
            cofins_non_cumulative_rate: dec!(0.076),
            loss_compensation_cap: dec!(0.30),
            jcp_withholding_rate: dec!(0.15),
            jcp_net_income_limit: dec!(0.50),
            jcp_retained_earnings_limit: dec!(0.50),
            depreciation_credit_months: 48,
            employer_payroll_rate: dec!(0.20),
            rat_rate: dec!(0.02),
            third_party_payroll_rate: dec!(0.058),
            simplified_ceiling: dec!(4_800_000),
            presumed_ceiling: dec!(78_000_000),
            payroll_ratio_threshold: dec!(0.28),
        }
    }
}

/// Federal-rate overrides attached to a jurisdiction. Rarely populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FederalOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irpj_rate: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irpj_surtax_rate: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csll_rate: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pis_cumulative_rate: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cofins_cumulative_rate: Option<Rate>,
}

impl FederalOverrides {
    pub fn is_empty(&self) -> bool {
        self.irpj_rate.is_none()
            && self.irpj_surtax_rate.is_none()
            && self.csll_rate.is_none()
            && self.pis_cumulative_rate.is_none()
            && self.cofins_cumulative_rate.is_none()
    }
}

impl NationalRates {
    /// Effective federal rates once jurisdiction overrides are applied.
    pub fn with_overrides(&self, overrides: &FederalOverrides) -> NationalRates {
        let mut rates = self.clone();
        if let Some(r) = overrides.irpj_rate {
            rates.irpj_rate = r;
        }
        if let Some(r) = overrides.irpj_surtax_rate {
            rates.irpj_surtax_rate = r;
        }
        if let Some(r) = overrides.csll_rate {
            rates.csll_rate = r;
        }
        if let Some(r) = overrides.pis_cumulative_rate {
            rates.pis_cumulative_rate = r;
        }
        if let Some(r) = overrides.cofins_cumulative_rate {
            rates.cofins_cumulative_rate = r;
        }
        rates
    }

    /// Surtax threshold prorated linearly to the period length.
    pub fn surtax_threshold(&self, period_months: u32) -> Money {
        self.irpj_surtax_monthly_threshold * Money::from(period_months)
    }

    /// Combined employer payroll burden for regimes outside the unified levy.
    pub fn payroll_burden_rate(&self) -> Rate {
        self.employer_payroll_rate + self.rat_rate + self.third_party_payroll_rate
    }

    /// CPP paid outside the unified levy by Annex IV activities (no third-party share).
    pub fn annex_iv_cpp_rate(&self) -> Rate {
        self.employer_payroll_rate + self.rat_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quarterly_surtax_threshold() {
        let rates = NationalRates::default();
        assert_eq!(rates.surtax_threshold(3), dec!(60_000));
        assert_eq!(rates.surtax_threshold(12), dec!(240_000));
    }

    #[test]
    fn test_overrides_replace_only_populated_rates() {
        let rates = NationalRates::default();
        let overrides = FederalOverrides {
            csll_rate: Some(dec!(0.15)),
            ..Default::default()
        };
        let effective = rates.with_overrides(&overrides);
        assert_eq!(effective.csll_rate, dec!(0.15));
        assert_eq!(effective.irpj_rate, dec!(0.15));
        assert_eq!(effective.pis_cumulative_rate, dec!(0.0065));
    }

    #[test]
    fn test_empty_overrides() {
        assert!(FederalOverrides::default().is_empty());
    }
}
