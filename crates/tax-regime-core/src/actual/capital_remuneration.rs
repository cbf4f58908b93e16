//! Interest on net equity (JCP) deduction, Lei 9.249/1995 art. 9.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::NationalRates;
use crate::error::TaxRegimeError;
use crate::types::*;
use crate::TaxRegimeResult;

/// Annual long-term reference rate (TJLP) and the window it was published for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRate {
    pub annual_rate: Rate,
    #[serde(default)]
    pub valid_from: Option<NaiveDate>,
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
}

impl ReferenceRate {
    pub fn new(annual_rate: Rate) -> Self {
        ReferenceRate {
            annual_rate,
            valid_from: None,
            valid_until: None,
        }
    }

    /// True when `date` falls inside the declared window. An open end never
    /// excludes a date.
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        self.valid_from.map_or(true, |from| date >= from)
            && self.valid_until.map_or(true, |until| date <= until)
    }
}

/// Equity figures for the capital-remuneration deduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityContext {
    /// Net equity less the accounts excluded from the computation
    pub adjusted_equity_base: Money,
    /// Retained earnings plus profit reserves
    #[serde(default)]
    pub retained_earnings: Money,
    /// Mandatory whenever an equity context is supplied
    #[serde(default)]
    pub reference_rate: Option<ReferenceRate>,
    /// Net income before the deduction; defaults to accounting profit less
    /// CSLL computed without the deduction
    #[serde(default)]
    pub pre_deduction_net_income: Option<Money>,
    /// Amount the company intends to credit; caps the deduction when given
    #[serde(default)]
    pub proposed_distribution: Option<Money>,
}

impl EquityContext {
    pub fn validate(&self) -> TaxRegimeResult<&ReferenceRate> {
        let rate = self.reference_rate.as_ref().ok_or_else(|| {
            TaxRegimeError::MissingReferenceRate {
                field: "equity.reference_rate".into(),
                hint: "supply the annual TJLP published for the period, e.g. 0.0741".into(),
            }
        })?;
        if rate.annual_rate < Decimal::ZERO || rate.annual_rate > Decimal::ONE {
            return Err(TaxRegimeError::OutOfRange {
                field: "equity.reference_rate.annual_rate".into(),
                value: rate.annual_rate,
                expected: "an annual fraction between 0 and 1".into(),
            });
        }
        for (field, value) in [
            ("equity.adjusted_equity_base", self.adjusted_equity_base),
            ("equity.retained_earnings", self.retained_earnings),
            (
                "equity.proposed_distribution",
                self.proposed_distribution.unwrap_or_default(),
            ),
        ] {
            if value < Decimal::ZERO {
                return Err(TaxRegimeError::InvalidInput {
                    field: field.into(),
                    reason: "must be zero or positive".into(),
                });
            }
        }
        Ok(rate)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalRemuneration {
    /// Reference rate prorated to the period
    pub prorated_rate: Rate,
    /// Equity base × prorated rate
    pub rate_cap: Money,
    pub pre_deduction_net_income: Money,
    pub net_income_limit: Money,
    pub retained_earnings_limit: Money,
    /// min(rate cap, max(net income limit, retained earnings limit))
    pub statutory_limit: Money,
    pub deduction: Money,
    pub withholding: Money,
    /// IRPJ + CSLL avoided by the deduction
    pub tax_saved: Money,
    /// Tax saved less withholding
    pub net_benefit: Money,
    pub flags: Vec<String>,
}

/// Deductible amount before the engine measures the tax saved.
pub fn capital_remuneration(
    equity: &EquityContext,
    rate: &ReferenceRate,
    pre_deduction_net_income: Money,
    period_months: u32,
    national: &NationalRates,
) -> CapitalRemuneration {
    let mut flags = Vec::new();
    let prorated_rate = rate.annual_rate * Decimal::from(period_months) / Decimal::from(12);
    let rate_cap = round_money(equity.adjusted_equity_base * prorated_rate);

    let net_income_limit =
        round_money(pre_deduction_net_income.max(Decimal::ZERO) * national.jcp_net_income_limit);
    let retained_earnings_limit =
        round_money(equity.retained_earnings * national.jcp_retained_earnings_limit);
    let statutory_limit = rate_cap.min(net_income_limit.max(retained_earnings_limit));

    let mut deduction = statutory_limit;
    if let Some(proposed) = equity.proposed_distribution {
        if proposed < deduction {
            flags.push("jcp_limited_by_proposed_distribution".to_string());
        }
        deduction = deduction.min(proposed);
    }
    let deduction = deduction.max(Decimal::ZERO);

    if equity.adjusted_equity_base.is_zero() {
        flags.push("jcp_zero_equity_base".to_string());
    } else if deduction.is_zero() {
        flags.push("jcp_no_profit_or_reserves".to_string());
    }

    CapitalRemuneration {
        prorated_rate,
        rate_cap,
        pre_deduction_net_income,
        net_income_limit,
        retained_earnings_limit,
        statutory_limit,
        withholding: round_money(deduction * national.jcp_withholding_rate),
        deduction,
        tax_saved: Decimal::ZERO,
        net_benefit: Decimal::ZERO,
        flags,
    }
}
