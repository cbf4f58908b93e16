use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::actual::{
    Adjustment, ActualInput, CapitalAsset, CreditContext, CreditExpense, CreditLedger,
    EquityContext, LossLedger,
};
use crate::error::TaxRegimeError;
use crate::presumed::PresumedInput;
use crate::simplified::SimplifiedInput;
use crate::types::*;
use crate::TaxRegimeResult;

/// One entity's figures for one period, shared by all three regimes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityInputs {
    #[serde(default)]
    pub entity_name: Option<String>,
    /// Two-letter state code (UF)
    pub jurisdiction_code: String,
    /// Defaults to the tax year of the loaded tables
    #[serde(default)]
    pub tax_year: Option<i32>,
    #[serde(default)]
    pub activity_code: String,
    #[serde(default)]
    pub declared_category: Option<String>,
    #[serde(default)]
    pub period: FilingPeriod,
    #[serde(default)]
    pub period_start: Option<NaiveDate>,

    // Revenue and payroll
    pub period_revenue: Money,
    pub trailing_revenue_12m: Money,
    /// Revenue of the previous calendar year for the presumed-profit
    /// ceiling; defaults to the trailing 12 months
    #[serde(default)]
    pub annual_revenue: Option<Money>,
    #[serde(default)]
    pub monthly_payroll: Money,
    #[serde(default)]
    pub trailing_payroll_12m: Option<Money>,
    #[serde(default)]
    pub taxable_purchases: Money,

    // Actual-profit figures
    pub accounting_profit_before_tax: Money,
    #[serde(default)]
    pub additions: Vec<Adjustment>,
    #[serde(default)]
    pub exclusions: Vec<Adjustment>,
    #[serde(default)]
    pub non_operating_result: Money,
    #[serde(default)]
    pub loss_ledger: LossLedger,
    #[serde(default)]
    pub equity: Option<EquityContext>,
    #[serde(default)]
    pub credit_expenses: Vec<CreditExpense>,
    #[serde(default)]
    pub capital_assets: Vec<CapitalAsset>,
    #[serde(default)]
    pub credit_ledger: CreditLedger,

    /// Regional incentive programmes the entity has been granted
    #[serde(default)]
    pub activate_incentives: Vec<String>,
}

impl EntityInputs {
    pub fn period_months(&self) -> u32 {
        self.period.months()
    }

    pub fn period_payroll(&self) -> Money {
        self.monthly_payroll * Decimal::from(self.period_months())
    }

    pub fn annual_revenue(&self) -> Money {
        self.annual_revenue.unwrap_or_else(|| {
            if self.trailing_revenue_12m > Decimal::ZERO {
                self.trailing_revenue_12m
            } else {
                self.period_revenue * Decimal::from(12) / Decimal::from(self.period_months())
            }
        })
    }

    pub fn trailing_payroll(&self) -> Money {
        self.trailing_payroll_12m
            .unwrap_or(self.monthly_payroll * Decimal::from(12))
    }

    pub fn simplified_input(&self) -> SimplifiedInput {
        SimplifiedInput {
            trailing_revenue_12m: self.trailing_revenue_12m,
            current_revenue: self.period_revenue,
            monthly_payroll: self.monthly_payroll,
            trailing_payroll_12m: self.trailing_payroll_12m,
            period_months: self.period_months(),
            taxable_purchases: self.taxable_purchases,
        }
    }

    pub fn presumed_input(&self) -> PresumedInput {
        PresumedInput {
            period_revenue: self.period_revenue,
            period_months: self.period_months(),
            period_payroll: self.period_payroll(),
            taxable_purchases: self.taxable_purchases,
            annual_revenue_estimate: Some(self.annual_revenue()),
        }
    }

    pub fn actual_input(&self) -> ActualInput {
        ActualInput {
            accounting_profit_before_tax: self.accounting_profit_before_tax,
            additions: self.additions.clone(),
            exclusions: self.exclusions.clone(),
            non_operating_result: self.non_operating_result,
            loss_ledger: self.loss_ledger.clone(),
            equity: self.equity.clone(),
            credits: CreditContext {
                taxable_revenue: self.period_revenue,
                expenses: self.credit_expenses.clone(),
                assets: self.capital_assets.clone(),
                ledger: self.credit_ledger.clone(),
            },
            period_months: self.period_months(),
            period_payroll: self.period_payroll(),
            taxable_purchases: self.taxable_purchases,
            gross_revenue: Some(self.period_revenue),
            period_start: self.period_start,
        }
    }

    /// Reject inputs no regime could compute, before any regime runs.
    pub fn validate(&self) -> TaxRegimeResult<()> {
        if self.jurisdiction_code.trim().is_empty() {
            return Err(TaxRegimeError::InvalidInput {
                field: "jurisdiction_code".into(),
                reason: "a two-letter state code is required".into(),
            });
        }
        if self.period_revenue <= Decimal::ZERO {
            return Err(TaxRegimeError::InvalidInput {
                field: "period_revenue".into(),
                reason: "must be positive to compare regimes".into(),
            });
        }
        for (field, value) in [
            ("trailing_revenue_12m", self.trailing_revenue_12m),
            ("annual_revenue", self.annual_revenue.unwrap_or_default()),
            ("monthly_payroll", self.monthly_payroll),
            (
                "trailing_payroll_12m",
                self.trailing_payroll_12m.unwrap_or_default(),
            ),
            ("taxable_purchases", self.taxable_purchases),
        ] {
            if value < Decimal::ZERO {
                return Err(TaxRegimeError::InvalidInput {
                    field: field.into(),
                    reason: "must be zero or positive".into(),
                });
            }
        }
        self.loss_ledger.validate()?;
        self.credit_ledger.validate()?;
        if let Some(equity) = &self.equity {
            equity.validate()?;
        }
        Ok(())
    }
}

/// A single-regime request: the regime's own input plus what is needed to
/// resolve the jurisdiction and the activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeRequest<T> {
    pub jurisdiction_code: String,
    #[serde(default)]
    pub tax_year: Option<i32>,
    #[serde(default)]
    pub activity_code: String,
    #[serde(default)]
    pub declared_category: Option<String>,
    #[serde(default)]
    pub activate_incentives: Vec<String>,
    pub input: T,
}
