//! Non-cumulative PIS/COFINS: debits on revenue, credits on eligible inputs
//! (Leis 10.637/2002 and 10.833/2003).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ledger::CreditLedger;
use crate::config::NationalRates;
use crate::error::TaxRegimeError;
use crate::types::*;
use crate::TaxRegimeResult;

/// Expense categories the credit rules distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpenseCategory {
    GoodsForResale,
    ProductionInputs,
    Energy,
    BuildingRent,
    EquipmentLeasing,
    FreightOnSales,
    Storage,
    ReturnedSales,
    /// Costs that never generate credit (payroll, fines, donations...)
    NonCreditable,
}

impl ExpenseCategory {
    pub fn earns_credit(&self) -> bool {
        !matches!(self, ExpenseCategory::NonCreditable)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditExpense {
    pub category: ExpenseCategory,
    pub amount: Money,
    /// Payments to natural persons earn no credit
    #[serde(default)]
    pub paid_to_natural_person: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// How the depreciation charge of an asset was declared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepreciationMethod {
    /// Statutory fixed fraction of cost per month
    #[default]
    StatutoryFixedFraction,
    /// Book straight-line rate; not accepted for the credit
    AccountingStraightLine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalAsset {
    pub description: String,
    pub acquisition_cost: Money,
    #[serde(default)]
    pub method: DepreciationMethod,
    /// Months of credit already taken in earlier periods
    #[serde(default)]
    pub months_already_credited: u32,
}

/// Everything the credit computation reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreditContext {
    pub taxable_revenue: Money,
    #[serde(default)]
    pub expenses: Vec<CreditExpense>,
    #[serde(default)]
    pub assets: Vec<CapitalAsset>,
    #[serde(default)]
    pub ledger: CreditLedger,
}

impl CreditContext {
    pub fn validate(&self) -> TaxRegimeResult<()> {
        if self.taxable_revenue < Decimal::ZERO {
            return Err(TaxRegimeError::InvalidInput {
                field: "credits.taxable_revenue".into(),
                reason: "must be zero or positive".into(),
            });
        }
        for (i, e) in self.expenses.iter().enumerate() {
            if e.amount < Decimal::ZERO {
                return Err(TaxRegimeError::InvalidInput {
                    field: format!("credits.expenses[{i}].amount"),
                    reason: "must be zero or positive".into(),
                });
            }
        }
        for (i, a) in self.assets.iter().enumerate() {
            if a.acquisition_cost < Decimal::ZERO {
                return Err(TaxRegimeError::InvalidInput {
                    field: format!("credits.assets[{i}].acquisition_cost"),
                    reason: "must be zero or positive".into(),
                });
            }
        }
        self.ledger.validate()
    }
}

/// Debit/credit settlement of one contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionSettlement {
    pub tax: TaxKind,
    pub rate: Rate,
    pub debit: Money,
    pub credit: Money,
    pub carryforward_used: Money,
    pub net_due: Money,
    pub carryforward_after: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonCumulativeResult {
    /// Eligible expenses plus depreciation credit base
    pub credit_base: Money,
    pub depreciation_credit_base: Money,
    /// Expenses refused because they were paid to natural persons
    pub excluded_natural_person: Money,
    pub pis: ContributionSettlement,
    pub cofins: ContributionSettlement,
    pub ledger_after: CreditLedger,
    pub flags: Vec<String>,
}

/// Depreciation credit base for one asset over the period, at
/// `cost / credit_months` per month and never past the last month.
pub fn depreciation_credit_base(asset: &CapitalAsset, period_months: u32, credit_months: u32) -> Money {
    if asset.method != DepreciationMethod::StatutoryFixedFraction || credit_months == 0 {
        return Decimal::ZERO;
    }
    let remaining = credit_months.saturating_sub(asset.months_already_credited);
    let months = period_months.min(remaining);
    asset.acquisition_cost * Decimal::from(months) / Decimal::from(credit_months)
}

/// Settle both contributions. Pure: the same context always gives the same
/// result.
pub fn settle_non_cumulative(
    ctx: &CreditContext,
    period_months: u32,
    national: &NationalRates,
) -> NonCumulativeResult {
    let mut flags = Vec::new();

    let mut eligible = Decimal::ZERO;
    let mut excluded_natural_person = Decimal::ZERO;
    for expense in &ctx.expenses {
        if !expense.category.earns_credit() {
            continue;
        }
        if expense.paid_to_natural_person {
            excluded_natural_person += expense.amount;
        } else {
            eligible += expense.amount;
        }
    }
    if excluded_natural_person > Decimal::ZERO {
        flags.push("credit_refused_natural_person".to_string());
    }

    let mut depreciation = Decimal::ZERO;
    for asset in &ctx.assets {
        if asset.method == DepreciationMethod::AccountingStraightLine {
            flags.push(format!(
                "depreciation_method_divergence: {}",
                asset.description
            ));
            continue;
        }
        depreciation += depreciation_credit_base(
            asset,
            period_months,
            national.depreciation_credit_months,
        );
    }
    let depreciation = round_money(depreciation);
    let credit_base = round_money(eligible) + depreciation;

    let pis = settle(
        TaxKind::Pis,
        ctx.taxable_revenue,
        credit_base,
        national.pis_non_cumulative_rate,
        ctx.ledger.pis_carryforward,
    );
    let cofins = settle(
        TaxKind::Cofins,
        ctx.taxable_revenue,
        credit_base,
        national.cofins_non_cumulative_rate,
        ctx.ledger.cofins_carryforward,
    );

    NonCumulativeResult {
        credit_base,
        depreciation_credit_base: depreciation,
        excluded_natural_person: round_money(excluded_natural_person),
        ledger_after: CreditLedger {
            pis_carryforward: pis.carryforward_after,
            cofins_carryforward: cofins.carryforward_after,
        },
        pis,
        cofins,
        flags,
    }
}

fn settle(
    tax: TaxKind,
    revenue: Money,
    credit_base: Money,
    rate: Rate,
    prior_carryforward: Money,
) -> ContributionSettlement {
    let debit = round_money(revenue * rate);
    let credit = round_money(credit_base * rate);
    let available = credit + prior_carryforward;
    let net_due = (debit - available).max(Decimal::ZERO);
    let carryforward_after = (available - debit).max(Decimal::ZERO);
    let carryforward_used = (debit - credit).max(Decimal::ZERO).min(prior_carryforward);
    ContributionSettlement {
        tax,
        rate,
        debit,
        credit,
        carryforward_used,
        net_due,
        carryforward_after,
    }
}
