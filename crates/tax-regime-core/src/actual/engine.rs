use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::adjustments::{adjusted_income, validate_adjustments, AdjustedIncome, Adjustment};
use super::capital_remuneration::{capital_remuneration, CapitalRemuneration, EquityContext};
use super::credits::{settle_non_cumulative, CreditContext, NonCumulativeResult};
use super::ledger::LossLedger;
use super::loss_compensation::{compensate_losses, LossCompensation};
use crate::activity::ActivityProfile;
use crate::config::{NationalRates, TaxTables};
use crate::error::TaxRegimeError;
use crate::jurisdiction::JurisdictionProfile;
use crate::levies::{income_tax, local_consumption_tax, payroll_contribution, IncomeTaxBreakdown};
use crate::regime::{RegimeDetail, RegimeResult};
use crate::types::*;
use crate::TaxRegimeResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

fn default_quarter() -> u32 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActualInput {
    /// Book profit before income taxes; negative for a loss
    pub accounting_profit_before_tax: Money,
    #[serde(default)]
    pub additions: Vec<Adjustment>,
    #[serde(default)]
    pub exclusions: Vec<Adjustment>,
    /// Gain (positive) or loss (negative) on disposal of fixed assets,
    /// already included in the accounting profit
    #[serde(default)]
    pub non_operating_result: Money,
    #[serde(default)]
    pub loss_ledger: LossLedger,
    #[serde(default)]
    pub equity: Option<EquityContext>,
    pub credits: CreditContext,
    #[serde(default = "default_quarter")]
    pub period_months: u32,
    #[serde(default)]
    pub period_payroll: Money,
    #[serde(default)]
    pub taxable_purchases: Money,
    /// Gross revenue for the effective rate and local tax; defaults to the
    /// PIS/COFINS taxable revenue
    #[serde(default)]
    pub gross_revenue: Option<Money>,
    /// First day of the period, checked against the reference rate window
    #[serde(default)]
    pub period_start: Option<NaiveDate>,
}

impl ActualInput {
    pub fn gross_revenue(&self) -> Money {
        self.gross_revenue.unwrap_or(self.credits.taxable_revenue)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualDetail {
    pub adjusted: AdjustedIncome,
    pub loss_compensation: LossCompensation,
    /// IRPJ base after compensation and capital remuneration
    pub irpj_base: Money,
    pub csll_base: Money,
    pub income_tax: IncomeTaxBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capital_remuneration: Option<CapitalRemuneration>,
    pub non_cumulative: NonCumulativeResult,
    pub loss_ledger_after: LossLedger,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Lucro Real engine: adjusted profit, loss compensation, capital
/// remuneration and non-cumulative contributions.
pub struct ActualProfitEngine<'a> {
    tables: &'a TaxTables,
}

impl<'a> ActualProfitEngine<'a> {
    pub fn new(tables: &'a TaxTables) -> Self {
        ActualProfitEngine { tables }
    }

    pub fn tables(&self) -> &TaxTables {
        self.tables
    }

    pub fn compute(
        &self,
        input: &ActualInput,
        activity: &ActivityProfile,
        jurisdiction: &JurisdictionProfile,
    ) -> TaxRegimeResult<RegimeResult> {
        validate_input(input)?;
        let rates = self
            .tables
            .national
            .with_overrides(&jurisdiction.federal_overrides);
        let months = input.period_months;
        let mut flags = Vec::new();
        let mut advisories = Vec::new();

        // 1. Adjusted income
        let adjusted = adjusted_income(
            input.accounting_profit_before_tax,
            &input.additions,
            &input.exclusions,
        );

        // 2. Loss compensation
        let compensation = compensate_losses(
            adjusted.adjusted,
            input.non_operating_result,
            &input.loss_ledger,
            rates.loss_compensation_cap,
        );
        if adjusted.adjusted <= Decimal::ZERO {
            flags.push("tax_loss_for_period".to_string());
        }
        debug!(
            adjusted = %adjusted.adjusted,
            irpj_compensated = %compensation.irpj_compensated(),
            csll_compensated = %compensation.csll_compensated(),
            "loss compensation"
        );

        // 3. Income taxes before capital remuneration
        let mut irpj_base = compensation.irpj_base;
        let mut csll_base = compensation.csll_base;
        let mut irpj = income_tax(irpj_base, months, &rates, jurisdiction);
        let mut csll = round_money(csll_base * rates.csll_rate);

        // 4. Capital remuneration
        let jcp = match &input.equity {
            Some(equity) => {
                let rate = equity.validate()?;
                let pre_deduction_net_income = equity
                    .pre_deduction_net_income
                    .unwrap_or(input.accounting_profit_before_tax - csll);
                let mut jcp =
                    capital_remuneration(equity, rate, pre_deduction_net_income, months, &rates);

                if jcp.deduction > irpj_base {
                    jcp.flags.push("jcp_capped_at_taxable_base".to_string());
                    jcp.deduction = irpj_base;
                    jcp.withholding = round_money(jcp.deduction * rates.jcp_withholding_rate);
                }

                let before = irpj.total() + csll;
                irpj_base -= jcp.deduction;
                csll_base = (csll_base - jcp.deduction).max(Decimal::ZERO);
                irpj = income_tax(irpj_base, months, &rates, jurisdiction);
                csll = round_money(csll_base * rates.csll_rate);
                jcp.tax_saved = before - (irpj.total() + csll);
                jcp.net_benefit = jcp.tax_saved - jcp.withholding;

                if let Some(start) = input.period_start {
                    if !rate.is_valid_on(start) {
                        advisories.push(
                            Advisory::new(
                                Severity::Warning,
                                format!(
                                    "Reference rate {} is not published for a period starting {}",
                                    pct(rate.annual_rate),
                                    start
                                ),
                            )
                            .cite("Lei 9.249/1995, art. 9")
                            .for_regime(Regime::ActualProfit),
                        );
                        jcp.flags.push("jcp_reference_rate_stale".to_string());
                    }
                }
                flags.extend(jcp.flags.iter().cloned());
                debug!(
                    deduction = %jcp.deduction,
                    tax_saved = %jcp.tax_saved,
                    net_benefit = %jcp.net_benefit,
                    "capital remuneration"
                );
                Some(jcp)
            }
            None => None,
        };

        // 5. Non-cumulative PIS/COFINS
        let non_cumulative = settle_non_cumulative(&input.credits, months, &rates);
        flags.extend(non_cumulative.flags.iter().cloned());

        // 6. Components
        let mut components = irpj.components(&rates);
        components.push(TaxComponent::new(
            TaxKind::Csll,
            csll_base,
            rates.csll_rate,
            csll,
        ));
        components.push(settlement_component(
            TaxKind::Pis,
            &input.credits,
            &non_cumulative,
            &rates,
        ));
        components.push(settlement_component(
            TaxKind::Cofins,
            &input.credits,
            &non_cumulative,
            &rates,
        ));
        let gross_revenue = input.gross_revenue();
        components.extend(local_consumption_tax(
            activity.tax_type,
            gross_revenue,
            input.taxable_purchases,
            jurisdiction,
        ));
        if let Some(cpp) = payroll_contribution(input.period_payroll, rates.payroll_burden_rate())
        {
            components.push(cpp);
        }
        if let Some(jcp) = jcp.as_ref().filter(|j| j.deduction > Decimal::ZERO) {
            components.push(TaxComponent::new(
                TaxKind::JcpWithholding,
                jcp.deduction,
                rates.jcp_withholding_rate,
                jcp.withholding,
            ));
        }

        if gross_revenue.is_zero() {
            flags.push("zero_revenue_effective_rate".to_string());
        }
        if !jurisdiction.federal_overrides.is_empty() {
            flags.push("federal_overrides_applied".to_string());
        }
        if let Some(incentive) = &irpj.incentive {
            advisories.push(
                Advisory::new(
                    Severity::Info,
                    format!(
                        "Regional incentive '{}' reduces IRPJ by {} ({})",
                        incentive.name,
                        pct(incentive.reduction),
                        brl(incentive.amount)
                    ),
                )
                .for_regime(Regime::ActualProfit),
            );
        }

        let detail = ActualDetail {
            adjusted,
            irpj_base: round_money(irpj_base),
            csll_base: round_money(csll_base),
            income_tax: irpj,
            loss_ledger_after: compensation.ledger_after.clone(),
            loss_compensation: compensation,
            capital_remuneration: jcp,
            non_cumulative,
        };

        Ok(RegimeResult::assemble(
            Regime::ActualProfit,
            components,
            gross_revenue,
            RegimeDetail::Actual(Box::new(detail)),
            flags,
            advisories,
        ))
    }
}

fn settlement_component(
    tax: TaxKind,
    ctx: &CreditContext,
    result: &NonCumulativeResult,
    rates: &NationalRates,
) -> TaxComponent {
    let (rate, net_due) = match tax {
        TaxKind::Pis => (rates.pis_non_cumulative_rate, result.pis.net_due),
        _ => (rates.cofins_non_cumulative_rate, result.cofins.net_due),
    };
    TaxComponent::new(tax, ctx.taxable_revenue, rate, net_due)
}

fn validate_input(input: &ActualInput) -> TaxRegimeResult<()> {
    validate_adjustments("additions", &input.additions)?;
    validate_adjustments("exclusions", &input.exclusions)?;
    input.loss_ledger.validate()?;
    input.credits.validate()?;
    if let Some(equity) = &input.equity {
        equity.validate()?;
    }
    for (field, value) in [
        ("period_payroll", input.period_payroll),
        ("taxable_purchases", input.taxable_purchases),
        ("gross_revenue", input.gross_revenue.unwrap_or_default()),
    ] {
        if value < Decimal::ZERO {
            return Err(TaxRegimeError::InvalidInput {
                field: field.into(),
                reason: "must be zero or positive".into(),
            });
        }
    }
    if input.period_months == 0 || input.period_months > 12 {
        return Err(TaxRegimeError::InvalidInput {
            field: "period_months".into(),
            reason: "must be between 1 and 12".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityClassifier;
    use crate::actual::capital_remuneration::ReferenceRate;
    use crate::actual::credits::{CreditExpense, ExpenseCategory};
    use crate::actual::ledger::CreditLedger;
    use crate::config::JurisdictionDefaults;
    use rust_decimal_macros::dec;

    fn sample_jurisdiction() -> JurisdictionProfile {
        JurisdictionProfile::fallback("SP", 2025, &JurisdictionDefaults::default())
    }

    fn sample_input(profit: Money) -> ActualInput {
        ActualInput {
            accounting_profit_before_tax: profit,
            additions: vec![],
            exclusions: vec![],
            non_operating_result: dec!(0),
            loss_ledger: LossLedger::zeroed(),
            equity: None,
            credits: CreditContext {
                taxable_revenue: dec!(2_000_000),
                expenses: vec![CreditExpense {
                    category: ExpenseCategory::GoodsForResale,
                    amount: dec!(800_000),
                    paid_to_natural_person: false,
                    description: None,
                }],
                assets: vec![],
                ledger: CreditLedger::zeroed(),
            },
            period_months: 3,
            period_payroll: dec!(0),
            taxable_purchases: dec!(800_000),
            gross_revenue: None,
            period_start: None,
        }
    }

    fn detail(result: &RegimeResult) -> &ActualDetail {
        match &result.detail {
            RegimeDetail::Actual(d) => d.as_ref(),
            other => panic!("unexpected detail {other:?}"),
        }
    }

    #[test]
    fn test_loss_carryforward_capped() {
        let tables = TaxTables::default();
        let engine = ActualProfitEngine::new(&tables);
        let activity = ActivityClassifier::new().classify("4711-3/02", None);
        let mut input = sample_input(dec!(500_000));
        input.loss_ledger = LossLedger::new(dec!(1_000_000), dec!(0), dec!(0));

        let r = engine
            .compute(&input, &activity, &sample_jurisdiction())
            .unwrap();
        let d = detail(&r);
        assert_eq!(d.loss_compensation.irpj_compensated(), dec!(150_000));
        assert_eq!(d.loss_ledger_after.operating_loss, dec!(850_000));
        assert_eq!(d.irpj_base, dec!(350_000));
        // 52_500 + 10% of (350_000 − 60_000)
        assert_eq!(r.component(TaxKind::Irpj), dec!(52_500));
        assert_eq!(r.component(TaxKind::IrpjSurtax), dec!(29_000));
        assert!(r.components_balance());
    }

    #[test]
    fn test_loss_period_has_no_income_tax() {
        let tables = TaxTables::default();
        let engine = ActualProfitEngine::new(&tables);
        let activity = ActivityClassifier::new().classify("4711-3/02", None);
        let r = engine
            .compute(&sample_input(dec!(-100_000)), &activity, &sample_jurisdiction())
            .unwrap();
        assert_eq!(r.component(TaxKind::Irpj), dec!(0));
        assert_eq!(r.component(TaxKind::Csll), dec!(0));
        assert!(r.flags.contains(&"tax_loss_for_period".to_string()));
        assert_eq!(detail(&r).loss_ledger_after.operating_loss, dec!(100_000));
        // Contributions and local tax are still due
        assert!(r.component(TaxKind::Cofins) > dec!(0));
        assert!(r.component(TaxKind::Icms) > dec!(0));
    }

    #[test]
    fn test_capital_remuneration_reduces_both_bases() {
        let tables = TaxTables::default();
        let engine = ActualProfitEngine::new(&tables);
        let activity = ActivityClassifier::new().classify("4711-3/02", None);
        let mut input = sample_input(dec!(400_000));
        input.equity = Some(EquityContext {
            adjusted_equity_base: dec!(5_000_000),
            retained_earnings: dec!(0),
            reference_rate: Some(ReferenceRate::new(dec!(0.08))),
            pre_deduction_net_income: None,
            proposed_distribution: None,
        });

        let r = engine
            .compute(&input, &activity, &sample_jurisdiction())
            .unwrap();
        let d = detail(&r);
        let jcp = d.capital_remuneration.as_ref().unwrap();
        // 5M × 8% × 3/12
        assert_eq!(jcp.deduction, dec!(100_000));
        assert_eq!(d.irpj_base, dec!(300_000));
        assert_eq!(d.csll_base, dec!(300_000));
        // 25% IRPJ at the margin + 9% CSLL
        assert_eq!(jcp.tax_saved, dec!(34_000));
        assert_eq!(jcp.withholding, dec!(15_000));
        assert_eq!(jcp.net_benefit, dec!(19_000));
        assert_eq!(r.component(TaxKind::JcpWithholding), dec!(15_000));
    }

    #[test]
    fn test_jcp_bounded_by_half_of_net_income() {
        let tables = TaxTables::default();
        let engine = ActualProfitEngine::new(&tables);
        let activity = ActivityClassifier::new().classify("4711-3/02", None);
        let mut input = sample_input(dec!(100_000));
        input.equity = Some(EquityContext {
            adjusted_equity_base: dec!(50_000_000),
            retained_earnings: dec!(0),
            reference_rate: Some(ReferenceRate::new(dec!(0.08))),
            pre_deduction_net_income: None,
            proposed_distribution: None,
        });
        let r = engine
            .compute(&input, &activity, &sample_jurisdiction())
            .unwrap();
        let jcp = detail(&r).capital_remuneration.clone().unwrap();
        // net income before deduction = 100_000 − 9_000 CSLL
        assert_eq!(jcp.pre_deduction_net_income, dec!(91_000));
        assert_eq!(jcp.deduction, dec!(45_500));
        assert!(jcp.deduction <= jcp.rate_cap);
    }

    #[test]
    fn test_missing_reference_rate_fails_before_computing() {
        let tables = TaxTables::default();
        let engine = ActualProfitEngine::new(&tables);
        let activity = ActivityClassifier::new().classify("4711-3/02", None);
        let mut input = sample_input(dec!(400_000));
        input.equity = Some(EquityContext {
            adjusted_equity_base: dec!(5_000_000),
            retained_earnings: dec!(0),
            reference_rate: None,
            pre_deduction_net_income: None,
            proposed_distribution: None,
        });
        let err = engine
            .compute(&input, &activity, &sample_jurisdiction())
            .unwrap_err();
        assert!(matches!(err, TaxRegimeError::MissingReferenceRate { .. }));
    }

    #[test]
    fn test_stale_reference_rate_advisory() {
        let tables = TaxTables::default();
        let engine = ActualProfitEngine::new(&tables);
        let activity = ActivityClassifier::new().classify("4711-3/02", None);
        let mut input = sample_input(dec!(400_000));
        input.period_start = NaiveDate::from_ymd_opt(2025, 7, 1);
        input.equity = Some(EquityContext {
            adjusted_equity_base: dec!(5_000_000),
            retained_earnings: dec!(0),
            reference_rate: Some(ReferenceRate {
                annual_rate: dec!(0.0741),
                valid_from: NaiveDate::from_ymd_opt(2025, 1, 1),
                valid_until: NaiveDate::from_ymd_opt(2025, 3, 31),
            }),
            pre_deduction_net_income: None,
            proposed_distribution: None,
        });
        let r = engine
            .compute(&input, &activity, &sample_jurisdiction())
            .unwrap();
        assert!(r.flags.contains(&"jcp_reference_rate_stale".to_string()));
        assert!(r.advisories.iter().any(|a| a.severity == Severity::Warning));
    }

    #[test]
    fn test_non_cumulative_contributions() {
        let tables = TaxTables::default();
        let engine = ActualProfitEngine::new(&tables);
        let activity = ActivityClassifier::new().classify("4711-3/02", None);
        let r = engine
            .compute(&sample_input(dec!(100_000)), &activity, &sample_jurisdiction())
            .unwrap();
        // (2M − 800k) × 1.65% and × 7.6%
        assert_eq!(r.component(TaxKind::Pis), dec!(19_800));
        assert_eq!(r.component(TaxKind::Cofins), dec!(91_200));
        // ICMS on 2M − 800k purchases
        assert_eq!(r.component(TaxKind::Icms), dec!(216_000));
    }

    #[test]
    fn test_zero_revenue_flags_effective_rate() {
        let tables = TaxTables::default();
        let engine = ActualProfitEngine::new(&tables);
        let activity = ActivityClassifier::new().classify("7020-4/00", None);
        let mut input = sample_input(dec!(0));
        input.credits.taxable_revenue = dec!(0);
        input.credits.expenses.clear();
        input.taxable_purchases = dec!(0);
        let r = engine
            .compute(&input, &activity, &sample_jurisdiction())
            .unwrap();
        assert_eq!(r.effective_rate, dec!(0));
        assert!(r.flags.contains(&"zero_revenue_effective_rate".to_string()));
    }

    #[test]
    fn test_negative_adjustment_rejected() {
        let tables = TaxTables::default();
        let engine = ActualProfitEngine::new(&tables);
        let activity = ActivityClassifier::new().classify("4711-3/02", None);
        let mut input = sample_input(dec!(100_000));
        input.additions.push(Adjustment::new("bad", dec!(-5)));
        assert!(engine
            .compute(&input, &activity, &sample_jurisdiction())
            .is_err());
    }
}
