use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::activity::ActivityProfile;
use crate::config::TaxTables;
use crate::error::TaxRegimeError;
use crate::jurisdiction::JurisdictionProfile;
use crate::levies::{income_tax, local_consumption_tax, payroll_contribution};
use crate::regime::{AppliedIncentive, ExclusionReason, RegimeDetail, RegimeResult};
use crate::types::*;
use crate::TaxRegimeResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

fn default_quarter() -> u32 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresumedInput {
    /// Gross revenue of the period
    pub period_revenue: Money,
    #[serde(default = "default_quarter")]
    pub period_months: u32,
    #[serde(default)]
    pub period_payroll: Money,
    #[serde(default)]
    pub taxable_purchases: Money,
    /// Annual revenue used for the eligibility ceiling; defaults to the
    /// period revenue annualized
    #[serde(default)]
    pub annual_revenue_estimate: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresumedDetail {
    pub irpj_presumption: Rate,
    pub csll_presumption: Rate,
    pub irpj_base: Money,
    pub csll_base: Money,
    pub surtax_threshold: Money,
    pub surtax_base: Money,
    pub annual_revenue: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incentive: Option<AppliedIncentive>,
    /// Federal rates replaced by jurisdiction overrides
    pub federal_overrides_applied: bool,
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

/// Lucro Presumido calculator.
pub struct PresumedProfitCalculator<'a> {
    tables: &'a TaxTables,
}

impl<'a> PresumedProfitCalculator<'a> {
    pub fn new(tables: &'a TaxTables) -> Self {
        PresumedProfitCalculator { tables }
    }

    pub fn compute(
        &self,
        input: &PresumedInput,
        activity: &ActivityProfile,
        jurisdiction: &JurisdictionProfile,
    ) -> TaxRegimeResult<RegimeResult> {
        validate_input(input)?;
        let rates = self
            .tables
            .national
            .with_overrides(&jurisdiction.federal_overrides);
        let revenue = input.period_revenue;
        let annual_revenue = input.annual_revenue_estimate.unwrap_or_else(|| {
            revenue * Decimal::from(12) / Decimal::from(input.period_months)
        });

        if activity.presumed_prohibited {
            return Ok(RegimeResult::excluded(
                Regime::PresumedProfit,
                ExclusionReason::ActualProfitRequired {
                    activity_code: activity.activity_code.clone(),
                },
            ));
        }
        if annual_revenue > rates.presumed_ceiling {
            return Ok(RegimeResult::excluded(
                Regime::PresumedProfit,
                ExclusionReason::PresumedCeilingExceeded {
                    ceiling: rates.presumed_ceiling,
                    annual_revenue,
                },
            ));
        }

        let irpj_base = revenue * activity.irpj_presumption;
        let csll_base = revenue * activity.csll_presumption;
        let irpj = income_tax(irpj_base, input.period_months, &rates, jurisdiction);

        debug!(
            irpj_base = %irpj_base,
            csll_base = %csll_base,
            surtax_base = %irpj.surtax_base,
            "presumed bases"
        );

        let mut components = irpj.components(&rates);
        components.push(TaxComponent::levied(TaxKind::Csll, csll_base, rates.csll_rate));
        components.push(TaxComponent::levied(
            TaxKind::Pis,
            revenue,
            rates.pis_cumulative_rate,
        ));
        components.push(TaxComponent::levied(
            TaxKind::Cofins,
            revenue,
            rates.cofins_cumulative_rate,
        ));
        components.extend(local_consumption_tax(
            activity.tax_type,
            revenue,
            input.taxable_purchases,
            jurisdiction,
        ));
        if let Some(cpp) = payroll_contribution(input.period_payroll, rates.payroll_burden_rate())
        {
            components.push(cpp);
        }

        let mut flags = Vec::new();
        let mut advisories = Vec::new();
        let overrides_applied = !jurisdiction.federal_overrides.is_empty();
        if overrides_applied {
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
                .for_regime(Regime::PresumedProfit),
            );
        }

        let detail = PresumedDetail {
            irpj_presumption: activity.irpj_presumption,
            csll_presumption: activity.csll_presumption,
            irpj_base: round_money(irpj_base),
            csll_base: round_money(csll_base),
            surtax_threshold: irpj.surtax_threshold,
            surtax_base: round_money(irpj.surtax_base),
            annual_revenue: round_money(annual_revenue),
            incentive: irpj.incentive.clone(),
            federal_overrides_applied: overrides_applied,
        };

        Ok(RegimeResult::assemble(
            Regime::PresumedProfit,
            components,
            revenue,
            RegimeDetail::Presumed(detail),
            flags,
            advisories,
        ))
    }
}

fn validate_input(input: &PresumedInput) -> TaxRegimeResult<()> {
    let figures = [
        ("period_revenue", input.period_revenue),
        ("period_payroll", input.period_payroll),
        ("taxable_purchases", input.taxable_purchases),
        (
            "annual_revenue_estimate",
            input.annual_revenue_estimate.unwrap_or_default(),
        ),
    ];
    for (field, value) in figures {
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
    use crate::config::JurisdictionDefaults;
    use crate::jurisdiction::RegionalIncentive;
    use crate::regime::Eligibility;
    use rust_decimal_macros::dec;

    fn sample_jurisdiction() -> JurisdictionProfile {
        JurisdictionProfile::fallback("SP", 2025, &JurisdictionDefaults::default())
    }

    fn sample_input(revenue: Money) -> PresumedInput {
        PresumedInput {
            period_revenue: revenue,
            period_months: 3,
            period_payroll: dec!(0),
            taxable_purchases: dec!(0),
            annual_revenue_estimate: None,
        }
    }

    fn detail(result: &RegimeResult) -> &PresumedDetail {
        match &result.detail {
            RegimeDetail::Presumed(d) => d,
            other => panic!("unexpected detail {other:?}"),
        }
    }

    #[test]
    fn test_quarterly_services_surtax() {
        let tables = TaxTables::default();
        let calc = PresumedProfitCalculator::new(&tables);
        let activity = ActivityClassifier::new().classify("7020-4/00", None);
        let r = calc
            .compute(&sample_input(dec!(300_000)), &activity, &sample_jurisdiction())
            .unwrap();
        let d = detail(&r);
        assert_eq!(d.irpj_base, dec!(96_000));
        assert_eq!(d.surtax_base, dec!(36_000));
        assert_eq!(r.component(TaxKind::Irpj), dec!(14_400));
        assert_eq!(r.component(TaxKind::IrpjSurtax), dec!(3_600));
        assert_eq!(r.component(TaxKind::Csll), dec!(8_640));
        assert_eq!(r.component(TaxKind::Pis), dec!(1_950));
        assert_eq!(r.component(TaxKind::Cofins), dec!(9_000));
        assert_eq!(r.component(TaxKind::Iss), dec!(15_000));
        assert_eq!(r.total_liability, dec!(52_590));
        assert!(r.components_balance());
    }

    #[test]
    fn test_goods_trade_uses_icms_on_net_base() {
        let tables = TaxTables::default();
        let calc = PresumedProfitCalculator::new(&tables);
        let activity = ActivityClassifier::new().classify("4711-3/02", None);
        let mut input = sample_input(dec!(1_000_000));
        input.taxable_purchases = dec!(600_000);
        let r = calc
            .compute(&input, &activity, &sample_jurisdiction())
            .unwrap();
        assert_eq!(detail(&r).irpj_base, dec!(80_000));
        assert_eq!(r.component(TaxKind::Icms), dec!(72_000));
        assert_eq!(r.component(TaxKind::Iss), dec!(0));
    }

    #[test]
    fn test_incentive_reduces_irpj_only() {
        let tables = TaxTables::default();
        let calc = PresumedProfitCalculator::new(&tables);
        let activity = ActivityClassifier::new().classify("7020-4/00", None);
        let mut jurisdiction = sample_jurisdiction();
        jurisdiction.incentives.insert(
            "sudene".into(),
            RegionalIncentive {
                active: true,
                reduction: dec!(0.75),
                condition: None,
            },
        );
        let r = calc
            .compute(&sample_input(dec!(300_000)), &activity, &jurisdiction)
            .unwrap();
        assert_eq!(
            r.component(TaxKind::Irpj) + r.component(TaxKind::IrpjSurtax),
            dec!(4_500)
        );
        assert_eq!(r.component(TaxKind::Csll), dec!(8_640));
        assert_eq!(detail(&r).incentive.as_ref().unwrap().name, "sudene");
    }

    #[test]
    fn test_federal_override_replaces_csll_rate() {
        let tables = TaxTables::default();
        let calc = PresumedProfitCalculator::new(&tables);
        let activity = ActivityClassifier::new().classify("7020-4/00", None);
        let mut jurisdiction = sample_jurisdiction();
        jurisdiction.federal_overrides.csll_rate = Some(dec!(0.15));
        let r = calc
            .compute(&sample_input(dec!(300_000)), &activity, &jurisdiction)
            .unwrap();
        assert_eq!(r.component(TaxKind::Csll), dec!(14_400));
        assert!(r.flags.contains(&"federal_overrides_applied".to_string()));
    }

    #[test]
    fn test_payroll_contribution_included() {
        let tables = TaxTables::default();
        let calc = PresumedProfitCalculator::new(&tables);
        let activity = ActivityClassifier::new().classify("7020-4/00", None);
        let mut input = sample_input(dec!(300_000));
        input.period_payroll = dec!(60_000);
        let r = calc
            .compute(&input, &activity, &sample_jurisdiction())
            .unwrap();
        // 20% + 2% + 5.8%
        assert_eq!(r.component(TaxKind::Cpp), dec!(16_680));
    }

    #[test]
    fn test_ceiling_and_obligation_exclusions() {
        let tables = TaxTables::default();
        let calc = PresumedProfitCalculator::new(&tables);
        let activity = ActivityClassifier::new().classify("7020-4/00", None);
        let r = calc
            .compute(&sample_input(dec!(20_000_000)), &activity, &sample_jurisdiction())
            .unwrap();
        assert!(matches!(
            r.eligibility,
            Eligibility::Excluded(ExclusionReason::PresumedCeilingExceeded { .. })
        ));

        let bank = ActivityClassifier::new().classify("6422-1/00", None);
        let r = calc
            .compute(&sample_input(dec!(300_000)), &bank, &sample_jurisdiction())
            .unwrap();
        assert_eq!(r.flags, vec!["actual_profit_required".to_string()]);
    }

    #[test]
    fn test_zero_revenue_is_zero_liability() {
        let tables = TaxTables::default();
        let calc = PresumedProfitCalculator::new(&tables);
        let activity = ActivityClassifier::new().classify("7020-4/00", None);
        let r = calc
            .compute(&sample_input(dec!(0)), &activity, &sample_jurisdiction())
            .unwrap();
        assert_eq!(r.total_liability, dec!(0));
        assert_eq!(r.effective_rate, dec!(0));
    }

    #[test]
    fn test_zero_period_months_rejected() {
        let tables = TaxTables::default();
        let calc = PresumedProfitCalculator::new(&tables);
        let activity = ActivityClassifier::new().classify("7020-4/00", None);
        let mut input = sample_input(dec!(100));
        input.period_months = 0;
        assert!(calc
            .compute(&input, &activity, &sample_jurisdiction())
            .is_err());
    }
}
