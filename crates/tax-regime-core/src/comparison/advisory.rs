//! Advisory text attached to a comparison.

use rust_decimal::Decimal;

use super::inputs::EntityInputs;
use super::ranking::{ExcludedRegime, RankedRegime};
use crate::activity::ActivityProfile;
use crate::actual::ActualDetail;
use crate::config::TaxTables;
use crate::jurisdiction::JurisdictionProfile;
use crate::regime::RegimeDetail;
use crate::types::*;

pub struct AdvisoryContext<'a> {
    pub inputs: &'a EntityInputs,
    pub tables: &'a TaxTables,
    pub jurisdiction: &'a JurisdictionProfile,
    pub activity: &'a ActivityProfile,
    pub ranked: &'a [RankedRegime],
    pub excluded: &'a [ExcludedRegime],
}

pub fn generate_advisories(ctx: &AdvisoryContext<'_>) -> Vec<Advisory> {
    let mut advisories = Vec::new();
    advisories.extend(recommendation(ctx));
    advisories.extend(ceiling_proximity(ctx));
    advisories.extend(payroll_ratio(ctx));
    advisories.extend(actual_profit_balances(ctx));
    advisories.extend(data_quality(ctx));
    for ranked in ctx.ranked {
        advisories.extend(ranked.result.advisories.iter().cloned());
    }
    advisories
}

fn recommendation(ctx: &AdvisoryContext<'_>) -> Vec<Advisory> {
    let (Some(cheapest), Some(dearest)) = (ctx.ranked.first(), ctx.ranked.last()) else {
        return vec![Advisory::new(
            Severity::Critical,
            "No regime is available for this entity",
        )];
    };
    let regime = cheapest.result.regime;
    let message = if ctx.ranked.len() == 1 {
        format!(
            "{} is the only regime available: liability {} ({} effective)",
            regime,
            brl(cheapest.result.total_liability),
            pct(cheapest.result.effective_rate)
        )
    } else {
        let savings = dearest.result.total_liability - cheapest.result.total_liability;
        format!(
            "Recommended regime: {} with liability {} ({} effective), saving {} against {}",
            regime,
            brl(cheapest.result.total_liability),
            pct(cheapest.result.effective_rate),
            brl(savings),
            dearest.result.regime
        )
    };
    let mut advisories = vec![Advisory::new(Severity::Info, message).for_regime(regime)];
    for excluded in ctx.excluded {
        advisories.push(
            Advisory::new(Severity::Info, excluded.reason.clone()).for_regime(excluded.regime),
        );
    }
    advisories
}

/// True when `value` sits in the band `[limit × (1 − band), limit]`.
fn near_limit(value: Money, limit: Money, band: Rate) -> bool {
    value <= limit && value >= limit * (Decimal::ONE - band)
}

fn ceiling_proximity(ctx: &AdvisoryContext<'_>) -> Vec<Advisory> {
    let band = ctx.tables.thresholds.ceiling_proximity;
    let national = &ctx.tables.national;
    let trailing = ctx.inputs.trailing_revenue_12m;
    let mut advisories = Vec::new();

    if near_limit(trailing, national.simplified_ceiling, band) {
        advisories.push(
            Advisory::new(
                Severity::Warning,
                format!(
                    "Trailing revenue {} is within {} of the simplified-regime ceiling {}",
                    brl(trailing),
                    pct(band),
                    brl(national.simplified_ceiling)
                ),
            )
            .cite("LC 123/2006, art. 3, II")
            .for_regime(Regime::Simplified),
        );
    }
    if near_limit(trailing, ctx.jurisdiction.simplified_sublimit, band) {
        advisories.push(
            Advisory::new(
                Severity::Warning,
                format!(
                    "Trailing revenue {} is within {} of the {} sublimit {}; above it ICMS/ISS \
                     leave the unified levy",
                    brl(trailing),
                    pct(band),
                    ctx.jurisdiction.code,
                    brl(ctx.jurisdiction.simplified_sublimit)
                ),
            )
            .cite("LC 123/2006, art. 19")
            .for_regime(Regime::Simplified),
        );
    }
    let annual = ctx.inputs.annual_revenue();
    if near_limit(annual, national.presumed_ceiling, band) {
        advisories.push(
            Advisory::new(
                Severity::Warning,
                format!(
                    "Annual revenue {} is within {} of the presumed-profit ceiling {}",
                    brl(annual),
                    pct(band),
                    brl(national.presumed_ceiling)
                ),
            )
            .cite("Lei 9.718/1998, art. 13")
            .for_regime(Regime::PresumedProfit),
        );
    }
    advisories
}

fn payroll_ratio(ctx: &AdvisoryContext<'_>) -> Option<Advisory> {
    if !ctx.activity.payroll_ratio_sensitive || ctx.inputs.trailing_revenue_12m.is_zero() {
        return None;
    }
    let threshold = ctx.tables.national.payroll_ratio_threshold;
    let ratio = ctx.inputs.trailing_payroll() / ctx.inputs.trailing_revenue_12m;
    if (ratio - threshold).abs() > ctx.tables.thresholds.payroll_ratio_band {
        return None;
    }
    let message = if ratio >= threshold {
        format!(
            "Payroll ratio {} is just above the {} threshold; a small payroll cut would move \
             the activity to the more expensive annex",
            pct(ratio),
            pct(threshold)
        )
    } else {
        let gap = (threshold * ctx.inputs.trailing_revenue_12m) - ctx.inputs.trailing_payroll();
        format!(
            "Payroll ratio {} is just below the {} threshold; {} more trailing payroll would \
             qualify for the cheaper annex",
            pct(ratio),
            pct(threshold),
            brl(gap)
        )
    };
    Some(
        Advisory::new(Severity::Warning, message)
            .cite("LC 123/2006, art. 18, §5-J")
            .for_regime(Regime::Simplified),
    )
}

fn actual_profit_balances(ctx: &AdvisoryContext<'_>) -> Vec<Advisory> {
    let Some(detail) = ctx.ranked.iter().find_map(|r| match &r.result.detail {
        RegimeDetail::Actual(detail) => Some(detail.as_ref()),
        _ => None,
    }) else {
        return Vec::new();
    };
    actual_detail_advisories(detail)
}

fn actual_detail_advisories(detail: &ActualDetail) -> Vec<Advisory> {
    let mut advisories = Vec::new();
    if let Some(jcp) = &detail.capital_remuneration {
        if jcp.net_benefit > Decimal::ZERO {
            advisories.push(
                Advisory::new(
                    Severity::Info,
                    format!(
                        "Capital remuneration of {} saves {} in IRPJ/CSLL for {} withholding: net benefit {}",
                        brl(jcp.deduction),
                        brl(jcp.tax_saved),
                        brl(jcp.withholding),
                        brl(jcp.net_benefit)
                    ),
                )
                .cite("Lei 9.249/1995, art. 9")
                .for_regime(Regime::ActualProfit),
            );
        }
    }
    let ledger = &detail.loss_ledger_after;
    if ledger.irpj_balance() > Decimal::ZERO || ledger.csll_negative_base > Decimal::ZERO {
        advisories.push(
            Advisory::new(
                Severity::Info,
                format!(
                    "Loss carryforward remaining: {} IRPJ ({} non-operating), {} CSLL negative base",
                    brl(ledger.irpj_balance()),
                    brl(ledger.non_operating_loss),
                    brl(ledger.csll_negative_base)
                ),
            )
            .cite("Lei 9.065/1995, art. 15")
            .for_regime(Regime::ActualProfit),
        );
    }
    let credits = &detail.non_cumulative.ledger_after;
    if credits.total() > Decimal::ZERO {
        advisories.push(
            Advisory::new(
                Severity::Info,
                format!(
                    "PIS/COFINS credit surplus carried forward: {} PIS, {} COFINS",
                    brl(credits.pis_carryforward),
                    brl(credits.cofins_carryforward)
                ),
            )
            .cite("Lei 10.833/2003, art. 3")
            .for_regime(Regime::ActualProfit),
        );
    }
    advisories
}

fn data_quality(ctx: &AdvisoryContext<'_>) -> Vec<Advisory> {
    let mut advisories = Vec::new();
    if !ctx.jurisdiction.is_authoritative() {
        advisories.push(Advisory::new(
            Severity::Warning,
            format!(
                "Jurisdiction {} data incomplete; defaults used for: {}",
                ctx.jurisdiction.code,
                ctx.jurisdiction.fallback_fields.join(", ")
            ),
        ));
    }
    if ctx.activity.is_degraded() {
        advisories.push(Advisory::new(
            Severity::Warning,
            format!(
                "Activity code '{}' not found in the classification table; treated as {:?}",
                ctx.activity.activity_code, ctx.activity.category
            ),
        ));
    }
    advisories
}
