use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use tax_regime_core::actual::{CreditLedger, LossLedger};
use tax_regime_core::comparison::ranking::{rank_results, savings};
use tax_regime_core::comparison::{ComparisonEngine, EntityInputs};
use tax_regime_core::regime::{RegimeDetail, RegimeResult};
use tax_regime_core::*;

// ===========================================================================
// Helpers
// ===========================================================================

fn sample_inputs() -> EntityInputs {
    EntityInputs {
        entity_name: Some("Acme Consultoria".into()),
        jurisdiction_code: "SP".into(),
        tax_year: Some(2025),
        activity_code: "7020-4/00".into(),
        declared_category: None,
        period: FilingPeriod::Quarterly,
        period_start: None,
        period_revenue: dec!(300_000),
        trailing_revenue_12m: dec!(1_200_000),
        annual_revenue: None,
        monthly_payroll: dec!(20_000),
        trailing_payroll_12m: None,
        taxable_purchases: dec!(0),
        accounting_profit_before_tax: dec!(60_000),
        additions: vec![],
        exclusions: vec![],
        non_operating_result: dec!(0),
        loss_ledger: LossLedger::zeroed(),
        equity: None,
        credit_expenses: vec![],
        capital_assets: vec![],
        credit_ledger: CreditLedger::zeroed(),
        activate_incentives: vec![],
    }
}

fn flat_result(regime: Regime, total: Money) -> RegimeResult {
    RegimeResult::assemble(
        regime,
        vec![TaxComponent::new(TaxKind::Irpj, total, dec!(1), total)],
        dec!(1_000_000),
        RegimeDetail::NotApplicable {
            reason: "fixture".into(),
        },
        vec![],
        vec![],
    )
}

// ===========================================================================
// Full comparison
// ===========================================================================

#[test]
fn test_three_regimes_ranked_cheapest_first() {
    let engine = ComparisonEngine::with_defaults().unwrap();
    let out = engine.compare(&sample_inputs()).unwrap();
    let r = &out.result;

    assert_eq!(r.ranked.len(), 3);
    assert!(r.excluded.is_empty());
    for pair in r.ranked.windows(2) {
        assert!(pair[0].result.total_liability <= pair[1].result.total_liability);
    }
    for (i, ranked) in r.ranked.iter().enumerate() {
        assert_eq!(ranked.rank, i + 1);
        assert!(ranked.result.components_balance());
    }
    assert_eq!(r.cheapest, r.ranked[0].result.regime);
    assert_eq!(r.most_expensive, r.ranked[2].result.regime);
    assert_eq!(
        r.savings,
        r.ranked[2].result.total_liability - r.ranked[0].result.total_liability
    );
    assert!(r.savings_pct >= dec!(0) && r.savings_pct <= dec!(1));
}

#[test]
fn test_recommendation_is_first_advisory() {
    let engine = ComparisonEngine::with_defaults().unwrap();
    let out = engine.compare(&sample_inputs()).unwrap();
    let first = &out.result.advisories[0];
    assert_eq!(first.severity, Severity::Info);
    assert_eq!(first.regime, Some(out.result.cheapest));
    assert!(first.message.starts_with("Recommended regime"));
}

#[test]
fn test_presumed_result_matches_standalone_calculation() {
    let engine = ComparisonEngine::with_defaults().unwrap();
    let out = engine.compare(&sample_inputs()).unwrap();
    let presumed = out.result.result_for(Regime::PresumedProfit).unwrap();
    assert_eq!(presumed.component(TaxKind::IrpjSurtax), dec!(3_600));
    assert_eq!(presumed.component(TaxKind::Cpp), dec!(16_680));
}

// ===========================================================================
// Exclusions
// ===========================================================================

#[test]
fn test_single_eligible_regime_has_zero_savings() {
    let engine = ComparisonEngine::with_defaults().unwrap();
    let mut inputs = sample_inputs();
    inputs.activity_code = "6422-1/00".into();
    let out = engine.compare(&inputs).unwrap();
    let r = &out.result;

    assert_eq!(r.ranked.len(), 1);
    assert_eq!(r.excluded.len(), 2);
    assert_eq!(r.cheapest, Regime::ActualProfit);
    assert_eq!(r.cheapest, r.most_expensive);
    assert_eq!(r.savings, dec!(0));
    assert_eq!(r.savings_pct, dec!(0));
    assert!(r.advisories[0].message.contains("only regime available"));
}

#[test]
fn test_excluded_regimes_are_listed_with_reason_codes() {
    let engine = ComparisonEngine::with_defaults().unwrap();
    let mut inputs = sample_inputs();
    inputs.trailing_revenue_12m = dec!(6_000_000);
    let out = engine.compare(&inputs).unwrap();
    let r = &out.result;

    assert_eq!(r.excluded.len(), 1);
    assert_eq!(r.excluded[0].regime, Regime::Simplified);
    assert_eq!(r.excluded[0].reason_code, "simplified_ceiling_exceeded");

    let records = r.to_flat_records();
    assert_eq!(records.len(), 3);
    let last = records.last().unwrap();
    assert!(!last.eligible);
    assert_eq!(last.rank, None);
}

#[test]
fn test_zero_period_revenue_rejected() {
    let engine = ComparisonEngine::with_defaults().unwrap();
    let mut inputs = sample_inputs();
    inputs.period_revenue = dec!(0);
    assert!(matches!(
        engine.compare(&inputs),
        Err(TaxRegimeError::InvalidInput { .. })
    ));
}

// ===========================================================================
// Advisories
// ===========================================================================

#[test]
fn test_near_ceiling_warning() {
    let engine = ComparisonEngine::with_defaults().unwrap();
    let mut inputs = sample_inputs();
    inputs.trailing_revenue_12m = dec!(4_700_000);
    let out = engine.compare(&inputs).unwrap();
    assert!(out
        .result
        .advisories
        .iter()
        .any(|a| a.severity == Severity::Warning && a.message.contains("simplified-regime ceiling")));
}

#[test]
fn test_unknown_jurisdiction_reports_incomplete_data() {
    let engine = ComparisonEngine::with_defaults().unwrap();
    let mut inputs = sample_inputs();
    inputs.jurisdiction_code = "ZZ".into();
    let out = engine.compare(&inputs).unwrap();
    assert!(out
        .result
        .advisories
        .iter()
        .any(|a| a.message.contains("data incomplete")));
    assert!(out
        .result
        .data_quality
        .contains(&"jurisdiction_fallback:goods_tax_standard_rate".to_string()));
    assert!(!out
        .result
        .data_quality
        .iter()
        .any(|q| q.ends_with(":*")));
}

// ===========================================================================
// Ranking
// ===========================================================================

#[test]
fn test_ties_prefer_lighter_compliance_regime() {
    let (ranked, excluded) = rank_results(vec![
        flat_result(Regime::ActualProfit, dec!(10_000)),
        flat_result(Regime::PresumedProfit, dec!(10_000)),
        flat_result(Regime::Simplified, dec!(12_000)),
    ]);
    assert!(excluded.is_empty());
    let order: Vec<Regime> = ranked.iter().map(|r| r.result.regime).collect();
    assert_eq!(
        order,
        vec![Regime::PresumedProfit, Regime::ActualProfit, Regime::Simplified]
    );

    let (amount, share) = savings(&ranked);
    assert_eq!(amount, dec!(2_000));
    assert_eq!(share.round_dp(4), dec!(0.1667));
}
