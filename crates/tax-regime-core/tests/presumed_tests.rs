use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use tax_regime_core::comparison::{ComparisonEngine, RegimeRequest};
use tax_regime_core::presumed::{PresumedDetail, PresumedInput};
use tax_regime_core::regime::{Eligibility, ExclusionReason, RegimeDetail, RegimeResult};
use tax_regime_core::*;

// ===========================================================================
// Helpers
// ===========================================================================

fn sample_request(revenue: Money) -> RegimeRequest<PresumedInput> {
    RegimeRequest {
        jurisdiction_code: "SP".into(),
        tax_year: Some(2025),
        activity_code: "7020-4/00".into(),
        declared_category: None,
        activate_incentives: vec![],
        input: PresumedInput {
            period_revenue: revenue,
            period_months: 3,
            period_payroll: dec!(0),
            taxable_purchases: dec!(0),
            annual_revenue_estimate: None,
        },
    }
}

fn detail(result: &RegimeResult) -> &PresumedDetail {
    match &result.detail {
        RegimeDetail::Presumed(d) => d,
        other => panic!("expected presumed detail, got {other:?}"),
    }
}

// ===========================================================================
// Quarterly services
// ===========================================================================

#[test]
fn test_quarterly_services_bases_and_surtax() {
    let engine = ComparisonEngine::with_defaults().unwrap();
    let out = engine.compute_presumed(&sample_request(dec!(300_000))).unwrap();
    let result = &out.result;
    let d = detail(result);

    assert_eq!(d.irpj_base, dec!(96_000));
    assert_eq!(d.csll_base, dec!(96_000));
    assert_eq!(d.surtax_threshold, dec!(60_000));
    assert_eq!(d.surtax_base, dec!(36_000));
    assert_eq!(result.component(TaxKind::IrpjSurtax), dec!(3_600));
    assert_eq!(result.total_liability, dec!(52_590));
    assert_eq!(result.effective_rate, dec!(0.1753));
    assert!(result.components_balance());
}

#[test]
fn test_authoritative_jurisdiction_produces_no_warning() {
    let engine = ComparisonEngine::with_defaults().unwrap();
    let out = engine.compute_presumed(&sample_request(dec!(300_000))).unwrap();
    assert!(out.warnings.is_empty());
    assert_eq!(out.metadata.precision, "rust_decimal_128bit");
}

#[test]
fn test_monthly_period_uses_monthly_surtax_threshold() {
    let engine = ComparisonEngine::with_defaults().unwrap();
    let mut request = sample_request(dec!(100_000));
    request.input.period_months = 1;
    let out = engine.compute_presumed(&request).unwrap();
    let d = detail(&out.result);
    assert_eq!(d.surtax_threshold, dec!(20_000));
    assert_eq!(d.surtax_base, dec!(12_000));
}

#[test]
fn test_base_below_threshold_pays_no_surtax() {
    let engine = ComparisonEngine::with_defaults().unwrap();
    let out = engine.compute_presumed(&sample_request(dec!(150_000))).unwrap();
    assert_eq!(detail(&out.result).surtax_base, dec!(0));
    assert_eq!(out.result.component(TaxKind::IrpjSurtax), dec!(0));
}

// ===========================================================================
// Eligibility
// ===========================================================================

#[test]
fn test_annual_revenue_above_ceiling_excluded() {
    let engine = ComparisonEngine::with_defaults().unwrap();
    let mut request = sample_request(dec!(300_000));
    request.input.annual_revenue_estimate = Some(dec!(80_000_000));
    let out = engine.compute_presumed(&request).unwrap();
    assert!(matches!(
        out.result.eligibility,
        Eligibility::Excluded(ExclusionReason::PresumedCeilingExceeded { .. })
    ));
    assert_eq!(out.result.total_liability, dec!(0));
}

#[test]
fn test_financial_activity_requires_actual_profit() {
    let engine = ComparisonEngine::with_defaults().unwrap();
    let mut request = sample_request(dec!(300_000));
    request.activity_code = "6422-1/00".into();
    let out = engine.compute_presumed(&request).unwrap();
    assert_eq!(
        out.result.flags,
        vec!["actual_profit_required".to_string()]
    );
}

#[test]
fn test_negative_revenue_rejected() {
    let engine = ComparisonEngine::with_defaults().unwrap();
    let request = sample_request(dec!(-1));
    assert!(matches!(
        engine.compute_presumed(&request),
        Err(TaxRegimeError::InvalidInput { .. })
    ));
}
