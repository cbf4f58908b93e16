use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;
use std::thread;
use tax_regime_core::config::JurisdictionDefaults;
use tax_regime_core::jurisdiction::{
    normalize_record, JurisdictionNormalizer, JurisdictionSources, SourceQuality,
};

// ===========================================================================
// Helpers
// ===========================================================================

fn sample_sources() -> JurisdictionSources {
    JurisdictionSources::from_value(json!({
        "jurisdictions": {
            "xa": {
                "rate": { "internal": "19%" },
                "fcp": { "exists": "sim", "name": "FCP", "rate": 2 },
                "iss": { "capital": 0.03, "aliquota_minima": "2", "aliquota_maxima": "5%" },
                "sublimite": "3.600.000,00",
                "incentivos": [
                    { "programa": "SUDAM", "ativo": false, "percentual": 75 }
                ]
            },
            "XB": {
                "aliquotas": { "2025": { "interna": 20 }, "2024": { "interna": "19,5" } }
            }
        }
    }))
    .unwrap()
}

fn sample_normalizer() -> JurisdictionNormalizer {
    JurisdictionNormalizer::new(sample_sources(), JurisdictionDefaults::default())
}

// ===========================================================================
// Round trip
// ===========================================================================

#[test]
fn test_complete_record_round_trips_exactly() {
    let raw = json!({
        "icms": { "standard": 0.17 },
        "surcharge": { "active": true, "name": "FEM", "rate": 0.01 },
        "iss": { "reference_rate": 0.045, "range": { "min": 0.02, "max": 0.05 } },
        "simples": { "sublimit": 3600000 }
    });
    let profile = normalize_record("MT", 2025, &raw, &JurisdictionDefaults::default());

    assert_eq!(profile.source_quality, SourceQuality::Authoritative);
    assert!(profile.is_authoritative());
    assert_eq!(profile.fallback_fields, Vec::<String>::new());
    assert_eq!(profile.goods_tax_standard_rate, dec!(0.17));
    assert_eq!(profile.surcharge.rate, dec!(0.01));
    assert_eq!(profile.services_tax.reference_rate, dec!(0.045));
    assert_eq!(profile.simplified_sublimit, dec!(3_600_000));
    assert_eq!(profile.goods_tax_rate_with_surcharge(), dec!(0.18));
}

// ===========================================================================
// Heterogeneous shapes
// ===========================================================================

#[test]
fn test_portuguese_and_string_encoded_values() {
    let n = sample_normalizer();
    let profile = n.normalize("XA", 2025);

    assert_eq!(profile.goods_tax_standard_rate, dec!(0.19));
    assert!(profile.surcharge.exists);
    assert_eq!(profile.surcharge.rate, dec!(0.02));
    assert_eq!(profile.services_tax.reference_rate, dec!(0.03));
    assert_eq!(profile.services_tax.min_rate, dec!(0.02));
    assert_eq!(profile.services_tax.max_rate, dec!(0.05));
    assert_eq!(profile.simplified_sublimit, dec!(3_600_000));
    assert_eq!(profile.source_quality, SourceQuality::Authoritative);

    let sudam = &profile.incentives["sudam"];
    assert!(!sudam.active);
    assert_eq!(sudam.reduction, dec!(0.75));
}

#[test]
fn test_year_versioned_rates_resolve_per_year() {
    let n = sample_normalizer();
    assert_eq!(n.normalize("XB", 2025).goods_tax_standard_rate, dec!(0.2));
    assert_eq!(n.normalize("XB", 2024).goods_tax_standard_rate, dec!(0.195));
    assert_eq!(n.normalize("XB", 2023).goods_tax_standard_rate, dec!(0.18));
}

#[test]
fn test_partial_record_lists_every_defaulted_attribute() {
    let n = sample_normalizer();
    let profile = n.normalize("XB", 2025);
    assert_eq!(profile.source_quality, SourceQuality::Fallback);
    for field in [
        "services_tax.reference_rate",
        "services_tax.min_rate",
        "services_tax.max_rate",
        "simplified_sublimit",
    ] {
        assert!(
            profile.fallback_fields.contains(&field.to_string()),
            "{field} missing from {:?}",
            profile.fallback_fields
        );
    }
}

#[test]
fn test_unknown_jurisdiction_gets_full_default_profile() {
    let n = sample_normalizer();
    let profile = n.normalize("QQ", 2025);
    assert_eq!(profile.source_quality, SourceQuality::Fallback);
    assert_eq!(profile.goods_tax_standard_rate, dec!(0.18));
    assert_eq!(profile.services_tax.reference_rate, dec!(0.05));
    assert!(!profile.surcharge.exists);
    assert!(profile.fallback_fields.iter().all(|f| f != "*"));
    assert!(profile
        .fallback_fields
        .contains(&"simplified_sublimit".to_string()));
}

// ===========================================================================
// Activation and bundled data
// ===========================================================================

#[test]
fn test_activating_an_incentive_makes_it_best_active() {
    let n = sample_normalizer();
    let profile = n.normalize("XA", 2025);
    assert!(profile.best_active_incentive().is_none());

    let activated = profile.with_activated_incentives(&["SUDAM".to_string()]);
    let (name, incentive) = activated.best_active_incentive().unwrap();
    assert_eq!(name, "sudam");
    assert_eq!(incentive.reduction, dec!(0.75));
}

#[test]
fn test_bundled_sources_cover_every_state() {
    let sources = JurisdictionSources::bundled().unwrap();
    assert_eq!(sources.len(), 27);
    assert!(sources.get("sp").is_some());
}

// ===========================================================================
// Cache
// ===========================================================================

#[test]
fn test_concurrent_callers_share_one_cached_profile() {
    let n = Arc::new(sample_normalizer());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let n = Arc::clone(&n);
            thread::spawn(move || n.normalize("XA", 2025))
        })
        .collect();
    let profiles: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    for p in &profiles {
        assert_eq!(**p, *profiles[0]);
    }
    assert_eq!(n.cached_profiles(), 1);
}
