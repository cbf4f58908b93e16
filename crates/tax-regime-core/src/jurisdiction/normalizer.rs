//! Reconciles heterogeneous state records into [`JurisdictionProfile`]s.

use dashmap::DashMap;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::paths::{self, FieldSpec};
use super::profile::*;
use super::sources::{normalize_code, JurisdictionSources};
use crate::config::{FederalOverrides, JurisdictionDefaults};
use crate::types::*;

/// Builds profiles from raw sources and caches them per (code, tax year).
///
/// The cache is insert-once: a profile is never mutated after it is stored,
/// so concurrent readers see either nothing or the final value.
#[derive(Debug)]
pub struct JurisdictionNormalizer {
    sources: JurisdictionSources,
    defaults: JurisdictionDefaults,
    cache: DashMap<(String, i32), Arc<JurisdictionProfile>>,
}

impl JurisdictionNormalizer {
    pub fn new(sources: JurisdictionSources, defaults: JurisdictionDefaults) -> Self {
        JurisdictionNormalizer {
            sources,
            defaults,
            cache: DashMap::new(),
        }
    }

    /// Canonical profile for `code` in `tax_year`. Never fails: unknown codes
    /// yield a fully-defaulted profile flagged as fallback.
    pub fn normalize(&self, code: &str, tax_year: i32) -> Arc<JurisdictionProfile> {
        let key = (normalize_code(code), tax_year);
        if let Some(hit) = self.cache.get(&key) {
            return Arc::clone(hit.value());
        }
        let entry = self
            .cache
            .entry(key)
            .or_insert_with(|| Arc::new(self.build(code, tax_year)));
        Arc::clone(entry.value())
    }

    fn build(&self, code: &str, tax_year: i32) -> JurisdictionProfile {
        let code = normalize_code(code);
        match self.sources.get(&code) {
            Some(raw) => normalize_record(&code, tax_year, raw, &self.defaults),
            None => {
                warn!(jurisdiction = %code, tax_year, "unknown jurisdiction, using national defaults");
                JurisdictionProfile::fallback(&code, tax_year, &self.defaults)
            }
        }
    }

    pub fn sources(&self) -> &JurisdictionSources {
        &self.sources
    }

    pub fn cached_profiles(&self) -> usize {
        self.cache.len()
    }
}

/// Tracks which attributes fell back to defaults while building one profile.
struct Extraction<'a> {
    raw: &'a Value,
    year: i32,
    code: &'a str,
    fallback_fields: Vec<String>,
}

impl<'a> Extraction<'a> {
    fn rate_or(&mut self, spec: &FieldSpec, default: Decimal) -> Decimal {
        match paths::first_rate(self.raw, spec, self.year) {
            Some((value, path)) => {
                debug!(jurisdiction = self.code, attribute = spec.attribute, path, %value, "resolved");
                value
            }
            None => self.fell_back(spec, default),
        }
    }

    fn money_or(&mut self, spec: &FieldSpec, default: Decimal) -> Decimal {
        match paths::first_match(self.raw, spec, self.year, paths::as_money) {
            Some((value, _)) => value,
            None => self.fell_back(spec, default),
        }
    }

    fn fell_back(&mut self, spec: &FieldSpec, default: Decimal) -> Decimal {
        warn!(
            jurisdiction = self.code,
            attribute = spec.attribute,
            %default,
            "attribute missing from source, using fallback"
        );
        self.fallback_fields.push(spec.attribute.to_string());
        default
    }
}

/// Build a profile from one raw record. Pure; used by the cached normalizer.
pub fn normalize_record(
    code: &str,
    tax_year: i32,
    raw: &Value,
    defaults: &JurisdictionDefaults,
) -> JurisdictionProfile {
    let mut ex = Extraction {
        raw,
        year: tax_year,
        code,
        fallback_fields: Vec::new(),
    };

    let goods_tax_standard_rate = ex.rate_or(&paths::GOODS_STANDARD_RATE, defaults.goods_tax_rate);

    let services_tax = ServicesTaxRange {
        min_rate: ex.rate_or(&paths::SERVICES_MIN_RATE, defaults.services_min_rate),
        max_rate: ex.rate_or(&paths::SERVICES_MAX_RATE, defaults.services_max_rate),
        reference_rate: ex.rate_or(
            &paths::SERVICES_REFERENCE_RATE,
            defaults.services_reference_rate,
        ),
    };
    if services_tax.reference_rate < services_tax.min_rate
        || services_tax.reference_rate > services_tax.max_rate
    {
        warn!(
            jurisdiction = code,
            reference = %services_tax.reference_rate,
            "ISS reference rate outside the published range"
        );
    }

    let simplified_sublimit = ex.money_or(&paths::SIMPLIFIED_SUBLIMIT, defaults.simplified_sublimit);

    let surcharge = extract_surcharge(&mut ex);
    let incentives = extract_incentives(raw, tax_year, code);
    let federal_overrides = extract_overrides(raw, tax_year);

    let source_quality = if ex.fallback_fields.is_empty() {
        SourceQuality::Authoritative
    } else {
        SourceQuality::Fallback
    };

    JurisdictionProfile {
        code: code.to_string(),
        tax_year,
        goods_tax_standard_rate,
        surcharge,
        services_tax,
        simplified_sublimit,
        incentives,
        federal_overrides,
        source_quality,
        fallback_fields: ex.fallback_fields,
    }
}

fn extract_surcharge(ex: &mut Extraction<'_>) -> RegionalSurcharge {
    let flag = paths::first_match(ex.raw, &paths::SURCHARGE_EXISTS, ex.year, paths::as_flag)
        .map(|(v, _)| v);
    let rate = paths::first_rate(ex.raw, &paths::SURCHARGE_RATE, ex.year).map(|(v, _)| v);
    let name = paths::first_match(ex.raw, &paths::SURCHARGE_NAME, ex.year, paths::as_text)
        .map(|(v, _)| v);

    match (flag, rate) {
        (Some(true), Some(rate)) => RegionalSurcharge {
            exists: true,
            name,
            rate,
        },
        (Some(true), None) => RegionalSurcharge {
            exists: true,
            name,
            rate: ex.fell_back(&paths::SURCHARGE_RATE, Decimal::ZERO),
        },
        (Some(false), rate) => RegionalSurcharge {
            exists: false,
            name,
            rate: rate.unwrap_or(Decimal::ZERO),
        },
        // No explicit flag: a positive published rate implies the surcharge exists.
        (None, Some(rate)) => RegionalSurcharge {
            exists: rate > Decimal::ZERO,
            name,
            rate,
        },
        (None, None) => RegionalSurcharge::default(),
    }
}

fn extract_incentives(raw: &Value, year: i32, code: &str) -> BTreeMap<String, RegionalIncentive> {
    let mut incentives = BTreeMap::new();
    let container = match paths::first_match(raw, &paths::INCENTIVE_CONTAINER, year, |v| {
        (v.is_object() || v.is_array()).then(|| v.clone())
    }) {
        Some((c, _)) => c,
        None => return incentives,
    };

    let entries: Vec<(Option<String>, &Value)> = match &container {
        Value::Object(map) => map.iter().map(|(k, v)| (Some(k.clone()), v)).collect(),
        Value::Array(items) => items.iter().map(|v| (None, v)).collect(),
        _ => Vec::new(),
    };

    for (key, entry) in entries {
        let name = key.or_else(|| paths::first_key(entry, paths::INCENTIVE_NAME_KEYS, paths::as_text));
        let Some(name) = name else {
            warn!(jurisdiction = code, "incentive entry without a name, skipped");
            continue;
        };
        let Some(reduction) = paths::first_key_rate(entry, paths::INCENTIVE_REDUCTION_KEYS) else {
            warn!(jurisdiction = code, incentive = %name, "incentive without a reduction, skipped");
            continue;
        };
        let active = paths::first_key(entry, paths::INCENTIVE_ACTIVE_KEYS, paths::as_flag)
            .unwrap_or(false);
        let condition = paths::first_key(entry, paths::INCENTIVE_CONDITION_KEYS, paths::as_text);

        incentives.insert(
            name.trim().to_lowercase(),
            RegionalIncentive {
                active,
                reduction,
                condition,
            },
        );
    }
    incentives
}

fn extract_overrides(raw: &Value, year: i32) -> FederalOverrides {
    let Some((container, _)) =
        paths::first_match(raw, &paths::FEDERAL_CONTAINER, year, |v| {
            v.is_object().then(|| v.clone())
        })
    else {
        return FederalOverrides::default();
    };
    FederalOverrides {
        irpj_rate: paths::first_key_rate(&container, paths::OVERRIDE_IRPJ_KEYS),
        irpj_surtax_rate: paths::first_key_rate(&container, paths::OVERRIDE_SURTAX_KEYS),
        csll_rate: paths::first_key_rate(&container, paths::OVERRIDE_CSLL_KEYS),
        pis_cumulative_rate: paths::first_key_rate(&container, paths::OVERRIDE_PIS_KEYS),
        cofins_cumulative_rate: paths::first_key_rate(&container, paths::OVERRIDE_COFINS_KEYS),
    }
}

/// Rate formatted for log/advisory text.
pub fn describe(profile: &JurisdictionProfile) -> String {
    format!(
        "{} ({}): ICMS {}, ISS {}, sublimit {}",
        profile.code,
        profile.tax_year,
        pct(profile.goods_tax_standard_rate),
        pct(profile.services_tax.reference_rate),
        brl(profile.simplified_sublimit)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn normalizer() -> JurisdictionNormalizer {
        JurisdictionNormalizer::new(
            JurisdictionSources::bundled().unwrap(),
            JurisdictionDefaults::default(),
        )
    }

    // --- Round trip ---

    #[test]
    fn test_complete_record_is_authoritative_and_exact() {
        let raw = json!({
            "icms": { "standard": 0.205 },
            "surcharge": { "active": true, "name": "FECEP", "rate": 0.02 },
            "iss": { "reference_rate": 0.04, "range": { "min": 0.02, "max": 0.05 } },
            "simples": { "sublimit": 3600000 },
            "incentives": {
                "SUDENE": { "active": true, "reduction": 0.75, "condition": "Projeto aprovado" }
            },
            "federal_overrides": { "csll_rate": 0.15 }
        });
        let p = normalize_record("PE", 2025, &raw, &JurisdictionDefaults::default());
        assert_eq!(p.source_quality, SourceQuality::Authoritative);
        assert!(p.fallback_fields.is_empty());
        assert_eq!(p.goods_tax_standard_rate, dec!(0.205));
        assert!(p.surcharge.exists);
        assert_eq!(p.surcharge.name.as_deref(), Some("FECEP"));
        assert_eq!(p.surcharge.rate, dec!(0.02));
        assert_eq!(p.services_tax.reference_rate, dec!(0.04));
        assert_eq!(p.services_tax.min_rate, dec!(0.02));
        assert_eq!(p.services_tax.max_rate, dec!(0.05));
        assert_eq!(p.simplified_sublimit, dec!(3600000));
        assert_eq!(p.incentives["sudene"].reduction, dec!(0.75));
        assert!(p.incentives["sudene"].active);
        assert_eq!(p.federal_overrides.csll_rate, Some(dec!(0.15)));
    }

    // --- Fallback ---

    #[test]
    fn test_missing_fields_fall_back_and_are_listed() {
        let raw = json!({ "iss": { "capital": 5 } });
        let p = normalize_record("RO", 2025, &raw, &JurisdictionDefaults::default());
        assert_eq!(p.source_quality, SourceQuality::Fallback);
        assert_eq!(p.goods_tax_standard_rate, dec!(0.18));
        assert_eq!(p.services_tax.reference_rate, dec!(0.05));
        assert!(p
            .fallback_fields
            .contains(&"goods_tax_standard_rate".to_string()));
        assert!(p.fallback_fields.contains(&"simplified_sublimit".to_string()));
        assert!(!p
            .fallback_fields
            .contains(&"services_tax.reference_rate".to_string()));
    }

    #[test]
    fn test_unknown_code_yields_defaulted_profile() {
        let n = normalizer();
        let p = n.normalize("ZZ", 2025);
        assert_eq!(p.source_quality, SourceQuality::Fallback);
        assert_eq!(p.code, "ZZ");
        assert_eq!(p.goods_tax_standard_rate, dec!(0.18));
    }

    #[test]
    fn test_year_versioned_source() {
        let n = normalizer();
        let current = n.normalize("BA", 2025);
        assert_eq!(current.goods_tax_standard_rate, dec!(0.205));
        let older = n.normalize("BA", 2023);
        assert_eq!(older.goods_tax_standard_rate, dec!(0.18));
        assert_eq!(older.source_quality, SourceQuality::Fallback);
    }

    // --- Heterogeneous shapes ---

    #[test]
    fn test_all_bundled_states_resolve_goods_and_services_rates() {
        let n = normalizer();
        let codes: Vec<String> = n.sources().codes().map(str::to_string).collect();
        assert_eq!(codes.len(), 27);
        for code in codes {
            let p = n.normalize(&code, 2025);
            assert!(p.goods_tax_standard_rate > dec!(0.1), "{}", code);
            assert!(p.goods_tax_standard_rate < dec!(0.3), "{}", code);
            assert!(p.services_tax.reference_rate > dec!(0), "{}", code);
            assert!(p.services_tax.min_rate <= p.services_tax.max_rate, "{}", code);
            assert!(p.surcharge.rate < dec!(0.05), "{}: {}", code, p.surcharge.rate);
            for (name, incentive) in &p.incentives {
                assert!(incentive.reduction <= dec!(1), "{} {}", code, name);
            }
        }
    }

    #[test]
    fn test_poverty_fund_published_as_one_percent() {
        let n = normalizer();
        let se = n.normalize("SE", 2025);
        assert!(se.surcharge.exists);
        assert_eq!(se.surcharge.rate, dec!(0.01));
        assert_eq!(se.goods_tax_rate_with_surcharge(), se.goods_tax_standard_rate + dec!(0.01));
    }

    #[test]
    fn test_incentive_reduction_of_one_is_one_percent() {
        let raw = json!({ "incentives": { "local": { "active": true, "reduction": 1 } } });
        let p = normalize_record("XX", 2025, &raw, &JurisdictionDefaults::default());
        assert_eq!(p.incentives["local"].reduction, dec!(0.01));
    }

    #[test]
    fn test_portuguese_keyed_record() {
        let n = normalizer();
        let p = n.normalize("PI", 2025);
        assert_eq!(p.goods_tax_standard_rate, dec!(0.225));
        assert!(p.surcharge.exists);
        assert_eq!(p.surcharge.rate, dec!(0.01));
        assert_eq!(p.simplified_sublimit, dec!(3600000));
        assert_eq!(p.incentives["sudene"].reduction, dec!(0.75));
        assert!(!p.incentives["sudene"].active);
    }

    #[test]
    fn test_array_incentives_with_name_key() {
        let n = normalizer();
        let p = n.normalize("BA", 2025);
        let sudene = &p.incentives["sudene"];
        assert_eq!(sudene.reduction, dec!(0.75));
        assert_eq!(sudene.condition.as_deref(), Some("Laudo constitutivo SUDENE"));
    }

    #[test]
    fn test_surcharge_inferred_from_rate() {
        let raw = json!({ "icms": { "standard": 18, "fcp": 1 } });
        let p = normalize_record("AL", 2025, &raw, &JurisdictionDefaults::default());
        assert!(p.surcharge.exists);
        assert_eq!(p.surcharge.rate, dec!(0.01));
    }

    #[test]
    fn test_surcharge_explicitly_disabled() {
        let n = normalizer();
        let sp = n.normalize("SP", 2025);
        assert!(!sp.surcharge.exists);
        assert_eq!(sp.goods_tax_rate_with_surcharge(), dec!(0.18));
        assert_eq!(sp.source_quality, SourceQuality::Authoritative);
    }

    // --- Cache ---

    #[test]
    fn test_repeat_calls_hit_cache() {
        let n = normalizer();
        let a = n.normalize("sp", 2025);
        let b = n.normalize("SP", 2025);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(n.cached_profiles(), 1);
        let _ = n.normalize("SP", 2024);
        assert_eq!(n.cached_profiles(), 2);
    }

    #[test]
    fn test_concurrent_lookups_share_one_entry() {
        let n = Arc::new(normalizer());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let n = Arc::clone(&n);
                std::thread::spawn(move || n.normalize("RJ", 2025))
            })
            .collect();
        let profiles: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for p in &profiles[1..] {
            assert!(Arc::ptr_eq(&profiles[0], p));
        }
        assert_eq!(n.cached_profiles(), 1);
    }
}
