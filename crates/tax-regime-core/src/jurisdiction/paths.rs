//! Candidate extraction paths and value coercion for raw jurisdiction records.
//!
//! Each logical attribute lists the dotted paths under which the 27 state
//! datasets have been seen to publish it. Paths are tried in order and the
//! first present, well-typed value wins. A `{year}` segment is replaced with
//! the tax year being normalized, which covers sources versioned by year.
//! Every path also declares whether its bare numbers are fractions or
//! percentages, since states publish `1` to mean 1%.

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// How a bare number published under a path is read as a rate.
///
/// A trailing `%` always marks a percentage, whatever the unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateUnit {
    /// `0.18` means 18%.
    Fraction,
    /// `18`, `1` and `0,5` are all percentages.
    Percent,
    /// Values of 1 or more are percentages, smaller ones fractions.
    Auto,
}

/// One candidate location for an attribute and the unit it is published in.
#[derive(Debug, Clone, Copy)]
pub struct FieldPath {
    pub path: &'static str,
    pub unit: RateUnit,
}

const fn fraction(path: &'static str) -> FieldPath {
    FieldPath {
        path,
        unit: RateUnit::Fraction,
    }
}

const fn percent(path: &'static str) -> FieldPath {
    FieldPath {
        path,
        unit: RateUnit::Percent,
    }
}

const fn auto(path: &'static str) -> FieldPath {
    FieldPath {
        path,
        unit: RateUnit::Auto,
    }
}

/// A logical attribute and its candidate paths, in priority order.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub attribute: &'static str,
    pub paths: &'static [FieldPath],
}

pub const GOODS_STANDARD_RATE: FieldSpec = FieldSpec {
    attribute: "goods_tax_standard_rate",
    paths: &[
        auto("icms.standard"),
        auto("rate.standard"),
        percent("rate.internal"),
        percent("rates.internal.general.rate"),
        percent("rates.{year}.internal"),
        percent("aliquotas.{year}.interna"),
        percent("icms.aliquota_padrao"),
        percent("icms_rate"),
        percent("aliquota_interna"),
    ],
};

pub const SURCHARGE_EXISTS: FieldSpec = FieldSpec {
    attribute: "surcharge.exists",
    paths: &[
        auto("surcharge.active"),
        auto("surcharge.exists"),
        auto("fcp.exists"),
        auto("fcp.active"),
        auto("fecp.ativo"),
        auto("fundo_pobreza.ativo"),
    ],
};

pub const SURCHARGE_NAME: FieldSpec = FieldSpec {
    attribute: "surcharge.name",
    paths: &[
        auto("surcharge.name"),
        auto("fcp.name"),
        auto("fecp.nome"),
        auto("fundo_pobreza.nome"),
    ],
};

pub const SURCHARGE_RATE: FieldSpec = FieldSpec {
    attribute: "surcharge.rate",
    paths: &[
        fraction("surcharge.rate"),
        percent("fcp.rate"),
        percent("fecp.aliquota"),
        percent("fundo_pobreza.aliquota"),
        auto("icms.fcp"),
    ],
};

pub const SERVICES_REFERENCE_RATE: FieldSpec = FieldSpec {
    attribute: "services_tax.reference_rate",
    paths: &[
        fraction("iss.reference_rate"),
        auto("iss.capital"),
        auto("iss.{year}.capital"),
        percent("iss.aliquota_capital"),
        percent("services.capital_rate"),
    ],
};

pub const SERVICES_MIN_RATE: FieldSpec = FieldSpec {
    attribute: "services_tax.min_rate",
    paths: &[
        auto("iss.min"),
        fraction("iss.range.min"),
        percent("iss.aliquota_minima"),
        percent("services.iss_min"),
    ],
};

pub const SERVICES_MAX_RATE: FieldSpec = FieldSpec {
    attribute: "services_tax.max_rate",
    paths: &[
        auto("iss.max"),
        fraction("iss.range.max"),
        percent("iss.aliquota_maxima"),
        percent("services.iss_max"),
    ],
};

pub const SIMPLIFIED_SUBLIMIT: FieldSpec = FieldSpec {
    attribute: "simplified_sublimit",
    paths: &[
        auto("simples.sublimit"),
        auto("simples.{year}.sublimit"),
        auto("simples_nacional.sublimite"),
        auto("sublimite"),
    ],
};

pub const INCENTIVE_CONTAINER: FieldSpec = FieldSpec {
    attribute: "incentives",
    paths: &[
        auto("incentives"),
        auto("incentivos"),
        auto("regional_incentives"),
        auto("beneficios.regionais"),
    ],
};

pub const FEDERAL_CONTAINER: FieldSpec = FieldSpec {
    attribute: "federal_overrides",
    paths: &[
        auto("federal_overrides"),
        auto("federal"),
        auto("tributos_federais"),
    ],
};

/// Attributes substituted wholesale when a jurisdiction has no source record.
pub const DEFAULTED_ATTRIBUTES: &[FieldSpec] = &[
    GOODS_STANDARD_RATE,
    SERVICES_MIN_RATE,
    SERVICES_MAX_RATE,
    SERVICES_REFERENCE_RATE,
    SIMPLIFIED_SUBLIMIT,
];

// Keys inside a single incentive entry.
pub const INCENTIVE_NAME_KEYS: &[&str] = &["name", "nome", "programa"];
pub const INCENTIVE_ACTIVE_KEYS: &[&str] = &["active", "ativo", "enabled"];
pub const INCENTIVE_REDUCTION_KEYS: &[FieldPath] = &[
    auto("reduction"),
    percent("reducao"),
    percent("percentual"),
    percent("irpj_reduction"),
];
pub const INCENTIVE_CONDITION_KEYS: &[&str] = &["condition", "condicao", "requisito"];

// Keys inside the federal overrides object.
pub const OVERRIDE_IRPJ_KEYS: &[FieldPath] = &[fraction("irpj_rate"), auto("irpj")];
pub const OVERRIDE_SURTAX_KEYS: &[FieldPath] =
    &[fraction("irpj_surtax_rate"), auto("adicional_irpj")];
pub const OVERRIDE_CSLL_KEYS: &[FieldPath] = &[fraction("csll_rate"), auto("csll")];
pub const OVERRIDE_PIS_KEYS: &[FieldPath] = &[fraction("pis_cumulative_rate"), auto("pis")];
pub const OVERRIDE_COFINS_KEYS: &[FieldPath] =
    &[fraction("cofins_cumulative_rate"), auto("cofins")];

// ---------------------------------------------------------------------------
// Path resolution
// ---------------------------------------------------------------------------

/// Walk a dotted path through nested objects.
pub fn lookup<'a>(raw: &'a Value, path: &str, year: i32) -> Option<&'a Value> {
    let year_key = year.to_string();
    path.split('.').try_fold(raw, |node, segment| {
        let key = if segment == "{year}" {
            year_key.as_str()
        } else {
            segment
        };
        node.as_object()?.get(key)
    })
}

/// First candidate path whose value converts successfully.
///
/// Returns the converted value and the path it came from.
pub fn first_match<T>(
    raw: &Value,
    spec: &FieldSpec,
    year: i32,
    convert: impl Fn(&Value) -> Option<T>,
) -> Option<(T, &'static str)> {
    spec.paths.iter().find_map(|candidate| {
        lookup(raw, candidate.path, year)
            .and_then(&convert)
            .map(|value| (value, candidate.path))
    })
}

/// First candidate path holding a valid rate, read in that path's unit.
pub fn first_rate(raw: &Value, spec: &FieldSpec, year: i32) -> Option<(Decimal, &'static str)> {
    spec.paths.iter().find_map(|candidate| {
        lookup(raw, candidate.path, year)
            .and_then(|v| as_rate_in(v, candidate.unit))
            .map(|rate| (rate, candidate.path))
    })
}

/// First key in `keys` that holds a convertible value on a flat object.
pub fn first_key<T>(
    obj: &Value,
    keys: &[&str],
    convert: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    let map = obj.as_object()?;
    keys.iter().find_map(|k| map.get(*k).and_then(&convert))
}

/// First key holding a valid rate on a flat object, read in that key's unit.
pub fn first_key_rate(obj: &Value, keys: &[FieldPath]) -> Option<Decimal> {
    let map = obj.as_object()?;
    keys.iter()
        .find_map(|k| map.get(k.path).and_then(|v| as_rate_in(v, k.unit)))
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

fn parse_decimal_text(text: &str, money: bool) -> Option<(Decimal, bool)> {
    let mut s = text.trim().trim_start_matches("R$").trim().to_string();
    let had_percent = s.ends_with('%');
    if had_percent {
        s.pop();
        s = s.trim().to_string();
    }
    // Brazilian formatting: '.' groups thousands, ',' marks decimals.
    if s.contains(',') {
        s = s.replace('.', "").replace(',', ".");
    } else if s.matches('.').count() > 1 || (money && single_thousands_group(&s)) {
        s = s.replace('.', "");
    }
    Decimal::from_str(&s).ok().map(|d| (d, had_percent))
}

/// `360.000`: one dot followed by exactly three digits.
fn single_thousands_group(s: &str) -> bool {
    match s.split_once('.') {
        Some((int, frac)) => {
            !int.is_empty() && frac.len() == 3 && frac.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

fn decimal_of(value: &Value, money: bool) -> Option<(Decimal, bool)> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok()
            .map(|d| (d, false)),
        Value::String(s) => parse_decimal_text(s, money),
        _ => None,
    }
}

/// A rate as a fraction, reading bare numbers in the given unit.
pub fn as_rate_in(value: &Value, unit: RateUnit) -> Option<Decimal> {
    let (d, had_percent) = decimal_of(value, false)?;
    if d < Decimal::ZERO {
        return None;
    }
    let is_percent = had_percent
        || match unit {
            RateUnit::Fraction => false,
            RateUnit::Percent => true,
            RateUnit::Auto => d >= Decimal::ONE,
        };
    let rate = if is_percent {
        d / Decimal::ONE_HUNDRED
    } else {
        d
    };
    if rate > Decimal::ONE {
        return None;
    }
    Some(rate.normalize())
}

/// A rate whose unit is not declared. Values of 1 or more are percentages.
pub fn as_rate(value: &Value) -> Option<Decimal> {
    as_rate_in(value, RateUnit::Auto)
}

/// A non-negative monetary amount.
pub fn as_money(value: &Value) -> Option<Decimal> {
    let (d, had_percent) = decimal_of(value, true)?;
    if had_percent || d < Decimal::ZERO {
        return None;
    }
    Some(d)
}

pub fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "sim" | "s" | "yes" | "y" | "ativo" | "1" => Some(true),
            "false" | "nao" | "não" | "n" | "no" | "inativo" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub fn as_text(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_lookup_nested_path() {
        let raw = json!({ "rates": { "internal": { "general": { "rate": 19 } } } });
        let v = lookup(&raw, "rates.internal.general.rate", 2025).unwrap();
        assert_eq!(v, &json!(19));
    }

    #[test]
    fn test_lookup_year_placeholder() {
        let raw = json!({ "rates": { "2024": { "internal": 20 }, "2025": { "internal": 20.5 } } });
        assert_eq!(lookup(&raw, "rates.{year}.internal", 2024), Some(&json!(20)));
        assert_eq!(
            lookup(&raw, "rates.{year}.internal", 2025),
            Some(&json!(20.5))
        );
        assert!(lookup(&raw, "rates.{year}.internal", 2023).is_none());
    }

    #[test]
    fn test_first_match_skips_ill_typed_values() {
        let raw = json!({ "icms": { "standard": "n/a" }, "rate": { "internal": 17 } });
        let (rate, path) = first_rate(&raw, &GOODS_STANDARD_RATE, 2025).unwrap();
        assert_eq!(rate, dec!(0.17));
        assert_eq!(path, "rate.internal");
    }

    #[test]
    fn test_rate_coercions() {
        assert_eq!(as_rate(&json!(0.18)), Some(dec!(0.18)));
        assert_eq!(as_rate(&json!(18)), Some(dec!(0.18)));
        assert_eq!(as_rate(&json!("18%")), Some(dec!(0.18)));
        assert_eq!(as_rate(&json!("22,5%")), Some(dec!(0.225)));
        assert_eq!(as_rate(&json!("2")), Some(dec!(0.02)));
        assert_eq!(as_rate(&json!(-1)), None);
        assert_eq!(as_rate(&json!(true)), None);
        assert_eq!(as_rate(&json!(250)), None);
    }

    #[test]
    fn test_auto_unit_reads_one_as_a_percentage() {
        assert_eq!(as_rate(&json!(1)), Some(dec!(0.01)));
        assert_eq!(as_rate(&json!("1")), Some(dec!(0.01)));
        assert_eq!(as_rate(&json!(0.75)), Some(dec!(0.75)));
    }

    #[test]
    fn test_percent_unit_ignores_magnitude() {
        assert_eq!(as_rate_in(&json!(1), RateUnit::Percent), Some(dec!(0.01)));
        assert_eq!(as_rate_in(&json!("0,5"), RateUnit::Percent), Some(dec!(0.005)));
        assert_eq!(as_rate_in(&json!(75), RateUnit::Percent), Some(dec!(0.75)));
        assert_eq!(as_rate_in(&json!("2%"), RateUnit::Percent), Some(dec!(0.02)));
    }

    #[test]
    fn test_fraction_unit_rejects_whole_percentages() {
        assert_eq!(as_rate_in(&json!(0.02), RateUnit::Fraction), Some(dec!(0.02)));
        assert_eq!(as_rate_in(&json!(1), RateUnit::Fraction), Some(dec!(1)));
        assert_eq!(as_rate_in(&json!(18), RateUnit::Fraction), None);
        assert_eq!(as_rate_in(&json!("5%"), RateUnit::Fraction), Some(dec!(0.05)));
    }

    #[test]
    fn test_surcharge_paths_declare_units() {
        let fund = json!({ "fundo_pobreza": { "aliquota": 1 } });
        assert_eq!(
            first_rate(&fund, &SURCHARGE_RATE, 2025),
            Some((dec!(0.01), "fundo_pobreza.aliquota"))
        );
        let explicit = json!({ "surcharge": { "rate": 0.02 } });
        assert_eq!(
            first_rate(&explicit, &SURCHARGE_RATE, 2025),
            Some((dec!(0.02), "surcharge.rate"))
        );
    }

    #[test]
    fn test_incentive_reduction_keys() {
        let entry = json!({ "reducao": 1 });
        assert_eq!(first_key_rate(&entry, INCENTIVE_REDUCTION_KEYS), Some(dec!(0.01)));
        let entry = json!({ "reduction": 0.75 });
        assert_eq!(first_key_rate(&entry, INCENTIVE_REDUCTION_KEYS), Some(dec!(0.75)));
    }

    #[test]
    fn test_money_coercions() {
        assert_eq!(as_money(&json!(3600000)), Some(dec!(3600000)));
        assert_eq!(as_money(&json!("3.600.000,00")), Some(dec!(3600000.00)));
        assert_eq!(as_money(&json!("3.600.000")), Some(dec!(3600000)));
        assert_eq!(as_money(&json!("R$ 1.800.000,00")), Some(dec!(1800000.00)));
        assert_eq!(as_money(&json!("R$ 360.000")), Some(dec!(360000)));
        assert_eq!(as_money(&json!("3600000.50")), Some(dec!(3600000.50)));
        assert_eq!(as_money(&json!("5%")), None);
    }

    #[test]
    fn test_flag_coercions() {
        assert_eq!(as_flag(&json!(true)), Some(true));
        assert_eq!(as_flag(&json!("sim")), Some(true));
        assert_eq!(as_flag(&json!("nao")), Some(false));
        assert_eq!(as_flag(&json!(0)), Some(false));
        assert_eq!(as_flag(&json!("talvez")), None);
    }
}
