use serde_json::Value;

use super::{scalar, unwrap_result};

/// Keys that carry the headline answer of each command, in priority order.
const HEADLINE_KEYS: [&str; 6] = [
    "cheapest",
    "total_liability",
    "goods_tax_standard_rate",
    "category",
    "rank",
    "regime",
];

/// Print only the headline answer.
///
/// A comparison prints the recommended regime and the savings; other
/// results print the first headline key they carry.
pub fn print_minimal(value: &Value) {
    let result = unwrap_result(value);

    if let Value::Object(map) = result {
        if let (Some(cheapest), Some(savings)) = (map.get("cheapest"), map.get("savings")) {
            println!("{} (saves {})", scalar(cheapest), scalar(savings));
            return;
        }
        for key in HEADLINE_KEYS {
            if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
                println!("{}", scalar(val));
                return;
            }
        }
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, scalar(val));
            return;
        }
    }

    if let Value::Array(rows) = result {
        for row in rows {
            let regime = row.get("regime").map(scalar).unwrap_or_default();
            let total = row.get("total_liability").map(scalar).unwrap_or_default();
            println!("{regime}: {total}");
        }
        return;
    }

    println!("{}", scalar(result));
}
