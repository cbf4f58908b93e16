use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::scalar;

/// Render a command's output as terminal tables.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(envelope) if envelope.contains_key("result") => {
            let result = &envelope["result"];
            match result {
                Value::Object(map) if map.contains_key("ranked") => print_comparison(map),
                Value::Object(map) if map.contains_key("periods") => print_simulation(map),
                Value::Object(map) if map.contains_key("components") => print_regime(map),
                Value::Object(map) => print_fields(map),
                other => println!("{}", scalar(other)),
            }
            print_envelope_notes(envelope);
        }
        Value::Object(map) => print_fields(map),
        Value::Array(rows) => print_rows(rows),
        other => println!("{}", scalar(other)),
    }
}

fn print_comparison(result: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Rank", "Regime", "Total liability", "Effective rate"]);
    for ranked in field(result, "ranked").as_array().into_iter().flatten() {
        let r = &ranked["result"];
        builder.push_record([
            scalar(&ranked["rank"]),
            scalar(&r["regime"]),
            scalar(&r["total_liability"]),
            percent(&r["effective_rate"]),
        ]);
    }
    println!("{}", Table::from(builder));

    if let Some(excluded) = result.get("excluded").and_then(Value::as_array) {
        if !excluded.is_empty() {
            let mut builder = Builder::default();
            builder.push_record(["Excluded", "Reason"]);
            for e in excluded {
                builder.push_record([scalar(&e["regime"]), scalar(&e["reason"])]);
            }
            println!("\n{}", Table::from(builder));
        }
    }

    println!(
        "\nCheapest: {}  Savings: {} ({})",
        scalar(&field(result, "cheapest")),
        scalar(&field(result, "savings")),
        percent(&field(result, "savings_pct"))
    );
    print_advisories(result.get("advisories"));
}

fn print_regime(result: &Map<String, Value>) {
    println!(
        "{}: total {} at {}",
        scalar(&field(result, "regime")),
        scalar(&field(result, "total_liability")),
        percent(&field(result, "effective_rate"))
    );
    let components = field(result, "components").as_array().map(Vec::as_slice).unwrap_or(&[]);
    if !components.is_empty() {
        let mut builder = Builder::default();
        builder.push_record(["Tax", "Base", "Rate", "Amount"]);
        for c in components {
            builder.push_record([
                scalar(&c["tax"]),
                scalar(&c["base"]),
                percent(&c["rate"]),
                scalar(&c["amount"]),
            ]);
        }
        println!("{}", Table::from(builder));
    }
    if let Some(Value::Object(eligibility)) = result.get("eligibility") {
        println!("Not applicable: {}", scalar(&Value::Object(eligibility.clone())));
    }
    print_advisories(result.get("advisories"));
}

fn print_simulation(result: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Period", "Liability", "Operating loss after", "CSLL base after"]);
    for p in field(result, "periods").as_array().into_iter().flatten() {
        builder.push_record([
            scalar(&p["period"]),
            scalar(&p["result"]["total_liability"]),
            scalar(&p["loss_ledger_after"]["operating_loss"]),
            scalar(&p["loss_ledger_after"]["csll_negative_base"]),
        ]);
    }
    println!("{}", Table::from(builder));
    println!(
        "\nTotal liability: {}  IRPJ losses used: {}  CSLL base used: {}",
        scalar(&field(result, "total_liability")),
        scalar(&field(result, "total_irpj_compensated")),
        scalar(&field(result, "total_csll_compensated"))
    );
}

fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.clone(), scalar(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        for row in rows {
            println!("{}", scalar(row));
        }
        return;
    };
    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for row in rows {
        builder.push_record(
            headers
                .iter()
                .map(|h| row.get(h).map(scalar).unwrap_or_default()),
        );
    }
    println!("{}", Table::from(builder));
}

fn print_advisories(advisories: Option<&Value>) {
    let Some(Value::Array(items)) = advisories else {
        return;
    };
    if items.is_empty() {
        return;
    }
    println!("\nAdvisories:");
    for a in items {
        let citation = a
            .get("citation")
            .and_then(Value::as_str)
            .map(|c| format!(" [{c}]"))
            .unwrap_or_default();
        println!("  {:<8} {}{}", scalar(&a["severity"]), scalar(&a["message"]), citation);
    }
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                println!("  - {}", scalar(w));
            }
        }
    }
    if let Some(Value::String(methodology)) = envelope.get("methodology") {
        println!("\nMethodology: {}", methodology);
    }
}

fn field<'a>(map: &'a Map<String, Value>, key: &str) -> &'a Value {
    map.get(key).unwrap_or(&Value::Null)
}

/// Decimal fractions are serialized as strings; show them as percentages.
fn percent(value: &Value) -> String {
    let text = scalar(value);
    match text.parse::<Decimal>() {
        Ok(rate) => format!("{:.2}%", rate * Decimal::ONE_HUNDRED),
        Err(_) => text,
    }
}
