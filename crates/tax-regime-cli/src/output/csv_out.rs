use serde_json::{Map, Value};
use std::io;

use super::{scalar, unwrap_result};

/// Write output as CSV to stdout.
///
/// Arrays of records (e.g. `compare --flat`) become one row per record with
/// nested objects flattened into `parent.child` columns; a single result
/// becomes `field,value` rows.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = unwrap_result(value);
    let outcome = match result {
        Value::Array(rows) => write_rows(&mut wtr, rows),
        Value::Object(map) => write_fields(&mut wtr, map),
        other => wtr.write_record([scalar(other)]).map_err(Into::into),
    };
    if let Err(e) = outcome.and_then(|_| wtr.flush().map_err(Into::into)) {
        eprintln!("CSV write error: {e}");
    }
}

type CsvResult = Result<(), Box<dyn std::error::Error>>;

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) -> CsvResult {
    let flattened: Vec<Vec<(String, String)>> = rows.iter().map(flatten).collect();

    // Union of columns in first-seen order; component columns vary by regime
    let mut headers: Vec<String> = Vec::new();
    for row in &flattened {
        for (key, _) in row {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }
    wtr.write_record(&headers)?;
    for row in &flattened {
        let record: Vec<&str> = headers
            .iter()
            .map(|h| {
                row.iter()
                    .find(|(k, _)| k == h)
                    .map(|(_, v)| v.as_str())
                    .unwrap_or("")
            })
            .collect();
        wtr.write_record(&record)?;
    }
    Ok(())
}

fn write_fields<W: io::Write>(wtr: &mut csv::Writer<W>, map: &Map<String, Value>) -> CsvResult {
    wtr.write_record(["field", "value"])?;
    for (key, val) in map {
        wtr.write_record([key.as_str(), &scalar(val)])?;
    }
    Ok(())
}

/// One level of object nesting becomes dotted columns, placed after the
/// plain columns.
fn flatten(row: &Value) -> Vec<(String, String)> {
    let Value::Object(map) = row else {
        return vec![("value".to_string(), scalar(row))];
    };
    let mut cells = Vec::new();
    let mut nested = Vec::new();
    for (key, val) in map {
        match val {
            Value::Object(inner) => {
                for (sub, v) in inner {
                    nested.push((format!("{key}.{sub}"), scalar(v)));
                }
            }
            other => cells.push((key.clone(), scalar(other))),
        }
    }
    cells.extend(nested);
    cells
}
