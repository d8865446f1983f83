use serde_json::{Map, Value};
use std::io;

use super::format_scalar;

/// Write output as CSV to stdout.
///
/// A lease valuation is written as one row per month; any other result as
/// `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => {
            if let Some(Value::Array(flows)) = map.get("cash_flows") {
                write_schedule(&mut wtr, flows);
            } else {
                write_fields(&mut wtr, map);
            }
        }
        _ => {
            let _ = wtr.write_record([&format_scalar(result)]);
        }
    }

    let _ = wtr.flush();
}

fn write_schedule(wtr: &mut csv::Writer<io::StdoutLock<'_>>, flows: &[Value]) {
    let _ = wtr.write_record(["month", "cash_flow"]);
    for (i, flow) in flows.iter().enumerate() {
        let month = (i + 1).to_string();
        let _ = wtr.write_record([month.as_str(), &format_scalar(flow)]);
    }
}

fn write_fields(wtr: &mut csv::Writer<io::StdoutLock<'_>>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let rendered = match val {
            Value::Array(items) => items
                .iter()
                .map(format_scalar)
                .collect::<Vec<_>>()
                .join("; "),
            other => format_scalar(other),
        };
        let _ = wtr.write_record([key.as_str(), &rendered]);
    }
}
