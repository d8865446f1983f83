use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::format_scalar;

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => print_result(result, map),
            _ => print_fields(map),
        },
        _ => println!("{}", value),
    }
}

fn print_result(result: &Map<String, Value>, envelope: &Map<String, Value>) {
    let mut scalars = Map::new();
    for (key, val) in result {
        if !matches!(val, Value::Array(_)) {
            scalars.insert(key.clone(), val.clone());
        }
    }
    print_fields(&scalars);

    if let Some(Value::Array(flows)) = result.get("cash_flows") {
        let mut builder = Builder::default();
        builder.push_record(["Month", "Cash flow"]);
        for (i, flow) in flows.iter().enumerate() {
            builder.push_record([(i + 1).to_string(), format_scalar(flow)]);
        }
        println!("\n{}", Table::from(builder));
    }

    if let Some(Value::Array(lines)) = result.get("commentary") {
        println!();
        for line in lines.iter().filter_map(Value::as_str) {
            println!("{}", line);
        }
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.clone(), format_scalar(val)]);
    }
    println!("{}", Table::from(builder));
}
