use serde_json::Value;

/// Print just the headline figure of a result.
///
/// Looks for the field that answers the command, in priority order, then
/// falls back to the first field of the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = [
        "investor_roi",
        "realized_roi",
        "success_rate",
        "pending",
        "risk_tier",
        "days_to_maturity",
        "is_terminal",
        "total_invested",
    ];

    match result_obj {
        Value::Object(map) => {
            // Lifecycle replays answer with the final status
            if let Some(status) = map.get("invoice").and_then(|inv| inv.get("status")) {
                println!("{}", format_minimal(status));
                return;
            }
            for key in &priority_keys {
                if let Some(val) = map.get(*key) {
                    if !val.is_null() {
                        println!("{}", format_minimal(val));
                        return;
                    }
                }
            }
            if let Some((key, val)) = map.iter().next() {
                println!("{}: {}", key, format_minimal(val));
            }
        }
        // Marketplace listings: one invoice id per line
        Value::Array(items) => {
            for item in items {
                match item.get("invoice_id") {
                    Some(id) => println!("{}", format_minimal(id)),
                    None => println!("{}", format_minimal(item)),
                }
            }
        }
        other => println!("{}", format_minimal(other)),
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
