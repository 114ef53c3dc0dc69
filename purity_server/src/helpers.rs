use serde_json::Value;

/// Reads a form value that the browser may have sent either as a string or as a number, e.g. a phone number or a
/// pincode. Anything else reads as blank.
pub fn value_as_text(value: &Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Reads a whole number that may have been sent as a number or as a numeric string. Fractions are rounded. Returns
/// `None` for anything that is not a number.
pub fn value_as_integer(value: &Option<Value>) -> Option<i64> {
    match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.round() as i64))
        },
        _ => None,
    }
}

/// Only accepts JSON integers. `"100"` and `100.5` are both rejected.
pub fn value_as_strict_integer(value: &Option<Value>) -> Option<i64> {
    value.as_ref().and_then(Value::as_i64)
}
