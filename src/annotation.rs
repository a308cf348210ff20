//! `@key value` documentation tags → extra schema keys.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::descriptor::DocTag;
use crate::fragment::{json_num_pref_i64, Extras};

static RAW_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)^\s*@?(\S+)(?:\s+(.*?))?\s*$").unwrap());
static SIGNED_DECIMAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+(?:\.\d+)?$").unwrap());

/// Parse tags into key/value pairs, in order. A repeated key keeps its last
/// value.
pub fn parse_tags(tags: &[DocTag]) -> Extras {
    let mut out = Extras::new();
    for tag in tags {
        if let Some((key, value)) = parse_tag(tag) {
            out.insert(key, value);
        }
    }
    out
}

pub fn parse_tag(tag: &DocTag) -> Option<(String, Value)> {
    match tag {
        DocTag::Parsed { name, text } => {
            let name = name.trim_start_matches('@');
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), coerce(text.as_deref())))
        }
        DocTag::Raw(line) => {
            let caps = RAW_TAG.captures(line)?;
            let name = caps.get(1)?.as_str();
            Some((name.to_string(), coerce(caps.get(2).map(|m| m.as_str()))))
        }
    }
}

/// `"true"`/`"false"` → boolean, a signed decimal → number, anything else
/// stays a string. A bare tag is a flag and reads as `true`.
pub fn coerce(text: Option<&str>) -> Value {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Value::Bool(true);
    };
    match text {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ if SIGNED_DECIMAL.is_match(text) => match text.parse::<f64>() {
            Ok(n) => json_num_pref_i64(n),
            Err(_) => Value::from(text),
        },
        _ => Value::from(text),
    }
}
