//! Python Source Helpers
//!
//! Small formatting helpers used to render workflows as Python source.
//! Output is deterministic: maps are rendered in key order.

use std::collections::BTreeMap;

use serde_json::Value;

/// Quotes a string as a double-quoted Python literal.
pub fn string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Renders a JSON value as the equivalent Python literal.
pub fn literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => string_literal(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(literal).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", string_literal(k), literal(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

/// Renders keyword arguments from a parameter map.
pub fn kwargs(params: &BTreeMap<String, Value>) -> Vec<String> {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, literal(v)))
        .collect()
}

/// Turns an arbitrary id into a Python variable name.
pub fn identifier(id: &str) -> String {
    let mut name: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if name.chars().next().map_or(true, |c| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name.push_str("_task");
    name
}

/// Indents every non-empty line by `level` blocks of four spaces.
pub fn indent(text: &str, level: usize) -> String {
    let pad = "    ".repeat(level);
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", pad, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_literal_escapes() {
        assert_eq!(string_literal(r#"echo "hi""#), r#""echo \"hi\"""#);
        assert_eq!(string_literal("a\nb"), r#""a\nb""#);
    }

    #[test]
    fn test_literal() {
        assert_eq!(literal(&json!(null)), "None");
        assert_eq!(literal(&json!(true)), "True");
        assert_eq!(literal(&json!(3)), "3");
        assert_eq!(literal(&json!(["a", 1])), r#"["a", 1]"#);
        assert_eq!(literal(&json!({"b": false})), r#"{"b": False}"#);
    }

    #[test]
    fn test_identifier() {
        assert_eq!(identifier("Extract-Data"), "extract_data_task");
        assert_eq!(identifier("1st"), "_1st_task");
        assert_eq!(identifier(""), "__task");
    }

    #[test]
    fn test_indent_skips_blank_lines() {
        assert_eq!(indent("a\n\nb", 1), "    a\n\n    b");
    }
}
