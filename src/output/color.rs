use crate::value::Value;

// ANSI color codes
const RESET: &str = "\x1b[0m";
const BOLD_BLUE: &str = "\x1b[1;34m";
const GREEN: &str = "\x1b[0;32m";
const CYAN: &str = "\x1b[0;36m";
const YELLOW: &str = "\x1b[0;33m";
const RED: &str = "\x1b[0;31m";
const BOLD_WHITE: &str = "\x1b[1;37m";

/// Pretty-print a value with two-space indentation and ANSI colors.
pub fn colorize_json(value: &Value) -> String {
    let mut buf = String::new();
    write_value(value, &mut buf, 0);
    buf
}

fn write_value(value: &Value, buf: &mut String, indent: usize) {
    match value {
        Value::Null => paint(buf, RED, "null"),
        Value::Bool(_) => paint(buf, YELLOW, &value.to_string()),
        Value::Number(_) => paint(buf, CYAN, &value.to_string()),
        // Display on a string value is its quoted, escaped JSON form
        Value::String(_) => paint(buf, GREEN, &value.to_string()),
        Value::Array(items) if items.is_empty() => paint(buf, BOLD_WHITE, "[]"),
        Value::Object(map) if map.is_empty() => paint(buf, BOLD_WHITE, "{}"),
        Value::Array(items) => {
            paint(buf, BOLD_WHITE, "[");
            buf.push('\n');
            for (i, item) in items.iter().enumerate() {
                write_indent(buf, indent + 1);
                write_value(item, buf, indent + 1);
                if i + 1 < items.len() {
                    buf.push(',');
                }
                buf.push('\n');
            }
            write_indent(buf, indent);
            paint(buf, BOLD_WHITE, "]");
        }
        Value::Object(map) => {
            paint(buf, BOLD_WHITE, "{");
            buf.push('\n');
            for (i, (key, val)) in map.iter().enumerate() {
                write_indent(buf, indent + 1);
                paint(buf, BOLD_BLUE, &Value::from(key.as_str()).to_string());
                buf.push_str(": ");
                write_value(val, buf, indent + 1);
                if i + 1 < map.len() {
                    buf.push(',');
                }
                buf.push('\n');
            }
            write_indent(buf, indent);
            paint(buf, BOLD_WHITE, "}");
        }
    }
}

fn paint(buf: &mut String, color: &str, text: &str) {
    buf.push_str(color);
    buf.push_str(text);
    buf.push_str(RESET);
}

fn write_indent(buf: &mut String, level: usize) {
    for _ in 0..level {
        buf.push_str("  ");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strip_ansi(s: &str) -> String {
        let mut out = String::new();
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                for c in chars.by_ref() {
                    if c == 'm' {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn colors_match_pretty_layout() {
        let val = Value::from(json!({"name": "a\"b", "n": [1, true, null], "e": {}}));
        let colored = colorize_json(&val);
        assert!(colored.contains(GREEN));
        assert!(colored.contains(BOLD_BLUE));
        assert_eq!(
            strip_ansi(&colored),
            serde_json::to_string_pretty(&val).unwrap()
        );
    }

    #[test]
    fn scalars() {
        assert_eq!(strip_ansi(&colorize_json(&Value::Null)), "null");
        assert_eq!(strip_ansi(&colorize_json(&Value::from(2.5))), "2.5");
    }
}
