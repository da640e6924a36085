//! Bracket predicates: `[?(@.field OP literal)]`.
//!
//! A predicate never fails at evaluation time. Missing fields, type mismatches
//! and non-string regex operands all evaluate to "no match" for the element,
//! so heterogeneous arrays stay queryable.

use regex::Regex;

use crate::error::NqError;
use crate::value::Value;

use super::eval::step_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Match,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Match => "=~",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Predicate {
    /// Member path below `@`; empty means the element itself.
    pub field: Vec<String>,
    pub op: CompareOp,
    pub literal: Value,
    pattern: Option<Regex>,
}

impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field && self.op == other.op && self.literal == other.literal
    }
}

impl Predicate {
    /// Parse the text between `?(` and `)`. `base` is the offset of the first
    /// character of `input` in the full query.
    pub fn parse(input: &str, base: usize) -> Result<Self, NqError> {
        let chars: Vec<char> = input.chars().collect();
        let mut i = skip_whitespace(&chars, 0);

        if chars.get(i) != Some(&'@') {
            return Err(NqError::syntax(base + i, "filter must start with '@'"));
        }
        i += 1;

        let mut field = Vec::new();
        while chars.get(i) == Some(&'.') {
            i += 1;
            let start = i;
            while i < chars.len() && !is_field_terminator(chars[i]) {
                i += 1;
            }
            if i == start {
                return Err(NqError::syntax(base + start, "empty field name in filter"));
            }
            field.push(chars[start..i].iter().collect());
        }

        i = skip_whitespace(&chars, i);
        let (op, width) = read_operator(&chars[i..])
            .ok_or_else(|| NqError::syntax(base + i, "expected comparison operator"))?;
        i = skip_whitespace(&chars, i + width);

        let literal_pos = base + i;
        let text: String = chars[i..].iter().collect();
        let text = text.trim_end();
        if text.is_empty() {
            return Err(NqError::syntax(literal_pos, "missing literal in filter"));
        }

        let (literal, pattern) = if op == CompareOp::Match {
            let source = parse_pattern(text, literal_pos)?;
            let re = Regex::new(&source).map_err(|e| {
                NqError::syntax(literal_pos, format!("invalid regular expression: {e}"))
            })?;
            (Value::from(source), Some(re))
        } else {
            (parse_literal(text, literal_pos)?, None)
        };

        Ok(Predicate {
            field,
            op,
            literal,
            pattern,
        })
    }

    /// Test one array element bound to `@`.
    pub fn matches(&self, element: &Value) -> bool {
        let mut current = element;
        for name in &self.field {
            match step_key(current, name) {
                Some(next) => current = next,
                None => return false,
            }
        }

        match self.op {
            CompareOp::Eq => *current == self.literal,
            CompareOp::Ne => *current != self.literal,
            CompareOp::Gt => self.numeric(current, |a, b| a > b),
            CompareOp::Ge => self.numeric(current, |a, b| a >= b),
            CompareOp::Lt => self.numeric(current, |a, b| a < b),
            CompareOp::Le => self.numeric(current, |a, b| a <= b),
            CompareOp::Match => match (current, &self.pattern) {
                (Value::String(s), Some(re)) => re.is_match(s),
                _ => false,
            },
        }
    }

    fn numeric(&self, left: &Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
        match (left.as_f64(), self.literal.as_f64()) {
            (Some(a), Some(b)) => cmp(a, b),
            _ => false,
        }
    }
}

fn skip_whitespace(chars: &[char], mut i: usize) -> usize {
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    i
}

fn is_field_terminator(c: char) -> bool {
    matches!(c, '.' | '=' | '!' | '<' | '>' | '~') || c.is_whitespace()
}

/// Longest operator first so `>=` is not read as `>`.
fn read_operator(chars: &[char]) -> Option<(CompareOp, usize)> {
    let two: String = chars.iter().take(2).collect();
    let op = match two.as_str() {
        "==" => Some((CompareOp::Eq, 2)),
        "!=" => Some((CompareOp::Ne, 2)),
        ">=" => Some((CompareOp::Ge, 2)),
        "<=" => Some((CompareOp::Le, 2)),
        "=~" => Some((CompareOp::Match, 2)),
        _ => None,
    };
    op.or_else(|| match chars.first() {
        Some('>') => Some((CompareOp::Gt, 1)),
        Some('<') => Some((CompareOp::Lt, 1)),
        _ => None,
    })
}

/// Literals are JSON scalars: `true`, `false`, `null`, numbers and
/// double-quoted strings.
fn parse_literal(text: &str, pos: usize) -> Result<Value, NqError> {
    let parsed: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| NqError::syntax(pos, format!("invalid filter literal {text:?}: {e}")))?;
    match parsed {
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            Err(NqError::syntax(pos, "filter literal must be a scalar"))
        }
        scalar => Ok(Value::from(scalar)),
    }
}

/// Regex source between double quotes. Backslashes belong to the regex, so
/// only `\"` is unescaped.
fn parse_pattern(text: &str, pos: usize) -> Result<String, NqError> {
    let inner = text
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or_else(|| NqError::syntax(pos, "'=~' expects a quoted pattern"))?;

    let mut source = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('"') => source.push('"'),
                Some(other) => {
                    source.push('\\');
                    source.push(other);
                }
                None => return Err(NqError::syntax(pos, "unterminated pattern")),
            },
            '"' => return Err(NqError::syntax(pos, "unescaped '\"' inside pattern")),
            c => source.push(c),
        }
    }
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pred(s: &str) -> Predicate {
        Predicate::parse(s, 0).unwrap()
    }

    fn v(j: serde_json::Value) -> Value {
        Value::from(j)
    }

    #[test]
    fn parse_numeric_comparison() {
        let p = pred("@.price>100");
        assert_eq!(p.field, vec!["price".to_string()]);
        assert_eq!(p.op, CompareOp::Gt);
        assert_eq!(p.literal, Value::Number(100.0));
    }

    #[test]
    fn parse_two_char_operators() {
        assert_eq!(pred("@.rating>=4.5").op, CompareOp::Ge);
        assert_eq!(pred("@.a<=1").op, CompareOp::Le);
        assert_eq!(pred("@.a!=false").op, CompareOp::Ne);
        assert_eq!(pred(r#"@.name=~"^M""#).op, CompareOp::Match);
    }

    #[test]
    fn parse_nested_field_and_whitespace() {
        let p = pred(r#" @.a.b == "x" "#);
        assert_eq!(p.field, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(p.literal, Value::from("x"));
    }

    #[test]
    fn parse_bare_element() {
        let p = pred("@>3");
        assert!(p.field.is_empty());
        assert!(p.matches(&Value::Number(4.0)));
        assert!(!p.matches(&Value::Number(3.0)));
    }

    #[test]
    fn parse_errors_carry_offsets() {
        let err = Predicate::parse("@.price", 10).unwrap_err();
        assert!(matches!(err, NqError::SyntaxError { position: 17, .. }));
        assert!(Predicate::parse(".price>1", 0).is_err());
        assert!(Predicate::parse("@.price>", 0).is_err());
        assert!(Predicate::parse("@.price>[1]", 0).is_err());
        assert!(Predicate::parse("@.price>abc", 0).is_err());
    }

    #[test]
    fn invalid_regex_is_syntax_error() {
        let err = Predicate::parse(r#"@.name=~"(unclosed""#, 4).unwrap_err();
        assert!(matches!(err, NqError::SyntaxError { position: 12, .. }));
        assert!(Predicate::parse("@.name=~5", 0).is_err());
    }

    #[test]
    fn regex_keeps_backslash_classes() {
        let p = pred(r#"@.c=~"\d+""#);
        assert_eq!(p.literal, Value::from(r"\d+"));
        assert!(p.matches(&v(json!({"c": "a12"}))));
        assert!(!p.matches(&v(json!({"c": "abc"}))));
        assert!(pred(r#"@=~"^\w+\.rs$""#).matches(&v(json!("main.rs"))));
    }

    #[test]
    fn regex_unescapes_quotes_only() {
        let p = pred(r#"@=~"say \"hi\"""#);
        assert_eq!(p.literal, Value::from(r#"say "hi""#));
        assert!(p.matches(&v(json!(r#"they say "hi" twice"#))));
        assert!(Predicate::parse(r#"@=~"a"b""#, 0).is_err());
        assert!(Predicate::parse(r#"@=~"abc\""#, 0).is_err());
        assert!(Predicate::parse(r#"@=~"abc"#, 0).is_err());
    }

    #[test]
    fn equality_requires_matching_types() {
        let p = pred("@.v==1");
        assert!(p.matches(&v(json!({"v": 1.0}))));
        assert!(!p.matches(&v(json!({"v": "1"}))));
        let ne = pred("@.v!=1");
        assert!(ne.matches(&v(json!({"v": "1"}))));
        assert!(!ne.matches(&v(json!({"v": 1}))));
    }

    #[test]
    fn ordering_on_non_numbers_does_not_match() {
        let p = pred("@.v>1");
        assert!(!p.matches(&v(json!({"v": "5"}))));
        assert!(!p.matches(&v(json!({"v": null}))));
        assert!(p.matches(&v(json!({"v": 2}))));
    }

    #[test]
    fn missing_field_never_matches() {
        assert!(!pred("@.x==null").matches(&v(json!({"y": 1}))));
        assert!(!pred("@.x!=1").matches(&v(json!({"y": 1}))));
        assert!(!pred("@.x==1").matches(&v(json!(5))));
    }

    #[test]
    fn regex_searches_anywhere() {
        let p = pred(r#"@.name=~"board$""#);
        assert!(p.matches(&v(json!({"name": "Keyboard"}))));
        assert!(!p.matches(&v(json!({"name": "Mouse"}))));
        assert!(!p.matches(&v(json!({"name": 12}))));
        assert!(pred(r#"@.name=~"oni""#).matches(&v(json!({"name": "Monitor"}))));
    }
}
