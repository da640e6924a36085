use std::fmt;

use crate::error::NqError;
use crate::value::Value;

use super::filter::{CompareOp, Predicate};
use super::lexer::{split_top_level, Lexer, Spanned, Token};
use super::modifiers::Modifier;

/// A single segment of a navigation path.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Member lookup: `name`. A non-negative integer name also indexes arrays.
    Key(String),
    /// Bracket index: `[2]`, `[-1]`
    Index(i64),
    /// Projection: `#` maps the remaining path over every element
    Project,
    /// Predicate filter: `[?(@.price>100)]`
    Filter(Predicate),
}

impl Segment {
    pub fn is_fanout(&self) -> bool {
        matches!(self, Segment::Project | Segment::Filter(_))
    }
}

/// One subpath: navigation segments plus an optional modifier pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub segments: Vec<Segment>,
    pub modifiers: Vec<Modifier>,
}

impl Path {
    /// Parse a single subpath like `items[?(@.price>100)].name|@sort`.
    pub fn parse(input: &str) -> Result<Self, NqError> {
        Self::parse_at(input, 0)
    }

    /// Parse a subpath that starts at character offset `base` of a larger query.
    pub fn parse_at(input: &str, base: usize) -> Result<Self, NqError> {
        let mut parts = split_top_level(input, '|', base)?.into_iter();
        let nav = parts
            .next()
            .ok_or_else(|| NqError::syntax(base, "empty path"))?;

        let segments = parse_segments(&nav.text, nav.offset)?;

        let mut modifiers = Vec::new();
        for piece in parts {
            modifiers.push(Modifier::parse(&piece.text, piece.offset)?);
        }

        Ok(Path {
            segments,
            modifiers,
        })
    }

    pub fn has_fanout(&self) -> bool {
        self.segments.iter().any(Segment::is_fanout)
    }
}

fn parse_segments(input: &str, base: usize) -> Result<Vec<Segment>, NqError> {
    if input.is_empty() {
        return Err(NqError::syntax(base, "empty path"));
    }

    let mut lex = Lexer::new(input, base);
    let tokens = lex.tokenize()?;
    let end = base + input.chars().count();
    let mut segments = Vec::new();
    let mut i = 0;

    // Leading segment: a key, `#`, or a bracket against a root array
    match tokens.first() {
        Some(tok) if tok.token == Token::Dot => {
            return Err(NqError::syntax(tok.pos, "path cannot start with '.'"));
        }
        Some(tok) => {
            segments.push(segment_from(tok)?);
            i += 1;
        }
        None => return Err(NqError::syntax(base, "empty path")),
    }

    while i < tokens.len() {
        let tok = &tokens[i];
        match &tok.token {
            Token::Dot => {
                let next = tokens
                    .get(i + 1)
                    .ok_or_else(|| NqError::syntax(end, "path cannot end with '.'"))?;
                match &next.token {
                    Token::Ident(_) | Token::Hash => segments.push(segment_from(next)?),
                    Token::Dot => return Err(NqError::syntax(next.pos, "empty segment")),
                    Token::Bracket(_) => {
                        return Err(NqError::syntax(next.pos - 1, "unexpected '[' after '.'"));
                    }
                }
                i += 2;
            }
            Token::Bracket(_) => {
                segments.push(segment_from(tok)?);
                i += 1;
            }
            Token::Ident(_) | Token::Hash => {
                return Err(NqError::syntax(tok.pos, "expected '.' or '[' between segments"));
            }
        }
    }

    Ok(segments)
}

fn segment_from(tok: &Spanned) -> Result<Segment, NqError> {
    match &tok.token {
        Token::Ident(name) if name.is_empty() => Err(NqError::syntax(tok.pos, "empty segment")),
        Token::Ident(name) => Ok(Segment::Key(name.clone())),
        Token::Hash => Ok(Segment::Project),
        Token::Bracket(body) => parse_bracket(body, tok.pos),
        Token::Dot => Err(NqError::syntax(tok.pos, "empty segment")),
    }
}

/// `body` is the bracket contents; `pos` is the offset of its first character.
fn parse_bracket(body: &str, pos: usize) -> Result<Segment, NqError> {
    if let Some(rest) = body.strip_prefix("?(") {
        let inner = rest.strip_suffix(')').ok_or_else(|| {
            NqError::syntax(pos + body.chars().count(), "filter must end with ')'")
        })?;
        return Predicate::parse(inner, pos + 2).map(Segment::Filter);
    }

    match body.chars().next() {
        Some(c) if c.is_ascii_digit() || c == '-' => body
            .parse::<i64>()
            .map(Segment::Index)
            .map_err(|_| NqError::syntax(pos, format!("invalid array index: {body}"))),
        Some('"') => serde_json::from_str::<String>(body)
            .map(Segment::Key)
            .map_err(|e| NqError::syntax(pos, format!("invalid quoted key: {e}"))),
        Some(_) => Err(NqError::syntax(pos, format!("unsupported bracket expression: {body}"))),
        None => Err(NqError::syntax(pos, "empty brackets")),
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(name) if needs_brackets(name) => {
                write!(f, "[{}]", Value::from(name.as_str()))
            }
            Segment::Key(name) => write!(f, "{name}"),
            Segment::Index(i) => write!(f, "[{i}]"),
            Segment::Project => write!(f, "#"),
            Segment::Filter(p) => {
                write!(f, "[?(@")?;
                for name in &p.field {
                    write!(f, ".{name}")?;
                }
                match (p.op, &p.literal) {
                    // Patterns are raw regex text; only quotes were escaped
                    (CompareOp::Match, Value::String(source)) => {
                        write!(f, "=~\"{}\")]", source.replace('"', "\\\""))
                    }
                    _ => write!(f, "{}{})]", p.op.symbol(), p.literal),
                }
            }
        }
    }
}

/// Keys that would not survive a bare `a.key` round trip print as `["key"]`.
fn needs_brackets(name: &str) -> bool {
    name.is_empty()
        || name == "#"
        || name
            .chars()
            .any(|c| matches!(c, '.' | '[' | ']' | '|' | ',' | '\\' | '"') || c.is_whitespace())
}

impl Segment {
    /// Printed inside `[...]`, so no `.` precedes it.
    fn is_bracketed(&self) -> bool {
        match self {
            Segment::Key(name) => needs_brackets(name),
            Segment::Index(_) | Segment::Filter(_) => true,
            Segment::Project => false,
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 && !seg.is_bracketed() {
                write!(f, ".")?;
            }
            write!(f, "{seg}")?;
        }
        for m in &self.modifiers {
            write!(f, "|@{}", m.name())?;
        }
        Ok(())
    }
}
