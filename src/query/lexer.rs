use crate::error::NqError;

/// A slice of the query text together with its character offset in the
/// original input, so errors can point back at the right column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub text: String,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Bare key with escapes resolved
    Ident(String),
    /// `#`
    Hash,
    /// `.`
    Dot,
    /// Contents of `[...]`, without the brackets
    Bracket(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    /// Offset of the token's first content character
    pub pos: usize,
}

/// Split `input` on `sep` wherever it appears outside brackets, quoted
/// strings, and backslash escapes. Pieces keep their offsets relative to
/// `base`.
pub fn split_top_level(input: &str, sep: char, base: usize) -> Result<Vec<Piece>, NqError> {
    let chars: Vec<char> = input.chars().collect();
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if ch == '\\' {
            i += 2;
            continue;
        }
        if in_quote {
            if ch == '"' {
                in_quote = false;
            }
        } else if ch == '"' && depth > 0 {
            in_quote = true;
        } else if ch == '[' {
            depth += 1;
        } else if ch == ']' {
            if depth == 0 {
                return Err(NqError::syntax(base + i, "unmatched ']'"));
            }
            depth -= 1;
        } else if ch == sep && depth == 0 {
            pieces.push(Piece {
                text: chars[start..i].iter().collect(),
                offset: base + start,
            });
            start = i + 1;
        }
        i += 1;
    }

    if in_quote {
        return Err(NqError::syntax(base + chars.len(), "unterminated string literal"));
    }
    if depth > 0 {
        return Err(NqError::syntax(base + chars.len(), "unclosed '['"));
    }
    pieces.push(Piece {
        text: chars[start..].iter().collect(),
        offset: base + start,
    });
    Ok(pieces)
}

/// Tokenizer for the navigation part of a path (everything before `|`).
#[derive(Debug, Clone)]
pub struct Lexer {
    input: Vec<char>,
    pos: usize,
    base: usize,
    pub tokens: Vec<Spanned>,
}

impl Lexer {
    pub fn new(input: &str, base: usize) -> Self {
        Lexer {
            input: input.chars().collect(),
            pos: 0,
            base,
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(&mut self) -> Result<&[Spanned], NqError> {
        while self.pos < self.input.len() {
            let ch = self.input[self.pos];
            match ch {
                '.' => {
                    self.push(Token::Dot, self.pos);
                    self.pos += 1;
                }
                '[' => self.read_bracket()?,
                ']' => return Err(self.error("unmatched ']'")),
                c if c.is_whitespace() => {
                    return Err(self.error("whitespace is not allowed in a path"))
                }
                _ => self.read_ident()?,
            }
        }
        Ok(&self.tokens)
    }

    fn push(&mut self, token: Token, pos: usize) {
        self.tokens.push(Spanned {
            token,
            pos: self.base + pos,
        });
    }

    fn error(&self, message: &str) -> NqError {
        NqError::syntax(self.base + self.pos, message)
    }

    fn read_ident(&mut self) -> Result<(), NqError> {
        let start = self.pos;
        let mut name = String::new();
        let mut escaped = false;

        while self.pos < self.input.len() {
            let ch = self.input[self.pos];
            match ch {
                '\\' => {
                    let next = self
                        .input
                        .get(self.pos + 1)
                        .copied()
                        .ok_or_else(|| self.error("dangling escape at end of path"))?;
                    name.push(next);
                    escaped = true;
                    self.pos += 2;
                }
                '.' | '[' | ']' => break,
                c if c.is_whitespace() => {
                    return Err(self.error("whitespace is not allowed in a path"))
                }
                c => {
                    name.push(c);
                    self.pos += 1;
                }
            }
        }

        if name == "#" && !escaped {
            self.push(Token::Hash, start);
        } else {
            self.push(Token::Ident(name), start);
        }
        Ok(())
    }

    fn read_bracket(&mut self) -> Result<(), NqError> {
        let open = self.pos;
        self.pos += 1;
        let start = self.pos;
        let mut depth = 0usize;
        let mut in_quote = false;

        while self.pos < self.input.len() {
            let ch = self.input[self.pos];
            if ch == '\\' {
                self.pos += 2;
                continue;
            }
            if in_quote {
                if ch == '"' {
                    in_quote = false;
                }
            } else {
                match ch {
                    '"' => in_quote = true,
                    '[' => depth += 1,
                    ']' if depth == 0 => {
                        let body: String = self.input[start..self.pos].iter().collect();
                        self.push(Token::Bracket(body), start);
                        self.pos += 1;
                        return Ok(());
                    }
                    ']' => depth -= 1,
                    _ => {}
                }
            }
            self.pos += 1;
        }

        Err(NqError::syntax(self.base + open, "unclosed '['"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(pieces: &[Piece]) -> Vec<&str> {
        pieces.iter().map(|p| p.text.as_str()).collect()
    }

    #[test]
    fn split_on_top_level_commas() {
        let pieces = split_top_level("user.name,user.email", ',', 0).unwrap();
        assert_eq!(texts(&pieces), vec!["user.name", "user.email"]);
        assert_eq!(pieces[1].offset, 10);
    }

    #[test]
    fn commas_inside_brackets_and_quotes_do_not_split() {
        let pieces = split_top_level(r#"a[?(@.n=="x,y")].b,c"#, ',', 0).unwrap();
        assert_eq!(texts(&pieces), vec![r#"a[?(@.n=="x,y")].b"#, "c"]);
    }

    #[test]
    fn escaped_separator_does_not_split() {
        let pieces = split_top_level(r"a\,b,c", ',', 0).unwrap();
        assert_eq!(texts(&pieces), vec![r"a\,b", "c"]);
    }

    #[test]
    fn pipe_split_keeps_offsets() {
        let pieces = split_top_level("nums|@sort|@reverse", '|', 4).unwrap();
        assert_eq!(texts(&pieces), vec!["nums", "@sort", "@reverse"]);
        assert_eq!(pieces[2].offset, 4 + 11);
    }

    #[test]
    fn unclosed_bracket_errors() {
        assert!(split_top_level("items[0", ',', 0).is_err());
        assert!(split_top_level("items]0", ',', 0).is_err());
    }

    #[test]
    fn tokenize_dots_and_brackets() {
        let mut lex = Lexer::new("items[2].price", 0);
        let tokens: Vec<Token> = lex.tokenize().unwrap().iter().map(|t| t.token.clone()).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("items".into()),
                Token::Bracket("2".into()),
                Token::Dot,
                Token::Ident("price".into()),
            ]
        );
    }

    #[test]
    fn tokenize_hash_and_escapes() {
        let mut lex = Lexer::new(r"items.#.a\.b.\#", 0);
        let tokens: Vec<Token> = lex.tokenize().unwrap().iter().map(|t| t.token.clone()).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("items".into()),
                Token::Dot,
                Token::Hash,
                Token::Dot,
                Token::Ident("a.b".into()),
                Token::Dot,
                Token::Ident("#".into()),
            ]
        );
    }

    #[test]
    fn bracket_keeps_quoted_closing_bracket() {
        let mut lex = Lexer::new(r#"a[?(@.re=~"[a-z]+")]"#, 0);
        let tokens = lex.tokenize().unwrap();
        assert_eq!(tokens[1].token, Token::Bracket(r#"?(@.re=~"[a-z]+")"#.into()));
        assert_eq!(tokens[1].pos, 2);
    }

    #[test]
    fn whitespace_in_token_errors() {
        let err = Lexer::new("user. name", 0).tokenize().unwrap_err();
        assert!(matches!(err, NqError::SyntaxError { position: 5, .. }));
    }
}
