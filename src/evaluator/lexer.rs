use crate::error::{TemplateError, TemplateResult};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    /// `$name`
    Variable(String),
    /// Word directly after a `.`: a key, field name or canonical index.
    Segment(String),
    Int(i64),
    Float(f64),
    Str(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Colon,
    Semicolon,
    Question,
    Coalesce,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Tilde,
    Bang,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    Identical,
    NotIdentical,
    AndAnd,
    OrOr,
    Assign,
    PlusAssign,
    MinusAssign,
    TildeAssign,
    Increment,
    Decrement,
    FatArrow,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

/// Split expression text into tokens. Offsets are byte offsets into `src`.
pub fn tokenize(src: &str) -> TemplateResult<Vec<Token>> {
    Lexer::new(src).run()
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> TemplateResult<Vec<Token>> {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.pos += 1;
                continue;
            }
            let start = self.pos;
            let after_dot = self.tokens.last().is_some_and(|t| t.kind == TokenKind::Dot)
                && start > 0
                && self.bytes[start - 1] == b'.';
            let kind = if after_dot && is_word_byte(b) {
                TokenKind::Segment(self.take_while(is_word_byte).to_string())
            } else if b.is_ascii_digit() {
                self.number()?
            } else if b.is_ascii_alphabetic() || b == b'_' {
                TokenKind::Ident(self.take_while(is_word_byte).to_string())
            } else if b == b'$' {
                self.pos += 1;
                match self.peek() {
                    Some(c) if c.is_ascii_alphabetic() || c == b'_' => {
                        TokenKind::Variable(self.take_while(is_word_byte).to_string())
                    }
                    _ => return Err(TemplateError::syntax(start, "expected variable name after '$'")),
                }
            } else if b == b'\'' || b == b'"' {
                self.string(b)?
            } else {
                self.punct()?
            };
            self.tokens.push(Token { kind, offset: start });
        }
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            offset: self.src.len(),
        });
        Ok(self.tokens)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<u8> {
        self.bytes.get(self.pos + n).copied()
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    fn number(&mut self) -> TemplateResult<TokenKind> {
        let start = self.pos;
        self.take_while(|b| b.is_ascii_digit());
        let is_float = self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|b| b.is_ascii_digit());
        if is_float {
            self.pos += 1;
            self.take_while(|b| b.is_ascii_digit());
        }
        let text = &self.src[start..self.pos];
        if is_float {
            text.parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| TemplateError::syntax(start, format!("invalid number '{}'", text)))
        } else {
            // Integers beyond i64 degrade to floats like any other overflow.
            Ok(text
                .parse::<i64>()
                .map(TokenKind::Int)
                .unwrap_or_else(|_| TokenKind::Float(text.parse::<f64>().unwrap_or(f64::INFINITY))))
        }
    }

    fn string(&mut self, quote: u8) -> TemplateResult<TokenKind> {
        let start = self.pos;
        self.pos += 1;
        let mut out = String::new();
        loop {
            let rest = &self.src[self.pos..];
            let Some(c) = rest.chars().next() else {
                return Err(TemplateError::syntax(start, "unterminated string literal"));
            };
            self.pos += c.len_utf8();
            if c as u32 == quote as u32 {
                return Ok(TokenKind::Str(out));
            }
            if c != '\\' {
                out.push(c);
                continue;
            }
            let Some(escaped) = self.src[self.pos..].chars().next() else {
                return Err(TemplateError::syntax(start, "unterminated string literal"));
            };
            self.pos += escaped.len_utf8();
            match escaped {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '\\' | '\'' | '"' | '$' => out.push(escaped),
                other => {
                    out.push('\\');
                    out.push(other);
                }
            }
        }
    }

    fn punct(&mut self) -> TemplateResult<TokenKind> {
        let start = self.pos;
        let three = self.src.get(start..start + 3);
        let two = self.src.get(start..start + 2);
        let (kind, len) = match (three, two) {
            (Some("==="), _) => (TokenKind::Identical, 3),
            (Some("!=="), _) => (TokenKind::NotIdentical, 3),
            (_, Some("==")) => (TokenKind::EqEq, 2),
            (_, Some("!=")) => (TokenKind::NotEq, 2),
            (_, Some("<=")) => (TokenKind::Le, 2),
            (_, Some(">=")) => (TokenKind::Ge, 2),
            (_, Some("&&")) => (TokenKind::AndAnd, 2),
            (_, Some("||")) => (TokenKind::OrOr, 2),
            (_, Some("??")) => (TokenKind::Coalesce, 2),
            (_, Some("=>")) => (TokenKind::FatArrow, 2),
            (_, Some("++")) => (TokenKind::Increment, 2),
            (_, Some("--")) => (TokenKind::Decrement, 2),
            (_, Some("+=")) => (TokenKind::PlusAssign, 2),
            (_, Some("-=")) => (TokenKind::MinusAssign, 2),
            (_, Some("~=")) => (TokenKind::TildeAssign, 2),
            _ => {
                let kind = match self.bytes[start] {
                    b'(' => TokenKind::LParen,
                    b')' => TokenKind::RParen,
                    b'[' => TokenKind::LBracket,
                    b']' => TokenKind::RBracket,
                    b',' => TokenKind::Comma,
                    b'.' => TokenKind::Dot,
                    b':' => TokenKind::Colon,
                    b';' => TokenKind::Semicolon,
                    b'?' => TokenKind::Question,
                    b'+' => TokenKind::Plus,
                    b'-' => TokenKind::Minus,
                    b'*' => TokenKind::Star,
                    b'/' => TokenKind::Slash,
                    b'%' => TokenKind::Percent,
                    b'~' => TokenKind::Tilde,
                    b'!' => TokenKind::Bang,
                    b'<' => TokenKind::Lt,
                    b'>' => TokenKind::Gt,
                    b'=' => TokenKind::Assign,
                    _ => {
                        let c = self.src[start..].chars().next().unwrap_or('?');
                        return Err(TemplateError::syntax(
                            start,
                            format!("unexpected character '{}'", c),
                        ));
                    }
                };
                (kind, 1)
            }
        };
        self.pos += len;
        Ok(kind)
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_path_segments_after_dot() {
        assert_eq!(
            kinds("$items.0.name"),
            vec![
                TokenKind::Variable("items".into()),
                TokenKind::Dot,
                TokenKind::Segment("0".into()),
                TokenKind::Dot,
                TokenKind::Segment("name".into()),
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("user.007"),
            vec![
                TokenKind::Ident("user".into()),
                TokenKind::Dot,
                TokenKind::Segment("007".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("42 1.5"), vec![TokenKind::Int(42), TokenKind::Float(1.5), TokenKind::Eof]);
        assert_eq!(
            kinds("1 ~ 2"),
            vec![TokenKind::Int(1), TokenKind::Tilde, TokenKind::Int(2), TokenKind::Eof]
        );
    }

    #[test]
    fn test_strings_and_escapes() {
        assert_eq!(
            kinds(r#"'it\'s' "a\nb""#),
            vec![
                TokenKind::Str("it's".into()),
                TokenKind::Str("a\nb".into()),
                TokenKind::Eof
            ]
        );
        assert_eq!(kinds("'é'"), vec![TokenKind::Str("é".into()), TokenKind::Eof]);
    }

    #[test]
    fn test_multi_char_operators() {
        assert_eq!(
            kinds("a === b ?? c => d++ += !=="),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Identical,
                TokenKind::Ident("b".into()),
                TokenKind::Coalesce,
                TokenKind::Ident("c".into()),
                TokenKind::FatArrow,
                TokenKind::Ident("d".into()),
                TokenKind::Increment,
                TokenKind::PlusAssign,
                TokenKind::NotIdentical,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lexer_errors() {
        assert!(matches!(
            tokenize("'open"),
            Err(TemplateError::Syntax { offset: 0, .. })
        ));
        assert!(matches!(
            tokenize("a & b"),
            Err(TemplateError::Syntax { offset: 2, .. })
        ));
        assert!(tokenize("$ x").is_err());
    }
}
