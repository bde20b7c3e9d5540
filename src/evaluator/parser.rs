//! Pratt parser for the instruction expression language.
//!
//! Entry points are split by instruction shape: plain expressions (`print`,
//! `if`, `while`), statement lists (`exec`), foreach headers and for headers.
//! Every entry point rejects trailing input.

use templar_types::Value;

use super::ast::{AssignOp, BinaryOp, Expr, LogicalOp, Stmt, UnaryOp};
use super::lexer::{tokenize, Token, TokenKind};
use crate::core::variable_path::{PathSegment, VariablePath};
use crate::error::{TemplateError, TemplateResult};

// =============================================================================
// Precedence Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Precedence {
    Lowest = 0,
    /// `c ? a : b`
    Conditional = 1,
    /// `??`
    Coalesce = 2,
    /// `||`, `or`
    Or = 3,
    /// `&&`, `and`
    And = 4,
    /// `==`, `!=`, `===`, `!==`
    Equality = 5,
    /// `<`, `<=`, `>`, `>=`
    Comparison = 6,
    /// `~`
    Concat = 7,
    /// `+`, `-`
    Additive = 8,
    /// `*`, `/`, `%`
    Multiplicative = 9,
    /// `!`, `not`, `-`
    Unary = 10,
    /// Member access, subscript
    Postfix = 11,
}

impl Precedence {
    /// Get the next higher precedence level.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Lowest => Self::Conditional,
            Self::Conditional => Self::Coalesce,
            Self::Coalesce => Self::Or,
            Self::Or => Self::And,
            Self::And => Self::Equality,
            Self::Equality => Self::Comparison,
            Self::Comparison => Self::Concat,
            Self::Concat => Self::Additive,
            Self::Additive => Self::Multiplicative,
            Self::Multiplicative => Self::Unary,
            Self::Unary => Self::Postfix,
            Self::Postfix => Self::Postfix,
        }
    }
}

// =============================================================================
// Public API
// =============================================================================

/// Parse a single expression.
pub fn parse_expression(source: &str) -> TemplateResult<Expr> {
    let mut parser = Parser::new(source)?;
    let expr = parser.expression(Precedence::Lowest)?;
    parser.expect_eof()?;
    Ok(expr)
}

/// Parse a `;`/`,` separated statement list. Empty statements are skipped.
pub fn parse_statements(source: &str) -> TemplateResult<Vec<Stmt>> {
    let mut parser = Parser::new(source)?;
    let mut stmts = Vec::new();
    loop {
        while matches!(parser.peek(), TokenKind::Semicolon | TokenKind::Comma) {
            parser.advance();
        }
        if parser.at_eof() {
            break;
        }
        stmts.push(parser.statement()?);
        if !matches!(
            parser.peek(),
            TokenKind::Semicolon | TokenKind::Comma | TokenKind::Eof
        ) {
            return Err(parser.unexpected("';'"));
        }
    }
    Ok(stmts)
}

/// Parse `iterable as value` or `iterable as key => value`.
///
/// Returns `(iterable, key_name, value_name)`.
pub fn parse_foreach_header(source: &str) -> TemplateResult<(Expr, Option<String>, String)> {
    let mut parser = Parser::new(source)?;
    let iterable = parser.expression(Precedence::Lowest)?;
    if !matches!(parser.peek(), TokenKind::Ident(word) if word == "as") {
        return Err(parser.unexpected("'as'"));
    }
    parser.advance();
    let first = parser.binding_name()?;
    let header = if parser.eat(&TokenKind::FatArrow) {
        let second = parser.binding_name()?;
        (iterable, Some(first), second)
    } else {
        (iterable, None, first)
    };
    parser.expect_eof()?;
    Ok(header)
}

/// Parse `init; condition; step`. Each clause may be empty; an empty
/// condition loops until the body breaks out through the iteration cap.
pub fn parse_for_header(source: &str) -> TemplateResult<(Vec<Stmt>, Option<Expr>, Vec<Stmt>)> {
    let mut parser = Parser::new(source)?;
    let init = parser.clause_statements()?;
    parser.expect(&TokenKind::Semicolon, "';'")?;
    let condition = if parser.peek() == &TokenKind::Semicolon {
        None
    } else {
        Some(parser.expression(Precedence::Lowest)?)
    };
    parser.expect(&TokenKind::Semicolon, "';'")?;
    let step = parser.clause_statements()?;
    parser.expect_eof()?;
    Ok((init, condition, step))
}

// =============================================================================
// Parser
// =============================================================================

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(source: &str) -> TemplateResult<Self> {
        Ok(Self {
            tokens: tokenize(source)?,
            pos: 0,
        })
    }

    fn current(&self) -> &Token {
        // tokenize always terminates the stream with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_next(&self) -> &TokenKind {
        let idx = (self.pos + 1).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    fn at_eof(&self) -> bool {
        self.peek() == &TokenKind::Eof
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> TemplateResult<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn expect_eof(&self) -> TemplateResult<()> {
        if self.at_eof() {
            Ok(())
        } else {
            Err(self.unexpected("end of expression"))
        }
    }

    fn unexpected(&self, expected: &str) -> TemplateError {
        let token = self.current();
        let found = match &token.kind {
            TokenKind::Eof => "end of input".to_string(),
            other => describe(other),
        };
        TemplateError::syntax(token.offset, format!("expected {}, found {}", expected, found))
    }

    // ---------------------------------------------------------------------
    // Statements
    // ---------------------------------------------------------------------

    fn statement(&mut self) -> TemplateResult<Stmt> {
        match self.peek().clone() {
            TokenKind::Increment | TokenKind::Decrement => {
                let increment = self.peek() == &TokenKind::Increment;
                self.advance();
                let name = self.binding_name()?;
                Ok(if increment {
                    Stmt::Increment(name)
                } else {
                    Stmt::Decrement(name)
                })
            }
            TokenKind::Ident(_) | TokenKind::Variable(_) => {
                let op = match self.peek_next().clone() {
                    TokenKind::Assign => Some(AssignOp::Set),
                    TokenKind::PlusAssign => Some(AssignOp::Add),
                    TokenKind::MinusAssign => Some(AssignOp::Sub),
                    TokenKind::TildeAssign => Some(AssignOp::Concat),
                    TokenKind::Increment | TokenKind::Decrement => None,
                    _ => return Ok(Stmt::Expr(self.expression(Precedence::Lowest)?)),
                };
                let target = self.binding_name()?;
                match op {
                    Some(op) => {
                        self.advance();
                        let value = self.expression(Precedence::Lowest)?;
                        Ok(Stmt::Assign { target, op, value })
                    }
                    None => {
                        let increment = self.peek() == &TokenKind::Increment;
                        self.advance();
                        Ok(if increment {
                            Stmt::Increment(target)
                        } else {
                            Stmt::Decrement(target)
                        })
                    }
                }
            }
            _ => Ok(Stmt::Expr(self.expression(Precedence::Lowest)?)),
        }
    }

    /// Comma separated statements inside one `for` clause.
    fn clause_statements(&mut self) -> TemplateResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        if matches!(self.peek(), TokenKind::Semicolon | TokenKind::Eof) {
            return Ok(stmts);
        }
        loop {
            stmts.push(self.statement()?);
            if !self.eat(&TokenKind::Comma) {
                return Ok(stmts);
            }
        }
    }

    /// A plain local name: `name` or `$name`.
    fn binding_name(&mut self) -> TemplateResult<String> {
        match self.peek().clone() {
            TokenKind::Ident(name) if !is_keyword(&name) => {
                self.advance();
                Ok(name)
            }
            TokenKind::Variable(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("variable name")),
        }
    }

    // ---------------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------------

    fn expression(&mut self, min: Precedence) -> TemplateResult<Expr> {
        let mut left = self.prefix()?;
        loop {
            let prec = self.infix_precedence();
            if prec == Precedence::Lowest || prec < min {
                break;
            }
            left = self.infix(left, prec)?;
        }
        Ok(left)
    }

    fn infix_precedence(&self) -> Precedence {
        match self.peek() {
            TokenKind::Question => Precedence::Conditional,
            TokenKind::Coalesce => Precedence::Coalesce,
            TokenKind::OrOr => Precedence::Or,
            TokenKind::AndAnd => Precedence::And,
            TokenKind::Ident(word) if word == "or" => Precedence::Or,
            TokenKind::Ident(word) if word == "and" => Precedence::And,
            TokenKind::EqEq | TokenKind::NotEq | TokenKind::Identical | TokenKind::NotIdentical => {
                Precedence::Equality
            }
            TokenKind::Lt | TokenKind::Le | TokenKind::Gt | TokenKind::Ge => Precedence::Comparison,
            TokenKind::Tilde => Precedence::Concat,
            TokenKind::Plus | TokenKind::Minus => Precedence::Additive,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Precedence::Multiplicative,
            TokenKind::Dot | TokenKind::LBracket => Precedence::Postfix,
            _ => Precedence::Lowest,
        }
    }

    fn infix(&mut self, left: Expr, prec: Precedence) -> TemplateResult<Expr> {
        let kind = self.peek().clone();
        self.advance();
        let logical = |op, left, right| Expr::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
        match kind {
            TokenKind::Question => {
                let then = self.expression(Precedence::Lowest)?;
                self.expect(&TokenKind::Colon, "':'")?;
                let otherwise = self.expression(Precedence::Conditional)?;
                Ok(Expr::Conditional {
                    condition: Box::new(left),
                    then: Box::new(then),
                    otherwise: Box::new(otherwise),
                })
            }
            // right associative
            TokenKind::Coalesce => {
                let right = self.expression(Precedence::Coalesce)?;
                Ok(logical(LogicalOp::Coalesce, left, right))
            }
            TokenKind::OrOr => Ok(logical(LogicalOp::Or, left, self.expression(prec.next())?)),
            TokenKind::AndAnd => Ok(logical(LogicalOp::And, left, self.expression(prec.next())?)),
            TokenKind::Ident(word) if word == "or" => {
                Ok(logical(LogicalOp::Or, left, self.expression(prec.next())?))
            }
            TokenKind::Ident(word) if word == "and" => {
                Ok(logical(LogicalOp::And, left, self.expression(prec.next())?))
            }
            TokenKind::Dot => {
                let segment = match self.peek().clone() {
                    TokenKind::Segment(word) | TokenKind::Ident(word) => {
                        self.advance();
                        PathSegment::parse(&word)
                    }
                    _ => return Err(self.unexpected("member name")),
                };
                Ok(match left {
                    Expr::Path(path) => {
                        let mut segments = path.segments().to_vec();
                        segments.push(segment);
                        Expr::Path(VariablePath::from_parts(path.root(), segments))
                    }
                    target => Expr::Member {
                        target: Box::new(target),
                        segment,
                    },
                })
            }
            TokenKind::LBracket => {
                let index = self.expression(Precedence::Lowest)?;
                self.expect(&TokenKind::RBracket, "']'")?;
                Ok(Expr::Index {
                    target: Box::new(left),
                    index: Box::new(index),
                })
            }
            other => {
                let op = match other {
                    TokenKind::EqEq => BinaryOp::Eq,
                    TokenKind::NotEq => BinaryOp::NotEq,
                    TokenKind::Identical => BinaryOp::Identical,
                    TokenKind::NotIdentical => BinaryOp::NotIdentical,
                    TokenKind::Lt => BinaryOp::Lt,
                    TokenKind::Le => BinaryOp::Le,
                    TokenKind::Gt => BinaryOp::Gt,
                    TokenKind::Ge => BinaryOp::Ge,
                    TokenKind::Tilde => BinaryOp::Concat,
                    TokenKind::Plus => BinaryOp::Add,
                    TokenKind::Minus => BinaryOp::Sub,
                    TokenKind::Star => BinaryOp::Mul,
                    TokenKind::Slash => BinaryOp::Div,
                    _ => BinaryOp::Mod,
                };
                let right = self.expression(prec.next())?;
                Ok(Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                })
            }
        }
    }

    fn prefix(&mut self) -> TemplateResult<Expr> {
        let kind = self.peek().clone();
        match kind {
            TokenKind::Int(i) => {
                self.advance();
                Ok(Expr::Literal(Value::Integer(i)))
            }
            TokenKind::Float(f) => {
                self.advance();
                Ok(Expr::Literal(Value::Float(f)))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Literal(Value::String(s)))
            }
            TokenKind::Variable(name) => {
                self.advance();
                Ok(Expr::Path(VariablePath::from_parts(name, Vec::new())))
            }
            TokenKind::Ident(word) => {
                self.advance();
                match word.as_str() {
                    "true" => Ok(Expr::Literal(Value::Bool(true))),
                    "false" => Ok(Expr::Literal(Value::Bool(false))),
                    "null" => Ok(Expr::Literal(Value::Null)),
                    "not" => self.unary(UnaryOp::Not),
                    "and" | "or" | "as" => Err(TemplateError::syntax(
                        self.tokens[self.pos - 1].offset,
                        format!("unexpected keyword '{}'", word),
                    )),
                    _ if self.peek() == &TokenKind::LParen => {
                        self.advance();
                        let args = self.list(&TokenKind::RParen, "')'")?;
                        Ok(Expr::Call { name: word, args })
                    }
                    _ => Ok(Expr::Path(VariablePath::from_parts(word, Vec::new()))),
                }
            }
            TokenKind::Bang => {
                self.advance();
                self.unary(UnaryOp::Not)
            }
            TokenKind::Minus => {
                self.advance();
                self.unary(UnaryOp::Neg)
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.expression(Precedence::Lowest)?;
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::LBracket => {
                self.advance();
                Ok(Expr::Array(self.list(&TokenKind::RBracket, "']'")?))
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn unary(&mut self, op: UnaryOp) -> TemplateResult<Expr> {
        let operand = self.expression(Precedence::Unary)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// Comma separated expressions up to `close`; a trailing comma is allowed.
    fn list(&mut self, close: &TokenKind, what: &str) -> TemplateResult<Vec<Expr>> {
        let mut items = Vec::new();
        loop {
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.expression(Precedence::Lowest)?);
            if !self.eat(&TokenKind::Comma) {
                self.expect(close, what)?;
                return Ok(items);
            }
        }
    }
}

fn is_keyword(word: &str) -> bool {
    matches!(word, "true" | "false" | "null" | "and" | "or" | "not" | "as")
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Ident(s) | TokenKind::Segment(s) => format!("'{}'", s),
        TokenKind::Variable(s) => format!("'${}'", s),
        TokenKind::Int(i) => format!("'{}'", i),
        TokenKind::Float(f) => format!("'{}'", f),
        TokenKind::Str(_) => "string literal".to_string(),
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(p: &str) -> Expr {
        Expr::Path(VariablePath::parse(p).unwrap())
    }

    #[test]
    fn test_dollar_prefix_and_dotted_path() {
        assert_eq!(parse_expression("$user.tags.0").unwrap(), path("user.tags.0"));
        assert_eq!(parse_expression("user.name").unwrap(), path("user.name"));
    }

    #[test]
    fn test_precedence_multiplicative_over_additive() {
        let expr = parse_expression("1 + 2 * 3").unwrap();
        let Expr::Binary { op, right, .. } = expr else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn test_left_associative_subtraction() {
        let expr = parse_expression("10 - 3 - 2").unwrap();
        let Expr::Binary { op, left, .. } = expr else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Sub);
        assert!(matches!(*left, Expr::Binary { op: BinaryOp::Sub, .. }));
    }

    #[test]
    fn test_coalesce_and_conditional() {
        let expr = parse_expression("a ?? b ? 'x' : 'y'").unwrap();
        let Expr::Conditional { condition, .. } = expr else {
            panic!("expected conditional");
        };
        assert!(matches!(
            *condition,
            Expr::Logical {
                op: LogicalOp::Coalesce,
                ..
            }
        ));
    }

    #[test]
    fn test_word_operators() {
        let expr = parse_expression("not a and b or c").unwrap();
        let Expr::Logical { op, left, .. } = expr else {
            panic!("expected logical");
        };
        assert_eq!(op, LogicalOp::Or);
        assert!(matches!(*left, Expr::Logical { op: LogicalOp::And, .. }));
    }

    #[test]
    fn test_call_member_and_index() {
        let expr = parse_expression("keys(m)[0].name").unwrap();
        let Expr::Member { target, segment } = expr else {
            panic!("expected member");
        };
        assert_eq!(segment, PathSegment::Key("name".into()));
        assert!(matches!(*target, Expr::Index { .. }));
    }

    #[test]
    fn test_array_literal_trailing_comma() {
        let expr = parse_expression("[1, 'two', ]").unwrap();
        assert_eq!(
            expr,
            Expr::Array(vec![
                Expr::Literal(Value::Integer(1)),
                Expr::Literal(Value::from("two"))
            ])
        );
    }

    #[test]
    fn test_statements() {
        let stmts = parse_statements("$total = 0; $total += 5, i++; --j;").unwrap();
        assert_eq!(stmts.len(), 4);
        assert!(matches!(
            &stmts[1],
            Stmt::Assign { target, op: AssignOp::Add, .. } if target == "total"
        ));
        assert_eq!(stmts[2], Stmt::Increment("i".into()));
        assert_eq!(stmts[3], Stmt::Decrement("j".into()));
        assert!(parse_statements("").unwrap().is_empty());
    }

    #[test]
    fn test_foreach_header() {
        let (iterable, key, value) = parse_foreach_header("$users as $user").unwrap();
        assert_eq!(iterable, path("users"));
        assert_eq!(key, None);
        assert_eq!(value, "user");

        let (_, key, value) = parse_foreach_header("map as $k => $v").unwrap();
        assert_eq!(key.as_deref(), Some("k"));
        assert_eq!(value, "v");
    }

    #[test]
    fn test_for_header() {
        let (init, condition, step) = parse_for_header("$i = 0; $i < 3; $i++").unwrap();
        assert_eq!(init.len(), 1);
        assert!(condition.is_some());
        assert_eq!(step, vec![Stmt::Increment("i".into())]);

        let (init, condition, step) = parse_for_header(";;").unwrap();
        assert!(init.is_empty() && condition.is_none() && step.is_empty());
    }

    #[test]
    fn test_syntax_errors_carry_offsets() {
        let err = parse_expression("1 + ").unwrap_err();
        assert!(matches!(err, TemplateError::Syntax { offset: 4, .. }));
        assert!(parse_expression("a b").is_err());
        assert!(parse_expression("(1").is_err());
        assert!(parse_foreach_header("$items").is_err());
        assert!(parse_for_header("$i = 0").is_err());
    }
}
