//! Lowering of compiled artifacts into a node program.
//!
//! An artifact is literal text interleaved with instruction tags
//! (`<?tpl KEYWORD HEADER ?>`). Block keywords nest; every opener must be
//! closed by its matching keyword, and closers must not appear outside
//! their block.

use crate::directives::{CLOSE_TAG, OPEN_TAG};
use crate::error::{TemplateError, TemplateResult};
use crate::evaluator::ast::{Expr, Stmt};
use crate::evaluator::parser::{
    parse_expression, parse_for_header, parse_foreach_header, parse_statements,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    /// Escaped output.
    Print(Expr),
    /// Raw output.
    Echo(Expr),
    Dump(Expr),
    Exec(Vec<Stmt>),
    If {
        branches: Vec<(Expr, Vec<Node>)>,
        otherwise: Option<Vec<Node>>,
    },
    Foreach {
        iterable: Expr,
        key: Option<String>,
        value: String,
        body: Vec<Node>,
    },
    For {
        init: Vec<Stmt>,
        condition: Option<Expr>,
        step: Vec<Stmt>,
        body: Vec<Node>,
    },
    While {
        condition: Expr,
        body: Vec<Node>,
    },
    DoWhile {
        body: Vec<Node>,
        condition: Expr,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    nodes: Vec<Node>,
}

impl Program {
    /// Parse an artifact. Unknown keywords, unbalanced blocks and malformed
    /// expressions are syntax errors carrying the artifact byte offset.
    pub fn parse(artifact: &str) -> TemplateResult<Self> {
        let pieces = scan(artifact)?;
        let mut builder = Builder {
            pieces: pieces.into_iter(),
        };
        let (nodes, closer) = builder.block(&[])?;
        debug_assert!(closer.is_none());
        Ok(Program { nodes })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// ================================
// Scanning
// ================================

#[derive(Debug, Clone, Copy)]
struct Instruction<'a> {
    keyword: &'a str,
    header: &'a str,
    /// Offset of `<?tpl`.
    offset: usize,
    header_offset: usize,
}

#[derive(Debug)]
enum Piece<'a> {
    Text(&'a str),
    Instruction(Instruction<'a>),
}

fn scan(artifact: &str) -> TemplateResult<Vec<Piece<'_>>> {
    let mut pieces = Vec::new();
    let mut text_start = 0;
    let mut search = 0;
    while let Some(found) = artifact[search..].find(OPEN_TAG) {
        let offset = search + found;
        let body_start = offset + OPEN_TAG.len();
        // `<?tplfoo` is not a tag
        let delimited = artifact[body_start..]
            .chars()
            .next()
            .map_or(true, char::is_whitespace);
        if !delimited {
            search = body_start;
            continue;
        }
        let body_end = find_close_tag(artifact, body_start)
            .ok_or_else(|| TemplateError::syntax(offset, "unterminated instruction tag"))?;
        if text_start < offset {
            pieces.push(Piece::Text(&artifact[text_start..offset]));
        }
        pieces.push(Piece::Instruction(split_instruction(
            &artifact[body_start..body_end],
            offset,
            body_start,
        )));
        text_start = body_end + CLOSE_TAG.len();
        search = text_start;
    }
    if text_start < artifact.len() {
        pieces.push(Piece::Text(&artifact[text_start..]));
    }
    Ok(pieces)
}

/// First `?>` at or after `from` that is not inside a quoted string.
fn find_close_tag(artifact: &str, from: usize) -> Option<usize> {
    let bytes = artifact.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = from;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None if b == b'\'' || b == b'"' => quote = Some(b),
            None if bytes[i..].starts_with(CLOSE_TAG.as_bytes()) => return Some(i),
            None => {}
        }
        i += 1;
    }
    None
}

fn split_instruction(body: &str, offset: usize, body_offset: usize) -> Instruction<'_> {
    let trimmed = body.trim_start();
    let lead = body.len() - trimmed.len();
    let keyword_len = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
    let (keyword, rest) = trimmed.split_at(keyword_len);
    let header = rest.trim();
    let header_lead = rest.len() - rest.trim_start().len();
    Instruction {
        keyword,
        header,
        offset,
        header_offset: body_offset + lead + keyword_len + header_lead,
    }
}

// ================================
// Block building
// ================================

struct Builder<'a> {
    pieces: std::vec::IntoIter<Piece<'a>>,
}

impl<'a> Builder<'a> {
    /// Collect nodes until one of `closers` (returned) or end of input.
    /// Reaching the end while closers are expected is the caller's error.
    fn block(&mut self, closers: &[&str]) -> TemplateResult<(Vec<Node>, Option<Instruction<'a>>)> {
        let mut nodes = Vec::new();
        while let Some(piece) = self.pieces.next() {
            let ins = match piece {
                Piece::Text(text) => {
                    nodes.push(Node::Text(text.to_string()));
                    continue;
                }
                Piece::Instruction(ins) => ins,
            };
            if closers.contains(&ins.keyword) {
                return Ok((nodes, Some(ins)));
            }
            nodes.push(self.instruction(ins)?);
        }
        Ok((nodes, None))
    }

    fn instruction(&mut self, ins: Instruction<'a>) -> TemplateResult<Node> {
        match ins.keyword {
            "print" => Ok(Node::Print(expression(&ins)?)),
            "echo" => Ok(Node::Echo(expression(&ins)?)),
            "dump" => Ok(Node::Dump(expression(&ins)?)),
            "exec" => Ok(Node::Exec(at(&ins, parse_statements(ins.header))?)),
            "if" => self.if_block(ins),
            "foreach" => {
                let (iterable, key, value) = at(&ins, parse_foreach_header(ins.header))?;
                let body = self.body(&ins, "endforeach")?;
                Ok(Node::Foreach {
                    iterable,
                    key,
                    value,
                    body,
                })
            }
            "for" => {
                let (init, condition, step) = at(&ins, parse_for_header(ins.header))?;
                let body = self.body(&ins, "endfor")?;
                Ok(Node::For {
                    init,
                    condition,
                    step,
                    body,
                })
            }
            "while" => {
                let condition = expression(&ins)?;
                let body = self.body(&ins, "endwhile")?;
                Ok(Node::While { condition, body })
            }
            "do" => {
                no_header(&ins)?;
                let (body, closer) = self.block(&["dowhile"])?;
                let closer = closer.ok_or_else(|| unclosed(&ins))?;
                let condition = expression(&closer)?;
                Ok(Node::DoWhile { body, condition })
            }
            "elseif" | "else" | "endif" | "endforeach" | "endfor" | "endwhile" | "dowhile" => Err(
                TemplateError::syntax(ins.offset, format!("unexpected '{}'", ins.keyword)),
            ),
            "" => Err(TemplateError::syntax(ins.offset, "empty instruction")),
            other => Err(TemplateError::syntax(
                ins.offset,
                format!("unknown instruction '{}'", other),
            )),
        }
    }

    fn if_block(&mut self, opener: Instruction<'a>) -> TemplateResult<Node> {
        let mut branches = Vec::new();
        let mut condition = expression(&opener)?;
        loop {
            let (body, closer) = self.block(&["elseif", "else", "endif"])?;
            let closer = closer.ok_or_else(|| unclosed(&opener))?;
            branches.push((condition, body));
            match closer.keyword {
                "elseif" => condition = expression(&closer)?,
                "else" => {
                    no_header(&closer)?;
                    let (otherwise, end) = self.block(&["endif"])?;
                    let end = end.ok_or_else(|| unclosed(&opener))?;
                    no_header(&end)?;
                    return Ok(Node::If {
                        branches,
                        otherwise: Some(otherwise),
                    });
                }
                _ => {
                    no_header(&closer)?;
                    return Ok(Node::If {
                        branches,
                        otherwise: None,
                    });
                }
            }
        }
    }

    fn body(&mut self, opener: &Instruction<'a>, closer: &str) -> TemplateResult<Vec<Node>> {
        let (body, end) = self.block(&[closer])?;
        let end = end.ok_or_else(|| unclosed(opener))?;
        no_header(&end)?;
        Ok(body)
    }
}

fn expression(ins: &Instruction<'_>) -> TemplateResult<Expr> {
    if ins.header.is_empty() {
        return Err(TemplateError::syntax(
            ins.offset,
            format!("'{}' requires an expression", ins.keyword),
        ));
    }
    at(ins, parse_expression(ins.header))
}

fn no_header(ins: &Instruction<'_>) -> TemplateResult<()> {
    if ins.header.is_empty() {
        Ok(())
    } else {
        Err(TemplateError::syntax(
            ins.header_offset,
            format!("'{}' takes no arguments", ins.keyword),
        ))
    }
}

fn unclosed(opener: &Instruction<'_>) -> TemplateError {
    TemplateError::syntax(opener.offset, format!("unclosed '{}' block", opener.keyword))
}

/// Rebase expression-relative syntax offsets onto the artifact.
fn at<T>(ins: &Instruction<'_>, result: TemplateResult<T>) -> TemplateResult<T> {
    result.map_err(|e| match e {
        TemplateError::Syntax { offset, message } => TemplateError::Syntax {
            offset: ins.header_offset + offset,
            message,
        },
        other => other,
    })
}
