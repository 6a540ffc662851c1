use miette::SourceSpan;

use crate::{
    env::Environment,
    error::ParseError,
    lexer::{tokenize, Token, TokenKind},
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    And,
    Or,
    Equal,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl Op {
    fn from_kind(kind: TokenKind) -> Option<Op> {
        match kind {
            TokenKind::And => Some(Op::And),
            TokenKind::Or => Some(Op::Or),
            TokenKind::EqualEqual => Some(Op::Equal),
            TokenKind::Less => Some(Op::Less),
            TokenKind::LessEqual => Some(Op::LessEqual),
            TokenKind::Greater => Some(Op::Greater),
            TokenKind::GreaterEqual => Some(Op::GreaterEqual),
            _ => None,
        }
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Op::And => "&&",
                Op::Or => "||",
                Op::Equal => "==",
                Op::Less => "<",
                Op::LessEqual => "<=",
                Op::Greater => ">",
                Op::GreaterEqual => ">=",
            }
        )
    }
}

/// Deepest nesting of groups and call arguments accepted by [`Parser`].
pub const MAX_NESTING: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Variable(String),
    Call {
        name: String,
        args: Vec<Expr>,
    },
    /// `first op0 e0 op1 e1 ...`, grouping to the right:
    /// `first op0 (e0 op1 (e1 ...))`.
    Chain {
        first: Box<Expr>,
        rest: Vec<(Op, Expr)>,
    },
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Literal(Value::String(s)) => write!(f, "{:?}", s),
            Expr::Literal(value) => write!(f, "{}", value),
            Expr::Variable(name) => write!(f, "{}", name),
            Expr::Call { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Chain { first, rest } => {
                let mut left = first.as_ref();
                for (op, operand) in rest {
                    write!(f, "({} {} ", op, left)?;
                    left = operand;
                }
                write!(f, "{}", left)?;
                for _ in rest {
                    write!(f, ")")?;
                }
                Ok(())
            }
        }
    }
}

/// Builds an [`Expr`] from source text.
///
/// Identifiers are resolved against the environment while parsing: a name
/// bound as a variable becomes a lookup, a name bound as a function must be
/// followed by an argument list, and anything else is rejected.
pub struct Parser<'a> {
    source: &'a str,
    env: &'a Environment,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str, env: &'a Environment) -> Self {
        Self { source: input, env }
    }

    pub fn parse(&self) -> Result<Expr, ParseError> {
        let tokens = tokenize(self.source)?;
        if tokens.is_empty() {
            return Err(ParseError::EmptyInput);
        }

        let expr = self.value(&tokens, 0, tokens.len(), 0)?;
        log::debug!("parsed {:?} as {}", self.source, expr);
        Ok(expr)
    }

    /// Parses `tokens[start..end]` as operands separated by operators.
    ///
    /// Operator chains are collected in a loop, so only groups and call
    /// arguments add to `depth`.
    fn value(
        &self,
        tokens: &[Token<'a>],
        start: usize,
        end: usize,
        depth: usize,
    ) -> Result<Expr, ParseError> {
        let (first, mut cursor) = self.operand(tokens, start, end, depth)?;

        let mut rest = vec![];
        while let Some(next) = tokens[..end].get(cursor) {
            let op = Op::from_kind(next.kind).ok_or_else(|| unexpected(next, cursor))?;
            let (operand, after) = self.operand(tokens, cursor + 1, end, depth)?;
            rest.push((op, operand));
            cursor = after;
        }

        if rest.is_empty() {
            return Ok(first);
        }
        Ok(Expr::Chain {
            first: Box::new(first),
            rest,
        })
    }

    /// Parses the single operand at `tokens[start]`, returning it and the
    /// position just past it.
    fn operand(
        &self,
        tokens: &[Token<'a>],
        start: usize,
        end: usize,
        depth: usize,
    ) -> Result<(Expr, usize), ParseError> {
        let Some(token) = tokens[..end].get(start) else {
            return Err(ParseError::UnparsableExpression {
                span: self.boundary(tokens, start),
            });
        };

        let cursor = start + 1;
        match token.kind {
            TokenKind::True => Ok((Expr::Literal(Value::Bool(true)), cursor)),
            TokenKind::False => Ok((Expr::Literal(Value::Bool(false)), cursor)),
            TokenKind::String => Ok((
                Expr::Literal(Value::String(unescape(token.slice))),
                cursor,
            )),
            TokenKind::Number => match token.slice.parse() {
                Ok(n) => Ok((Expr::Literal(Value::Number(n)), cursor)),
                Err(_) => Err(unexpected(token, start)),
            },
            TokenKind::Ident if self.env.has_variable(token.slice) => {
                Ok((Expr::Variable(token.slice.to_string()), cursor))
            }
            TokenKind::Ident if self.env.has_function(token.slice) => {
                self.call(tokens, start, end, nested(token, depth)?)
            }
            TokenKind::LeftParen => {
                let depth = nested(token, depth)?;
                let close = find_closing_paren(tokens, cursor, end)
                    .ok_or_else(|| self.unclosed(token))?;
                let inner = self.value(tokens, cursor, close, depth)?;
                Ok((inner, close + 1))
            }
            _ => Err(unexpected(token, start)),
        }
    }

    /// Parses the call whose name sits at `tokens[start]`, returning the call
    /// and the position just past its closing paren.
    fn call(
        &self,
        tokens: &[Token<'a>],
        start: usize,
        end: usize,
        depth: usize,
    ) -> Result<(Expr, usize), ParseError> {
        let name = &tokens[start];
        let mut cursor = start + 1;
        match tokens[..end].get(cursor) {
            Some(Token {
                kind: TokenKind::LeftParen,
                ..
            }) => cursor += 1,
            _ => {
                return Err(ParseError::ExpectedOpenParen {
                    name: name.slice.to_string(),
                    span: name.span(),
                })
            }
        }

        let mut args = vec![];
        while cursor < end && tokens[cursor].kind != TokenKind::RightParen {
            let close =
                find_closing_paren(tokens, cursor, end).ok_or_else(|| self.unclosed(name))?;
            match find_comma(tokens, cursor, close) {
                Some(comma) => {
                    args.push(self.value(tokens, cursor, comma, depth)?);
                    cursor = comma + 1;
                }
                None => {
                    args.push(self.value(tokens, cursor, close, depth)?);
                    // stay on the `)` so the loop stops
                    cursor = close;
                }
            }
        }

        if cursor >= end {
            return Err(self.unclosed(name));
        }

        let call = Expr::Call {
            name: name.slice.to_string(),
            args,
        };
        Ok((call, cursor + 1))
    }

    fn unclosed(&self, from: &Token<'_>) -> ParseError {
        ParseError::ExpectedCloseParen {
            span: (from.offset, self.source.len() - from.offset).into(),
        }
    }

    /// Span for a range that ran out of tokens: the token that bounds it, or
    /// the end of the source.
    fn boundary(&self, tokens: &[Token<'a>], position: usize) -> SourceSpan {
        match tokens.get(position) {
            Some(token) => token.span(),
            None => (self.source.len(), 0).into(),
        }
    }
}

/// One level deeper than `depth`, opened by `token`.
fn nested(token: &Token<'_>, depth: usize) -> Result<usize, ParseError> {
    if depth >= MAX_NESTING {
        return Err(ParseError::NestedTooDeep {
            limit: MAX_NESTING,
            span: token.span(),
        });
    }
    Ok(depth + 1)
}

fn unexpected(token: &Token<'_>, position: usize) -> ParseError {
    ParseError::UnexpectedToken {
        token: token.slice.to_string(),
        position,
        span: token.span(),
    }
}

/// Finds the `)` closing a group opened just before `start`.
fn find_closing_paren(tokens: &[Token<'_>], start: usize, end: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().take(end).skip(start) {
        match token.kind {
            TokenKind::RightParen if depth == 0 => return Some(i),
            TokenKind::RightParen => depth -= 1,
            TokenKind::LeftParen => depth += 1,
            _ => {}
        }
    }
    None
}

/// Finds the first `,` in `start..end` that is not nested inside parens.
fn find_comma(tokens: &[Token<'_>], start: usize, end: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().take(end).skip(start) {
        match token.kind {
            TokenKind::Comma if depth == 0 => return Some(i),
            TokenKind::LeftParen => depth += 1,
            TokenKind::RightParen => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    None
}

/// Drops the surrounding quotes and every escaping backslash.
fn unescape(literal: &str) -> String {
    let inner = &literal[1..literal.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            c => out.push(c),
        }
    }
    out
}
