// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Recursive-descent parser with Pratt parsing for expressions.

use std::rc::Rc;

use babylon_source::Span;

use crate::ast::{BinOp, Expr, ExprKind, FnDecl, Item, Param, Program, Stmt, StmtKind, UnaryOp};
use crate::token::{Token, TokenKind};

/// Maximum number of errors to collect before stopping.
const MAX_ERRORS: usize = 20;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    /// Record error, return if should continue.
    fn record_error(&mut self, error: ParseError) -> bool {
        self.errors.push(error);
        self.errors.len() < MAX_ERRORS
    }

    /// Skip to the next item after an error at top level.
    fn synchronize(&mut self) {
        let mut brace_depth = 0;
        while !self.at_end() {
            match self.current_kind() {
                TokenKind::LBrace => {
                    brace_depth += 1;
                    self.advance();
                }
                TokenKind::RBrace => {
                    self.advance();
                    if brace_depth > 0 {
                        brace_depth -= 1;
                        if brace_depth == 0 {
                            return;
                        }
                    }
                }
                TokenKind::Semi if brace_depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::Function | TokenKind::Import if brace_depth == 0 => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn synchronize_in_block(&mut self) {
        while !self.at_end() {
            match self.current_kind() {
                TokenKind::RBrace => return,
                TokenKind::Semi => {
                    self.advance();
                    return;
                }
                TokenKind::Let
                | TokenKind::Return
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Break
                | TokenKind::Continue => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // =========================================================================
    // Token Navigation
    // =========================================================================

    fn current(&self) -> &Token {
        let idx = self.pos.min(self.tokens.len().saturating_sub(1));
        &self.tokens[idx]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek(&self, n: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    fn at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !self.at_end() {
            self.pos += 1;
        }
        token
    }

    /// End offset of the most recently consumed token.
    fn prev_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|idx| self.tokens.get(idx))
            .map(|t| t.span.end)
            .unwrap_or(0)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::expected(
                &kind.display_name(),
                self.current_kind(),
                self.current().span,
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.current_kind().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(ParseError::expected("identifier", &other, self.current().span)),
        }
    }

    /// Semicolons are optional.
    fn skip_terminator(&mut self) {
        self.match_token(&TokenKind::Semi);
    }

    // =========================================================================
    // Items
    // =========================================================================

    pub fn parse(&mut self) -> ParseResult {
        let mut items = Vec::new();
        while !self.at_end() {
            match self.parse_item() {
                Ok(item) => items.push(item),
                Err(e) => {
                    if !self.record_error(e) {
                        break;
                    }
                    self.synchronize();
                }
            }
        }
        ParseResult {
            program: Program { items },
            errors: std::mem::take(&mut self.errors),
        }
    }

    fn parse_item(&mut self) -> Result<Item, ParseError> {
        match self.current_kind() {
            TokenKind::Import => {
                let start = self.advance().span.start;
                let path = match self.current_kind().clone() {
                    TokenKind::String(path) => {
                        self.advance();
                        path
                    }
                    other => {
                        return Err(ParseError::expected(
                            "string literal",
                            &other,
                            self.current().span,
                        )
                        .with_hint("imports name a file: import \"lib.bab\";"))
                    }
                };
                let span = Span::new(start, self.prev_end());
                self.skip_terminator();
                Ok(Item::Import { path, span })
            }
            TokenKind::Function => Ok(Item::Function(Rc::new(self.parse_fn()?))),
            _ => Ok(Item::Stmt(self.parse_stmt()?)),
        }
    }

    fn parse_fn(&mut self) -> Result<FnDecl, ParseError> {
        let start = self.expect(&TokenKind::Function)?.span.start;
        let name = self.expect_ident()?;
        self.expect(&TokenKind::LParen)?;
        let params = self.parse_params()?;
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(FnDecl {
            name,
            params,
            body,
            span: Span::new(start, self.prev_end()),
        })
    }

    fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) && !self.at_end() {
            let start = self.current().span.start;
            let name = self.expect_ident()?;
            let default = if self.match_token(&TokenKind::Eq) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            params.push(Param {
                name,
                default,
                span: Span::new(start, self.prev_end()),
            });
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        Ok(params)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(&TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(e) => {
                    if !self.record_error(e) {
                        break;
                    }
                    self.synchronize_in_block();
                }
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current().span.start;
        let kind = match self.current_kind() {
            TokenKind::Let => {
                self.advance();
                let name = self.expect_ident()?;
                self.expect(&TokenKind::Eq)?;
                let init = self.parse_expr()?;
                StmtKind::Let { name, init }
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.is_expr_start() {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                StmtKind::Return(value)
            }
            TokenKind::If => return self.parse_if(),
            TokenKind::While => {
                self.advance();
                self.expect(&TokenKind::LParen)?;
                let cond = self.parse_expr()?;
                self.expect(&TokenKind::RParen)?;
                let body = self.parse_block()?;
                return Ok(Stmt {
                    kind: StmtKind::While { cond, body },
                    span: Span::new(start, self.prev_end()),
                });
            }
            TokenKind::Break => {
                self.advance();
                StmtKind::Break
            }
            TokenKind::Continue => {
                self.advance();
                StmtKind::Continue
            }
            TokenKind::Function => {
                return Err(ParseError {
                    span: self.current().span,
                    message: "Functions can only be declared at top level".to_string(),
                    hint: None,
                })
            }
            TokenKind::Ident(name) if matches!(self.peek(1), TokenKind::Eq) => {
                let name = name.clone();
                self.advance();
                self.advance();
                let value = self.parse_expr()?;
                StmtKind::Assign { name, value }
            }
            _ => {
                let expr = self.parse_expr()?;
                if self.match_token(&TokenKind::Eq) {
                    let value = self.parse_expr()?;
                    match expr.kind {
                        ExprKind::Index { target, index } => StmtKind::IndexAssign {
                            target: *target,
                            index: *index,
                            value,
                        },
                        _ => {
                            return Err(ParseError {
                                span: expr.span,
                                message: "Invalid assignment target".to_string(),
                                hint: Some("assign to a variable or an indexed element".to_string()),
                            })
                        }
                    }
                } else {
                    StmtKind::Expr(expr)
                }
            }
        };
        let span = Span::new(start, self.prev_end());
        self.skip_terminator();
        Ok(Stmt { kind, span })
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(&TokenKind::If)?.span.start;
        self.expect(&TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::RParen)?;
        let then_branch = self.parse_block()?;
        let else_branch = if self.match_token(&TokenKind::Else) {
            if self.check(&TokenKind::If) {
                Some(vec![self.parse_if()?])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(Stmt {
            kind: StmtKind::If {
                cond,
                then_branch,
                else_branch,
            },
            span: Span::new(start, self.prev_end()),
        })
    }

    fn is_expr_start(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Int(_)
                | TokenKind::Float(_)
                | TokenKind::String(_)
                | TokenKind::Ident(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::Minus
                | TokenKind::Bang
        )
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_expr_bp(0)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let start = self.current().span.start;
        let mut lhs = self.parse_prefix()?;

        loop {
            if let Some(bp) = self.postfix_bp() {
                if bp < min_bp {
                    break;
                }
                lhs = self.parse_postfix(lhs, start)?;
                continue;
            }

            if let Some((l_bp, r_bp)) = self.infix_bp() {
                if l_bp < min_bp {
                    break;
                }
                let op = self.parse_binop()?;
                let rhs = self.parse_expr_bp(r_bp)?;
                let end = rhs.span.end;
                lhs = Expr {
                    kind: ExprKind::Binary {
                        op,
                        left: Box::new(lhs),
                        right: Box::new(rhs),
                    },
                    span: Span::new(start, end),
                };
                continue;
            }

            break;
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        let token = self.advance();
        let span = token.span;
        let kind = match token.kind {
            TokenKind::Int(n) => ExprKind::Int(n),
            TokenKind::Float(x) => ExprKind::Float(x),
            TokenKind::String(s) => ExprKind::String(s),
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::Null => ExprKind::Null,
            TokenKind::Ident(name) => ExprKind::Ident(name),
            TokenKind::Minus => return self.parse_unary(UnaryOp::Neg, span.start),
            TokenKind::Bang => return self.parse_unary(UnaryOp::Not, span.start),
            TokenKind::LParen => {
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen)?;
                return Ok(inner);
            }
            TokenKind::LBracket => {
                let items = self.parse_args(&TokenKind::RBracket)?;
                return Ok(Expr {
                    kind: ExprKind::List(items),
                    span: Span::new(span.start, self.prev_end()),
                });
            }
            other => {
                return Err(ParseError::expected("expression", &other, span));
            }
        };
        Ok(Expr { kind, span })
    }

    fn parse_unary(&mut self, op: UnaryOp, start: usize) -> Result<Expr, ParseError> {
        let operand = self.parse_expr_bp(PREFIX_BP)?;
        let end = operand.span.end;
        Ok(Expr {
            kind: ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span: Span::new(start, end),
        })
    }

    fn postfix_bp(&self) -> Option<u8> {
        match self.current_kind() {
            TokenKind::LParen | TokenKind::LBracket => Some(POSTFIX_BP),
            _ => None,
        }
    }

    fn parse_postfix(&mut self, lhs: Expr, start: usize) -> Result<Expr, ParseError> {
        if self.match_token(&TokenKind::LParen) {
            let args = self.parse_args(&TokenKind::RParen)?;
            return Ok(Expr {
                kind: ExprKind::Call {
                    callee: Box::new(lhs),
                    args,
                },
                span: Span::new(start, self.prev_end()),
            });
        }
        self.expect(&TokenKind::LBracket)?;
        let index = self.parse_expr()?;
        self.expect(&TokenKind::RBracket)?;
        Ok(Expr {
            kind: ExprKind::Index {
                target: Box::new(lhs),
                index: Box::new(index),
            },
            span: Span::new(start, self.prev_end()),
        })
    }

    /// Comma-separated expressions up to and including `close`.
    fn parse_args(&mut self, close: &TokenKind) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        while !self.check(close) && !self.at_end() {
            args.push(self.parse_expr()?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(close)?;
        Ok(args)
    }

    fn infix_bp(&self) -> Option<(u8, u8)> {
        match self.current_kind() {
            TokenKind::PipePipe => Some((1, 2)),
            TokenKind::AmpAmp => Some((3, 4)),
            TokenKind::EqEq | TokenKind::BangEq => Some((5, 6)),
            TokenKind::Lt | TokenKind::Gt | TokenKind::LtEq | TokenKind::GtEq => Some((7, 8)),
            TokenKind::Plus | TokenKind::Minus => Some((9, 10)),
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some((11, 12)),
            _ => None,
        }
    }

    fn parse_binop(&mut self) -> Result<BinOp, ParseError> {
        let token = self.advance();
        Ok(match token.kind {
            TokenKind::PipePipe => BinOp::Or,
            TokenKind::AmpAmp => BinOp::And,
            TokenKind::EqEq => BinOp::Eq,
            TokenKind::BangEq => BinOp::Ne,
            TokenKind::Lt => BinOp::Lt,
            TokenKind::Gt => BinOp::Gt,
            TokenKind::LtEq => BinOp::Le,
            TokenKind::GtEq => BinOp::Ge,
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            TokenKind::Star => BinOp::Mul,
            TokenKind::Slash => BinOp::Div,
            TokenKind::Percent => BinOp::Mod,
            other => return Err(ParseError::expected("operator", &other, token.span)),
        })
    }
}

const PREFIX_BP: u8 = 13;
const POSTFIX_BP: u8 = 15;

/// Result of parsing: the program plus any errors found.
#[derive(Debug)]
pub struct ParseResult {
    pub program: Program,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A parser error with location and friendly message.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub span: Span,
    pub message: String,
    pub hint: Option<String>,
}

impl ParseError {
    fn expected(expected: &str, found: &TokenKind, span: Span) -> Self {
        Self {
            span,
            message: format!("Expected {}, found {}", expected, found.display_name()),
            hint: None,
        }
    }

    fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
