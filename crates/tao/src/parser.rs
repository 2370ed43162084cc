//! Precedence-climbing recursive-descent parser
//!
//! Statements are dispatched off the leading token; expressions climb an
//! explicit precedence ladder (lowest to highest: assignment, ternary,
//! `||`, `&&`, bitwise, equality, comparison, shift, additive,
//! multiplicative, `**`). `**` and assignment are right-associative.
//!
//! The one genuine ambiguity — lambda head versus parenthesized
//! expression — is resolved by speculative parsing under a lexer frame:
//! try `(ident, ident, ...) =>`, roll the tokens back on failure. Parse
//! errors fail fast; frames are never used for error recovery.

use std::sync::Arc;

use crate::ast::{Block, CaseGroup, Expr, FunctionExpr, Program, Stmt};
use crate::error::{Error, Result};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};
use crate::value::Value;

/// Operator precedence, loosest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Prec {
    Assign,
    Ternary,
    Or,
    And,
    Bitwise,
    Equality,
    Comparison,
    Shift,
    Additive,
    Multiplicative,
    Pow,
    /// Floor used for unary operands: no binary operator binds here
    Unary,
}

fn binary_prec(kind: TokenKind) -> Option<Prec> {
    Some(match kind {
        TokenKind::OrOr => Prec::Or,
        TokenKind::AndAnd => Prec::And,
        TokenKind::BitAnd | TokenKind::BitOr | TokenKind::BitXor | TokenKind::BitAndNot => {
            Prec::Bitwise
        }
        TokenKind::Equal | TokenKind::NotEqual => Prec::Equality,
        TokenKind::GreaterThan
        | TokenKind::GreaterThanOrEqual
        | TokenKind::LessThan
        | TokenKind::LessThanOrEqual => Prec::Comparison,
        TokenKind::LeftShift | TokenKind::RightShift => Prec::Shift,
        TokenKind::Addition | TokenKind::Subtraction => Prec::Additive,
        TokenKind::Multiply | TokenKind::Division | TokenKind::Percent => Prec::Multiplicative,
        TokenKind::StarStar => Prec::Pow,
        _ => return None,
    })
}

/// For a compound assignment token, the underlying binary operator.
fn compound_base(kind: TokenKind) -> Option<TokenKind> {
    Some(match kind {
        TokenKind::PlusAssign => TokenKind::Addition,
        TokenKind::MinusAssign => TokenKind::Subtraction,
        TokenKind::StarAssign => TokenKind::Multiply,
        TokenKind::StarStarAssign => TokenKind::StarStar,
        TokenKind::DivideAssign => TokenKind::Division,
        TokenKind::PercentAssign => TokenKind::Percent,
        TokenKind::LeftShiftAssign => TokenKind::LeftShift,
        TokenKind::RightShiftAssign => TokenKind::RightShift,
        TokenKind::AndAssign => TokenKind::BitAnd,
        TokenKind::OrAssign => TokenKind::BitOr,
        TokenKind::XorAssign => TokenKind::BitXor,
        TokenKind::AndNotAssign => TokenKind::BitAndNot,
        _ => return None,
    })
}

fn is_assign_op(kind: TokenKind) -> bool {
    kind == TokenKind::Assign || compound_base(kind).is_some()
}

/// Parser over a checkpointable token stream.
pub struct Parser {
    lexer: Lexer,
    /// How many breakable constructs enclose the current position; a
    /// `break` is only legal when this is positive. Function bodies
    /// reset it.
    break_count: u32,
}

impl Parser {
    /// Create a parser over the given lexer.
    pub fn new(lexer: Lexer) -> Self {
        Parser {
            lexer,
            break_count: 0,
        }
    }

    /// Parse a whole program. Only `let`, `function`, and `;` are legal
    /// at the top level.
    pub fn parse(&mut self) -> Result<Program> {
        let mut program = Program::default();
        while !self.follow(TokenKind::Eof)? {
            program.stmts.push(self.parse_statement(true)?);
        }
        Ok(program)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Token helpers
    // ═══════════════════════════════════════════════════════════════════

    fn next(&mut self) -> Result<Token> {
        self.lexer.next()
    }

    fn undo(&mut self, token: Token) {
        self.lexer.undo(token);
    }

    fn peek(&mut self) -> Result<Token> {
        self.lexer.peek()
    }

    fn follow(&mut self, kind: TokenKind) -> Result<bool> {
        Ok(self.peek()?.kind == kind)
    }

    fn skip(&mut self, kind: TokenKind) -> Result<bool> {
        if self.follow(kind)? {
            self.next()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        let token = self.next()?;
        if token.kind != kind {
            let expected = match kind {
                TokenKind::Identifier => "`identifier'".to_string(),
                other => format!("`{}'", other.name().unwrap_or("?")),
            };
            return Err(Error::Syntax(format!(
                "unexpected token: {} (expect: {})",
                token, expected
            )));
        }
        Ok(token)
    }

    fn enter(&mut self) {
        self.lexer.push_frame();
    }

    fn leave(&mut self, put_back: bool) {
        self.lexer.pop_frame(put_back);
    }

    // ═══════════════════════════════════════════════════════════════════
    // Statements
    // ═══════════════════════════════════════════════════════════════════

    fn parse_statement(&mut self, global: bool) -> Result<Stmt> {
        let tok = self.peek()?;

        match tok.kind {
            TokenKind::Let => return self.parse_let(),
            TokenKind::Function => return Ok(Stmt::Function(self.parse_function_expression()?)),
            TokenKind::Semicolon => {
                self.next()?;
                return Ok(Stmt::Empty);
            }
            _ => {}
        }

        if global {
            return Err(Error::Syntax(format!(
                "non-global statement at line: {}",
                tok.line
            )));
        }

        match tok.kind {
            TokenKind::Return => self.parse_return(),
            // In statement position `{` opens a block, never an object
            // literal.
            TokenKind::LeftBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::For => self.parse_for(),
            TokenKind::Break => {
                if self.break_count == 0 {
                    return Err(Error::Syntax(
                        "break statement must be in for-loop or switch".to_string(),
                    ));
                }
                self.next()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Break)
            }
            TokenKind::If => self.parse_if(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::Tao => self.parse_tao(),
            _ => {
                let expr = self.parse_expression(Prec::Assign)?;
                if self.skip(TokenKind::Semicolon)? {
                    Ok(Stmt::Expression(expr))
                } else {
                    Err(Error::Syntax(format!(
                        "unknown statement at line: {}",
                        tok.line
                    )))
                }
            }
        }
    }

    fn parse_let(&mut self) -> Result<Stmt> {
        self.expect(TokenKind::Let)?;
        let name = self.expect(TokenKind::Identifier)?.text;
        let init = if self.skip(TokenKind::Assign)? {
            Some(self.parse_expression(Prec::Ternary)?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Let { name, init })
    }

    fn parse_return(&mut self) -> Result<Stmt> {
        self.expect(TokenKind::Return)?;
        let expr = if self.follow(TokenKind::Semicolon)? {
            None
        } else {
            Some(self.parse_expression(Prec::Ternary)?)
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Return(expr))
    }

    fn parse_block(&mut self) -> Result<Block> {
        self.expect(TokenKind::LeftBrace)?;
        let mut block = Block::default();
        while !self.follow(TokenKind::RightBrace)? {
            block.stmts.push(self.parse_statement(false)?);
        }
        self.expect(TokenKind::RightBrace)?;
        Ok(block)
    }

    /// All three headers of a for statement can be omitted:
    /// `for init; test; incr {}`, `for test {}`, `for {}`.
    fn parse_for(&mut self) -> Result<Stmt> {
        self.expect(TokenKind::For)?;

        let mut init = None;
        let mut test = None;
        let mut incr = None;

        // `let` or a leading `;` means the full three-part form; anything
        // except `{` is a bare condition.
        let has_init = if self.follow(TokenKind::Let)? {
            init = Some(Box::new(self.parse_let()?));
            true
        } else if self.follow(TokenKind::Semicolon)? {
            self.next()?;
            true
        } else if !self.follow(TokenKind::LeftBrace)? {
            test = Some(self.parse_expression(Prec::Ternary)?);
            false
        } else {
            false
        };

        if has_init {
            if !self.follow(TokenKind::Semicolon)? {
                test = Some(self.parse_expression(Prec::Ternary)?);
                self.expect(TokenKind::Semicolon)?;
            } else {
                self.next()?;
            }
            if !self.follow(TokenKind::LeftBrace)? {
                incr = Some(self.parse_expression(Prec::Assign)?);
            }
        } else if !self.follow(TokenKind::LeftBrace)? {
            return Err(Error::Syntax("for needs body".to_string()));
        }

        self.break_count += 1;
        let body = self.parse_block()?;
        self.break_count -= 1;

        Ok(Stmt::For {
            init,
            test,
            incr,
            body,
        })
    }

    fn parse_if(&mut self) -> Result<Stmt> {
        self.expect(TokenKind::If)?;
        let cond = self.parse_expression(Prec::Ternary)?;
        let then = self.parse_block()?;
        let otherwise = if self.skip(TokenKind::Else)? {
            match self.peek()?.kind {
                TokenKind::If => Some(Box::new(self.parse_if()?)),
                TokenKind::LeftBrace => Some(Box::new(Stmt::Block(self.parse_block()?))),
                _ => {
                    return Err(Error::Syntax(
                        "else expect if or block to follow".to_string(),
                    ))
                }
            }
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then,
            otherwise,
        })
    }

    fn parse_switch(&mut self) -> Result<Stmt> {
        self.expect(TokenKind::Switch)?;
        let cond = self.parse_expression(Prec::Ternary)?;
        self.expect(TokenKind::LeftBrace)?;

        let mut cases = Vec::new();
        let mut default = None;

        if self.skip(TokenKind::RightBrace)? {
            return Ok(Stmt::Switch {
                cond,
                cases,
                default,
            });
        }

        loop {
            let tok = self.next()?;
            match tok.kind {
                TokenKind::Default => {
                    if default.is_some() {
                        return Err(Error::Syntax("duplicate default".to_string()));
                    }
                    self.expect(TokenKind::Colon)?;
                    default = Some(self.parse_case_body()?);
                }
                TokenKind::Case => {
                    let mut matches = Vec::new();
                    loop {
                        matches.push(self.parse_expression(Prec::Ternary)?);
                        self.skip(TokenKind::Comma)?;
                        if self.skip(TokenKind::Colon)? {
                            break;
                        }
                    }
                    let body = self.parse_case_body()?;
                    cases.push(CaseGroup { matches, body });
                }
                _ => {
                    return Err(Error::Syntax(format!(
                        "unexpected token: {} (expect: `case' or `default')",
                        tok
                    )))
                }
            }
            if self.skip(TokenKind::RightBrace)? {
                break;
            }
        }

        Ok(Stmt::Switch {
            cond,
            cases,
            default,
        })
    }

    fn parse_case_body(&mut self) -> Result<Block> {
        let mut block = Block::default();
        self.break_count += 1;
        loop {
            let kind = self.peek()?.kind;
            if matches!(
                kind,
                TokenKind::Case | TokenKind::Default | TokenKind::RightBrace
            ) {
                break;
            }
            match self.parse_statement(false) {
                Ok(stmt) => block.stmts.push(stmt),
                Err(err) => {
                    self.break_count -= 1;
                    return Err(err);
                }
            }
        }
        self.break_count -= 1;
        Ok(block)
    }

    fn parse_tao(&mut self) -> Result<Stmt> {
        self.expect(TokenKind::Tao)?;
        let expr = self.parse_expression(Prec::Assign)?;
        let stmt = match expr {
            Expr::Call { callee, args } => Stmt::Tao {
                callee: *callee,
                args,
            },
            _ => {
                return Err(Error::Syntax(
                    "tao statement needs a function call".to_string(),
                ))
            }
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(stmt)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Expressions
    // ═══════════════════════════════════════════════════════════════════

    fn parse_expression(&mut self, min: Prec) -> Result<Expr> {
        let mut left = self.parse_prefix()?;

        loop {
            let op = self.next()?;

            if is_assign_op(op.kind) {
                if Prec::Assign < min {
                    self.undo(op);
                    break;
                }
                return self.parse_assignment(left, op.kind);
            }

            match op.kind {
                TokenKind::Question => {
                    if Prec::Ternary < min {
                        self.undo(op);
                        break;
                    }
                    return self.parse_ternary(left);
                }
                TokenKind::Increment | TokenKind::Decrement => {
                    // Postfix; binds tightest and ends the expression.
                    return Ok(Expr::IncDec {
                        op: op.kind,
                        prefix: false,
                        target: Box::new(left),
                    });
                }
                kind => match binary_prec(kind) {
                    Some(prec) if prec >= min => {
                        // `**` is right-associative: its right operand
                        // parses at the same level.
                        let next_min = match kind {
                            TokenKind::StarStar => Prec::Pow,
                            _ => tighter(prec),
                        };
                        let right = self.parse_expression(next_min)?;
                        left = Expr::Binary {
                            left: Box::new(left),
                            op: kind,
                            right: Box::new(right),
                        };
                    }
                    _ => {
                        self.undo(op);
                        break;
                    }
                },
            }
        }

        Ok(left)
    }

    fn parse_assignment(&mut self, left: Expr, op: TokenKind) -> Result<Expr> {
        if !left.is_assignable() {
            return Err(Error::Syntax(
                "left side of assignment is not assignable".to_string(),
            ));
        }

        // Ternary floor forbids chained assignment on the right.
        let right = self.parse_expression(Prec::Ternary)?;

        let value = match compound_base(op) {
            // `lhs OP= rhs` desugars to `lhs = lhs OP rhs`.
            Some(base) => Expr::Binary {
                left: Box::new(left.clone()),
                op: base,
                right: Box::new(right),
            },
            None => right,
        };

        Ok(Expr::Assign {
            target: Box::new(left),
            value: Box::new(value),
        })
    }

    fn parse_ternary(&mut self, cond: Expr) -> Result<Expr> {
        // Nested ternaries parse, then get rejected: the error message
        // beats a confusing cascade.
        let then = self.parse_expression(Prec::Ternary)?;
        self.expect(TokenKind::Colon)?;
        let otherwise = self.parse_expression(Prec::Ternary)?;
        if matches!(then, Expr::Ternary { .. }) || matches!(otherwise, Expr::Ternary { .. }) {
            return Err(Error::Syntax("nested ?: is not allowed".to_string()));
        }
        Ok(Expr::Ternary {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn parse_prefix(&mut self) -> Result<Expr> {
        let tok = self.peek()?;
        match tok.kind {
            TokenKind::Not
            | TokenKind::BitXor
            | TokenKind::Addition
            | TokenKind::Subtraction => {
                self.next()?;
                let operand = self.parse_expression(Prec::Unary)?;
                Ok(Expr::Unary {
                    op: tok.kind,
                    operand: Box::new(operand),
                })
            }
            TokenKind::Increment | TokenKind::Decrement => {
                self.next()?;
                let target = self.parse_expression(Prec::Unary)?;
                Ok(Expr::IncDec {
                    op: tok.kind,
                    prefix: true,
                    target: Box::new(target),
                })
            }
            TokenKind::New => {
                self.next()?;
                let expr = self.parse_primary()?;
                let new_expr = match expr {
                    Expr::Call { callee, args } => Expr::New { callee, args },
                    _ => {
                        return Err(Error::Syntax(
                            "`new' needs a constructor call".to_string(),
                        ))
                    }
                };
                self.parse_postfix_chain(new_expr)
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let tok = self.next()?;

        let expr = match tok.kind {
            TokenKind::Nil => Expr::Value(Value::Nil),
            TokenKind::Boolean => Expr::Value(Value::Boolean(tok.text == "true")),
            TokenKind::Number => Expr::Value(Value::Number(tok.num)),
            TokenKind::Str => Expr::Value(Value::string(tok.text)),
            TokenKind::LeftParen => {
                self.undo(tok);
                if let Some(lambda) = self.try_parse_lambda(false)? {
                    return Ok(lambda);
                }
                self.next()?;
                let inner = self.parse_expression(Prec::Ternary)?;
                self.expect(TokenKind::RightParen)?;
                inner
            }
            TokenKind::Identifier => {
                if self.follow(TokenKind::Lambda)? {
                    self.undo(tok);
                    // Must-mode either yields a lambda or errors.
                    return match self.try_parse_lambda(true)? {
                        Some(lambda) => Ok(lambda),
                        None => Err(Error::Internal("lambda expected".to_string())),
                    };
                }
                Expr::Value(Value::variable(tok.text))
            }
            TokenKind::Function => {
                self.undo(tok);
                Expr::Function(self.parse_function_expression()?)
            }
            // In expression position `{` opens an object literal.
            TokenKind::LeftBrace => {
                self.undo(tok);
                self.parse_object_literal()?
            }
            TokenKind::LeftBracket => {
                self.undo(tok);
                self.parse_array_literal()?
            }
            _ => {
                let line = tok.line;
                self.undo(tok);
                return Err(Error::Syntax(format!(
                    "unknown expression at line: {}",
                    line
                )));
            }
        };

        self.parse_postfix_chain(expr)
    }

    fn parse_postfix_chain(&mut self, mut expr: Expr) -> Result<Expr> {
        loop {
            if let Some(index) = self.try_parse_index(&mut expr)? {
                expr = index;
                continue;
            }
            if let Some(call) = self.try_parse_call(&mut expr)? {
                expr = call;
                continue;
            }
            break;
        }
        Ok(expr)
    }

    /// Speculatively parse a lambda head. On failure the consumed tokens
    /// roll back and `None` is returned (or an error when `must` holds).
    fn try_parse_lambda(&mut self, must: bool) -> Result<Option<Expr>> {
        self.enter();

        let mut params = Vec::new();

        if self.follow(TokenKind::LeftParen)? {
            self.next()?;
            loop {
                if self.follow(TokenKind::RightParen)? {
                    break;
                }
                if self.follow(TokenKind::Identifier)? {
                    params.push(self.next()?.text);
                } else {
                    return self.lambda_rollback(must);
                }
                if self.skip(TokenKind::Comma)? {
                    continue;
                }
                if self.follow(TokenKind::RightParen)? {
                    break;
                }
                return self.lambda_rollback(must);
            }
            self.next()?; // eat `)`
        } else {
            if !self.follow(TokenKind::Identifier)? {
                return self.lambda_rollback(must);
            }
            params.push(self.next()?.text);
        }

        if !self.follow(TokenKind::Lambda)? {
            return self.lambda_rollback(must);
        }

        // The head is a lambda for sure: commit the frame.
        self.leave(false);
        self.next()?; // eat `=>`

        let body = if self.follow(TokenKind::LeftBrace)? {
            // A lambda body is a function body: breaks don't reach out.
            let saved = self.break_count;
            self.break_count = 0;
            let block = self.parse_block();
            self.break_count = saved;
            block?
        } else {
            let expr = self.parse_expression(Prec::Ternary)?;
            Block {
                stmts: vec![Stmt::Return(Some(expr))],
            }
        };

        Ok(Some(Expr::Function(Arc::new(FunctionExpr {
            name: None,
            params,
            body,
        }))))
    }

    fn lambda_rollback(&mut self, must: bool) -> Result<Option<Expr>> {
        self.leave(true);
        if must {
            Err(Error::Syntax("bad lambda expression".to_string()))
        } else {
            Ok(None)
        }
    }

    fn try_parse_index(&mut self, left: &mut Expr) -> Result<Option<Expr>> {
        let tok = self.next()?;
        match tok.kind {
            TokenKind::Dot => {
                let key = self.next()?;
                if key.kind != TokenKind::Identifier {
                    return Err(Error::Syntax(format!("unexpected token: {}", key)));
                }
                Ok(Some(Expr::Index {
                    target: Box::new(std::mem::replace(left, Expr::Value(Value::Nil))),
                    key: Box::new(Expr::Value(Value::string(key.text))),
                }))
            }
            TokenKind::LeftBracket => {
                let key = self.parse_expression(Prec::Ternary)?;
                self.expect(TokenKind::RightBracket)?;
                Ok(Some(Expr::Index {
                    target: Box::new(std::mem::replace(left, Expr::Value(Value::Nil))),
                    key: Box::new(key),
                }))
            }
            _ => {
                self.undo(tok);
                Ok(None)
            }
        }
    }

    fn try_parse_call(&mut self, left: &mut Expr) -> Result<Option<Expr>> {
        let paren = self.next()?;
        if paren.kind != TokenKind::LeftParen {
            self.undo(paren);
            return Ok(None);
        }

        let mut args = Vec::new();
        if !self.follow(TokenKind::RightParen)? {
            loop {
                args.push(self.parse_expression(Prec::Ternary)?);
                let sep = self.next()?;
                match sep.kind {
                    TokenKind::Comma => continue,
                    TokenKind::RightParen => {
                        self.undo(sep);
                        break;
                    }
                    _ => return Err(Error::Syntax(format!("unexpected token: {}", sep))),
                }
            }
        }
        self.expect(TokenKind::RightParen)?;

        Ok(Some(Expr::Call {
            callee: Box::new(std::mem::replace(left, Expr::Value(Value::Nil))),
            args,
        }))
    }

    fn parse_function_expression(&mut self) -> Result<Arc<FunctionExpr>> {
        self.expect(TokenKind::Function)?;

        let name = if self.follow(TokenKind::Identifier)? {
            Some(self.next()?.text)
        } else {
            None
        };

        self.expect(TokenKind::LeftParen)?;
        let mut params = Vec::new();
        if !self.follow(TokenKind::RightParen)? {
            loop {
                params.push(self.expect(TokenKind::Identifier)?.text);
                let sep = self.next()?;
                match sep.kind {
                    TokenKind::Comma => continue,
                    TokenKind::RightParen => {
                        self.undo(sep);
                        break;
                    }
                    _ => return Err(Error::Syntax(format!("unexpected token: {}", sep))),
                }
            }
        }
        self.expect(TokenKind::RightParen)?;

        if !self.follow(TokenKind::LeftBrace)? {
            return Err(Error::Syntax("function needs a body".to_string()));
        }

        // A new function body starts with a clean break discipline.
        let saved = self.break_count;
        self.break_count = 0;
        let body = self.parse_block();
        self.break_count = saved;

        Ok(Arc::new(FunctionExpr {
            name,
            params,
            body: body?,
        }))
    }

    fn parse_object_literal(&mut self) -> Result<Expr> {
        self.expect(TokenKind::LeftBrace)?;
        let mut props = Vec::new();
        loop {
            if self.follow(TokenKind::RightBrace)? {
                break;
            }

            let key_tok = self.next()?;
            let key = match key_tok.kind {
                TokenKind::Str | TokenKind::Identifier => key_tok.text,
                _ => {
                    return Err(Error::Type(format!(
                        "unsupported key type: {}",
                        key_tok
                    )))
                }
            };

            self.expect(TokenKind::Colon)?;
            let value = self.parse_expression(Prec::Ternary)?;
            props.push((key, value));

            // A trailing comma is allowed.
            self.skip(TokenKind::Comma)?;
            if self.follow(TokenKind::RightBrace)? {
                break;
            }
        }
        self.expect(TokenKind::RightBrace)?;
        Ok(Expr::ObjectLiteral(props))
    }

    fn parse_array_literal(&mut self) -> Result<Expr> {
        self.expect(TokenKind::LeftBracket)?;
        let mut elems = Vec::new();
        loop {
            if self.follow(TokenKind::RightBracket)? {
                break;
            }
            elems.push(self.parse_expression(Prec::Ternary)?);
            self.skip(TokenKind::Comma)?;
            if self.follow(TokenKind::RightBracket)? {
                break;
            }
        }
        self.expect(TokenKind::RightBracket)?;
        Ok(Expr::ArrayLiteral(elems))
    }
}

fn tighter(prec: Prec) -> Prec {
    match prec {
        Prec::Assign => Prec::Ternary,
        Prec::Ternary => Prec::Or,
        Prec::Or => Prec::And,
        Prec::And => Prec::Bitwise,
        Prec::Bitwise => Prec::Equality,
        Prec::Equality => Prec::Comparison,
        Prec::Comparison => Prec::Shift,
        Prec::Shift => Prec::Additive,
        Prec::Additive => Prec::Multiplicative,
        Prec::Multiplicative => Prec::Pow,
        Prec::Pow | Prec::Unary => Prec::Unary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_source(src: &str) -> Result<Program> {
        Parser::new(Lexer::new(src)).parse()
    }

    fn parse_expr(src: &str) -> Result<Expr> {
        let mut parser = Parser::new(Lexer::new(src));
        parser.parse_expression(Prec::Assign)
    }

    #[test]
    fn test_top_level_accepts_let_function_semicolon() {
        assert!(parse_source("let x = 1; function f() {} ;").is_ok());
    }

    #[test]
    fn test_top_level_rejects_other_statements() {
        assert!(matches!(
            parse_source("return 1;"),
            Err(Error::Syntax(msg)) if msg.contains("non-global")
        ));
        assert!(parse_source("f();").is_err());
    }

    #[test]
    fn test_precedence_additive_vs_multiplicative() {
        let expr = parse_expr("1 + 2 * 3").unwrap();
        match expr {
            Expr::Binary { op, right, .. } => {
                assert_eq!(op, TokenKind::Addition);
                assert!(matches!(
                    *right,
                    Expr::Binary {
                        op: TokenKind::Multiply,
                        ..
                    }
                ));
            }
            other => panic!("expected binary, got {:?}", other),
        }
    }

    #[test]
    fn test_logical_or_binds_looser_than_and() {
        let expr = parse_expr("a || b && c").unwrap();
        match expr {
            Expr::Binary { op, right, .. } => {
                assert_eq!(op, TokenKind::OrOr);
                assert!(matches!(
                    *right,
                    Expr::Binary {
                        op: TokenKind::AndAnd,
                        ..
                    }
                ));
            }
            other => panic!("expected binary, got {:?}", other),
        }
    }

    #[test]
    fn test_pow_is_right_associative() {
        let expr = parse_expr("2 ** 3 ** 2").unwrap();
        match expr {
            Expr::Binary { op, left, right } => {
                assert_eq!(op, TokenKind::StarStar);
                assert!(matches!(*left, Expr::Value(Value::Number(2))));
                assert!(matches!(
                    *right,
                    Expr::Binary {
                        op: TokenKind::StarStar,
                        ..
                    }
                ));
            }
            other => panic!("expected binary, got {:?}", other),
        }
    }

    #[test]
    fn test_lambda_single_param() {
        let expr = parse_expr("x => x + 1").unwrap();
        match expr {
            Expr::Function(func) => {
                assert_eq!(func.params, vec!["x"]);
                assert!(func.name.is_none());
            }
            other => panic!("expected lambda, got {:?}", other),
        }
    }

    #[test]
    fn test_lambda_param_list() {
        let expr = parse_expr("(a, b) => a + b").unwrap();
        match expr {
            Expr::Function(func) => assert_eq!(func.params, vec!["a", "b"]),
            other => panic!("expected lambda, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_param_lambda() {
        let expr = parse_expr("() => 1").unwrap();
        assert!(matches!(expr, Expr::Function(func) if func.params.is_empty()));
    }

    #[test]
    fn test_paren_expression_is_not_lambda() {
        let expr = parse_expr("(1 + 2) * 3").unwrap();
        assert!(matches!(
            expr,
            Expr::Binary {
                op: TokenKind::Multiply,
                ..
            }
        ));
    }

    #[test]
    fn test_paren_variable_then_call() {
        // `(f)(x)` must roll back the lambda attempt and end up as a call.
        let expr = parse_expr("(f)(3)").unwrap();
        assert!(matches!(expr, Expr::Call { .. }));
    }

    #[test]
    fn test_nested_ternary_rejected() {
        assert!(matches!(
            parse_expr("a ? b ? c : d : e"),
            Err(Error::Syntax(msg)) if msg.contains("nested")
        ));
        assert!(parse_expr("a ? b : c ? d : e").is_err());
    }

    #[test]
    fn test_compound_assignment_desugars() {
        let expr = parse_expr("x += 2").unwrap();
        match expr {
            Expr::Assign { value, .. } => {
                assert!(matches!(
                    *value,
                    Expr::Binary {
                        op: TokenKind::Addition,
                        ..
                    }
                ));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_target_must_be_assignable() {
        assert!(matches!(
            parse_expr("1 = 2"),
            Err(Error::Syntax(msg)) if msg.contains("not assignable")
        ));
        assert!(parse_expr("f() = 2").is_err());
        assert!(parse_expr("a.b = 2").is_ok());
        assert!(parse_expr("a[0] = 2").is_ok());
    }

    #[test]
    fn test_break_outside_loop_rejected() {
        let err = parse_source("function f() { break; }").unwrap_err();
        assert!(err.to_string().contains("break statement"));
    }

    #[test]
    fn test_break_inside_loop_and_switch() {
        assert!(parse_source("function f() { for { break; } }").is_ok());
        assert!(parse_source("function f() { switch 1 { case 1: break; } }").is_ok());
    }

    #[test]
    fn test_break_does_not_cross_function_boundary() {
        // A lambda body resets the break discipline.
        let err = parse_source("function f() { for { let g = () => { break; }; } }").unwrap_err();
        assert!(err.to_string().contains("break statement"));
    }

    #[test]
    fn test_for_forms() {
        assert!(parse_source("function f() { for let i = 0; i < 3; i++ { } }").is_ok());
        assert!(parse_source("function f() { for ;; { break; } }").is_ok());
        assert!(parse_source("function f() { let i = 0; for i < 3 { i++; } }").is_ok());
        assert!(parse_source("function f() { for { break; } }").is_ok());
    }

    #[test]
    fn test_switch_duplicate_default_rejected() {
        let err =
            parse_source("function f() { switch 1 { default: default: } }").unwrap_err();
        assert!(err.to_string().contains("duplicate default"));
    }

    #[test]
    fn test_switch_multi_expression_case() {
        let program = parse_source("function f(x) { switch x { case 1, 2: return 1; } }");
        assert!(program.is_ok());
    }

    #[test]
    fn test_object_literal_keys() {
        assert!(parse_expr("{a: 1, \"b c\": 2}").is_ok());
        assert!(matches!(parse_expr("{3: 1}"), Err(Error::Type(_))));
    }

    #[test]
    fn test_block_vs_object_literal() {
        // Statement position: a block. Expression position: an object.
        assert!(parse_source("function f() { { let x = 1; } }").is_ok());
        assert!(parse_source("function f() { let o = {a: 1}; }").is_ok());
    }

    #[test]
    fn test_member_and_index_chains() {
        let expr = parse_expr("a.b[0].c(1)(2)").unwrap();
        assert!(matches!(expr, Expr::Call { .. }));
    }

    #[test]
    fn test_tao_statement_needs_call() {
        assert!(parse_source("function f() { tao g(); }").is_ok());
        let err = parse_source("function f() { tao 42; }").unwrap_err();
        assert!(err.to_string().contains("tao"));
    }

    #[test]
    fn test_new_expression() {
        let expr = parse_expr("new Promise(f)").unwrap();
        assert!(matches!(expr, Expr::New { .. }));
        assert!(parse_expr("new 42").is_err());
    }

    #[test]
    fn test_postfix_increment() {
        let expr = parse_expr("i++").unwrap();
        assert!(matches!(
            expr,
            Expr::IncDec {
                op: TokenKind::Increment,
                prefix: false,
                ..
            }
        ));
    }

    #[test]
    fn test_prefix_increment() {
        let expr = parse_expr("++i").unwrap();
        assert!(matches!(
            expr,
            Expr::IncDec {
                op: TokenKind::Increment,
                prefix: true,
                ..
            }
        ));
    }

    #[test]
    fn test_unary_chain() {
        assert!(parse_expr("!!x").is_ok());
        assert!(parse_expr("-x ** 2").is_ok());
        assert!(parse_expr("^x").is_ok());
    }

    #[test]
    fn test_unmatched_braces_fail() {
        assert!(parse_source("function f() {").is_err());
        assert!(parse_expr("(1 + 2").is_err());
        assert!(parse_expr("[1, 2").is_err());
    }
}
