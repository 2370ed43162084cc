//! Byte-stream lexer with undo, peek, and checkpointed look-ahead frames
//!
//! The lexer hands out one token at a time. Consumers can push a token back
//! (`undo`), peek, or open a checkpoint frame: every token consumed while a
//! frame is active is recorded, and `pop_frame(true)` restores the recorded
//! tokens to the head of the stream. Frames nest, which is what lets the
//! parser speculatively try a lambda head and fall back to a parenthesized
//! expression.

use std::collections::VecDeque;

use tracing::trace;

use crate::error::{Error, Result};
use crate::token::{Token, TokenKind};

/// Tokenizer over an in-memory byte stream.
pub struct Lexer {
    input: Vec<u8>,
    pos: usize,
    line: u32,
    col: u32,
    /// Tokens pushed back onto the head of the stream
    buf: VecDeque<Token>,
    /// Active look-ahead frames, innermost last
    frames: Vec<Vec<Token>>,
}

impl Lexer {
    /// Create a lexer over the given source bytes.
    pub fn new(input: impl Into<Vec<u8>>) -> Self {
        Lexer {
            input: input.into(),
            pos: 0,
            line: 1,
            col: 1,
            buf: VecDeque::new(),
            frames: Vec::new(),
        }
    }

    /// Advance and return the next token.
    ///
    /// The pushback buffer is consulted first; at end of input an EOF token
    /// is returned indefinitely.
    pub fn next(&mut self) -> Result<Token> {
        let token = match self.buf.pop_front() {
            Some(tok) => tok,
            None => self.scan()?,
        };
        if let Some(frame) = self.frames.last_mut() {
            frame.push(token.clone());
        }
        Ok(token)
    }

    /// Push one token back onto the head of the stream.
    pub fn undo(&mut self, token: Token) {
        if let Some(frame) = self.frames.last_mut() {
            // An undone token was necessarily the last one recorded.
            if frame.pop().is_none() {
                debug_assert!(false, "undo with empty frame");
            }
        }
        self.buf.push_front(token);
    }

    /// Return the next token without consuming it.
    pub fn peek(&mut self) -> Result<Token> {
        let token = self.next()?;
        self.undo(token.clone());
        Ok(token)
    }

    /// Open a look-ahead frame.
    pub fn push_frame(&mut self) {
        trace!(depth = self.frames.len() + 1, "lexer frame open");
        self.frames.push(Vec::new());
    }

    /// Close the innermost frame.
    ///
    /// With `put_back`, every token consumed under the frame is restored to
    /// the head of the stream (rollback); otherwise the record is discarded
    /// (commit).
    pub fn pop_frame(&mut self, put_back: bool) {
        let frame = self
            .frames
            .pop()
            .expect("pop_frame without matching push_frame");
        trace!(depth = self.frames.len(), put_back, "lexer frame close");
        if put_back {
            // Tokens are recorded only by the innermost frame, so restoring
            // them re-exposes them to the enclosing frame as fresh reads.
            for token in frame.into_iter().rev() {
                self.buf.push_front(token);
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Scanning
    // ═══════════════════════════════════════════════════════════════════

    fn scan(&mut self) -> Result<Token> {
        loop {
            let (line, col) = (self.line, self.col);
            let ch = match self.bump() {
                Some(ch) => ch,
                None => return Ok(self.locate(Token::eof(), line, col)),
            };

            if ch.is_ascii_digit() {
                let token = self.read_number(ch)?;
                return Ok(self.locate(token, line, col));
            }
            if ch.is_ascii_alphabetic() || ch == b'_' {
                let token = self.read_identifier(ch)?;
                return Ok(self.locate(token, line, col));
            }
            if ch == b'"' {
                let token = self.read_string()?;
                return Ok(self.locate(token, line, col));
            }

            let kind = match ch {
                b' ' | b'\t' | b'\r' | b'\n' => continue,
                b'(' => TokenKind::LeftParen,
                b')' => TokenKind::RightParen,
                b'[' => TokenKind::LeftBracket,
                b']' => TokenKind::RightBracket,
                b'{' => TokenKind::LeftBrace,
                b'}' => TokenKind::RightBrace,
                b'.' => TokenKind::Dot,
                b',' => TokenKind::Comma,
                b':' => TokenKind::Colon,
                b'?' => TokenKind::Question,
                b';' => TokenKind::Semicolon,
                b'+' => self.two_two(b'+', b'=', TokenKind::Increment, TokenKind::PlusAssign, TokenKind::Addition),
                b'-' => self.two_two(b'-', b'=', TokenKind::Decrement, TokenKind::MinusAssign, TokenKind::Subtraction),
                b'*' => {
                    if self.eat(b'*') {
                        self.two(b'=', TokenKind::StarStarAssign, TokenKind::StarStar)
                    } else {
                        self.two(b'=', TokenKind::StarAssign, TokenKind::Multiply)
                    }
                }
                b'/' => {
                    if self.eat(b'/') {
                        self.skip_comment();
                        continue;
                    }
                    self.two(b'=', TokenKind::DivideAssign, TokenKind::Division)
                }
                b'%' => self.two(b'=', TokenKind::PercentAssign, TokenKind::Percent),
                b'=' => self.two_two(b'=', b'>', TokenKind::Equal, TokenKind::Lambda, TokenKind::Assign),
                b'>' => {
                    if self.eat(b'=') {
                        TokenKind::GreaterThanOrEqual
                    } else if self.eat(b'>') {
                        self.two(b'=', TokenKind::RightShiftAssign, TokenKind::RightShift)
                    } else {
                        TokenKind::GreaterThan
                    }
                }
                b'<' => {
                    if self.eat(b'=') {
                        TokenKind::LessThanOrEqual
                    } else if self.eat(b'<') {
                        self.two(b'=', TokenKind::LeftShiftAssign, TokenKind::LeftShift)
                    } else {
                        TokenKind::LessThan
                    }
                }
                b'!' => self.two(b'=', TokenKind::NotEqual, TokenKind::Not),
                b'&' => {
                    if self.eat(b'&') {
                        TokenKind::AndAnd
                    } else if self.eat(b'=') {
                        TokenKind::AndAssign
                    } else if self.eat(b'^') {
                        self.two(b'=', TokenKind::AndNotAssign, TokenKind::BitAndNot)
                    } else {
                        TokenKind::BitAnd
                    }
                }
                b'|' => self.two_two(b'|', b'=', TokenKind::OrOr, TokenKind::OrAssign, TokenKind::BitOr),
                b'^' => self.two(b'=', TokenKind::XorAssign, TokenKind::BitXor),
                _ => {
                    return Err(Error::Syntax(format!(
                        "unhandled character `{}' at line:{},col:{}",
                        ch as char, line, col
                    )))
                }
            };

            return Ok(self.locate(Token::new(kind), line, col));
        }
    }

    fn locate(&self, mut token: Token, line: u32, col: u32) -> Token {
        token.line = line;
        token.col = col;
        token
    }

    /// `try longest`: returns `long1` on `ch1`, `long2` on `ch2`, else `short`.
    fn two_two(&mut self, ch1: u8, ch2: u8, long1: TokenKind, long2: TokenKind, short: TokenKind) -> TokenKind {
        if self.eat(ch1) {
            long1
        } else if self.eat(ch2) {
            long2
        } else {
            short
        }
    }

    /// Returns `long` if the next byte is `ch`, else `short`.
    fn two(&mut self, ch: u8, long: TokenKind, short: TokenKind) -> TokenKind {
        if self.eat(ch) {
            long
        } else {
            short
        }
    }

    fn read_number(&mut self, first: u8) -> Result<Token> {
        let mut num = (first - b'0') as i64;
        while let Some(ch) = self.peek_byte() {
            if ch.is_ascii_digit() {
                self.bump();
                num = num.wrapping_mul(10).wrapping_add((ch - b'0') as i64);
            } else {
                break;
            }
        }
        self.check_follow()?;
        let mut token = Token::new(TokenKind::Number);
        token.num = num;
        Ok(token)
    }

    fn read_identifier(&mut self, first: u8) -> Result<Token> {
        let mut name = String::new();
        name.push(first as char);
        while let Some(ch) = self.peek_byte() {
            if ch.is_ascii_alphanumeric() || ch == b'_' {
                self.bump();
                name.push(ch as char);
            } else {
                break;
            }
        }
        self.check_follow()?;
        let kind = TokenKind::keyword(&name).unwrap_or(TokenKind::Identifier);
        let mut token = Token::new(kind);
        token.text = name;
        Ok(token)
    }

    fn read_string(&mut self) -> Result<Token> {
        // The opening quote has been consumed; string bytes are copied raw.
        let mut text = Vec::new();
        loop {
            match self.bump() {
                Some(b'"') => break,
                Some(ch) => text.push(ch),
                None => {
                    return Err(Error::Syntax(format!(
                        "unterminated string at line:{},col:{}",
                        self.line, self.col
                    )))
                }
            }
        }
        self.check_follow()?;
        let mut token = Token::new(TokenKind::Str);
        token.text = String::from_utf8_lossy(&text).into_owned();
        Ok(token)
    }

    fn skip_comment(&mut self) {
        while let Some(ch) = self.bump() {
            if ch == b'\n' {
                break;
            }
        }
    }

    /// Reject an alphanumeric or `"` immediately following a literal or
    /// identifier, so inputs like `123abc` and `"a""b"` fail at lex time.
    fn check_follow(&mut self) -> Result<()> {
        if let Some(ch) = self.peek_byte() {
            if ch.is_ascii_alphanumeric() || ch == b'"' {
                return Err(Error::Syntax(format!(
                    "unexpected follow character `{}' at line:{},col:{}",
                    ch as char, self.line, self.col
                )));
            }
        }
        Ok(())
    }

    fn peek_byte(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn eat(&mut self, ch: u8) -> bool {
        if self.peek_byte() == Some(ch) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn bump(&mut self) -> Option<u8> {
        let ch = self.peek_byte()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next().expect("lex failed");
            if tok.kind == TokenKind::Eof {
                break;
            }
            out.push(tok.kind);
        }
        out
    }

    #[test]
    fn test_operators_longest_match() {
        use TokenKind::*;
        assert_eq!(kinds("**= ** *= *"), vec![StarStarAssign, StarStar, StarAssign, Multiply]);
        assert_eq!(kinds("&^= &^ &= & &&"), vec![AndNotAssign, BitAndNot, AndAssign, BitAnd, AndAnd]);
        assert_eq!(kinds("=> == ="), vec![Lambda, Equal, Assign]);
        assert_eq!(kinds("<<= << <= <"), vec![LeftShiftAssign, LeftShift, LessThanOrEqual, LessThan]);
        assert_eq!(kinds(">>= >> >= >"), vec![RightShiftAssign, RightShift, GreaterThanOrEqual, GreaterThan]);
        assert_eq!(kinds("++ += +"), vec![Increment, PlusAssign, Addition]);
        assert_eq!(kinds("-- -= -"), vec![Decrement, MinusAssign, Subtraction]);
        assert_eq!(kinds("|| |= |"), vec![OrOr, OrAssign, BitOr]);
        assert_eq!(kinds("^= ^"), vec![XorAssign, BitXor]);
        assert_eq!(kinds("!= !"), vec![NotEqual, Not]);
    }

    #[test]
    fn test_keywords_and_identifiers() {
        use TokenKind::*;
        assert_eq!(
            kinds("let x = tao new function"),
            vec![Let, Identifier, Assign, Tao, New, Function]
        );
        let mut lexer = Lexer::new("_under2");
        let tok = lexer.next().unwrap();
        assert_eq!(tok.kind, Identifier);
        assert_eq!(tok.text, "_under2");
    }

    #[test]
    fn test_number_and_string_literals() {
        let mut lexer = Lexer::new(r#"42 "hi there""#);
        let num = lexer.next().unwrap();
        assert_eq!(num.kind, TokenKind::Number);
        assert_eq!(num.num, 42);
        let s = lexer.next().unwrap();
        assert_eq!(s.kind, TokenKind::Str);
        assert_eq!(s.text, "hi there");
    }

    #[test]
    fn test_comment_consumes_line() {
        assert_eq!(
            kinds("1 // all of this vanishes ++ --\n2"),
            vec![TokenKind::Number, TokenKind::Number]
        );
    }

    #[test]
    fn test_eof_repeats() {
        let mut lexer = Lexer::new("x");
        lexer.next().unwrap();
        for _ in 0..3 {
            assert_eq!(lexer.next().unwrap().kind, TokenKind::Eof);
        }
    }

    #[test]
    fn test_follow_check() {
        let mut lexer = Lexer::new("123abc");
        assert!(lexer.next().is_err());

        let mut lexer = Lexer::new(r#""a""b""#);
        assert!(lexer.next().is_err());
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("\"oops");
        assert!(matches!(lexer.next(), Err(Error::Syntax(_))));
    }

    #[test]
    fn test_line_and_col_tracking() {
        let mut lexer = Lexer::new("a\n  b");
        let a = lexer.next().unwrap();
        assert_eq!((a.line, a.col), (1, 1));
        let b = lexer.next().unwrap();
        assert_eq!((b.line, b.col), (2, 3));
    }

    #[test]
    fn test_undo_and_peek() {
        let mut lexer = Lexer::new("a b");
        let a = lexer.next().unwrap();
        lexer.undo(a.clone());
        assert_eq!(lexer.peek().unwrap(), a);
        assert_eq!(lexer.next().unwrap(), a);
        assert_eq!(lexer.next().unwrap().text, "b");
    }

    #[test]
    fn test_frame_rollback_restores_stream() {
        let mut lexer = Lexer::new("a b c");

        lexer.push_frame();
        assert_eq!(lexer.next().unwrap().text, "a");
        assert_eq!(lexer.next().unwrap().text, "b");
        lexer.pop_frame(true);

        // The stream reads as if the frame had never been opened.
        assert_eq!(lexer.next().unwrap().text, "a");
        assert_eq!(lexer.next().unwrap().text, "b");
        assert_eq!(lexer.next().unwrap().text, "c");
    }

    #[test]
    fn test_frame_commit_discards_record() {
        let mut lexer = Lexer::new("a b");
        lexer.push_frame();
        assert_eq!(lexer.next().unwrap().text, "a");
        lexer.pop_frame(false);
        assert_eq!(lexer.next().unwrap().text, "b");
    }

    #[test]
    fn test_nested_frames() {
        let mut lexer = Lexer::new("a b c d");

        lexer.push_frame();
        assert_eq!(lexer.next().unwrap().text, "a");

        lexer.push_frame();
        assert_eq!(lexer.next().unwrap().text, "b");
        assert_eq!(lexer.next().unwrap().text, "c");
        lexer.pop_frame(true); // roll back b, c

        assert_eq!(lexer.next().unwrap().text, "b");
        lexer.pop_frame(true); // roll back a, b

        assert_eq!(lexer.next().unwrap().text, "a");
        assert_eq!(lexer.next().unwrap().text, "b");
        assert_eq!(lexer.next().unwrap().text, "c");
        assert_eq!(lexer.next().unwrap().text, "d");
    }

    #[test]
    fn test_undo_inside_frame() {
        let mut lexer = Lexer::new("a b");
        lexer.push_frame();
        let a = lexer.next().unwrap();
        lexer.undo(a);
        lexer.pop_frame(true); // nothing net-consumed
        assert_eq!(lexer.next().unwrap().text, "a");
    }
}
