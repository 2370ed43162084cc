//! Lexer behavior through the public surface

use tao::{Lexer, TokenKind};

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
fn test_full_operator_inventory() {
    use TokenKind::*;
    let src = "= == != < <= > >= + - * / % ** ! && || & | ^ &^ << >> ++ -- += -= *= /= %= **= <<= >>= &= |= ^= &^= ? : . , ; ( ) [ ] { } =>";
    assert_eq!(
        kinds(src),
        vec![
            Assign, Equal, NotEqual, LessThan, LessThanOrEqual, GreaterThan, GreaterThanOrEqual,
            Addition, Subtraction, Multiply, Division, Percent, StarStar, Not, AndAnd, OrOr,
            BitAnd, BitOr, BitXor, BitAndNot, LeftShift, RightShift, Increment, Decrement,
            PlusAssign, MinusAssign, StarAssign, DivideAssign, PercentAssign, StarStarAssign,
            LeftShiftAssign, RightShiftAssign, AndAssign, OrAssign, XorAssign, AndNotAssign,
            Question, Colon, Dot, Comma, Semicolon, LeftParen, RightParen, LeftBracket,
            RightBracket, LeftBrace, RightBrace, Lambda,
        ]
    );
}

#[test]
fn test_keyword_inventory() {
    use TokenKind::*;
    let src = "break case default else for function if let switch return nil true false tao new";
    assert_eq!(
        kinds(src),
        vec![
            Break, Case, Default, Else, For, Function, If, Let, Switch, Return, Nil, Boolean,
            Boolean, Tao, New,
        ]
    );
}

#[test]
fn test_frame_rollback_is_transparent() {
    // Consuming under a frame and rolling back must leave the stream
    // exactly as if the frame had never been opened.
    let src = "let x = (a, b) => a;";

    let mut plain = Lexer::new(src);
    let mut expected = Vec::new();
    loop {
        let tok = plain.next().unwrap();
        let done = tok.kind == TokenKind::Eof;
        expected.push(tok);
        if done {
            break;
        }
    }

    let mut framed = Lexer::new(src);
    let mut observed = Vec::new();
    // Open/rollback a frame around every single consumption.
    loop {
        framed.push_frame();
        let probe = framed.next().unwrap();
        framed.pop_frame(true);

        let tok = framed.next().unwrap();
        assert_eq!(tok, probe);
        let done = tok.kind == TokenKind::Eof;
        observed.push(tok);
        if done {
            break;
        }
    }

    assert_eq!(observed, expected);
}

#[test]
fn test_string_bytes_are_copied_raw() {
    let mut lexer = Lexer::new(r#""no \n escapes here""#);
    let tok = lexer.next().unwrap();
    assert_eq!(tok.text, r"no \n escapes here");
}

#[test]
fn test_utf8_passes_through_strings() {
    let mut lexer = Lexer::new("\"héllo wörld\"");
    assert_eq!(lexer.next().unwrap().text, "héllo wörld");
}

#[test]
fn test_error_carries_position() {
    let mut lexer = Lexer::new("let x = @");
    for _ in 0..3 {
        lexer.next().unwrap();
    }
    let err = lexer.next().unwrap_err();
    assert!(err.to_string().contains("line:1"));
    assert!(err.to_string().starts_with("SyntaxError"));
}

#[test]
fn test_adjacent_literal_rejection() {
    assert!(Lexer::new("12ab").next().is_err());
    assert!(Lexer::new(r#""a"5"#).next().is_err());
    // A separator in between is fine.
    assert!(Lexer::new("12+ab").next().is_ok());
}

#[test]
fn test_comments_to_end_of_line() {
    let toks = kinds("a // b c d ==\nb");
    assert_eq!(toks, vec![TokenKind::Identifier, TokenKind::Identifier]);
}
