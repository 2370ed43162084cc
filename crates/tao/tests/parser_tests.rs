//! Parser acceptance and rejection through the public surface

use tao::{Error, Lexer, Parser};

fn parse(src: &str) -> Result<tao::ast::Program, Error> {
    Parser::new(Lexer::new(src)).parse()
}

fn parse_err(src: &str) -> Error {
    parse(src).expect_err("expected a parse error")
}

// ═══════════════════════════════════════════════════════════════════════
// Statement Forms
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_accepts_the_statement_inventory() {
    let src = r#"
let a;
let b = 1 + 2;
function f(x, y) {
  ;
  { let inner = 1; }
  if x { return 1; } else if y { return 2; } else { return 3; }
  for let i = 0; i < 10; i += 1 { break; }
  for x < 10 { x++; }
  for { break; }
  switch x { case 1, 2: return 1; default: return 0; }
  tao f(1, 2);
  x = y;
  f(1, 2);
  return;
}
"#;
    assert!(parse(src).is_ok());
}

#[test]
fn test_expression_grammar_superset() {
    let src = r#"
function f(g, o, a, x) {
  let v1 = x ? 1 : 2;
  let v2 = -x ** 2 + +x * !x;
  let v3 = o.k[0](1)(2).m;
  let v4 = (a, x) => a + x;
  let v5 = () => { return 0; };
  let v6 = {k: 1, "spaced key": [1, {nested: true}], f: y => y};
  let v7 = new Promise((res, rej) => res(1));
  let v8 = x++ ;
  let v9 = --x;
  let v10 = 1 << 2 & 3 | 4 ^ 5 &^ 6;
  let v11 = x % 2 == 0 && x > 1 || x != 3;
  return nil;
}
"#;
    assert!(parse(src).is_ok());
}

#[test]
fn test_error_messages_carry_the_offending_line() {
    let err = parse_err("let x = 1;\nlet 5 = 2;");
    assert!(err.to_string().contains("line:2"), "got: {err}");

    let err = parse_err("function f() {\n  let y = ];\n}");
    assert!(err.to_string().contains("line: 2"), "got: {err}");
}

#[test]
fn test_let_requires_identifier_and_semicolon() {
    assert!(matches!(parse_err("let 5 = 1;"), Error::Syntax(_)));
    assert!(matches!(parse_err("let x = 1"), Error::Syntax(_)));
}

#[test]
fn test_else_requires_if_or_block() {
    let err = parse_err("function f() { if 1 { } else return; }");
    assert!(err.to_string().contains("else"));
}

#[test]
fn test_function_requires_body() {
    let err = parse_err("function f();");
    assert!(err.to_string().contains("body"));
}

#[test]
fn test_for_condition_form_requires_body_brace() {
    assert!(parse("function f(x) { for x 1; }").is_err());
}

// ═══════════════════════════════════════════════════════════════════════
// Ambiguity Resolution
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_parenthesized_expression_vs_lambda() {
    assert!(parse("function f(g, a, b) { let x = (a); }").is_ok());
    assert!(parse("function f(g, a, b) { let x = (a + b); }").is_ok());
    assert!(parse("function f(g, a, b) { let x = (a) => a; }").is_ok());
    assert!(parse("function f(g, a, b) { let x = (a, b) => a; }").is_ok());
    assert!(parse("function f(g, a, b) { let x = (g)(a); }").is_ok());
}

#[test]
fn test_lambda_with_block_body() {
    assert!(parse("function f() { let g = x => { let y = x; return y; }; }").is_ok());
}

#[test]
fn test_object_literal_in_expression_position_only() {
    assert!(parse("function f() { let o = {a: 1}; }").is_ok());
    // Statement position: `{` is a block, so `a: 1` inside must fail.
    assert!(parse("function f() { {a: 1}; }").is_err());
}

// ═══════════════════════════════════════════════════════════════════════
// Rejections
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_top_level_discipline() {
    assert!(parse("let x = 1; function f() {} ;").is_ok());
    assert!(matches!(parse_err("if 1 { }"), Error::Syntax(_)));
    assert!(matches!(parse_err("x = 1;"), Error::Syntax(_)));
}

#[test]
fn test_break_depth_discipline() {
    assert!(matches!(parse_err("function f() { break; }"), Error::Syntax(_)));
    // A function body inside a loop resets the counter.
    assert!(parse("function f() { for { function g() { } break; } }").is_ok());
    assert!(
        parse("function f() { for { let g = function() { break; }; } }").is_err()
    );
}

#[test]
fn test_nested_ternary_rejection() {
    let err = parse_err("function f(a, b, c, d, e) { let x = a ? b ? c : d : e; }");
    assert!(err.to_string().contains("nested ?:"));
}

#[test]
fn test_assignment_lhs_discipline() {
    assert!(parse("function f(a) { a = 1; a[0] = 1; a.k = 1; }").is_ok());
    assert!(matches!(parse_err("function f() { 1 = 2; }"), Error::Syntax(_)));
    assert!(matches!(parse_err("function f(g) { g() = 2; }"), Error::Syntax(_)));
}

#[test]
fn test_object_literal_key_discipline() {
    assert!(matches!(
        parse_err("function f() { let o = {1: 2}; }"),
        Error::Type(_)
    ));
}

#[test]
fn test_duplicate_default_rejected() {
    assert!(parse("function f(x) { switch x { default: default: } }").is_err());
}

#[test]
fn test_tao_requires_a_call() {
    assert!(parse("function f() { tao f(); }").is_ok());
    assert!(parse("function f(x) { tao x; }").is_err());
}

#[test]
fn test_unbalanced_delimiters() {
    assert!(parse("function f() {").is_err());
    assert!(parse("function f() { f(1; }").is_err());
    assert!(parse("function f() { let a = [1, 2; }").is_err());
}
