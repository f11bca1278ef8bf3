use dust::ast::{BinaryOp, Expr, Item, Stmt};
use dust::lexer::TokenKind;
use dust::parser::{ParseError, Parser};
use dust::source::TokenBuffer;
use dust::types::Type;

fn parser(s: &str) -> Parser<TokenBuffer> {
    Parser::new(TokenBuffer::from_source(s).expect("lexing failed"))
}

fn parse_expr(s: &str) -> Expr {
    parser(s).parse_expression().expect("parse_expression failed")
}

fn parse_stmt(s: &str) -> Stmt {
    parser(s).parse_statement().expect("parse_statement failed")
}

fn parse_program(s: &str) -> Vec<Item> {
    parser(s).parse_program().expect("parse_program failed")
}

#[test]
fn parse_expression_arithmetic_and_precedence() {
    // 2 + 3 * 4 => 2 + (3 * 4)
    assert_eq!(parse_expr("2 + 3 * 4").to_string(), "(+ 2 (* 3 4))");
    assert_eq!(parse_expr("2 * 3 + 4").to_string(), "(+ (* 2 3) 4)");
    assert_eq!(parse_expr("(2 + 3) * 4").to_string(), "(* (+ 2 3) 4)");
}

#[test]
fn equal_precedence_folds_left() {
    assert_eq!(parse_expr("8 - 3 - 2").to_string(), "(- (- 8 3) 2)");
    assert_eq!(parse_expr("8 / 4 * 2").to_string(), "(* (/ 8 4) 2)");
}

#[test]
fn comparison_binds_looser_than_arithmetic() {
    assert_eq!(parse_expr("a + 1 < b * 2").to_string(), "(< (+ a 1) (* b 2))");
}

#[test]
fn assignment_binds_loosest() {
    let expr = parse_expr("x = y + 1");
    match expr {
        Expr::Binary { op: BinaryOp::Assign, left, right } => {
            assert_eq!(*left, Expr::Variable("x".into()));
            assert_eq!(right.to_string(), "(+ y 1)");
        }
        other => panic!("expected assignment, got {other}"),
    }
}

#[test]
fn parse_call_and_if_expression() {
    assert_eq!(parse_expr("f(1, g(x), \"s\")").to_string(), "(call f 1 (call g x) \"s\")");
    assert_eq!(parse_expr("if x < 1 { 2 } else { 3 }").to_string(), "(if (< x 1) 2 3)");
}

#[test]
fn parse_for_statement() {
    let stmt = parse_stmt("for i = 0; i < 5; 1 { printd(i); }");
    assert_eq!(stmt.to_string(), "(for i 0 (< i 5) 1 {(call printd i);})");

    let Stmt::For { step, .. } = parse_stmt("for i = 0; i < 5 { }") else {
        panic!("expected for loop");
    };
    assert_eq!(step, None);
}

#[test]
fn parse_var_statement() {
    let stmt = parse_stmt("var a = 1, b: str, c: num = a + 2; { c; }");
    let Stmt::Var { bindings, body } = stmt else {
        panic!("expected var");
    };
    assert_eq!(bindings.len(), 3);
    assert_eq!(bindings[0].init, Some(Expr::Number(1.0)));
    assert_eq!(bindings[1].ty, Some(Type::Str));
    assert_eq!(bindings[1].init, None);
    assert_eq!(bindings[2].init.as_ref().map(|e| e.to_string()), Some("(+ a 2)".to_string()));
    assert_eq!(body, vec![Stmt::ExprStmt(Expr::Variable("c".into()))]);
}

#[test]
fn else_if_chains_nest() {
    let stmt = parse_stmt("if a { 1; } else if b { 2; } else { 3; }");
    let Stmt::If { else_branch, .. } = stmt else {
        panic!("expected if");
    };
    assert!(matches!(else_branch.as_slice(), [Stmt::If { .. }]));
}

#[test]
fn parse_top_level_items() {
    let items = parse_program(
        "extern putchard(c: num);\n\
         fn greet(name: str): void { prints(name); }\n\
         greet(\"dust\");",
    );
    assert_eq!(items.len(), 3);

    let Item::Extern(proto) = &items[0] else { panic!("expected extern") };
    assert_eq!(proto.name, "putchard");
    assert_eq!(proto.return_type, Type::Num);

    let Item::Function(function) = &items[1] else { panic!("expected function") };
    assert_eq!(function.proto.return_type, Type::Void);
    assert_eq!(function.proto.param_types(), vec![Type::Str]);

    assert!(matches!(items[2], Item::Stmt(Stmt::ExprStmt(Expr::Call { .. }))));
}

#[test]
fn missing_expression_is_recoverable() {
    let err = parser(") 1;").parse_top_level_item().unwrap_err();
    assert!(matches!(err, ParseError::ExpectedExpression { found: TokenKind::RParen, .. }));
    assert!(!err.is_fatal());
}

#[test]
fn expected_token_violations_are_fatal() {
    let err = parser("fn f(x num) { }").parse_top_level_item().unwrap_err();
    assert!(matches!(err, ParseError::Unexpected { expected: "':' after parameter name", .. }));
    assert!(err.is_fatal());

    let err = parser("1 + 2").parse_top_level_item().unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn void_is_not_a_parameter_type() {
    let err = parser("extern f(x: void);").parse_top_level_item().unwrap_err();
    assert!(err.is_fatal());
}
