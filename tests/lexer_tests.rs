use dust::lexer::{LexError, Lexer, Token, TokenKind};
use dust::types::Type;

fn lex_str(s: &str) -> Vec<Token> {
    Lexer::new().lex(s).unwrap()
}

fn kinds(s: &str) -> Vec<TokenKind> {
    lex_str(s).into_iter().map(|t| t.kind).collect()
}

#[test]
fn function_def_tokens() {
    let code = "fn twice(x: num): num { return x + x; }";
    let expected = vec![
        TokenKind::Fn,
        TokenKind::Identifier,
        TokenKind::LParen,
        TokenKind::Identifier,
        TokenKind::Colon,
        TokenKind::Type(Type::Num),
        TokenKind::RParen,
        TokenKind::Colon,
        TokenKind::Type(Type::Num),
        TokenKind::LBrace,
        TokenKind::Return,
        TokenKind::Identifier,
        TokenKind::Plus,
        TokenKind::Identifier,
        TokenKind::Semicolon,
        TokenKind::RBrace,
        TokenKind::Eof,
    ];
    assert_eq!(kinds(code), expected);
}

#[test]
fn payloads_are_kept_in_text() {
    let tokens = lex_str("extern prints(s: str); prints(\"hi there\"); 3.25");
    assert_eq!(tokens[1], Token::new(TokenKind::Identifier, "prints", 1));
    let string = tokens.iter().find(|t| t.kind == TokenKind::Str).unwrap();
    assert_eq!(string.text, "hi there");
    let number = tokens.iter().find(|t| t.kind == TokenKind::Number).unwrap();
    assert_eq!(number.text, "3.25");
}

#[test]
fn two_char_operators() {
    assert_eq!(
        kinds("a <= b >= c == d != e += 1"),
        vec![
            TokenKind::Identifier,
            TokenKind::LessEqual,
            TokenKind::Identifier,
            TokenKind::GreaterEqual,
            TokenKind::Identifier,
            TokenKind::Equal,
            TokenKind::Identifier,
            TokenKind::NotEqual,
            TokenKind::Identifier,
            TokenKind::PlusAssign,
            TokenKind::Number,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn comments_and_lines() {
    let tokens = lex_str("// header\nvar x = 1;\n\nx;");
    assert_eq!(tokens[0].kind, TokenKind::Var);
    assert_eq!(tokens[0].line, 2);
    let last_ident = tokens.iter().rev().find(|t| t.kind == TokenKind::Identifier).unwrap();
    assert_eq!(last_ident.line, 4);
}

#[test]
fn type_keywords() {
    assert_eq!(
        kinds("num str void"),
        vec![TokenKind::Type(Type::Num), TokenKind::Type(Type::Str), TokenKind::Type(Type::Void), TokenKind::Eof]
    );
}

#[test]
fn lex_errors() {
    let lexer = Lexer::new();
    assert_eq!(lexer.lex("1 @ 2"), Err(LexError::UnexpectedChar { line: 1, ch: '@' }));
    assert_eq!(lexer.lex("\"open"), Err(LexError::UnterminatedString { line: 1 }));
    assert!(matches!(lexer.lex("1.2.3"), Err(LexError::MalformedNumber { .. })));
}
