use hannac::frontend::lexer::Lexer;
use hannac::frontend::token_type::TokenType;

#[test]
fn single_char_tokens() {
    let input = "+-*/(),";
    let mut lexer = Lexer::new(input);

    let expected = vec![
        TokenType::Plus,
        TokenType::Minus,
        TokenType::Asterisk,
        TokenType::Slash,
        TokenType::LParen,
        TokenType::RParen,
        TokenType::Comma,
        TokenType::Eof,
    ];

    for expected_type in expected {
        let tok = lexer.next_token();
        assert_eq!(tok.token_type, expected_type, "Expected {:?}", expected_type);
    }
}

#[test]
fn keywords() {
    let input = "method main return";
    let mut lexer = Lexer::new(input);

    assert_eq!(lexer.next_token().token_type, TokenType::Method);
    assert_eq!(lexer.next_token().token_type, TokenType::Main);
    assert_eq!(lexer.next_token().token_type, TokenType::Return);
}

#[test]
fn identifiers() {
    let input = "foo bar1 addTwo x";
    let mut lexer = Lexer::new(input);

    let expected = vec!["foo", "bar1", "addTwo", "x"];

    for expected_literal in expected {
        let tok = lexer.next_token();
        assert_eq!(tok.token_type, TokenType::Ident);
        assert_eq!(tok.literal, expected_literal);
    }
}

#[test]
fn integer_and_real_numbers() {
    let input = "42 3.25 0 100.5";
    let mut lexer = Lexer::new(input);

    let expected = vec![
        (TokenType::Int, "42"),
        (TokenType::Real, "3.25"),
        (TokenType::Int, "0"),
        (TokenType::Real, "100.5"),
    ];

    for (expected_type, expected_literal) in expected {
        let tok = lexer.next_token();
        assert_eq!(tok.token_type, expected_type);
        assert_eq!(tok.literal, expected_literal);
    }
}

#[test]
fn number_with_two_dots_is_illegal() {
    let mut lexer = Lexer::new("1.2.3");
    let tok = lexer.next_token();
    assert_eq!(tok.token_type, TokenType::Illegal);
    assert_eq!(tok.literal, "1.2.3");
    assert_eq!(lexer.next_token().token_type, TokenType::Eof);
}

#[test]
fn number_with_trailing_dot_is_a_real() {
    let mut lexer = Lexer::new("7.");
    let tok = lexer.next_token();
    assert_eq!(tok.token_type, TokenType::Real);
    assert_eq!(tok.literal, "7.");
    assert_eq!(lexer.next_token().token_type, TokenType::Eof);
}

#[test]
fn comments_run_to_end_of_line() {
    let input = "1 # the rest is ignored 2 3\n4";
    let mut lexer = Lexer::new(input);

    let first = lexer.next_token();
    assert_eq!(first.token_type, TokenType::Int);
    assert_eq!(first.literal, "1");

    let second = lexer.next_token();
    assert_eq!(second.token_type, TokenType::Int);
    assert_eq!(second.literal, "4");

    assert_eq!(lexer.next_token().token_type, TokenType::Eof);
}

#[test]
fn whitespace_is_free_form() {
    let input = "method\n\tadd ( a ,\n b )";
    let mut lexer = Lexer::new(input);

    let expected = vec![
        TokenType::Method,
        TokenType::Ident,
        TokenType::LParen,
        TokenType::Ident,
        TokenType::Comma,
        TokenType::Ident,
        TokenType::RParen,
        TokenType::Eof,
    ];

    for expected_type in expected {
        assert_eq!(lexer.next_token().token_type, expected_type);
    }
}

#[test]
fn positions_track_lines_and_columns() {
    let input = "add\n  12";
    let mut lexer = Lexer::new(input);

    let first = lexer.next_token();
    assert_eq!(first.position.line, 1);
    assert_eq!(first.position.column, 1);

    let second = lexer.next_token();
    assert_eq!(second.position.line, 2);
    assert_eq!(second.position.column, 3);
}

#[test]
fn tokenize_collects_through_eof() {
    let tokens = Lexer::new("add(2, 3)").tokenize();
    let types: Vec<TokenType> = tokens.iter().map(|t| t.token_type).collect();
    assert_eq!(
        types,
        vec![
            TokenType::Ident,
            TokenType::LParen,
            TokenType::Int,
            TokenType::Comma,
            TokenType::Int,
            TokenType::RParen,
            TokenType::Eof,
        ]
    );
}

#[test]
fn underscore_is_not_part_of_identifiers() {
    let mut lexer = Lexer::new("foo_bar");
    assert_eq!(lexer.next_token().token_type, TokenType::Ident);
    assert_eq!(lexer.next_token().token_type, TokenType::Illegal);
}
