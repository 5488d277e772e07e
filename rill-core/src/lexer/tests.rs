use super::prelude::{Lexer, LexicalError, LexicalErrorType, Token};

fn lex(src: &str) -> Vec<Token> {
    Lexer::new(src.char_indices().map(|(i, c)| (i as u32, c)))
        .map(|result| result.expect("lexing failed").1)
        .collect()
}

fn lex_errors(src: &str) -> Vec<LexicalError> {
    Lexer::new(src.char_indices().map(|(i, c)| (i as u32, c)))
        .filter_map(|result| result.err())
        .collect()
}

#[test]
fn single_character_tokens() {
    assert_eq!(
        lex("( ) { } [ ] , . ; : ? + - * %"),
        vec![
            Token::LParen, Token::RParen,
            Token::LBrace, Token::RBrace,
            Token::LBracket, Token::RBracket,
            Token::Comma, Token::Dot, Token::Semicolon,
            Token::Colon, Token::Question,
            Token::Plus, Token::Minus, Token::Star, Token::Percent,
        ]
    );
}

#[test]
fn one_and_two_character_operators() {
    assert_eq!(
        lex("= == ! != < <= > >= /"),
        vec![
            Token::Equal, Token::EqualEqual,
            Token::Bang, Token::BangEqual,
            Token::Less, Token::LessEqual,
            Token::Greater, Token::GreaterEqual,
            Token::Slash,
        ]
    );
}

#[test]
fn keywords_are_not_identifiers() {
    assert_eq!(
        lex("var foo while nilx lambda_"),
        vec![
            Token::Var,
            Token::Ident("foo".into()),
            Token::While,
            Token::Ident("nilx".into()),
            Token::Ident("lambda_".into()),
        ]
    );
}

#[test]
fn number_literals() {
    assert_eq!(
        lex("0 123 2.5 10.75"),
        vec![
            Token::Number(0.0),
            Token::Number(123.0),
            Token::Number(2.5),
            Token::Number(10.75),
        ]
    );
}

#[test]
fn trailing_dot_is_not_part_of_a_number() {
    assert_eq!(
        lex("1.foo"),
        vec![
            Token::Number(1.0),
            Token::Dot,
            Token::Ident("foo".into()),
        ]
    );
}

#[test]
fn string_literal_with_span() {
    let tokens = Lexer::new("  \"hi\"".char_indices().map(|(i, c)| (i as u32, c)))
        .map(|result| result.expect("lexing failed"))
        .collect::<Vec<_>>();

    assert_eq!(tokens, vec![(2, Token::String("hi".into()), 6)]);
}

#[test]
fn line_comment_becomes_a_comment_token() {
    assert_eq!(
        lex("// note\n42"),
        vec![Token::Comment, Token::Number(42.0)]
    );
}

#[test]
fn unterminated_string_is_an_error() {
    let errors = lex_errors("\"oops");

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].error, LexicalErrorType::UnterminatedString);
}

#[test]
fn unrecognized_character_is_an_error() {
    let errors = lex_errors("var a = $;");

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].error, LexicalErrorType::UnrecognizedToken { tok: '$' });
}
