// tests/lexer_tests.rs

use rust_decimal::Decimal;
use sieve_lang::lexer::Lexer;
use sieve_lang::{FloatTy, IntTy, Token};

fn tokens(input: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(input);
    let mut out = Vec::new();
    loop {
        let next = lexer.next_token().expect("lex failure").token;
        let done = next == Token::Eof;
        out.push(next);
        if done {
            break;
        }
    }
    out
}

// ============================================================================
// Operators and punctuation
// ============================================================================

#[test]
fn test_two_character_operators() {
    assert_eq!(
        tokens("&& || == != <> <= >="),
        vec![
            Token::AmpAmp,
            Token::BarBar,
            Token::EqEq,
            Token::NotEq,
            Token::NotEq,
            Token::LtEq,
            Token::GtEq,
            Token::Eof,
        ]
    );
}

#[test]
fn test_single_characters_are_not_greedy() {
    assert_eq!(
        tokens("& | = < > !"),
        vec![
            Token::Amp,
            Token::Bar,
            Token::Eq,
            Token::Lt,
            Token::Gt,
            Token::Exclamation,
            Token::Eof,
        ]
    );
}

#[test]
fn test_conditional_and_arithmetic() {
    assert_eq!(
        tokens("a ? b : c % 2"),
        vec![
            Token::Identifier("a".to_string()),
            Token::Question,
            Token::Identifier("b".to_string()),
            Token::Colon,
            Token::Identifier("c".to_string()),
            Token::Percent,
            Token::Integer {
                value: 2,
                ty: IntTy::I32
            },
            Token::Eof,
        ]
    );
}

// ============================================================================
// Keywords
// ============================================================================

#[test]
fn test_keywords_are_distinct_from_identifiers() {
    assert_eq!(
        tokens("is island as aspect new newest"),
        vec![
            Token::Is,
            Token::Identifier("island".to_string()),
            Token::As,
            Token::Identifier("aspect".to_string()),
            Token::New,
            Token::Identifier("newest".to_string()),
            Token::Eof,
        ]
    );
}

#[test]
fn test_word_operators() {
    assert_eq!(
        tokens("a and b or not c"),
        vec![
            Token::Identifier("a".to_string()),
            Token::And,
            Token::Identifier("b".to_string()),
            Token::Or,
            Token::Not,
            Token::Identifier("c".to_string()),
            Token::Eof,
        ]
    );
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_integer_suffixes() {
    assert_eq!(
        tokens("7 7L 7U 7UL"),
        vec![
            Token::Integer {
                value: 7,
                ty: IntTy::I32
            },
            Token::Integer {
                value: 7,
                ty: IntTy::I64
            },
            Token::Integer {
                value: 7,
                ty: IntTy::U32
            },
            Token::Integer {
                value: 7,
                ty: IntTy::U64
            },
            Token::Eof,
        ]
    );
}

#[test]
fn test_real_literals() {
    assert_eq!(
        tokens("3.25 2.5F 1.5e2"),
        vec![
            Token::Float {
                value: 3.25,
                ty: FloatTy::F64
            },
            Token::Float {
                value: 2.5,
                ty: FloatTy::F32
            },
            Token::Float {
                value: 150.0,
                ty: FloatTy::F64
            },
            Token::Eof,
        ]
    );
}

#[test]
fn test_decimal_literal() {
    assert_eq!(
        tokens("19.99M"),
        vec![
            Token::Decimal(Decimal::from_str_exact("19.99").unwrap()),
            Token::Eof,
        ]
    );
}

#[test]
fn test_string_escapes() {
    assert_eq!(
        tokens(r#""a\tb\n\"c\"""#),
        vec![Token::String("a\tb\n\"c\"".to_string()), Token::Eof]
    );
}

#[test]
fn test_char_literal() {
    assert_eq!(
        tokens(r"'a' '\n'"),
        vec![Token::Char('a'), Token::Char('\n'), Token::Eof]
    );
}

#[test]
fn test_placeholders() {
    assert_eq!(
        tokens("@0 @12"),
        vec![Token::Placeholder(0), Token::Placeholder(12), Token::Eof]
    );
}

// ============================================================================
// Positions and restartability
// ============================================================================

#[test]
fn test_token_positions_are_character_offsets() {
    let mut lexer = Lexer::new("ab  == 12");
    assert_eq!(lexer.next_token().unwrap().pos, 0);
    assert_eq!(lexer.next_token().unwrap().pos, 4);
    assert_eq!(lexer.next_token().unwrap().pos, 7);
}

#[test]
fn test_seek_restarts_from_saved_offset() {
    let mut lexer = Lexer::new("1 + 2");
    lexer.next_token().unwrap();
    let saved = lexer.offset();
    assert_eq!(lexer.next_token().unwrap().token, Token::Plus);
    lexer.seek(saved);
    assert_eq!(lexer.next_token().unwrap().token, Token::Plus);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unterminated_string() {
    let mut lexer = Lexer::new(r#"  "abc"#);
    let err = lexer.next_token().unwrap_err();
    assert_eq!(err.pos, 2);
    assert!(err.message.contains("unterminated"));
}

#[test]
fn test_char_literal_must_be_one_character() {
    let mut lexer = Lexer::new("'ab'");
    assert!(lexer.next_token().is_err());
}

#[test]
fn test_invalid_escape() {
    let mut lexer = Lexer::new(r#""a\qb""#);
    assert!(lexer.next_token().is_err());
}

#[test]
fn test_bare_at_sign() {
    let mut lexer = Lexer::new("@x");
    assert!(lexer.next_token().is_err());
}

#[test]
fn test_unexpected_character() {
    let mut lexer = Lexer::new("1 # 2");
    lexer.next_token().unwrap();
    let err = lexer.next_token().unwrap_err();
    assert_eq!(err.pos, 2);
}

#[test]
fn test_integer_out_of_range() {
    let mut lexer = Lexer::new("99999999999999999999999999");
    assert!(lexer.next_token().is_err());
}
