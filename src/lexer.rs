use rust_decimal::Decimal;

use crate::ast::tokens::{SpannedToken, Token};
use crate::types::{FloatTy, IntTy};

/// A lexing failure with the character offset where it occurred.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub message: String,
    pub pos: usize,
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Lex error at position {}: {}", self.pos, self.message)
    }
}

impl std::error::Error for LexError {}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Current character offset; pass back to [`Lexer::seek`] to restart
    /// from a saved point for bounded lookahead.
    pub fn offset(&self) -> usize {
        self.position
    }

    pub fn seek(&mut self, offset: usize) {
        self.position = offset;
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn error(&self, pos: usize, message: impl Into<String>) -> LexError {
        LexError {
            message: message.into(),
            pos,
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_quoted(&mut self, quote: char) -> Result<String, LexError> {
        let start = self.position;
        let mut result = String::new();
        self.advance(); // consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    self.advance();
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('0') => result.push('\0'),
                        Some('"') => result.push('"'),
                        Some('\'') => result.push('\''),
                        Some('\\') => result.push('\\'),
                        Some(ch) => {
                            return Err(self.error(
                                self.position,
                                format!("invalid escape sequence: \\{}", ch),
                            ));
                        }
                        None => {
                            return Err(
                                self.error(start, "unterminated literal: EOF after backslash")
                            );
                        }
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(self.error(start, "unterminated literal: missing closing quote"))
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.position;
        let mut number = String::new();
        let mut is_real = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !is_real
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_real = true;
                number.push(ch);
                self.advance();
            } else if (ch == 'e' || ch == 'E')
                && self
                    .peek_char(1)
                    .is_some_and(|c| c.is_ascii_digit() || c == '+' || c == '-')
            {
                is_real = true;
                number.push(ch);
                self.advance();
                if let Some(sign) = self.current_char()
                    && (sign == '+' || sign == '-')
                {
                    number.push(sign);
                    self.advance();
                }
                while let Some(d) = self.current_char() {
                    if d.is_ascii_digit() {
                        number.push(d);
                        self.advance();
                    } else {
                        break;
                    }
                }
            } else {
                break;
            }
        }

        if is_real {
            return self.real_with_suffix(&number, start);
        }

        // Integer suffixes: L, U, UL (case-insensitive), or a real suffix
        // turning the digits into a float/decimal literal.
        match self.current_char() {
            Some('l') | Some('L') => {
                self.advance();
                let value = self.parse_integer(&number, start)?;
                Ok(Token::Integer {
                    value,
                    ty: IntTy::I64,
                })
            }
            Some('u') | Some('U') => {
                self.advance();
                let ty = if matches!(self.current_char(), Some('l') | Some('L')) {
                    self.advance();
                    IntTy::U64
                } else {
                    IntTy::U32
                };
                let value = self.parse_integer(&number, start)?;
                Ok(Token::Integer { value, ty })
            }
            Some('f') | Some('F') | Some('d') | Some('D') | Some('m') | Some('M') => {
                self.real_with_suffix(&number, start)
            }
            _ => {
                let value = self.parse_integer(&number, start)?;
                let ty = if value <= i32::MAX as u64 {
                    IntTy::I32
                } else if value <= i64::MAX as u64 {
                    IntTy::I64
                } else {
                    IntTy::U64
                };
                Ok(Token::Integer { value, ty })
            }
        }
    }

    fn parse_integer(&self, text: &str, start: usize) -> Result<u64, LexError> {
        text.parse::<u64>()
            .map_err(|_| self.error(start, format!("integer literal '{}' out of range", text)))
    }

    fn real_with_suffix(&mut self, number: &str, start: usize) -> Result<Token, LexError> {
        match self.current_char() {
            Some('f') | Some('F') => {
                self.advance();
                let value = self.parse_real(number, start)?;
                Ok(Token::Float {
                    value,
                    ty: FloatTy::F32,
                })
            }
            Some('m') | Some('M') => {
                self.advance();
                let value = number.parse::<Decimal>().map_err(|_| {
                    self.error(start, format!("invalid decimal literal '{}'", number))
                })?;
                Ok(Token::Decimal(value))
            }
            Some('d') | Some('D') => {
                self.advance();
                let value = self.parse_real(number, start)?;
                Ok(Token::Float {
                    value,
                    ty: FloatTy::F64,
                })
            }
            _ => {
                let value = self.parse_real(number, start)?;
                Ok(Token::Float {
                    value,
                    ty: FloatTy::F64,
                })
            }
        }
    }

    fn parse_real(&self, text: &str, start: usize) -> Result<f64, LexError> {
        text.parse::<f64>()
            .map_err(|_| self.error(start, format!("invalid numeric literal '{}'", text)))
    }

    pub fn next_token(&mut self) -> Result<SpannedToken, LexError> {
        self.skip_whitespace();
        let pos = self.position;
        let token = self.next_token_inner(pos)?;
        Ok(SpannedToken { token, pos })
    }

    fn next_token_inner(&mut self, pos: usize) -> Result<Token, LexError> {
        match self.current_char() {
            None => Ok(Token::Eof),
            Some('@') => {
                self.advance();
                if !self.current_char().is_some_and(|c| c.is_ascii_digit()) {
                    return Err(self.error(pos, "expected digits after '@'".to_string()));
                }
                let digits = self.read_identifier();
                let index = digits
                    .parse::<usize>()
                    .map_err(|_| self.error(pos, format!("invalid placeholder '@{}'", digits)))?;
                Ok(Token::Placeholder(index))
            }
            Some('?') => {
                self.advance();
                Ok(Token::Question)
            }
            Some(':') => {
                self.advance();
                Ok(Token::Colon)
            }
            Some('|') => {
                if self.peek_char(1) == Some('|') {
                    self.advance();
                    self.advance();
                    Ok(Token::BarBar)
                } else {
                    self.advance();
                    Ok(Token::Bar)
                }
            }
            Some('&') => {
                if self.peek_char(1) == Some('&') {
                    self.advance();
                    self.advance();
                    Ok(Token::AmpAmp)
                } else {
                    self.advance();
                    Ok(Token::Amp)
                }
            }
            Some('^') => {
                self.advance();
                Ok(Token::Caret)
            }
            Some('.') => {
                self.advance();
                Ok(Token::Dot)
            }
            Some(',') => {
                self.advance();
                Ok(Token::Comma)
            }
            Some('+') => {
                self.advance();
                Ok(Token::Plus)
            }
            Some('-') => {
                self.advance();
                Ok(Token::Minus)
            }
            Some('*') => {
                self.advance();
                Ok(Token::Star)
            }
            Some('/') => {
                self.advance();
                Ok(Token::Slash)
            }
            Some('%') => {
                self.advance();
                Ok(Token::Percent)
            }
            Some('=') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.advance();
                    Ok(Token::EqEq)
                } else {
                    self.advance();
                    Ok(Token::Eq)
                }
            }
            Some('>') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.advance();
                    Ok(Token::GtEq)
                } else {
                    self.advance();
                    Ok(Token::Gt)
                }
            }
            Some('<') => match self.peek_char(1) {
                Some('=') => {
                    self.advance();
                    self.advance();
                    Ok(Token::LtEq)
                }
                Some('>') => {
                    self.advance();
                    self.advance();
                    Ok(Token::NotEq)
                }
                _ => {
                    self.advance();
                    Ok(Token::Lt)
                }
            },
            Some('!') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.advance();
                    Ok(Token::NotEq)
                } else {
                    self.advance();
                    Ok(Token::Exclamation)
                }
            }
            Some('"') => Ok(Token::String(self.read_quoted('"')?)),
            Some('\'') => {
                let text = self.read_quoted('\'')?;
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Token::Char(c)),
                    _ => Err(self.error(
                        pos,
                        "character literal must contain exactly one character",
                    )),
                }
            }
            Some('(') => {
                self.advance();
                Ok(Token::LParen)
            }
            Some(')') => {
                self.advance();
                Ok(Token::RParen)
            }
            Some('[') => {
                self.advance();
                Ok(Token::LBracket)
            }
            Some(']') => {
                self.advance();
                Ok(Token::RBracket)
            }
            Some(ch) if ch.is_alphabetic() || ch == '_' => {
                let ident = self.read_identifier();

                match ident.as_str() {
                    "and" => Ok(Token::And),
                    "or" => Ok(Token::Or),
                    "not" => Ok(Token::Not),
                    "true" => Ok(Token::Boolean(true)),
                    "false" => Ok(Token::Boolean(false)),
                    "null" => Ok(Token::Null),
                    "new" => Ok(Token::New),
                    "is" => Ok(Token::Is),
                    "as" => Ok(Token::As),
                    "alias" => Ok(Token::Alias),
                    "iif" => Ok(Token::Iif),
                    _ => Ok(Token::Identifier(ident)),
                }
            }
            Some(ch) if ch.is_ascii_digit() => self.read_number(),
            Some(ch) => Err(self.error(pos, format!("unexpected character '{}'", ch))),
        }
    }
}

#[test]
fn test_keywords() {
    let mut lexer = Lexer::new("and or not true false null new is as alias iif");
    let mut next = || lexer.next_token().unwrap().token;
    assert_eq!(next(), Token::And);
    assert_eq!(next(), Token::Or);
    assert_eq!(next(), Token::Not);
    assert_eq!(next(), Token::Boolean(true));
    assert_eq!(next(), Token::Boolean(false));
    assert_eq!(next(), Token::Null);
    assert_eq!(next(), Token::New);
    assert_eq!(next(), Token::Is);
    assert_eq!(next(), Token::As);
    assert_eq!(next(), Token::Alias);
    assert_eq!(next(), Token::Iif);
}

#[test]
fn test_integer_sizing() {
    let mut lexer = Lexer::new("1 3000000000 10000000000000000000 5L");
    let mut next = || lexer.next_token().unwrap().token;
    assert_eq!(
        next(),
        Token::Integer {
            value: 1,
            ty: IntTy::I32
        }
    );
    assert_eq!(
        next(),
        Token::Integer {
            value: 3_000_000_000,
            ty: IntTy::I64
        }
    );
    assert_eq!(
        next(),
        Token::Integer {
            value: 10_000_000_000_000_000_000,
            ty: IntTy::U64
        }
    );
    assert_eq!(
        next(),
        Token::Integer {
            value: 5,
            ty: IntTy::I64
        }
    );
}
