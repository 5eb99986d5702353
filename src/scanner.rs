use std::collections::HashMap;
use std::str::Chars;

use once_cell::sync::Lazy;
use peekmore::{PeekMore, PeekMoreIterator};

use crate::error::ScanError;
use crate::token::{Token, Type};

/// Characters that terminate a symbol run. Every single-character token plus
/// whitespace; anything else belongs to the run it appears in.
const DELIMITERS: &str = "+-*/%><()[];=!' \t\r\n";

fn is_delimiter(c: char) -> bool {
    DELIMITERS.contains(c)
}

/// Word tokens. Initialised once; a run that misses this table is a user
/// symbol. `&&` and `||` live here, so they must stand alone in the source.
static KEYWORDS: Lazy<HashMap<&'static str, Type>> = Lazy::new(|| {
    HashMap::from([
        ("int", Type::TypeInt),
        ("float", Type::TypeFloat),
        ("char", Type::TypeChar),
        ("bool", Type::TypeBool),
        ("true", Type::BoolLiteral),
        ("false", Type::BoolLiteral),
        ("begin", Type::Begin),
        ("end", Type::End),
        ("if", Type::If),
        ("else", Type::Else),
        ("while", Type::While),
        ("let", Type::Let),
        ("print", Type::Print),
        ("println", Type::Println),
        ("&&", Type::And),
        ("||", Type::Or),
    ])
});

pub struct Scanner<'a> {
    source: PeekMoreIterator<Chars<'a>>,
    tokens: Vec<Token>,
}

impl<'a> Scanner<'a> {
    /// Creates a new scanner.
    pub fn new(source: &'a str) -> Scanner<'a> {
        Scanner {
            source: source.chars().peekmore(),
            tokens: vec![],
        }
    }

    /// Scans the source code and returns a vector of tokens.
    pub fn scan_tokens(mut self) -> Result<Vec<Token>, ScanError> {
        while !self.is_at_end() {
            self.scan_token()?;
        }

        Ok(self.tokens)
    }

    /// Consumes and returns the next character.
    fn advance(&mut self) -> Option<char> {
        self.source.next()
    }

    /// Returns the next character without consuming it.
    fn peek(&mut self) -> Option<char> {
        self.source.peek().copied()
    }

    /// Returns if the character after the next one is the expected character.
    fn match_next(&mut self, expected: char) -> bool {
        matches!(self.source.peek_next(), Some(c) if *c == expected)
    }

    /// Adds a new token to the list of tokens.
    fn add_token(&mut self, r#type: Type, lexeme: String) {
        self.tokens.push(Token::new(r#type, lexeme));
    }

    /// Adds a new single char token to the list of tokens.
    fn add_single_char_token(&mut self, r#type: Type) {
        if let Some(c) = self.advance() {
            self.add_token(r#type, c.to_string());
        }
    }

    /// Adds a new double char token to the list of tokens.
    fn add_double_char_token(&mut self, r#type: Type) {
        if let (Some(first), Some(second)) = (self.advance(), self.advance()) {
            self.add_token(r#type, format!("{first}{second}"));
        }
    }

    /// Returns if the scanner has reached the end of the source.
    fn is_at_end(&mut self) -> bool {
        self.source.peek().is_none()
    }

    /// Handles a character literal: a quote, one character, a closing quote.
    fn char_literal(&mut self) -> Result<(), ScanError> {
        self.advance(); // Move past the opening quote.

        let value = self.advance();
        let closing = self.advance();

        match (value, closing) {
            (Some(value), Some('\'')) => {
                self.add_token(Type::CharLiteral, value.to_string());
                Ok(())
            }
            _ => Err(ScanError::new("invalid character literal")),
        }
    }

    /// Handles a number literal: a run of digits with at most one radix point.
    fn number(&mut self) -> Result<(), ScanError> {
        let mut text = String::new();
        let mut radix_found = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
            } else if c == '.' {
                if radix_found {
                    return Err(ScanError::new("invalid floating point literal"));
                }
                radix_found = true;
                text.push(c);
            } else {
                break;
            }
            self.advance();
        }

        let r#type = if radix_found {
            Type::FloatLiteral
        } else {
            Type::IntLiteral
        };
        self.add_token(r#type, text);

        Ok(())
    }

    /// Handles a keyword or a user symbol: the run of characters up to the
    /// next delimiter.
    fn symbol(&mut self) {
        let mut text = String::new();

        while let Some(c) = self.peek() {
            if is_delimiter(c) {
                break;
            }
            text.push(c);
            self.advance();
        }

        let r#type = KEYWORDS.get(text.as_str()).copied().unwrap_or(Type::Identifier);
        self.add_token(r#type, text);
    }

    /// Scans the next token.
    fn scan_token(&mut self) -> Result<(), ScanError> {
        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(()),
        };

        match c {
            // One character tokens
            '+' => self.add_single_char_token(Type::Plus),
            '-' => self.add_single_char_token(Type::Minus),
            '/' => self.add_single_char_token(Type::Slash),
            '%' => self.add_single_char_token(Type::Percent),
            '>' => self.add_single_char_token(Type::Greater),
            '<' => self.add_single_char_token(Type::Less),
            '(' => self.add_single_char_token(Type::LeftParen),
            ')' => self.add_single_char_token(Type::RightParen),
            '[' => self.add_single_char_token(Type::LeftBracket),
            ']' => self.add_single_char_token(Type::RightBracket),

            // Statement breaks
            ';' | '\n' => self.add_single_char_token(Type::Break),

            // One or two character tokens
            '*' => {
                if self.match_next('*') {
                    self.add_double_char_token(Type::StarStar);
                } else {
                    self.add_single_char_token(Type::Star);
                }
            }
            '=' => {
                if self.match_next('=') {
                    self.add_double_char_token(Type::EqualEqual);
                } else {
                    self.add_single_char_token(Type::Equal);
                }
            }
            '!' => {
                if self.match_next('=') {
                    self.add_double_char_token(Type::BangEqual);
                } else {
                    self.add_single_char_token(Type::Bang);
                }
            }

            // Ignore whitespace
            ' ' | '\t' | '\r' => {
                self.advance();
            }

            // Character literals
            '\'' => return self.char_literal(),

            // Numbers
            c if c.is_ascii_digit() => return self.number(),

            // Keywords and user symbols
            _ => self.symbol(),
        }

        Ok(())
    }
}
