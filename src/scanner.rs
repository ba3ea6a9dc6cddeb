use crate::token::{Token, TokenType};
use phf::phf_map;
use std::iter::Peekable;
use std::str::CharIndices;
use thiserror::Error;
use tracing::{trace, warn};

#[derive(Debug, Error, PartialEq)]
pub enum ScanError {
    #[error("[line {line}] Error: Unterminated string.")]
    UnterminatedString { line: usize },
    #[error("[line {line}] Error: Invalid number literal '{lexeme}'.")]
    InvalidNumber { line: usize, lexeme: String },
}

enum Scanned {
    Token(Token),
    Skip,
    Stop,
}

// Note: current becomes self.iter.peek()?.0
struct Scanner<'a> {
    source: &'a str,
    iter: Peekable<CharIndices<'a>>,
    start: usize,
    line: usize,
}

/// Converts source text into a flat token sequence terminated by `EOF`.
///
/// An unrecognised character ends the stream where it appears; only an
/// unterminated string literal is a hard failure.
pub fn scan_tokens(source: &str) -> Result<Vec<Token>, ScanError> {
    let mut scanner = Scanner {
        source,
        iter: source.char_indices().peekable(),
        start: 0,
        line: 1,
    };
    let mut tokens: Vec<Token> = Vec::new();

    while let Some((idx, _)) = scanner.iter.peek() {
        scanner.start = *idx;
        match scanner.scan_token()? {
            Scanned::Token(token) => tokens.push(token),
            Scanned::Skip => (),
            Scanned::Stop => break,
        }
    }
    tokens.push(Token {
        tokentype: TokenType::EOF,
        lexeme: String::new(),
        line: scanner.line,
    });
    trace!(count = tokens.len(), "scanned tokens");
    Ok(tokens)
}

impl<'a> Scanner<'a> {
    fn scan_token(&mut self) -> Result<Scanned, ScanError> {
        let c = match self.iter.next() {
            Some((_, c)) => c,
            None => return Ok(Scanned::Stop),
        };
        let tokentype = match c {
            '(' => TokenType::LeftParen,
            ')' => TokenType::RightParen,
            '{' => TokenType::LeftBrace,
            '}' => TokenType::RightBrace,
            '[' => TokenType::LeftBracket,
            ']' => TokenType::RightBracket,
            ',' => TokenType::Comma,
            ';' => TokenType::Semicolon,
            ':' => TokenType::Colon,
            '+' => TokenType::Plus,
            '*' => TokenType::Star,
            '%' => TokenType::Percent,
            '.' => {
                if self.next_if('.') {
                    TokenType::DotDot
                } else {
                    TokenType::Dot
                }
            }
            '-' => {
                if self.next_if('>') {
                    TokenType::Arrow
                } else {
                    TokenType::Minus
                }
            }
            '!' => {
                if self.next_if('=') {
                    TokenType::BangEqual
                } else {
                    TokenType::Bang
                }
            }
            '=' => {
                if self.next_if('=') {
                    TokenType::EqualEqual
                } else {
                    TokenType::Equal
                }
            }
            '<' => {
                if self.next_if('=') {
                    TokenType::LessEqual
                } else {
                    TokenType::Less
                }
            }
            '>' => {
                if self.next_if('=') {
                    TokenType::GreaterEqual
                } else {
                    TokenType::Greater
                }
            }
            '&' if self.next_if('&') => TokenType::And,
            '|' if self.next_if('|') => TokenType::Or,
            '/' => {
                if self.next_if('/') {
                    while let Some((_, c)) = self.iter.peek() {
                        if *c == '\n' {
                            break;
                        }
                        self.iter.next();
                    }
                    return Ok(Scanned::Skip);
                }
                TokenType::Slash
            }
            ' ' | '\r' | '\t' | '\x0b' | '\x0c' => return Ok(Scanned::Skip),
            '\n' => {
                self.line += 1;
                return Ok(Scanned::Skip);
            }
            '"' => return Ok(Scanned::Token(self.string()?)),
            '0'..='9' => return Ok(Scanned::Token(self.number()?)),
            'a'..='z' | 'A'..='Z' | '_' => return Ok(Scanned::Token(self.identifier())),
            other => {
                warn!(
                    line = self.line,
                    character = %other,
                    "unrecognised character ends the token stream"
                );
                return Ok(Scanned::Stop);
            }
        };
        Ok(Scanned::Token(self.token(tokentype)))
    }
    fn current(&mut self) -> usize {
        match self.iter.peek() {
            None => self.source.len(),
            Some((idx, _)) => *idx,
        }
    }
    fn token(&mut self, tokentype: TokenType) -> Token {
        let current = self.current();
        Token {
            tokentype,
            lexeme: self.source[self.start..current].to_string(),
            line: self.line,
        }
    }
    fn next_if(&mut self, expected: char) -> bool {
        match self.iter.peek() {
            Some((_, c)) if *c == expected => {
                self.iter.next();
                true
            }
            _ => false,
        }
    }
    fn next_if_digit(&mut self) -> bool {
        match self.iter.peek() {
            Some((_, c)) if c.is_ascii_digit() => {
                self.iter.next();
                true
            }
            _ => false,
        }
    }
    // Escapes are resolved here; `#{` markers stay in the text for evaluation time.
    fn string(&mut self) -> Result<Token, ScanError> {
        let opened_on = self.line;
        let mut text = String::new();
        loop {
            match self.iter.next() {
                None => return Err(ScanError::UnterminatedString { line: opened_on }),
                Some((_, '"')) => break,
                Some((_, '\\')) => match self.iter.next() {
                    None => return Err(ScanError::UnterminatedString { line: opened_on }),
                    Some((_, 'n')) => text.push('\n'),
                    Some((_, 't')) => text.push('\t'),
                    Some((_, escaped)) => {
                        if escaped == '\n' {
                            self.line += 1;
                        }
                        text.push(escaped)
                    }
                },
                Some((_, c)) => {
                    if c == '\n' {
                        self.line += 1;
                    }
                    text.push(c);
                }
            }
        }
        Ok(Token {
            tokentype: TokenType::String(text.clone()),
            lexeme: text,
            line: opened_on,
        })
    }
    fn number(&mut self) -> Result<Token, ScanError> {
        while self.next_if_digit() {}

        // A '.' belongs to the number only when a digit follows, which also
        // leaves `1..5` to the range operator.
        if let Some((_, '.')) = self.iter.peek() {
            let mut lookahead = self.iter.clone();
            lookahead.next();
            if let Some((_, c)) = lookahead.peek() {
                if c.is_ascii_digit() {
                    self.iter.next();
                    while self.next_if_digit() {}
                }
            }
        }

        let current = self.current();
        let lexeme = &self.source[self.start..current];
        let value = lexeme.parse().map_err(|_| ScanError::InvalidNumber {
            line: self.line,
            lexeme: lexeme.to_string(),
        })?;
        Ok(self.token(TokenType::Number(value)))
    }
    fn identifier(&mut self) -> Token {
        while let Some((_, c)) = self.iter.peek() {
            if c.is_ascii_alphanumeric() || *c == '_' {
                self.iter.next();
            } else {
                break;
            }
        }
        let current = self.current();
        let word = &self.source[self.start..current];
        match KEYWORDS.get(word) {
            None => self.token(TokenType::Identifier(word.to_string())),
            Some(keyword) => self.token(keyword.clone()),
        }
    }
}

static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "else" => TokenType::Else,
    "false" => TokenType::False,
    "fn" => TokenType::Fn,
    "for" => TokenType::For,
    "if" => TokenType::If,
    "in" => TokenType::In,
    "let" => TokenType::Let,
    "puts" => TokenType::Puts,
    "return" => TokenType::Return,
    "true" => TokenType::True,
    "while" => TokenType::While,
};

#[cfg(test)]
mod scanner_tests {
    use crate::scanner::{self, ScanError};
    use crate::token::{TokenKind, TokenType};

    #[test]
    fn basic_scanner_test() {
        let tokens = scanner::scan_tokens("x = 2").unwrap();
        assert_eq!(tokens.len(), 4);
        assert!(matches!(&tokens[0].tokentype, TokenType::Identifier(x) if x == "x"));
        assert!(matches!(tokens[1].tokentype, TokenType::Equal));
        assert!(matches!(tokens[2].tokentype, TokenType::Number(x) if x == 2.0));
        assert!(matches!(tokens[3].tokentype, TokenType::EOF));
    }

    #[test]
    fn range_is_not_a_decimal_point() {
        let tokens = scanner::scan_tokens("1..5 1.5 2.").unwrap();
        let types: Vec<TokenType> = tokens.into_iter().map(|t| t.tokentype).collect();
        assert_eq!(
            types,
            vec![
                TokenType::Number(1.0),
                TokenType::DotDot,
                TokenType::Number(5.0),
                TokenType::Number(1.5),
                TokenType::Number(2.0),
                TokenType::Dot,
                TokenType::EOF,
            ]
        );
    }

    #[test]
    fn keywords_are_reclassified() {
        let tokens = scanner::scan_tokens("let letter fn puts").unwrap();
        assert!(matches!(tokens[0].tokentype, TokenType::Let));
        assert!(matches!(&tokens[1].tokentype, TokenType::Identifier(x) if x == "letter"));
        assert!(matches!(tokens[2].tokentype, TokenType::Fn));
        assert!(matches!(tokens[3].tokentype, TokenType::Puts));
        assert_eq!(tokens[0].tokentype.kind(), TokenKind::Keyword);
        assert_eq!(tokens[1].tokentype.kind(), TokenKind::Identifier);
    }

    #[test]
    fn comments_and_lines() {
        let tokens = scanner::scan_tokens("a // ignored ( {\nb\n\nc").unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[2].line, 4);
    }

    #[test]
    fn two_character_operators() {
        let tokens = scanner::scan_tokens("== != <= >= && || -> ..").unwrap();
        let types: Vec<TokenType> = tokens.into_iter().map(|t| t.tokentype).collect();
        assert_eq!(
            types,
            vec![
                TokenType::EqualEqual,
                TokenType::BangEqual,
                TokenType::LessEqual,
                TokenType::GreaterEqual,
                TokenType::And,
                TokenType::Or,
                TokenType::Arrow,
                TokenType::DotDot,
                TokenType::EOF,
            ]
        );
    }

    #[test]
    fn string_escapes_and_interpolation_marker() {
        let tokens = scanner::scan_tokens(r#""a\tb\n\"q\" \\ \z #{x}""#).unwrap();
        assert_eq!(tokens[0].lexeme, "a\tb\n\"q\" \\ z #{x}");
        assert!(matches!(&tokens[0].tokentype, TokenType::String(s) if s == &tokens[0].lexeme));
    }

    #[test]
    fn unterminated_string_fails() {
        assert_eq!(
            scanner::scan_tokens("puts 1\nputs \"oops").unwrap_err(),
            ScanError::UnterminatedString { line: 2 }
        );
        assert!(scanner::scan_tokens("\"trailing\\").is_err());
    }

    #[test]
    fn unknown_character_ends_stream() {
        let tokens = scanner::scan_tokens("a @ b").unwrap();
        assert_eq!(tokens.len(), 2);
        assert!(matches!(tokens[1].tokentype, TokenType::EOF));

        let tokens = scanner::scan_tokens("a & b").unwrap();
        assert_eq!(tokens.len(), 2);
    }
}
