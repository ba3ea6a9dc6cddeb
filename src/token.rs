use strum_macros::Display;

#[rustfmt::skip]
#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    // Single-character tokens.
    LeftParen, RightParen, LeftBrace, RightBrace, LeftBracket, RightBracket,
    Comma, Colon, Dot, Minus, Plus, Percent, Semicolon, Slash, Star,

    // One or two character tokens.
    Bang, BangEqual,
    Equal, EqualEqual,
    Greater, GreaterEqual,
    Less, LessEqual,
    And, Or, Arrow, DotDot,

    // Literals.
    Identifier(String), String(String), Number(f64),

    // Keywords.
    Else, False, Fn, For, If, In, Let, Puts, Return, True, While,

    EOF
}

/// Coarse classification of a token, as shown by `--tokens`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TokenKind {
    Literal,
    Identifier,
    Keyword,
    Operator,
    Punctuation,
    EndOfInput,
}

impl TokenType {
    pub fn kind(&self) -> TokenKind {
        match self {
            TokenType::Number(_) | TokenType::String(_) => TokenKind::Literal,
            TokenType::Identifier(_) => TokenKind::Identifier,
            TokenType::Else
            | TokenType::False
            | TokenType::Fn
            | TokenType::For
            | TokenType::If
            | TokenType::In
            | TokenType::Let
            | TokenType::Puts
            | TokenType::Return
            | TokenType::True
            | TokenType::While => TokenKind::Keyword,
            TokenType::LeftParen
            | TokenType::RightParen
            | TokenType::LeftBrace
            | TokenType::RightBrace
            | TokenType::LeftBracket
            | TokenType::RightBracket
            | TokenType::Comma
            | TokenType::Colon
            | TokenType::Semicolon => TokenKind::Punctuation,
            TokenType::EOF => TokenKind::EndOfInput,
            _ => TokenKind::Operator,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub tokentype: TokenType,
    pub lexeme: String,
    pub line: usize,
}
