#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum TokenType {
    LeftParen, RightParen, // ()
    Comma,
    Equal, BangEqual,
    Greater, GreaterEqual,
    Less, LessEqual,
    And, Or, In,
    Field, // delimited field name, only in delimited mode
    Identifier,
    Number,
    Str,
    Unknown, // any other single character
    EOF,
}

impl TokenType {
    /// True for tokens that can stand on their own as a value or a field name.
    pub fn is_value(self) -> bool {
        matches!(self, TokenType::Field | TokenType::Identifier | TokenType::Number | TokenType::Str)
    }
}
