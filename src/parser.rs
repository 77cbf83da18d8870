/// A recursive descent parser for boolean filter queries.
///
/// Grammar, loosest binding first:
///
/// or_group   -> and_group ( "OR" and_group )*
/// and_group  -> primary ( "AND" primary )*
/// primary    -> "(" or_group ")" | field ( condition | membership )
/// condition  -> ( "=" | "!=" | "<" | "<=" | ">" | ">=" ) VALUE
/// membership -> ( "IN" | "NOT" "IN" ) "(" VALUE ( "," VALUE )* ")"
/// field      -> IDENTIFIER | FIELD (when a field delimiter is configured)
///
/// Examples: "A = 1", "(A = 1 OR B != 'x') AND C IN (1, 2)", "D NOT IN (foo-bar, 'a+b')"

use std::str::FromStr;

use strum::IntoEnumIterator;

use crate::config::ParserConfig;
use crate::error::{ErrorKind, ParseError};
use crate::expr::{Expr, Literal, Operator};
use crate::scanner::Token;
use crate::token_type::TokenType::{self, *};

/// Deepest parenthesis nesting accepted by the parser.
pub const MAX_NESTING: usize = 256;

/// Stand-in for token slices that do not end with `EOF`.
static END: Token = Token {
    variant: EOF,
    lexeme: String::new(),
    literal: None,
    span: 0..0,
    line: 1,
    column: 1,
};

pub struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
    depth: usize,
    config: ParserConfig,
}

impl<'a> Parser<'a> {

    /// `tokens` should come from `tokenize_with` called with the same `config`.
    pub fn new(tokens: &'a [Token], config: ParserConfig) -> Self {
        Parser {
            tokens,
            current: 0,
            depth: 0,
            config,
        }
    }

    /// Parses all tokens into a syntax tree. Stops at the first error.
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let result = self.or_group().and_then(|expr| {
            if self.at_end() {
                Ok(expr)
            } else if self.check(RightParen) {
                Err(self.error(ErrorKind::UnbalancedParenthesis, "')' without matching '('".to_string()))
            } else {
                let msg = format!("unexpected '{}' after complete expression", self.peek().lexeme);
                Err(self.error(ErrorKind::UnexpectedToken, msg))
            }
        });

        match &result {
            Ok(expr) => tracing::debug!(conditions = expr.conditions().len(), "parsed query"),
            Err(error) => tracing::debug!(kind = %error.kind, token = %error.token, "failed to parse query"),
        }
        result
    }

    /// Matches production: or_group -> and_group ( "OR" and_group )*
    fn or_group(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.and_group()?;
        while self.match_token(&[Or]) {
            let right = self.and_group()?;
            left = Expr::or(left, right);
        }
        Ok(left)
    }

    /// Matches production: and_group -> primary ( "AND" primary )*
    fn and_group(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.primary()?;
        while self.match_token(&[And]) {
            let right = self.primary()?;
            left = Expr::and(left, right);
        }

        match self.peek().variant {
            Or | RightParen | EOF => Ok(left),
            // Case: missing 'AND' or 'OR'. Ex.: 'A = 1 B = 2'
            variant if variant.is_value() => {
                let msg = format!("missing AND/OR between conditions near '{}'", self.peek().lexeme);
                Err(self.error(ErrorKind::MissingConnective, msg))
            }
            // anything else is rejected by the caller
            _ => Ok(left),
        }
    }

    /// Matches production: primary -> "(" or_group ")" | field ( condition | membership )
    fn primary(&mut self) -> Result<Expr, ParseError> {
        if self.check(LeftParen) {
            let open = self.peek();
            if self.depth == MAX_NESTING {
                let msg = format!("parentheses nested deeper than {} levels", MAX_NESTING);
                return Err(self.error(ErrorKind::NestingTooDeep, msg))
            }
            self.advance();
            self.depth += 1;
            let expr = self.or_group();
            self.depth -= 1;
            let expr = expr?;
            if !self.match_token(&[RightParen]) {
                let msg = format!("expected ')' to close '(' at {}:{}", open.line, open.column);
                return Err(self.error(ErrorKind::UnbalancedParenthesis, msg))
            }
            return Ok(expr)
        }

        let field = self.field()?;
        if self.check(In) || (self.peek().is_word("NOT") && self.check_next(In)) {
            self.membership(field)
        } else {
            self.condition(field)
        }
    }

    /// Matches the field name in front of an operator. Ex.: 'A', 'hello-world' or, with a
    /// delimiter configured, '`first-name`'
    fn field(&mut self) -> Result<String, ParseError> {
        let token = self.peek();
        if token.variant == EOF {
            return Err(self.error(ErrorKind::UnexpectedEndOfInput, "expected field name".to_string()))
        }

        let name = match self.config.field_delimiter() {
            Some(delimiter) => {
                if token.variant != Field {
                    let msg = format!("field name must be enclosed in '{}', found '{}'", delimiter, token.lexeme);
                    return Err(self.error(ErrorKind::InvalidFieldName, msg))
                }
                if token.text().is_empty() {
                    return Err(self.error(ErrorKind::InvalidFieldName, "empty field name".to_string()))
                }
                token.text()
            }
            None => {
                if token.variant != Identifier || !token.lexeme.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
                    let msg = format!("expected field name, found '{}'", token.lexeme);
                    return Err(self.error(ErrorKind::UnexpectedToken, msg))
                }
                token.text()
            }
        };

        self.advance();
        Ok(name.to_string())
    }

    /// Matches production: condition -> OPERATOR VALUE
    /// Ex.: '>= 5' or "!= 'x'"
    fn condition(&mut self, field: String) -> Result<Expr, ParseError> {
        let token = self.peek();
        if token.variant == EOF {
            let msg = format!("expected operator after '{}'", field);
            return Err(self.error(ErrorKind::UnexpectedEndOfInput, msg))
        }

        let operator = match Operator::from_str(&token.lexeme) {
            Ok(operator) => operator,
            Err(_) => {
                let expected: Vec<String> = Operator::iter().map(|op| format!("'{}'", op)).collect();
                let msg = format!(
                    "invalid operator '{}', expected one of {}, IN, NOT IN",
                    token.lexeme,
                    expected.join(", ")
                );
                return Err(self.error(ErrorKind::InvalidOperator, msg))
            }
        };
        self.advance();

        let token = self.peek();
        if token.variant == EOF {
            let msg = format!("missing value after operator '{}'", operator);
            return Err(self.error(ErrorKind::UnexpectedEndOfInput, msg))
        }
        let Some(value) = Self::value(token) else {
            let msg = format!("expected value after '{}', found '{}'", operator, token.lexeme);
            return Err(self.error(ErrorKind::InvalidValue, msg))
        };
        self.advance();

        Ok(Expr::condition(field, operator, value))
    }

    /// Matches production: membership -> ( "IN" | "NOT" "IN" ) "(" VALUE ( "," VALUE )* ")"
    /// Ex.: "IN (1, 2, 3)" or "NOT IN ('a', b-c)"
    fn membership(&mut self, field: String) -> Result<Expr, ParseError> {
        let negated = if self.match_token(&[In]) {
            false
        } else {
            self.advance(); // consume 'NOT'
            self.advance(); // consume 'IN'
            true
        };
        let keyword = if negated { "NOT IN" } else { "IN" };

        if !self.match_token(&[LeftParen]) {
            let msg = format!("expected '(' after {}", keyword);
            return Err(self.error(ErrorKind::MalformedMembershipList, msg))
        }

        let mut values = Vec::new();
        loop {
            let token = self.peek();
            match token.variant {
                EOF => {
                    let msg = format!("unexpected end of {} list", keyword);
                    return Err(self.error(ErrorKind::UnexpectedEndOfInput, msg))
                }
                RightParen if values.is_empty() => {
                    let msg = format!("empty {} list", keyword);
                    return Err(self.error(ErrorKind::MalformedMembershipList, msg))
                }
                _ => {}
            }
            let Some(value) = Self::value(token) else {
                let msg = format!("expected value in {} list, found '{}'", keyword, token.lexeme);
                return Err(self.error(ErrorKind::MalformedMembershipList, msg))
            };
            values.push(value);
            self.advance();

            if self.match_token(&[RightParen]) {
                break
            }
            if self.at_end() {
                let msg = format!("expected ')' to close {} list", keyword);
                return Err(self.error(ErrorKind::MalformedMembershipList, msg))
            }
            if !self.match_token(&[Comma]) {
                let msg = format!("expected ',' between {} values, found '{}'", keyword, self.peek().lexeme);
                return Err(self.error(ErrorKind::MalformedMembershipList, msg))
            }
        }

        Ok(Expr::membership(field, negated, values))
    }

    /// Literal of a token usable as a value. Delimited field names are not values.
    fn value(token: &Token) -> Option<Literal> {
        match token.variant {
            Identifier | Number | Str => token.literal.clone(),
            _ => None,
        }
    }

    fn match_token(&mut self, token_types: &[TokenType]) -> bool {
        for token_type in token_types {
            if self.check(*token_type) {
                self.advance();
                return true
            }
        }
        false
    }

    fn check(&self, token_type: TokenType) -> bool {
        self.peek().variant == token_type
    }

    fn check_next(&self, token_type: TokenType) -> bool {
        self.tokens
            .get(self.current + 1)
            .is_some_and(|token| token.variant == token_type)
    }

    fn advance(&mut self) {
        if !self.at_end() {
            self.current += 1;
        }
    }

    fn peek(&self) -> &'a Token {
        self.tokens.get(self.current).unwrap_or(&END)
    }

    fn at_end(&self) -> bool {
        self.peek().variant == EOF
    }

    fn error(&self, kind: ErrorKind, message: String) -> ParseError {
        ParseError::new(kind, message, self.peek())
    }
}
