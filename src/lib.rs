//! Tokenizer and recursive-descent parser for boolean filter queries such as
//!
//! ```text
//! (A = hello-world AND B >= 5) OR C IN (x-y, "a+b") AND D NOT IN ('x', 1)
//! ```
//!
//! `AND` binds tighter than `OR`, both fold to the left, and parentheses group. The
//! result is an [`Expr`] tree; evaluation is left to the caller.
//!
//! ```
//! use filter_query::{parse_query, Expr, Literal, Operator};
//!
//! let expr = parse_query("A = 1 OR B = 2").unwrap();
//! assert_eq!(
//!     expr,
//!     Expr::or(
//!         Expr::condition("A", Operator::Eq, Literal::Number("1".into())),
//!         Expr::condition("B", Operator::Eq, Literal::Number("2".into())),
//!     )
//! );
//! ```

pub mod config;
pub mod error;
pub mod expr;
pub mod parser;
pub mod scanner;
pub mod token_type;

pub use config::{ConfigError, ParserConfig};
pub use error::{ErrorKind, ParseError};
pub use expr::{Expr, Literal, Operator};
pub use parser::Parser;
pub use scanner::{Token, tokenize, tokenize_with};

/// Parses `text` with the default configuration.
pub fn parse_query(text: &str) -> Result<Expr, ParseError> {
    parse_query_with(text, &ParserConfig::default())
}

pub fn parse_query_with(text: &str, config: &ParserConfig) -> Result<Expr, ParseError> {
    let tokens = tokenize_with(text, config);
    Parser::new(&tokens, *config).parse()
}
