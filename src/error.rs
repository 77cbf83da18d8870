use std::io::IsTerminal;
use std::ops::Range;

use ariadne::{self, Config, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::scanner::Token;

/// Category of a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ErrorKind {
    /// Input ended where a field, operator, value or list element was required.
    #[strum(to_string = "unexpected end of input")]
    UnexpectedEndOfInput,
    /// Two complete conditions without `AND`/`OR` between them.
    #[strum(to_string = "missing connective")]
    MissingConnective,
    #[strum(to_string = "invalid operator")]
    InvalidOperator,
    /// Field token lacks the configured delimiter, or the delimited name is empty.
    #[strum(to_string = "invalid field name")]
    InvalidFieldName,
    /// Token in value position is not a number, string or bare value.
    #[strum(to_string = "invalid value")]
    InvalidValue,
    #[strum(to_string = "unbalanced parenthesis")]
    UnbalancedParenthesis,
    #[strum(to_string = "malformed membership list")]
    MalformedMembershipList,
    /// Token that no grammar rule can consume.
    #[strum(to_string = "unexpected token")]
    UnexpectedToken,
    /// Parentheses nested deeper than `parser::MAX_NESTING`.
    #[strum(to_string = "nesting too deep")]
    NestingTooDeep,
}

/// The first error encountered while parsing. Parsing stops there, no partial tree is
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: String,
    /// Raw text of the offending token, empty at end of input.
    pub token: String,
    /// Byte range of the offending token in the query.
    pub span: Range<usize>,
}

impl ParseError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, token: &Token) -> Self {
        ParseError {
            kind,
            message: message.into(),
            token: token.lexeme.clone(),
            span: token.span.clone(),
        }
    }

    /// Builds an ariadne report labelling the offending token.
    pub fn report<'a>(&self, source_name: &'a str, source: &str, color: bool) -> Report<'a, (&'a str, Range<usize>)> {
        let span = self.label_span(source);
        Report::build(ReportKind::Error, (source_name, span.clone()))
            .with_config(Config::default().with_color(color).with_index_type(ariadne::IndexType::Byte))
            .with_message(format!("Parsing error: {}", self.kind))
            .with_label(Label::new((source_name, span)).with_message(&self.message))
            .finish()
    }

    /// Report as plain text, without colors.
    pub fn render(&self, source_name: &str, source: &str) -> String {
        let mut buffer = Vec::<u8>::new();
        let written = self
            .report(source_name, source, false)
            .write((source_name, Source::from(source)), &mut buffer);
        match written {
            Ok(()) => String::from_utf8_lossy(&buffer).into_owned(),
            Err(_) => self.to_string(),
        }
    }

    /// Prints the report to stderr, colored when stderr is a terminal.
    pub fn eprint(&self, source_name: &str, source: &str) {
        let color = std::io::stderr().is_terminal();
        if let Err(io_error) = self
            .report(source_name, source, color)
            .eprint((source_name, Source::from(source)))
        {
            tracing::warn!(%io_error, "could not print error report");
            eprintln!("{}", self);
        }
    }

    /// Zero-width spans (end of input) are widened to the neighbouring character so the
    /// label has something to point at. Spans that do not fit `source` collapse to its end.
    fn label_span(&self, source: &str) -> Range<usize> {
        let fits = |span: &Range<usize>| {
            span.end <= source.len() && source.is_char_boundary(span.start) && source.is_char_boundary(span.end)
        };
        if !self.span.is_empty() && fits(&self.span) {
            return self.span.clone()
        }

        let mut start = self.span.start.min(source.len());
        while !source.is_char_boundary(start) {
            start -= 1;
        }
        if let Some(c) = source[start..].chars().next() {
            start..start + c.len_utf8()
        } else if let Some(c) = source[..start].chars().next_back() {
            start - c.len_utf8()..start
        } else {
            start..start
        }
    }
}

/// Prints the error as an ariadne report to stderr.
pub fn print_error(source: &str, error: &ParseError) {
    error.eprint("query", source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_type::TokenType;

    fn token(lexeme: &str, span: Range<usize>) -> Token {
        Token { variant: TokenType::Unknown, lexeme: lexeme.to_string(), literal: None, span, line: 1, column: 1 }
    }

    #[test]
    fn display_names_category_and_message() {
        let error = ParseError::new(ErrorKind::InvalidOperator, "invalid operator '~'", &token("~", 2..3));
        assert_eq!(error.to_string(), "invalid operator: invalid operator '~'");
        assert_eq!(error.token, "~");
        assert_eq!(error.span, 2..3);
    }

    #[test]
    fn kind_display() {
        let cases = vec![
            (ErrorKind::UnexpectedEndOfInput, "unexpected end of input"),
            (ErrorKind::MissingConnective, "missing connective"),
            (ErrorKind::InvalidFieldName, "invalid field name"),
            (ErrorKind::UnbalancedParenthesis, "unbalanced parenthesis"),
            (ErrorKind::MalformedMembershipList, "malformed membership list"),
            (ErrorKind::NestingTooDeep, "nesting too deep"),
        ];
        for (kind, text) in cases {
            assert_eq!(kind.to_string(), text);
        }
    }

    #[test]
    fn label_span_widens_end_of_input() {
        let error = ParseError::new(ErrorKind::UnexpectedEndOfInput, "expected value", &token("", 5..5));
        assert_eq!(error.label_span("A = 1"), 4..5);
        assert_eq!(error.label_span(""), 0..0);

        let error = ParseError::new(ErrorKind::UnexpectedToken, "unexpected", &token("", 2..2));
        assert_eq!(error.label_span("A = 1"), 2..3);
    }

    #[test]
    fn label_span_keeps_multibyte_characters_whole() {
        // U+3000 is three bytes, U+00A0 two
        let error = ParseError::new(ErrorKind::UnexpectedEndOfInput, "missing value", &token("", 6..6));
        assert_eq!(error.label_span("A =\u{3000}"), 3..6);

        let error = ParseError::new(ErrorKind::UnexpectedEndOfInput, "missing value", &token("", 5..5));
        assert_eq!(error.label_span("A =\u{a0}"), 3..5);

        let error = ParseError::new(ErrorKind::UnexpectedToken, "unexpected", &token("", 1..1));
        assert_eq!(error.label_span("é"), 0..2);
    }

    #[test]
    fn render_end_of_input_after_multibyte_whitespace() {
        for source in ["A =\u{3000}", "A =\u{a0}", "X IN (1,\u{3000}\u{a0}"] {
            let error = crate::parse_query(source).unwrap_err();
            assert_eq!(error.kind, ErrorKind::UnexpectedEndOfInput);
            let rendered = error.render("query", source);
            assert!(rendered.contains(&error.message), "{}", rendered);
        }
    }

    #[test]
    fn render_contains_message_and_source() {
        let source = "A ~ 1";
        let error = ParseError::new(ErrorKind::InvalidOperator, "invalid operator '~'", &token("~", 2..3));
        let rendered = error.render("query", source);
        assert!(rendered.contains("invalid operator '~'"), "{}", rendered);
        assert!(rendered.contains("A ~ 1"), "{}", rendered);
    }
}
