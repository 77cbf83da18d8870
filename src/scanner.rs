use std::fmt;
use std::ops::Range;

use crate::config::ParserConfig;
use crate::expr::Literal;
use crate::token_type::TokenType::{self, *};

/// The `Scanner` loops through the query text, identifying tokens and returning them as
/// Vec<Token>. Scanning never fails: characters that fit no rule become `Unknown` tokens
/// and are rejected later by the parser.
pub struct Scanner<'a> {
    source: &'a str,
    chars: std::str::CharIndices<'a>, // iterator over chars of source
    config: ParserConfig,
    tokens: Vec<Token>,
    start: usize,   // byte index of first char of lexeme
    current: usize, // byte index of next char
    line: usize,    // current line in source
    column: usize,  // current column in source
    line_start: usize,   // line of first char of lexeme
    column_start: usize, // column of first char of lexeme
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str, config: ParserConfig) -> Self {
        Scanner {
            source,
            chars: source.char_indices(),
            config,
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            column: 1,
            line_start: 1,
            column_start: 1,
        }
    }

    /// Scans the whole source. The returned tokens always end with a single `EOF` token.
    pub fn scan(mut self) -> Vec<Token> {
        while !self.at_end() {
            self.start = self.current;
            self.line_start = self.line;
            self.column_start = self.column;
            self.scan_token();
        }
        self.start = self.current;
        self.line_start = self.line;
        self.column_start = self.column;
        self.add_token(EOF, None);

        tracing::debug!(tokens = self.tokens.len(), "scanned query");
        self.tokens
    }

    fn scan_token(&mut self) {
        let c = match self.advance() {
            Some(ch) => ch,
            None => return,
        };

        match c {
            // delimited field names take priority over every other rule
            _ if Some(c) == self.config.field_delimiter() => self.delimited(c, Field),
            '(' => self.add_token(LeftParen, None),
            ')' => self.add_token(RightParen, None),
            ',' => self.add_token(Comma, None),
            '=' => self.add_token(Equal, None),
            '!' => self.match_and_add_token('=', BangEqual, Unknown),
            '<' => self.match_and_add_token('=', LessEqual, Less),
            '>' => self.match_and_add_token('=', GreaterEqual, Greater),
            '\'' | '"' => self.delimited(c, Str),
            '-' | '+' if matches!(self.peek(), Some(d) if d.is_ascii_digit()) => self.value(),
            _ if c.is_ascii_digit() => self.value(),
            _ if Self::is_alpha(c) => self.identifier(),
            _ if c.is_whitespace() => {} // ignore whitespace
            _ => self.add_token(Unknown, None),
        }
    }

    /// Identifier, bare value or one of the keywords AND, OR, IN.
    fn identifier(&mut self) {
        self.consume_value_chars();

        let source = self.source;
        let lexeme = &source[self.start..self.current];
        let keyword = match lexeme.to_ascii_uppercase().as_str() {
            "AND" => Some(And),
            "OR" => Some(Or),
            "IN" => Some(In),
            _ => None,
        };

        match keyword {
            Some(variant) => self.add_token(variant, None),
            None => {
                let literal = Literal::Identifier(lexeme.to_string());
                self.add_token(Identifier, Some(literal))
            }
        }
    }

    /// Value starting with a digit or a sign. Signed or unsigned runs of digits are
    /// numbers, anything longer (`2024-01-01`, `1a`) is a bare value.
    fn value(&mut self) {
        self.consume_value_chars();

        let source = self.source;
        let lexeme = &source[self.start..self.current];
        let digits = lexeme.strip_prefix(['-', '+']).unwrap_or(lexeme);
        if digits.chars().all(|c| c.is_ascii_digit()) {
            let literal = Literal::Number(lexeme.to_string());
            self.add_token(Number, Some(literal))
        } else {
            let literal = Literal::Identifier(lexeme.to_string());
            self.add_token(Identifier, Some(literal))
        }
    }

    /// Text between two `mark`s, used for quoted strings and delimited field names.
    /// Without a closing mark only the opening mark is emitted, as an `Unknown` token.
    fn delimited(&mut self, mark: char, variant: TokenType) {
        let rest = &self.source[self.current..];
        let Some(len) = rest.find(mark) else {
            return self.add_token(Unknown, None);
        };

        let content = rest[..len].to_string();
        while self.current < self.start + mark.len_utf8() + len + mark.len_utf8() {
            self.advance();
        }

        let literal = match variant {
            Str => Literal::Str(content),
            _ => Literal::Identifier(content),
        };
        self.add_token(variant, Some(literal))
    }

    fn consume_value_chars(&mut self) {
        while matches!(self.peek(), Some(c) if Self::is_value_char(c)) {
            self.advance();
        }
    }

    fn is_alpha(c: char) -> bool {
        c.is_ascii_alphabetic() || c == '_'
    }

    fn is_value_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+')
    }

    fn match_and_add_token(&mut self, expected: char, type1: TokenType, type2: TokenType) {
        let token = if self.match_char(expected) { type1 } else { type2 };
        self.add_token(token, None)
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            return true
        }
        false
    }

    fn at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    /// Return current char and advance to next.
    fn advance(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        self.current += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Return current char without advancing.
    fn peek(&self) -> Option<char> {
        self.chars.clone().next().map(|(_, c)| c)
    }

    fn add_token(&mut self, variant: TokenType, literal: Option<Literal>) {
        let token = Token {
            variant,
            lexeme: self.source[self.start..self.current].to_string(),
            literal,
            span: self.start..self.current,
            line: self.line_start,
            column: self.column_start,
        };
        tracing::trace!(token = %token, "scanned token");
        self.tokens.push(token);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub variant: TokenType,
    /// Raw source text, including quotes or field delimiters.
    pub lexeme: String,
    /// Present for value-shaped tokens: the value with quotes stripped. For `Field`
    /// tokens it holds the field name without delimiters.
    pub literal: Option<Literal>,
    /// Byte range of the lexeme in the source.
    pub span: Range<usize>,
    pub line: usize,
    pub column: usize,
}

impl Token {
    /// Literal text if the token has one, the raw lexeme otherwise.
    pub fn text(&self) -> &str {
        match &self.literal {
            Some(literal) => literal.as_str(),
            None => &self.lexeme,
        }
    }

    /// Case-insensitive comparison of the lexeme, used for `NOT`.
    pub fn is_word(&self, word: &str) -> bool {
        self.variant == Identifier && self.lexeme.eq_ignore_ascii_case(word)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{} {}", self.variant, self.lexeme)?;
        if let Some(literal) = &self.literal {
            write!(f, " {}", literal)?;
        }
        Ok(())
    }
}

/// Tokenizes `input` with the default configuration (no field delimiter).
pub fn tokenize(input: &str) -> Vec<Token> {
    tokenize_with(input, &ParserConfig::default())
}

pub fn tokenize_with(input: &str, config: &ParserConfig) -> Vec<Token> {
    Scanner::new(input, *config).scan()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variants(input: &str) -> Vec<TokenType> {
        tokenize(input).iter().map(|t| t.variant).collect()
    }

    fn lexemes(input: &str) -> Vec<String> {
        tokenize(input).into_iter().map(|t| t.lexeme).collect()
    }

    #[test]
    fn empty_input_is_only_eof() {
        let tokens = tokenize("   \t\n ");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].variant, EOF);
        assert_eq!(tokens[0].span, 6..6);
    }

    #[test]
    fn operators_prefer_two_characters() {
        assert_eq!(
            variants("a!=1 b<=2 c>=3 d<4 e>5 f=6"),
            vec![
                Identifier, BangEqual, Number,
                Identifier, LessEqual, Number,
                Identifier, GreaterEqual, Number,
                Identifier, Less, Number,
                Identifier, Greater, Number,
                Identifier, Equal, Number,
                EOF,
            ]
        );
    }

    #[test]
    fn punctuation() {
        assert_eq!(variants("(,)"), vec![LeftParen, Comma, RightParen, EOF]);
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(variants("and OR In aNd"), vec![And, Or, In, And, EOF]);
        // keyword text keeps its case
        assert_eq!(lexemes("and"), vec!["and", ""]);
    }

    #[test]
    fn not_is_an_identifier() {
        let tokens = tokenize("x NOT IN (1)");
        assert_eq!(tokens[1].variant, Identifier);
        assert!(tokens[1].is_word("not"));
        assert_eq!(tokens[2].variant, In);
    }

    #[test]
    fn identifiers_with_hyphen_and_plus() {
        let tokens = tokenize("hello-world foo-bar+123 _x");
        assert_eq!(tokens[0].literal, Some(Literal::Identifier("hello-world".into())));
        assert_eq!(tokens[1].literal, Some(Literal::Identifier("foo-bar+123".into())));
        assert_eq!(tokens[2].literal, Some(Literal::Identifier("_x".into())));
    }

    #[test]
    fn numbers_and_bare_values_starting_with_digits() {
        let tokens = tokenize("42 -7 +3 2024-01-01 1a");
        assert_eq!(tokens[0].literal, Some(Literal::Number("42".into())));
        assert_eq!(tokens[1].literal, Some(Literal::Number("-7".into())));
        assert_eq!(tokens[2].literal, Some(Literal::Number("+3".into())));
        assert_eq!(tokens[3].literal, Some(Literal::Identifier("2024-01-01".into())));
        assert_eq!(tokens[4].literal, Some(Literal::Identifier("1a".into())));
    }

    #[test]
    fn quoted_strings_strip_quotes_without_escapes() {
        let tokens = tokenize(r#"'a b' "it's" '"x"'"#);
        assert_eq!(tokens[0].literal, Some(Literal::Str("a b".into())));
        assert_eq!(tokens[0].lexeme, "'a b'");
        assert_eq!(tokens[1].literal, Some(Literal::Str("it's".into())));
        assert_eq!(tokens[2].literal, Some(Literal::Str("\"x\"".into())));
    }

    #[test]
    fn unterminated_quote_is_unknown() {
        let tokens = tokenize("'abc");
        assert_eq!(tokens[0].variant, Unknown);
        assert_eq!(tokens[0].lexeme, "'");
        assert_eq!(tokens[1].literal, Some(Literal::Identifier("abc".into())));
    }

    #[test]
    fn unknown_characters_become_single_tokens() {
        assert_eq!(lexemes("a ~ 1"), vec!["a", "~", "1", ""]);
        assert_eq!(variants("!"), vec![Unknown, EOF]);
        assert_eq!(variants("- x"), vec![Unknown, Identifier, EOF]);
        assert_eq!(variants("é"), vec![Unknown, EOF]);
    }

    #[test]
    fn delimited_fields() {
        let config = ParserConfig::new().with_field_delimiter('`').unwrap();
        let tokens = tokenize_with("`first-name+x` = 'Ann'", &config);
        assert_eq!(tokens[0].variant, Field);
        assert_eq!(tokens[0].text(), "first-name+x");
        assert_eq!(tokens[0].lexeme, "`first-name+x`");
        assert_eq!(tokens[1].variant, Equal);
        assert_eq!(tokens[2].variant, Str);
    }

    #[test]
    fn delimiter_is_unknown_without_config() {
        assert_eq!(variants("`a`"), vec![Unknown, Identifier, Unknown, EOF]);
    }

    #[test]
    fn spans_lines_and_columns() {
        let tokens = tokenize("a = 1\n  AND b");
        assert_eq!(tokens[2].span, 4..5);
        assert_eq!((tokens[3].line, tokens[3].column), (2, 3));
        assert_eq!(tokens[3].span, 8..11);
        assert_eq!(tokens[4].span, 12..13);
    }

    #[test]
    fn whitespace_does_not_change_tokens() {
        let compact: Vec<String> = lexemes("(A=1 OR B!='x')AND C IN(1,2)");
        let spaced: Vec<String> = lexemes("  ( A = 1  OR  B != 'x' )\n AND C IN ( 1 , 2 ) ");
        assert_eq!(compact, spaced);
    }
}
