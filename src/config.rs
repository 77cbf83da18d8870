use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("'{0}' cannot be used as field delimiter, it is part of the query syntax")]
    ReservedDelimiter(char),
}

/// Options shared by the scanner and the parser.
///
/// With a field delimiter set, field names must be written between two delimiter
/// marks (e.g. `` `first-name` = 'Ann' ``), which lets them contain characters that
/// would otherwise be read as part of a value. Without it, any identifier is accepted
/// in field position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserConfig {
    field_delimiter: Option<char>,
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires field names to be enclosed in `delimiter`. Whitespace, quotes,
    /// operator and punctuation characters and the characters of bare values are
    /// rejected, since the scanner would no longer see them as what they are.
    pub fn with_field_delimiter(mut self, delimiter: char) -> Result<Self, ConfigError> {
        self.field_delimiter = Some(Self::check_field_delimiter(delimiter)?);
        Ok(self)
    }

    pub fn check_field_delimiter(delimiter: char) -> Result<char, ConfigError> {
        let reserved = delimiter.is_whitespace()
            || delimiter.is_ascii_alphanumeric()
            || "()',\"=!<>_-+".contains(delimiter);
        if reserved {
            return Err(ConfigError::ReservedDelimiter(delimiter))
        }
        Ok(delimiter)
    }

    pub fn field_delimiter(&self) -> Option<char> {
        self.field_delimiter
    }

    pub fn requires_field_delimiter(&self) -> bool {
        self.field_delimiter.is_some()
    }
}
