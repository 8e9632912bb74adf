use std::io;

use thiserror::Error;

/// Errors raised while turning text into a [`Document`](crate::Document).
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read data")]
    ReadFailure(#[from] io::Error),
    #[error("data is not valid UTF-8")]
    InvalidEncoding,
    #[error("line {line}: {reason}")]
    MalformedInput { line: usize, reason: Malformed },
    #[error("line {line}: section {name:?} already defined")]
    DuplicateSection { name: String, line: usize },
}

/// Why a line could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Malformed {
    #[error("entry appears before any section header")]
    EntryOutsideSection,
    #[error("section name cannot be empty")]
    SectionNameEmpty,
    #[error("unterminated section header")]
    UnterminatedHeader,
    #[error("unexpected text after section header")]
    TrailingText,
    #[error("key cannot be empty")]
    KeyEmpty,
    #[error("expected `key = value`")]
    MissingDelimiter,
}

/// Errors raised when reading a value back out of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("no section {0:?}")]
    MissingSection(String),
    #[error("no option {key:?} in section {section:?}")]
    MissingKey { section: String, key: String },
    #[error("option {key:?} in section {section:?} is not a valid {expected}: {value:?}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceholderError {
    #[error("unterminated {{{{ NAME }}}} sequence")]
    Unterminated,
    #[error("no value for placeholder {0:?}")]
    NotFound(String),
}
