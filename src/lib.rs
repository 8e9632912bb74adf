#![warn(
    clippy::correctness,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::style,
    clippy::pedantic
)]

//! Reader for the sectioned `key = value` configuration file of the S3 compatibility test suite.
//!
//! Values are kept verbatim, including any `{{ NAME }}` placeholders left for a provisioning
//! step to fill in. See [`placeholder`] for the substitution helpers and [`harness`] for the
//! typed settings the test suite reads.

mod error;
pub mod harness;
mod parser;
pub mod placeholder;
mod section;

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;

pub use error::{LookupError, Malformed, ParseError, PlaceholderError};
pub use section::{Entry, Section};

/// Name of the section whose options act as fallbacks for [`Document::lookup`].
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// Byte Order Mark (BOM) some editors prepend to UTF-8 files.
///
/// <https://en.wikipedia.org/wiki/Byte_order_mark>
const BOM_UTF8: &[u8] = &[0xEF, 0xBB, 0xBF];

/// How the parser reacts to lines it cannot make sense of.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Abort on the first malformed line or repeated section header.
    #[default]
    Strict,
    /// Skip malformed lines with a warning and merge repeated sections into the first one.
    Lenient,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    sections: Vec<Section>,
}

impl Document {
    /// Parse `text` in [`ParseMode::Strict`].
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        Self::parse_with(text, ParseMode::Strict)
    }

    pub fn parse_with(text: &str, mode: ParseMode) -> Result<Self, ParseError> {
        let sections = parser::Parser::new(text, mode).into_sections()?;
        Ok(Self { sections })
    }

    pub fn from_reader<R>(reader: &mut R, mode: ParseMode) -> Result<Self, ParseError>
    where
        R: Read,
    {
        let mut buffer = Vec::with_capacity(4096);
        reader.read_to_end(&mut buffer)?;

        let text = decode_data(&buffer)?;
        Self::parse_with(text, mode)
    }

    pub fn load<P>(path: P, mode: ParseMode) -> Result<Self, ParseError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), ?mode, "loading configuration");

        let mut file = fs::File::open(path)?;
        Self::from_reader(&mut file, mode)
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.name() == name)
    }

    #[must_use]
    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    /// The `[DEFAULT]` section, if the document has one.
    #[must_use]
    pub fn defaults(&self) -> Option<&Section> {
        self.section(DEFAULT_SECTION)
    }

    /// Raw value of `key` in `section`. Section names are case-sensitive, keys are not.
    pub fn get(&self, section: &str, key: &str) -> Result<&str, LookupError> {
        self.section(section)
            .ok_or_else(|| LookupError::MissingSection(section.to_owned()))?
            .get(key)
            .ok_or_else(|| LookupError::MissingKey {
                section: section.to_owned(),
                key: key.to_owned(),
            })
    }

    /// Like [`Document::get`], but a missing section or key yields `default`.
    #[must_use]
    pub fn get_or<'a>(&'a self, section: &str, key: &str, default: &'a str) -> &'a str {
        self.get(section, key).unwrap_or(default)
    }

    /// Like [`Document::get`], but falls back to `[DEFAULT]` when `section` lacks the key.
    pub fn lookup(&self, section: &str, key: &str) -> Result<&str, LookupError> {
        match self.get(section, key) {
            Err(LookupError::MissingKey { .. }) => self
                .defaults()
                .and_then(|defaults| defaults.get(key))
                .ok_or_else(|| LookupError::MissingKey {
                    section: section.to_owned(),
                    key: key.to_owned(),
                }),
            result => result,
        }
    }

    /// Read a boolean: `1`, `yes`, `true`, `on` or `0`, `no`, `false`, `off` in any case.
    pub fn get_bool(&self, section: &str, key: &str) -> Result<bool, LookupError> {
        let value = self.get(section, key)?;
        parse_bool(value).ok_or_else(|| invalid_value(section, key, value, "boolean"))
    }

    pub fn get_int(&self, section: &str, key: &str) -> Result<i64, LookupError> {
        let value = self.get(section, key)?;
        value
            .parse()
            .map_err(|_| invalid_value(section, key, value, "integer"))
    }

    /// Every distinct placeholder name used by any value, sorted.
    #[must_use]
    pub fn placeholders(&self) -> BTreeSet<&str> {
        self.sections
            .iter()
            .flat_map(Section::entries)
            .flat_map(|entry| placeholder::placeholders(entry.value()))
            .collect()
    }

    /// Return a copy of the document with every placeholder replaced by `resolve(NAME)`.
    pub fn expand<'v, F>(&self, mut resolve: F) -> Result<Self, PlaceholderError>
    where
        F: FnMut(&str) -> Option<&'v str>,
    {
        let mut expanded = self.clone();

        for section in &mut expanded.sections {
            for entry in section.entries_mut() {
                let value = placeholder::expand_placeholders(entry.value(), &mut resolve)?;
                *entry.value_mut() = value;
            }
        }

        Ok(expanded)
    }
}

/// Serializes back to the same dialect; parsing the output yields an equal document.
impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }

            writeln!(f, "[{}]", section.name())?;

            for entry in section.entries() {
                if entry.value().is_empty() {
                    writeln!(f, "{} =", entry.key())?;
                } else {
                    writeln!(f, "{} = {}", entry.key(), entry.value())?;
                }
            }
        }

        Ok(())
    }
}

fn decode_data(data: &[u8]) -> Result<&str, ParseError> {
    let data = data.strip_prefix(BOM_UTF8).unwrap_or(data);
    std::str::from_utf8(data).map_err(|_| ParseError::InvalidEncoding)
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

pub(crate) fn invalid_value(
    section: &str,
    key: &str,
    value: &str,
    expected: &'static str,
) -> LookupError {
    LookupError::InvalidValue {
        section: section.to_owned(),
        key: key.to_owned(),
        value: value.to_owned(),
        expected,
    }
}
