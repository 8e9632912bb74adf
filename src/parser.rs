use std::str::Lines;

use crate::ParseMode;
use crate::error::{Malformed, ParseError};
use crate::section::Section;

/// Represents an on-going parse.
#[derive(Debug, Clone)]
pub struct Parser<'a> {
    lines: Lines<'a>,
    line: usize,
    mode: ParseMode,
    sections: Vec<Section>,
    current: Option<usize>,
    // Set after a header is skipped in lenient mode; entries are dropped until the next header.
    orphaned: bool,
}

impl<'a> Parser<'a> {
    #[must_use]
    pub fn new(text: &'a str, mode: ParseMode) -> Self {
        Self {
            lines: text.lines(),
            line: 0,
            mode,
            sections: Vec::with_capacity(8),
            current: None,
            orphaned: false,
        }
    }
}

impl Parser<'_> {
    pub fn into_sections(mut self) -> Result<Vec<Section>, ParseError> {
        while let Some(raw) = self.lines.next() {
            self.line += 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with(['#', ';']) {
                continue;
            }

            if line.starts_with('[') {
                self.parse_section_header(line)?;
            } else {
                self.parse_entry(line)?;
            }
        }

        Ok(self.sections)
    }

    /// Decide what to do with a line that could not be parsed.
    fn malformed(&self, reason: Malformed) -> Result<(), ParseError> {
        let line = self.line;

        // An entry with no section to land in is never recoverable.
        if self.mode == ParseMode::Strict || reason == Malformed::EntryOutsideSection {
            return Err(ParseError::MalformedInput { line, reason });
        }

        tracing::warn!(line, %reason, "skipping malformed line");
        Ok(())
    }

    fn parse_section_header(&mut self, line: &str) -> Result<(), ParseError> {
        let name = match parse_section_name(line) {
            Ok(name) => name,
            Err(reason) => {
                self.malformed(reason)?;
                self.current = None;
                self.orphaned = true;
                return Ok(());
            }
        };

        self.orphaned = false;

        if let Some(i) = self.sections.iter().position(|s| s.name() == name) {
            if self.mode == ParseMode::Strict {
                return Err(ParseError::DuplicateSection {
                    name: name.to_owned(),
                    line: self.line,
                });
            }

            tracing::debug!(line = self.line, section = name, "merging repeated section");
            self.current = Some(i);
            return Ok(());
        }

        tracing::debug!(line = self.line, section = name, "opening section");
        self.sections.push(Section::new(name.to_owned()));
        self.current = Some(self.sections.len() - 1);

        Ok(())
    }

    fn parse_entry(&mut self, line: &str) -> Result<(), ParseError> {
        let Some((key, value)) = line.split_once('=') else {
            return self.malformed(Malformed::MissingDelimiter);
        };

        if self.orphaned {
            tracing::warn!(line = self.line, "skipping entry under malformed section header");
            return Ok(());
        }

        let Some(i) = self.current else {
            return self.malformed(Malformed::EntryOutsideSection);
        };

        let key = key.trim();
        if key.is_empty() {
            return self.malformed(Malformed::KeyEmpty);
        }

        let section = &mut self.sections[i];
        if section.insert(key, value.trim().to_owned()).is_some() {
            tracing::debug!(
                line = self.line,
                section = section.name(),
                key,
                "option reassigned"
            );
        }

        Ok(())
    }
}

/// Extract the name from a trimmed `[name]` line. Anything after the closing bracket must be
/// whitespace or a comment.
fn parse_section_name(line: &str) -> Result<&str, Malformed> {
    let inner = line.strip_prefix('[').unwrap_or(line);
    let Some((name, rest)) = inner.split_once(']') else {
        return Err(Malformed::UnterminatedHeader);
    };

    let rest = rest.trim_start();
    if !(rest.is_empty() || rest.starts_with(['#', ';'])) {
        return Err(Malformed::TrailingText);
    }

    let name = name.trim();
    if name.is_empty() {
        return Err(Malformed::SectionNameEmpty);
    }

    Ok(name)
}
