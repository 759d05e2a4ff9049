//! Source location tracking
//!
//! Every term, token and diagnostic carries the unit it came from plus a
//! 1-based line and column. Locations are immutable; advancing produces a new
//! value.
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// A position in a text unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    unit: Arc<str>,
    line: u32,
    column: u32,
}

impl SourceLocation {
    pub fn new(unit: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        debug_assert!(line >= 1 && column >= 1, "locations are 1-based");
        Self {
            unit: unit.into(),
            line,
            column,
        }
    }

    /// Line 1, column 1 of `unit`
    pub fn start(unit: impl Into<Arc<str>>) -> Self {
        Self::new(unit, 1, 1)
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    /// First column of the following line
    pub fn next_line(&self) -> Self {
        Self {
            unit: Arc::clone(&self.unit),
            line: self.line + 1,
            column: 1,
        }
    }

    /// Advance past one character on the same line
    pub fn next_column(&self) -> Self {
        Self {
            unit: Arc::clone(&self.unit),
            line: self.line,
            column: self.column + 1,
        }
    }

    /// Location reached after reading `text` from here.
    ///
    /// `\n`, `\r\n` and a bare `\r` each count as one line break.
    pub fn advance_str(&self, text: &str) -> Self {
        let mut line = self.line;
        let mut column = self.column;
        let mut chars = text.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    line += 1;
                    column = 1;
                }
                '\n' => {
                    line += 1;
                    column = 1;
                }
                _ => column += 1,
            }
        }

        Self {
            unit: Arc::clone(&self.unit),
            line,
            column,
        }
    }
}

impl Ord for SourceLocation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then(self.column.cmp(&other.column))
            .then_with(|| self.unit.cmp(&other.unit))
    }
}

impl PartialOrd for SourceLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.line, self.column)
    }
}

/// A range of source text. `end` is the location just past the last character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceSpan {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        debug_assert!(start <= end, "Span start must not be after end");
        Self { start, end }
    }

    /// Span between two locations given in either order
    pub fn ordered(a: SourceLocation, b: SourceLocation) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// Zero-width span at `location`
    pub fn point(location: SourceLocation) -> Self {
        Self {
            end: location.clone(),
            start: location,
        }
    }

    /// Span covering `text` when it starts at `start`
    pub fn covering(start: SourceLocation, text: &str) -> Self {
        let end = start.advance_str(text);
        Self { start, end }
    }

    pub fn start(&self) -> &SourceLocation {
        &self.start
    }

    pub fn end(&self) -> &SourceLocation {
        &self.end
    }

    pub fn unit(&self) -> &str {
        self.start.unit()
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            start: self.start.clone().min(other.start.clone()),
            end: self.end.clone().max(other.end.clone()),
        }
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start.line, self.start.column, self.end.line, self.end.column
        )
    }
}
