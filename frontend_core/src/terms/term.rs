use crate::utils::{SourceLocation, SourceSpan};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The line break that ended a term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineTerminator {
    Lf,
    CrLf,
    Cr,
    /// Last line of a unit without a trailing break
    None,
}

impl LineTerminator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineTerminator::Lf => "\n",
            LineTerminator::CrLf => "\r\n",
            LineTerminator::Cr => "\r",
            LineTerminator::None => "",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, LineTerminator::None)
    }
}

/// One physical line of a unit, located at its first column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Term {
    pub location: SourceLocation,
    /// Line content without the terminator
    pub text: String,
    pub terminator: LineTerminator,
}

impl Term {
    pub fn new(location: SourceLocation, text: String, terminator: LineTerminator) -> Self {
        Self {
            location,
            text,
            terminator,
        }
    }

    pub fn unit(&self) -> &str {
        self.location.unit()
    }

    /// Text followed by the terminator exactly as read
    pub fn raw(&self) -> String {
        let mut raw = String::with_capacity(self.text.len() + 2);
        raw.push_str(&self.text);
        raw.push_str(self.terminator.as_str());
        raw
    }

    /// Location just past the terminator
    pub fn end_location(&self) -> SourceLocation {
        let end = self.location.advance_str(&self.text);
        if self.terminator.is_none() {
            end
        } else {
            end.next_line()
        }
    }

    /// Span of the text, excluding the terminator
    pub fn span(&self) -> SourceSpan {
        SourceSpan::covering(self.location.clone(), &self.text)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.location, self.text)
    }
}
