//! Lexicon tables and longest-match rule selection

use crate::tokens::Terminal;

/// Result of trying one rule at the current position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    NoMatch,
    /// Byte length of the lexeme
    Matched(usize),
    /// The construct has started but continues past the visible input
    NeedMore,
}

impl Scan {
    /// `Matched(len)` for a non-zero length, otherwise `NoMatch`
    pub fn from_len(len: usize) -> Self {
        if len == 0 {
            Scan::NoMatch
        } else {
            Scan::Matched(len)
        }
    }
}

/// One entry of a lexicon: which terminal, how to recognise it, how to decode it
pub struct LexRule<T> {
    pub terminal: T,
    pub scan: fn(&str) -> Scan,
    pub decode: fn(&str) -> String,
}

impl<T> LexRule<T> {
    pub const fn new(terminal: T, scan: fn(&str) -> Scan, decode: fn(&str) -> String) -> Self {
        Self {
            terminal,
            scan,
            decode,
        }
    }
}

/// Decoder that keeps the lexeme as written
pub fn verbatim(text: &str) -> String {
    text.to_string()
}

/// A grammar's token table.
///
/// Rule order is the tie-break: when two rules match the same length the
/// earlier one wins.
pub trait Lexicon {
    type Terminal: Terminal;

    fn name(&self) -> &'static str;

    fn rules(&self) -> &[LexRule<Self::Terminal>];
}

impl<L: Lexicon + ?Sized> Lexicon for &L {
    type Terminal = L::Terminal;

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn rules(&self) -> &[LexRule<Self::Terminal>] {
        (**self).rules()
    }
}

/// Outcome of running every rule at one position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    NoMatch,
    Matched { rule: usize, len: usize },
    /// Index of the first rule that asked for more input
    NeedMore { rule: usize },
}

/// Pick the longest match among `rules` at the start of `input`.
///
/// Any rule asking for more input takes precedence, since its eventual match
/// may be longer than anything visible now.
pub fn longest_match<T>(rules: &[LexRule<T>], input: &str) -> MatchOutcome {
    let mut best: Option<(usize, usize)> = None;
    let mut need_more: Option<usize> = None;

    for (index, rule) in rules.iter().enumerate() {
        match (rule.scan)(input) {
            Scan::Matched(len) if len > 0 && input.is_char_boundary(len) => {
                if best.map_or(true, |(_, best_len)| len > best_len) {
                    best = Some((index, len));
                }
            }
            Scan::NeedMore if need_more.is_none() => need_more = Some(index),
            _ => {}
        }
    }

    match (need_more, best) {
        (Some(rule), _) => MatchOutcome::NeedMore { rule },
        (None, Some((rule, len))) => MatchOutcome::Matched { rule, len },
        (None, None) => MatchOutcome::NoMatch,
    }
}

/// Byte length of the unclassifiable run at the start of `input`: up to the
/// first later position where some rule matches or asks for more
pub fn unrecognized_len<T>(rules: &[LexRule<T>], input: &str) -> usize {
    input
        .char_indices()
        .skip(1)
        .find(|&(idx, _)| longest_match(rules, &input[idx..]) != MatchOutcome::NoMatch)
        .map(|(idx, _)| idx)
        .unwrap_or(input.len())
}
