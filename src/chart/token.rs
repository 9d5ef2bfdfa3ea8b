//! Record tokenizer
//!
//! Splits one line of the flattened record stream into its record type and
//! two bounded fields:
//!
//! ```text
//! <level> <first> <second>
//! 0 @I1@ INDI
//! 1 NAME John /Smith/
//! 2 DATE 12 MAR 1901
//! ```
//!
//! Tokenizing never fails. A line without a leading level yields no record
//! type, and any field that does not match its character class comes back
//! empty, so callers fall through to whatever a blank field means for them.

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum number of characters kept in either field of a record line.
pub const FIELD_LIMIT: usize = 63;

/// Maximum number of characters kept in a cross-reference token.
pub const XREF_LIMIT: usize = 31;

/// Splits a line into level, first token and the remainder.
static LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<level>\d+)\s*(?P<first>\S*)\s*(?P<rest>.*)").unwrap()
});

/// Pulls the identifier out of a delimited cross-reference such as `@I12@`.
static XREF_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^@(?P<xref>[0-9A-Za-z_]+)").unwrap());

/// The three record categories of the flattened stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    /// Level 0: starts a record (`HEAD`, `@I1@ INDI`, `@F1@ FAM`).
    Object,
    /// Level 1: a fact about the current record.
    Attr,
    /// Level 2: a detail of the preceding fact (date, place, name part).
    SubAttr,
}

impl RecordType {
    pub fn from_level(level: u32) -> Option<Self> {
        match level {
            0 => Some(RecordType::Object),
            1 => Some(RecordType::Attr),
            2 => Some(RecordType::SubAttr),
            _ => None,
        }
    }
}

/// One tokenized input line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordLine {
    /// Leading integer, if the line had one that fits in a `u32`.
    pub level: Option<u32>,
    /// Tag or cross-reference, restricted to `[0-9A-Za-z_@]`.
    pub first: String,
    /// Value, restricted to `[0-9A-Za-z /@-]`.
    pub second: String,
}

impl RecordLine {
    /// The record type, or `None` for lines the graph builder ignores.
    pub fn record_type(&self) -> Option<RecordType> {
        self.level.and_then(RecordType::from_level)
    }
}

fn is_first_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '@'
}

fn is_second_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ' ' | '/' | '@' | '-')
}

/// Copy at most `limit` characters of `value`.
///
/// Excess text is dropped silently; a field that is too long is never an error.
pub fn bounded(value: &str, limit: usize) -> String {
    value.chars().take(limit).collect()
}

/// Longest prefix of `value` whose characters satisfy `accept`, bounded to `limit`.
fn scan_class(value: &str, limit: usize, accept: fn(char) -> bool) -> String {
    value.chars().take_while(|c| accept(*c)).take(limit).collect()
}

/// Tokenize a single line of the record stream.
pub fn tokenize(line: &str) -> RecordLine {
    let Some(caps) = LINE_REGEX.captures(line) else {
        return RecordLine::default();
    };

    let level = caps["level"].parse::<u32>().ok();
    let first = scan_class(&caps["first"], FIELD_LIMIT, is_first_char);
    let second = scan_class(&caps["rest"], FIELD_LIMIT, is_second_char)
        .trim_end()
        .to_string();

    RecordLine {
        level,
        first,
        second,
    }
}

/// Extract the identifier from a delimited cross-reference token.
///
/// `@I12@` yields `I12`. Returns `None` when the token does not start with
/// `@` followed by at least one identifier character.
pub fn parse_xref(token: &str) -> Option<String> {
    XREF_REGEX
        .captures(token)
        .map(|caps| bounded(&caps["xref"], XREF_LIMIT))
}
