//! Error types for chart conversion
//!
//! Only conditions that abort a run are represented here. Over-long fields,
//! malformed lines and an existing override file are recovered where they
//! happen and only logged.

use crate::chart::formats::FormatError;
use std::io;
use std::path::PathBuf;

/// Which interning table or record kind an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Individual,
    Family,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Individual => write!(f, "individual"),
            RecordKind::Family => write!(f, "family"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    /// The record stream could not be opened or read.
    #[error("can't read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A cross-reference could not be given an id.
    #[error("no slot left for {kind} '{token}' (line {line})")]
    Unresolvable {
        kind: RecordKind,
        token: String,
        line: usize,
    },

    /// A spouse-family or children list is full.
    #[error("{kind} '{xref}' has more than {limit} {relation} (line {line})")]
    RelationCapacity {
        kind: RecordKind,
        xref: String,
        relation: &'static str,
        limit: usize,
        line: usize,
    },

    /// An override file exists but could not be read or written.
    #[error("layout file {}: {source}", .path.display())]
    Layout {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Output could not be written.
    #[error("can't write {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Format(#[from] FormatError),
}
