//! Layout override file
//!
//! A plain text file, one individual per line, meant to be edited by hand
//! between runs:
//!
//! ```text
//!    0  posn  suggested
//!    0  x  y      x     xref  Name
//!    1  0  0      1      I1  John /Smith/
//!    2  3  4      1      I2  Mary /Jones/
//! ```
//!
//! Fields are whitespace separated: id, override column, override row,
//! suggested (computed) column, xref and name. Only the first three are read
//! back. Zero in both override fields means "keep the computed slot". Lines
//! whose id is 0 or not a number, such as the two headers, are ignored.
//!
//! Writing refuses to replace an existing file unless forced, so a
//! hand-tuned layout is not lost by re-running the tool.

use crate::chart::error::ChartError;
use crate::chart::model::Graph;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// One line of an override file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideEntry {
    pub id: u32,
    pub column: u32,
    pub row: u32,
    pub suggested_column: Option<u32>,
    pub xref: Option<String>,
    pub name: Option<String>,
}

impl OverrideEntry {
    /// True when the entry moves its individual.
    pub fn is_set(&self) -> bool {
        self.column > 0 || self.row > 0
    }
}

/// Parsed override file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideTable {
    entries: Vec<OverrideEntry>,
}

impl OverrideTable {
    pub fn entries(&self) -> &[OverrideEntry] {
        &self.entries
    }

    pub fn get(&self, id: u32) -> Option<&OverrideEntry> {
        self.entries.iter().rev().find(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What [`write_layout`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The file already existed and was left alone.
    Skipped,
}

/// Render the override file for `graph`, suggesting the computed columns.
pub fn render_layout(graph: &Graph) -> String {
    let mut out = String::new();
    out.push_str("   0  posn  suggested\n");
    out.push_str("   0  x  y      x     xref  Name\n");
    for person in graph.individuals() {
        out.push_str(&format!(
            "{:4}  0  0      {}      {}  {}\n",
            person.id.get(),
            person.position.column,
            person.xref,
            person.name
        ));
    }
    out
}

/// Parse override file text. Never fails; unusable lines are skipped.
pub fn parse_layout(text: &str) -> OverrideTable {
    let entries = text.lines().filter_map(parse_entry).collect();
    OverrideTable { entries }
}

fn parse_entry(line: &str) -> Option<OverrideEntry> {
    let mut fields = line.split_whitespace();
    let id = fields.next()?.parse::<u32>().ok().filter(|id| *id > 0)?;

    let mut number = |name: &str| -> u32 {
        match fields.next() {
            None => 0,
            Some(field) => parse_coordinate(field).unwrap_or_else(|| {
                tracing::warn!(id, field, "unreadable {} in layout file, using 0", name);
                0
            }),
        }
    };
    let column = number("column");
    let row = number("row");

    let suggested_column = fields.next().and_then(|field| field.parse().ok());
    let xref = fields.next().map(str::to_string);
    let rest: Vec<&str> = fields.collect();
    let name = (!rest.is_empty()).then(|| rest.join(" "));

    Some(OverrideEntry {
        id,
        column,
        row,
        suggested_column,
        xref,
        name,
    })
}

/// Accept whole numbers and, for hand edits, decimals such as `2.0`.
fn parse_coordinate(field: &str) -> Option<u32> {
    if let Ok(value) = field.parse::<u32>() {
        return Some(value);
    }
    field
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
        .map(|value| value as u32)
}

/// Read an override file.
pub fn read_layout(path: &Path) -> Result<OverrideTable, ChartError> {
    let text = fs::read_to_string(path).map_err(|source| ChartError::Layout {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_layout(&text))
}

/// Read an override file if it exists.
pub fn read_layout_if_present(path: &Path) -> Result<Option<OverrideTable>, ChartError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(parse_layout(&text))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ChartError::Layout {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Write the override file for `graph`.
///
/// Without `force` an existing file is kept and a warning is logged.
pub fn write_layout(path: &Path, graph: &Graph, force: bool) -> Result<WriteOutcome, ChartError> {
    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }

    let mut file = match options.open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            tracing::warn!(path = %path.display(), "not overwriting existing layout file");
            return Ok(WriteOutcome::Skipped);
        }
        Err(source) => {
            return Err(ChartError::Layout {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    file.write_all(render_layout(graph).as_bytes())
        .map_err(|source| ChartError::Layout {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::info!(path = %path.display(), "layout file written");
    Ok(WriteOutcome::Written)
}

/// The `HEAD` record's file name reduced to its last path component, so a
/// `FILE` value cannot point the layout file outside the input's directory.
pub fn dataset_name(graph: &Graph) -> Option<String> {
    Path::new(graph.file.trim())
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

/// Default override file location: `<FILE>.<extension>` next to the input,
/// where `FILE` is [`dataset_name`], or the input's stem.
pub fn default_layout_path(input: &Path, graph: &Graph, extension: &str) -> PathBuf {
    let base = dataset_name(graph).unwrap_or_else(|| {
        input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "chart".to_string())
    });
    let dir = input.parent().unwrap_or_else(|| Path::new(""));
    dir.join(format!("{base}.{extension}"))
}
