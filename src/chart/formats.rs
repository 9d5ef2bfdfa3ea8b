//! Renderer handoff and output formats
//!
//! [`ChartView`] is everything a drawing backend needs: per individual the
//! name parts, events, occupation and slot; per family the ids to connect.
//! The core never draws anything itself. Formats serialize the view and are
//! looked up by name in a [`FormatRegistry`].

use crate::chart::model::{Event, FamilyId, Graph, IndividualId, NameParts};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Error that can occur during formatting
#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    /// Format not found in registry
    FormatNotFound(String),
    /// Error during serialization
    SerializationError(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::FormatNotFound(name) => write!(f, "Format '{name}' not found"),
            FormatError::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
        }
    }
}

impl std::error::Error for FormatError {}

/// A marriage as seen from one of the spouses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnionView {
    pub family: FamilyId,
    pub spouse: Option<IndividualId>,
    pub marriage: Event,
    pub divorce: Event,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndividualView {
    pub id: IndividualId,
    pub xref: String,
    pub name: NameParts,
    pub married_name: String,
    pub sex: String,
    pub occupation: String,
    pub birth: Event,
    pub death: Event,
    pub child_count: u32,
    pub parent_family: Option<FamilyId>,
    pub unions: Vec<UnionView>,
    pub generation: u32,
    pub column: u32,
    pub row: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilyView {
    pub id: FamilyId,
    pub xref: String,
    pub husband: Option<IndividualId>,
    pub wife: Option<IndividualId>,
    pub children: Vec<IndividualId>,
    pub marriage: Event,
    pub divorce: Event,
}

/// The positioned chart handed to a renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartView {
    pub title: String,
    pub max_generation: u32,
    pub individuals: Vec<IndividualView>,
    pub families: Vec<FamilyView>,
}

impl ChartView {
    /// Snapshot `graph`. `name` is the dataset name used for the title.
    pub fn from_graph(graph: &Graph, name: &str, max_generation: u32) -> Self {
        let individuals = graph
            .individuals()
            .map(|person| {
                let unions = graph
                    .spouse_families_of(person.id)
                    .into_iter()
                    .map(|family_id| {
                        let family = graph.family(family_id);
                        UnionView {
                            family: family.id,
                            spouse: graph.partner_in(person.id, family_id),
                            marriage: family.marriage.clone(),
                            divorce: family.divorce.clone(),
                        }
                    })
                    .collect();

                IndividualView {
                    id: person.id,
                    xref: person.xref.clone(),
                    name: person.name_parts(),
                    married_name: person.married_name.clone(),
                    sex: person.sex.clone(),
                    occupation: person.occupation.clone(),
                    birth: person.birth.clone(),
                    death: person.death.clone(),
                    child_count: person.child_count,
                    parent_family: person.parent_family,
                    unions,
                    generation: person.generation,
                    column: person.position.column,
                    row: person.position.row,
                }
            })
            .collect();

        let families = graph
            .families()
            .map(|family| FamilyView {
                id: family.id,
                xref: family.xref.clone(),
                husband: family.husband,
                wife: family.wife,
                children: family.children.clone(),
                marriage: family.marriage.clone(),
                divorce: family.divorce.clone(),
            })
            .collect();

        ChartView {
            title: chart_title(name),
            max_generation,
            individuals,
            families,
        }
    }
}

/// `"smith"` becomes `"Smith Family Tree"`.
pub fn chart_title(name: &str) -> String {
    let name = name.trim();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("{}{} Family Tree", first.to_uppercase(), chars.as_str()),
        None => "Family Tree".to_string(),
    }
}

/// Trait for chart formatters
///
/// Implementors serialize a [`ChartView`] to a string representation.
pub trait Formatter: Send + Sync {
    /// The name of this format (e.g., "json", "columns")
    fn name(&self) -> &str;

    /// Serialize a chart to this format
    fn serialize(&self, chart: &ChartView) -> Result<String, FormatError>;

    /// Optional description of this format
    fn description(&self) -> &str {
        ""
    }
}

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn name(&self) -> &str {
        "json"
    }

    fn serialize(&self, chart: &ChartView) -> Result<String, FormatError> {
        serde_json::to_string_pretty(chart)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| FormatError::SerializationError(e.to_string()))
    }

    fn description(&self) -> &str {
        "Renderer handoff as pretty-printed JSON"
    }
}

pub struct YamlFormatter;

impl Formatter for YamlFormatter {
    fn name(&self) -> &str {
        "yaml"
    }

    fn serialize(&self, chart: &ChartView) -> Result<String, FormatError> {
        serde_yaml::to_string(chart).map_err(|e| FormatError::SerializationError(e.to_string()))
    }

    fn description(&self) -> &str {
        "Renderer handoff as YAML"
    }
}

/// Plain text listing, one block per column.
pub struct ColumnsFormatter;

impl ColumnsFormatter {
    fn event(out: &mut String, label: &str, event: &Event) {
        if !event.is_known() {
            return;
        }
        let detail = [event.date.as_str(), event.place.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        if detail.is_empty() {
            out.push_str(&format!("  {label}"));
        } else {
            out.push_str(&format!("  {label} {detail}"));
        }
    }
}

impl Formatter for ColumnsFormatter {
    fn name(&self) -> &str {
        "columns"
    }

    fn serialize(&self, chart: &ChartView) -> Result<String, FormatError> {
        let mut columns: BTreeMap<u32, Vec<&IndividualView>> = BTreeMap::new();
        for person in &chart.individuals {
            columns.entry(person.column).or_default().push(person);
        }

        let mut out = String::new();
        out.push_str(&chart.title);
        out.push('\n');

        for (column, mut people) in columns {
            people.sort_by_key(|person| (person.row, person.id));
            out.push_str(&format!("\ncolumn {column}\n"));
            for person in people {
                let name = [person.name.given.as_str(), person.name.surname.as_str()]
                    .iter()
                    .filter(|s| !s.is_empty())
                    .copied()
                    .collect::<Vec<_>>()
                    .join(" ");
                out.push_str(&format!("{:4}  {} @{}@", person.row, name, person.xref));
                Self::event(&mut out, "b.", &person.birth);
                for union in &person.unions {
                    Self::event(&mut out, "m.", &union.marriage);
                }
                Self::event(&mut out, "d.", &person.death);
                out.push('\n');
            }
        }

        Ok(out)
    }

    fn description(&self) -> &str {
        "Plain text listing of each column's rows"
    }
}

/// Registry of chart formatters
///
/// Formats can be registered and retrieved by name.
pub struct FormatRegistry {
    formatters: HashMap<String, Box<dyn Formatter>>,
}

impl FormatRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        FormatRegistry {
            formatters: HashMap::new(),
        }
    }

    /// Register a formatter, replacing any with the same name
    pub fn register<F: Formatter + 'static>(&mut self, formatter: F) {
        self.formatters
            .insert(formatter.name().to_string(), Box::new(formatter));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Formatter> {
        self.formatters.get(name).map(|f| f.as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.formatters.contains_key(name)
    }

    /// Serialize a chart using the specified format
    pub fn serialize(&self, chart: &ChartView, format: &str) -> Result<String, FormatError> {
        let formatter = self
            .get(format)
            .ok_or_else(|| FormatError::FormatNotFound(format.to_string()))?;
        formatter.serialize(chart)
    }

    /// List all available format names (sorted)
    pub fn list_formats(&self) -> Vec<String> {
        let mut names: Vec<_> = self.formatters.keys().cloned().collect();
        names.sort();
        names
    }

    /// Create a registry with the built-in formatters
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ColumnsFormatter);
        registry.register(JsonFormatter);
        registry.register(YamlFormatter);
        registry
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
