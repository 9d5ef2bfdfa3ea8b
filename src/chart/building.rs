//! Graph builder
//!
//! A line-at-a-time state machine that turns tokenized records into the
//! individual/family graph. All per-run state (the record being filled in,
//! and which event a following `DATE`/`PLAC` belongs to) lives in
//! [`ParserState`], owned by one [`GraphBuilder`], so independent runs never
//! share anything.
//!
//! Level 0 lines switch the current record:
//!
//! ```text
//! 0 HEAD          -> Head
//! 0 @I1@ INDI     -> Individual(I1)
//! 0 @F1@ FAM      -> Family(F1)
//! 0 anything else -> None
//! ```
//!
//! Level 1 lines are facts about the current record. `BIRT`, `DEAT`, `MARR`
//! and `DIV` do not store anything beyond the occurrence; they mark which
//! event the following level 2 `DATE`/`PLAC` lines describe. Every other
//! level 1 tag clears that mark, so a stray date is never attributed to an
//! earlier event.

use crate::chart::config::LimitsConfig;
use crate::chart::error::{ChartError, RecordKind};
use crate::chart::model::{Event, FamilyId, Graph, IndividualId};
use crate::chart::token::{parse_xref, tokenize, RecordLine, RecordType};
use std::io::BufRead;
use std::path::Path;

/// Which record subsequent attribute lines apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    None,
    Head,
    Individual(IndividualId),
    Family(FamilyId),
}

/// Event that a following `DATE`/`PLAC` line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingEvent {
    Birth,
    Death,
    Marriage,
    Divorce,
}

/// Mutable state threaded through every line of one run.
#[derive(Debug, Clone)]
pub struct ParserState {
    pub state: State,
    pub pending: Option<PendingEvent>,
    /// 1-based number of the line being processed.
    pub line: usize,
}

impl Default for ParserState {
    fn default() -> Self {
        Self {
            state: State::None,
            pending: None,
            line: 0,
        }
    }
}

/// Builds a [`Graph`] from the flattened record stream.
pub struct GraphBuilder {
    graph: Graph,
    limits: LimitsConfig,
    parser: ParserState,
}

impl GraphBuilder {
    pub fn new(limits: LimitsConfig) -> Self {
        Self {
            graph: Graph::new(limits.individuals, limits.families),
            limits,
            parser: ParserState::default(),
        }
    }

    /// Current parser state, mainly for tests and diagnostics.
    pub fn parser(&self) -> &ParserState {
        &self.parser
    }

    /// Feed every line of `source`.
    pub fn feed_str(&mut self, source: &str) -> Result<(), ChartError> {
        for line in source.lines() {
            self.feed_line(line)?;
        }
        Ok(())
    }

    /// Feed every line of a reader. `path` is only used in error messages.
    ///
    /// Lines are decoded lossily: bytes that are not UTF-8 (Latin-1 or ANSEL
    /// exports) become replacement characters, which no field accepts.
    pub fn feed_reader<R: BufRead>(&mut self, mut reader: R, path: &Path) -> Result<(), ChartError> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|source| ChartError::Unreadable {
                    path: path.to_path_buf(),
                    source,
                })?;
            if read == 0 {
                return Ok(());
            }
            let line = String::from_utf8_lossy(&buf);
            self.feed_line(line.trim_end_matches(['\r', '\n']))?;
        }
    }

    /// Process one input line.
    pub fn feed_line(&mut self, line: &str) -> Result<(), ChartError> {
        self.parser.line += 1;
        let record = tokenize(line);

        match record.record_type() {
            Some(RecordType::Object) => self.object(&record),
            Some(RecordType::Attr) => self.attribute(&record),
            Some(RecordType::SubAttr) => {
                self.sub_attribute(&record);
                Ok(())
            }
            None => {
                tracing::trace!(line = self.parser.line, "ignoring line without a known level");
                Ok(())
            }
        }
    }

    /// Finish the run and hand over the graph.
    pub fn finish(self) -> Graph {
        for person in self.graph.individuals().filter(|i| !i.declared) {
            tracing::warn!(xref = %person.xref, "individual referenced but never declared");
        }
        for family in self.graph.families().filter(|f| !f.declared) {
            tracing::warn!(xref = %family.xref, "family referenced but never declared");
        }
        tracing::info!(
            individuals = self.graph.individual_count(),
            families = self.graph.family_count(),
            "record stream parsed"
        );
        self.graph
    }

    fn object(&mut self, record: &RecordLine) -> Result<(), ChartError> {
        self.parser.pending = None;

        if record.first == "HEAD" {
            self.parser.state = State::Head;
        } else if record.second == "INDI" {
            self.parser.state = match self.individual_ref(&record.first)? {
                Some(id) => {
                    let person = self.graph.individual_mut(id);
                    person.declared = true;
                    person.spouse_families.clear();
                    tracing::debug!(%id, xref = %person.xref, "individual record");
                    State::Individual(id)
                }
                None => State::None,
            };
        } else if record.second == "FAM" {
            self.parser.state = match self.family_ref(&record.first)? {
                Some(id) => {
                    let family = self.graph.family_mut(id);
                    family.declared = true;
                    family.children.clear();
                    tracing::debug!(%id, xref = %family.xref, "family record");
                    State::Family(id)
                }
                None => State::None,
            };
        } else {
            self.parser.state = State::None;
        }

        Ok(())
    }

    fn attribute(&mut self, record: &RecordLine) -> Result<(), ChartError> {
        match self.parser.state {
            State::Head => {
                self.parser.pending = None;
                if record.first == "FILE" {
                    self.graph.set_file(&record.second);
                }
            }
            State::Individual(id) => self.individual_attribute(id, record)?,
            State::Family(id) => self.family_attribute(id, record)?,
            State::None => {
                self.parser.pending = None;
            }
        }
        Ok(())
    }

    fn individual_attribute(&mut self, id: IndividualId, record: &RecordLine) -> Result<(), ChartError> {
        let value = record.second.as_str();
        self.parser.pending = None;

        match record.first.as_str() {
            "NAME" => self.graph.individual_mut(id).set_name(value),
            "SEX" => self.graph.individual_mut(id).set_sex(value),
            "OCCU" => self.graph.individual_mut(id).set_occupation(value),
            "NCHI" => self.graph.individual_mut(id).child_count = leading_number(value),
            "BIRT" => {
                self.graph.individual_mut(id).birth.occurred = true;
                self.parser.pending = Some(PendingEvent::Birth);
            }
            "DEAT" => {
                self.graph.individual_mut(id).death.occurred = true;
                self.parser.pending = Some(PendingEvent::Death);
            }
            "FAMC" => {
                if let Some(family) = self.family_ref(value)? {
                    self.graph.individual_mut(id).parent_family = Some(family);
                }
            }
            "FAMS" => {
                if let Some(family) = self.family_ref(value)? {
                    let limit = self.limits.spouse_families;
                    let line = self.parser.line;
                    let person = self.graph.individual_mut(id);
                    if person.spouse_families.len() >= limit {
                        return Err(ChartError::RelationCapacity {
                            kind: RecordKind::Individual,
                            xref: person.xref.clone(),
                            relation: "spouse families",
                            limit,
                            line,
                        });
                    }
                    person.spouse_families.push(family);
                }
            }
            other => {
                tracing::trace!(line = self.parser.line, tag = other, "unhandled individual attribute");
            }
        }
        Ok(())
    }

    fn family_attribute(&mut self, id: FamilyId, record: &RecordLine) -> Result<(), ChartError> {
        let value = record.second.as_str();
        self.parser.pending = None;

        match record.first.as_str() {
            "HUSB" => {
                if let Some(person) = self.individual_ref(value)? {
                    self.graph.family_mut(id).husband = Some(person);
                }
            }
            "WIFE" => {
                if let Some(person) = self.individual_ref(value)? {
                    self.graph.family_mut(id).wife = Some(person);
                }
            }
            "CHIL" => {
                if let Some(person) = self.individual_ref(value)? {
                    let limit = self.limits.children;
                    let line = self.parser.line;
                    let family = self.graph.family_mut(id);
                    if family.children.len() >= limit {
                        return Err(ChartError::RelationCapacity {
                            kind: RecordKind::Family,
                            xref: family.xref.clone(),
                            relation: "children",
                            limit,
                            line,
                        });
                    }
                    family.children.push(person);
                }
            }
            "MARR" => {
                self.graph.family_mut(id).marriage.occurred = true;
                self.parser.pending = Some(PendingEvent::Marriage);
            }
            "DIV" => {
                self.graph.family_mut(id).divorce.occurred = true;
                self.parser.pending = Some(PendingEvent::Divorce);
            }
            other => {
                tracing::trace!(line = self.parser.line, tag = other, "unhandled family attribute");
            }
        }
        Ok(())
    }

    fn sub_attribute(&mut self, record: &RecordLine) {
        let value = record.second.as_str();

        match self.parser.state {
            State::Individual(id) => {
                let person = self.graph.individual_mut(id);
                match record.first.as_str() {
                    "GIVN" => person.set_given_name(value),
                    "SURN" => person.set_surname(value),
                    "NICK" => person.set_nickname(value),
                    "_MARNM" => person.set_married_name(value),
                    "DATE" | "PLAC" => {
                        let event = match self.parser.pending {
                            Some(PendingEvent::Birth) => &mut person.birth,
                            Some(PendingEvent::Death) => &mut person.death,
                            _ => return,
                        };
                        apply_event_detail(event, &record.first, value);
                    }
                    _ => {}
                }
            }
            State::Family(id) => {
                if record.first == "DATE" || record.first == "PLAC" {
                    let family = self.graph.family_mut(id);
                    let event = match self.parser.pending {
                        Some(PendingEvent::Marriage) => &mut family.marriage,
                        Some(PendingEvent::Divorce) => &mut family.divorce,
                        _ => return,
                    };
                    apply_event_detail(event, &record.first, value);
                }
            }
            State::Head | State::None => {}
        }
    }

    /// Resolve an individual cross-reference token such as `@I1@`.
    ///
    /// Malformed tokens are skipped with a warning; a full table is fatal.
    fn individual_ref(&mut self, token: &str) -> Result<Option<IndividualId>, ChartError> {
        let Some(xref) = parse_xref(token) else {
            tracing::warn!(line = self.parser.line, token, "malformed individual reference");
            return Ok(None);
        };
        self.graph
            .intern_individual(&xref)
            .map(Some)
            .ok_or_else(|| ChartError::Unresolvable {
                kind: RecordKind::Individual,
                token: token.to_string(),
                line: self.parser.line,
            })
    }

    /// Resolve a family cross-reference token such as `@F1@`.
    fn family_ref(&mut self, token: &str) -> Result<Option<FamilyId>, ChartError> {
        let Some(xref) = parse_xref(token) else {
            tracing::warn!(line = self.parser.line, token, "malformed family reference");
            return Ok(None);
        };
        self.graph
            .intern_family(&xref)
            .map(Some)
            .ok_or_else(|| ChartError::Unresolvable {
                kind: RecordKind::Family,
                token: token.to_string(),
                line: self.parser.line,
            })
    }
}

fn apply_event_detail(event: &mut Event, tag: &str, value: &str) {
    if tag == "DATE" {
        event.set_date(value);
    } else {
        event.set_place(value);
    }
}

/// Parse the leading digits of `value`, 0 when there are none.
fn leading_number(value: &str) -> u32 {
    let digits: String = value
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}

/// Build a graph from source text.
pub fn build_graph(source: &str, limits: LimitsConfig) -> Result<Graph, ChartError> {
    let mut builder = GraphBuilder::new(limits);
    builder.feed_str(source)?;
    Ok(builder.finish())
}
