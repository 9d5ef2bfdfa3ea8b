//! Slot layout
//!
//! Rows are handed out per column in id order, so no two individuals in a
//! column share a row. Crossing connectors are not minimized. Hand-edited
//! overrides (see [`crate::chart::overrides`]) replace the computed slot of the
//! individuals they name.

use crate::chart::model::{Graph, IndividualId, Position};
use crate::chart::overrides::OverrideTable;
use std::collections::{BTreeMap, HashMap};

/// Give every individual the next free row of its column.
///
/// Expects `position.column` to be set already.
pub fn assign_slots(graph: &mut Graph) {
    let mut next_row: HashMap<u32, u32> = HashMap::new();
    for person in graph.individuals_mut() {
        let row = next_row.entry(person.position.column).or_insert(0);
        person.position.row = *row;
        *row += 1;
    }
}

/// Apply hand-edited slots. Returns how many individuals were moved.
///
/// An entry counts when its column or row is non-zero; it then replaces both.
/// Entries naming an unknown id are skipped with a warning.
pub fn apply_overrides(graph: &mut Graph, overrides: &OverrideTable) -> usize {
    let mut applied = 0;

    for entry in overrides.entries() {
        if !entry.is_set() {
            continue;
        }
        match graph.individual_by_number_mut(entry.id) {
            Some(person) => {
                person.position = Position {
                    column: entry.column,
                    row: entry.row,
                };
                applied += 1;
            }
            None => {
                tracing::warn!(id = entry.id, "layout override names an unknown individual");
            }
        }
    }

    if applied > 0 {
        tracing::info!(applied, "layout overrides applied");
    }
    applied
}

/// Slots held by more than one individual, in slot order.
///
/// Computed layouts never collide; hand edits can.
pub fn find_collisions(graph: &Graph) -> Vec<(Position, Vec<IndividualId>)> {
    let mut slots: BTreeMap<Position, Vec<IndividualId>> = BTreeMap::new();
    for person in graph.individuals() {
        slots.entry(person.position).or_default().push(person.id);
    }
    slots
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .collect()
}

/// Number of columns in use, i.e. highest column plus one.
pub fn column_count(graph: &Graph) -> u32 {
    graph
        .individuals()
        .map(|person| person.position.column + 1)
        .max()
        .unwrap_or(0)
}
