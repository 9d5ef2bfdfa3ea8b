//! # gedchart
//!
//! Turns a flattened GEDCOM record stream into a positioned family-tree
//! layout: every individual gets a generation column and a row, ready for a
//! rendering backend.
//!
//! The work happens in strictly sequential phases, see [`chart::loader`]:
//! tokenize and build the graph, resolve generations, assign slots, then
//! apply any hand-edited overrides.

pub mod chart;
