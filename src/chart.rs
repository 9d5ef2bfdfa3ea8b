//! Main module for gedchart library functionality

pub mod building;
pub mod config;
pub mod error;
pub mod formats;
pub mod generations;
pub mod interning;
pub mod layout;
pub mod loader;
pub mod model;
pub mod overrides;
pub mod token;

pub use error::ChartError;
pub use loader::{Chart, ChartLoader};
pub use model::{Family, FamilyId, Graph, Individual, IndividualId};
