//! Core data models for location resolution and hazard membership.

pub mod gazetteer;
pub mod hierarchy;
pub mod individual;
pub mod selection;

pub use gazetteer::{Gazetteer, GazetteerRow};
pub use hierarchy::{Hierarchy, Level, LevelKind};
pub use individual::{Individual, ResolvedIndividual};
pub use selection::{Selection, SelectionEntry};
