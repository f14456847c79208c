//! Hazmap - resolve free-text roster addresses against an administrative
//! gazetteer and report who lives inside selected hazard areas.
//!
//! This library provides shared types and modules for the resolve and report binaries.

pub mod config;
pub mod error;
pub mod hazard;
pub mod io;
pub mod matcher;
pub mod models;
pub mod normalize;
pub mod resolver;

pub use config::Config;
pub use error::{Error, Result};
pub use hazard::{classify, expand, populated_areas, Classification, Expansion, MembershipSet, Share};
pub use matcher::{Match, Matcher};
pub use models::{
    Gazetteer, GazetteerRow, Hierarchy, Individual, LevelKind, ResolvedIndividual, Selection,
    SelectionEntry,
};
pub use normalize::Normalizer;
pub use resolver::{IncompleteRecord, Resolution, Resolver};
