//! Hazard membership: selection expansion and affected classification.

mod classify;
mod expand;
mod populated;

pub use classify::{classify, Classification, Classified, GroupStat, Share, Summary};
pub use expand::{expand, Expansion, MembershipSet, SkipReason, SkippedEntry};
pub use populated::{populated_areas, PopulatedArea};
