//! Core data structures.

pub mod identity;
pub mod matches;
pub mod rank;
pub mod stats;
pub mod team;

pub use identity::{AccountRef, Identity};
pub use matches::{MatchRecord, Participant, Role};
pub use rank::{Division, Queue, RankEntry, Tier};
pub use stats::{round1, round2, PlayerStats, RoleCounts};
pub use team::Team;
