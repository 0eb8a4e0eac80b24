//! Match records and per-participant performance rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The five assignable positions, in draft-priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Top,
    Jungle,
    Middle,
    Bottom,
    Utility,
}

impl Role {
    /// Fixed enumeration order used for tie-breaking and lane assignment.
    pub const ORDER: [Role; 5] = [
        Role::Top,
        Role::Jungle,
        Role::Middle,
        Role::Bottom,
        Role::Utility,
    ];

    /// Parse an upstream position string. Anything outside the five
    /// assignable roles (e.g. "Invalid", "NONE") is ignored.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "TOP" => Some(Role::Top),
            "JUNGLE" => Some(Role::Jungle),
            "MIDDLE" => Some(Role::Middle),
            "BOTTOM" => Some(Role::Bottom),
            "UTILITY" => Some(Role::Utility),
            _ => None,
        }
    }

    /// Index into [`Role::ORDER`].
    pub fn index(&self) -> usize {
        match self {
            Role::Top => 0,
            Role::Jungle => 1,
            Role::Middle => 2,
            Role::Bottom => 3,
            Role::Utility => 4,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Top => "TOP",
            Role::Jungle => "JUNGLE",
            Role::Middle => "MIDDLE",
            Role::Bottom => "BOTTOM",
            Role::Utility => "UTILITY",
        };
        write!(f, "{}", s)
    }
}

/// One participant's performance row within a match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub puuid: String,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    /// Lane minions killed.
    pub total_minions_killed: u32,
    /// Jungle monsters killed; counted into creep score alongside lane minions.
    pub neutral_minions_killed: u32,
    pub vision_score: u32,
    /// The more specific position field; preferred when it names a real role.
    pub individual_position: Option<String>,
    /// Fallback position field.
    pub team_position: Option<String>,
    pub win: bool,
}

impl Participant {
    /// Combined creep score (lane + jungle).
    pub fn creep_score(&self) -> u32 {
        self.total_minions_killed + self.neutral_minions_killed
    }

    /// Resolve the participant's role: individual position preferred,
    /// team position as fallback, `None` when neither names a real role.
    pub fn role(&self) -> Option<Role> {
        self.individual_position
            .as_deref()
            .and_then(Role::parse)
            .or_else(|| self.team_position.as_deref().and_then(Role::parse))
    }
}

/// A completed match. Immutable once fetched; safe to cache for the
/// process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Opaque upstream match identifier, e.g. "EUW1_7012345678".
    pub match_id: String,
    pub game_creation: Option<DateTime<Utc>>,
    /// Match length in seconds.
    pub duration_secs: i64,
    pub participants: Vec<Participant>,
}

impl MatchRecord {
    /// Match duration in minutes, used as the per-minute divisor.
    pub fn duration_minutes(&self) -> f64 {
        self.duration_secs as f64 / 60.0
    }

    /// Find the row for a given account, if they played in this match.
    pub fn participant(&self, puuid: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.puuid == puuid)
    }
}
