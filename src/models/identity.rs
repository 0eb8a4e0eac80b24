//! Player identity and account reference types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A raw player identity as entered by the lobby organizer: `name#tag`.
///
/// Case-sensitive and opaque; resolves to at most one upstream account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Display name portion (before the `#`)
    pub game_name: String,

    /// Tag line portion (after the `#`)
    pub tag_line: String,
}

impl Identity {
    pub fn new(game_name: impl Into<String>, tag_line: impl Into<String>) -> Self {
        Self {
            game_name: game_name.into(),
            tag_line: tag_line.into(),
        }
    }

    /// Parse a `name#tag` string. Returns `None` when either side is empty
    /// or the separator is missing.
    pub fn parse(s: &str) -> Option<Self> {
        let (name, tag) = s.split_once('#')?;
        let name = name.trim();
        let tag = tag.trim();
        if name.is_empty() || tag.is_empty() {
            return None;
        }
        Some(Self::new(name, tag))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.game_name, self.tag_line)
    }
}

/// A stable global account identifier (PUUID).
///
/// The `unknown` sentinel marks identities that failed resolution; it is never
/// used as a lookup key or compared against real accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountRef {
    pub puuid: String,
}

impl AccountRef {
    pub const UNKNOWN: &'static str = "unknown";

    pub fn new(puuid: impl Into<String>) -> Self {
        Self {
            puuid: puuid.into(),
        }
    }

    /// Sentinel for identities that could not be resolved.
    pub fn unknown() -> Self {
        Self::new(Self::UNKNOWN)
    }

    pub fn is_unknown(&self) -> bool {
        self.puuid == Self::UNKNOWN
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.puuid)
    }
}
