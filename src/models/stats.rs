//! Derived per-player statistics.

use serde::{Deserialize, Serialize};

use super::{AccountRef, Identity, RankEntry, Role};

/// Round to 2 decimal places for presentation stability.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Round to 1 decimal place (creep score per minute).
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Per-role game counts over the analysis window, indexed by [`Role::ORDER`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCounts([u32; 5]);

impl RoleCounts {
    pub fn count(&self, role: Role) -> u32 {
        self.0[role.index()]
    }

    pub fn record(&mut self, role: Role) {
        self.0[role.index()] += 1;
    }

    /// Role with the highest game count, ties broken by the fixed
    /// enumeration order. `None` when no games recorded any role.
    pub fn preferred(&self) -> Option<Role> {
        let best = Role::ORDER.iter().map(|r| self.count(*r)).max()?;
        if best == 0 {
            return None;
        }
        Role::ORDER.iter().copied().find(|r| self.count(*r) == best)
    }
}

/// Derived statistics for one player, recomputed each analysis run.
///
/// Always carries a defined `team_contribution` (0.0 for unresolved
/// placeholders) so sorting is total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerStats {
    pub identity: Identity,
    pub account: AccountRef,

    /// False when identity resolution failed; the rest of the record is
    /// a zero-value placeholder in that case.
    pub resolved: bool,

    /// Ranked entry the score was derived from, if any.
    pub rank: Option<RankEntry>,

    /// Matches that were successfully fetched and aggregated.
    pub games_analyzed: u32,

    pub avg_kills: f64,
    pub avg_deaths: f64,
    pub avg_assists: f64,

    /// (kills + assists) / deaths; plain kills + assists when deathless.
    pub kda: f64,

    /// Win percentage over analyzed games, 0..100.
    pub win_rate: f64,

    /// Creep score per minute, rounded to 1 decimal place.
    pub cs_per_minute: f64,

    /// Vision score per minute, rounded to 2 decimal places.
    pub vision_per_minute: f64,

    pub role_counts: RoleCounts,

    /// Role with the most games in the window, if any role was seen.
    pub preferred_lane: Option<Role>,

    /// Composite skill score; the sort key for balancing.
    pub team_contribution: f64,
}

impl PlayerStats {
    /// Zero-value placeholder for an identity that could not be resolved.
    /// Keeps the batch going instead of aborting on one bad entry.
    pub fn unresolved(identity: Identity) -> Self {
        Self {
            identity,
            account: AccountRef::unknown(),
            resolved: false,
            rank: None,
            games_analyzed: 0,
            avg_kills: 0.0,
            avg_deaths: 0.0,
            avg_assists: 0.0,
            kda: 0.0,
            win_rate: 0.0,
            cs_per_minute: 0.0,
            vision_per_minute: 0.0,
            role_counts: RoleCounts::default(),
            preferred_lane: None,
            team_contribution: 0.0,
        }
    }
}
