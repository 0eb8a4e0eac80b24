//! Ranked ladder types: tiers, divisions, and league entries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ladder tier, lowest to highest.
///
/// The apex tiers (Master and above) share a base score and have no divisions;
/// they are differentiated by league points alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Iron,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Emerald,
    Diamond,
    Master,
    Grandmaster,
    Challenger,
}

impl Tier {
    /// Base contribution score for this tier.
    pub fn base_score(&self) -> f64 {
        match self {
            Tier::Iron => 0.0,
            Tier::Bronze => 400.0,
            Tier::Silver => 800.0,
            Tier::Gold => 1200.0,
            Tier::Platinum => 1600.0,
            Tier::Emerald => 2000.0,
            Tier::Diamond => 2400.0,
            Tier::Master | Tier::Grandmaster | Tier::Challenger => 2800.0,
        }
    }

    /// Apex tiers have no divisions; league points run unbounded.
    pub fn is_apex(&self) -> bool {
        matches!(self, Tier::Master | Tier::Grandmaster | Tier::Challenger)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tier::Iron => "Iron",
            Tier::Bronze => "Bronze",
            Tier::Silver => "Silver",
            Tier::Gold => "Gold",
            Tier::Platinum => "Platinum",
            Tier::Emerald => "Emerald",
            Tier::Diamond => "Diamond",
            Tier::Master => "Master",
            Tier::Grandmaster => "Grandmaster",
            Tier::Challenger => "Challenger",
        };
        write!(f, "{}", s)
    }
}

/// Division within a sub-apex tier, IV (lowest) to I (highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Division {
    I,
    II,
    III,
    IV,
}

impl Division {
    /// Score offset within the tier: IV=0, III=100, II=200, I=300.
    pub fn offset(&self) -> f64 {
        match self {
            Division::IV => 0.0,
            Division::III => 100.0,
            Division::II => 200.0,
            Division::I => 300.0,
        }
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Division::I => "I",
            Division::II => "II",
            Division::III => "III",
            Division::IV => "IV",
        };
        write!(f, "{}", s)
    }
}

/// Ranked queue a league entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Queue {
    #[serde(rename = "RANKED_SOLO_5x5")]
    SoloDuo,
    #[serde(rename = "RANKED_FLEX_SR")]
    Flex,
    /// Any other queue string the upstream may add.
    #[serde(other)]
    Other,
}

/// One ranked ladder entry for a player.
///
/// A player may hold zero, one, or two entries (solo, flex). Solo is
/// preferred when both exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankEntry {
    pub queue: Queue,
    pub tier: Tier,
    /// Absent for apex tiers.
    pub division: Option<Division>,
    pub league_points: u32,
    /// Season win total for this queue.
    pub wins: u32,
    /// Season loss total for this queue.
    pub losses: u32,
}

impl RankEntry {
    /// Season game total used for the activity bonus.
    pub fn season_games(&self) -> u32 {
        self.wins + self.losses
    }

    /// Pick the entry to score from: solo preferred, else flex, else none.
    pub fn preferred(entries: &[RankEntry]) -> Option<&RankEntry> {
        entries
            .iter()
            .find(|e| e.queue == Queue::SoloDuo)
            .or_else(|| entries.iter().find(|e| e.queue == Queue::Flex))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(queue: Queue, tier: Tier) -> RankEntry {
        RankEntry {
            queue,
            tier,
            division: Some(Division::II),
            league_points: 40,
            wins: 60,
            losses: 55,
        }
    }

    #[test]
    fn test_tier_base_scores_ascend() {
        let tiers = [
            Tier::Iron,
            Tier::Bronze,
            Tier::Silver,
            Tier::Gold,
            Tier::Platinum,
            Tier::Emerald,
            Tier::Diamond,
            Tier::Master,
        ];
        for pair in tiers.windows(2) {
            assert!(pair[0].base_score() < pair[1].base_score());
        }
    }

    #[test]
    fn test_apex_tiers_share_base() {
        assert_eq!(Tier::Master.base_score(), 2800.0);
        assert_eq!(Tier::Grandmaster.base_score(), 2800.0);
        assert_eq!(Tier::Challenger.base_score(), 2800.0);
        assert!(Tier::Master.is_apex());
        assert!(!Tier::Diamond.is_apex());
    }

    #[test]
    fn test_division_offsets() {
        assert_eq!(Division::IV.offset(), 0.0);
        assert_eq!(Division::III.offset(), 100.0);
        assert_eq!(Division::II.offset(), 200.0);
        assert_eq!(Division::I.offset(), 300.0);
    }

    #[test]
    fn test_preferred_entry_solo_over_flex() {
        let entries = vec![entry(Queue::Flex, Tier::Platinum), entry(Queue::SoloDuo, Tier::Gold)];
        let picked = RankEntry::preferred(&entries).unwrap();
        assert_eq!(picked.queue, Queue::SoloDuo);
        assert_eq!(picked.tier, Tier::Gold);
    }

    #[test]
    fn test_preferred_entry_flex_fallback() {
        let entries = vec![entry(Queue::Flex, Tier::Silver)];
        assert_eq!(RankEntry::preferred(&entries).unwrap().queue, Queue::Flex);
    }

    #[test]
    fn test_preferred_entry_empty() {
        assert_eq!(RankEntry::preferred(&[]), None);
    }

    #[test]
    fn test_queue_wire_names() {
        let q: Queue = serde_json::from_str("\"RANKED_SOLO_5x5\"").unwrap();
        assert_eq!(q, Queue::SoloDuo);
        let q: Queue = serde_json::from_str("\"RANKED_FLEX_SR\"").unwrap();
        assert_eq!(q, Queue::Flex);
        let q: Queue = serde_json::from_str("\"RANKED_TFT\"").unwrap();
        assert_eq!(q, Queue::Other);
    }

    #[test]
    fn test_tier_wire_names() {
        let t: Tier = serde_json::from_str("\"GRANDMASTER\"").unwrap();
        assert_eq!(t, Tier::Grandmaster);
    }

    #[test]
    fn test_season_games() {
        assert_eq!(entry(Queue::SoloDuo, Tier::Gold).season_games(), 115);
    }
}
