//! Composite skill scoring.
//!
//! `team_contribution = tier_score + kda_bonus + win_rate_bonus
//!                      + activity_bonus + role_stats_bonus`
//!
//! The centers, multipliers, and caps here are the observable contract the
//! balancer is tuned against; changing any of them shifts every downstream
//! balance result.

use crate::models::{round2, RankEntry, Role};

/// Score for players with no ranked entry: the Gold base, an assumed
/// mid-tier baseline rather than a penalty.
pub const UNRANKED_TIER_SCORE: f64 = 1200.0;

const KDA_CENTER: f64 = 3.0;
const KDA_MULTIPLIER: f64 = 30.0;
const KDA_CAP: f64 = 150.0;

const WIN_RATE_CENTER: f64 = 50.0;
const WIN_RATE_MULTIPLIER: f64 = 5.0;

const ACTIVITY_MULTIPLIER: f64 = 15.0;
const ACTIVITY_CAP: f64 = 50.0;

const VISION_CENTER: f64 = 2.0;
const VISION_MULTIPLIER: f64 = 20.0;
const CS_CENTER: f64 = 6.5;
const CS_MULTIPLIER: f64 = 10.0;

/// Base score from the ranked ladder: tier base, division offset for
/// sub-apex tiers, and league points on top.
pub fn tier_score(rank: Option<&RankEntry>) -> f64 {
    match rank {
        None => UNRANKED_TIER_SCORE,
        Some(entry) => {
            let division_offset = if entry.tier.is_apex() {
                0.0
            } else {
                entry.division.map(|d| d.offset()).unwrap_or(0.0)
            };
            entry.tier.base_score() + division_offset + entry.league_points as f64
        }
    }
}

/// Centered on an assumed average KDA of 3.0, clamped to ±150 so outlier
/// games cannot dominate the score.
pub fn kda_bonus(kda: f64) -> f64 {
    ((kda - KDA_CENTER) * KDA_MULTIPLIER).clamp(-KDA_CAP, KDA_CAP)
}

/// Centered on 50%, uncapped.
pub fn win_rate_bonus(win_rate: f64) -> f64 {
    (win_rate - WIN_RATE_CENTER) * WIN_RATE_MULTIPLIER
}

/// Rewards a larger season sample with diminishing, capped returns.
/// Season totals come from the rank entry, not the analysis window.
pub fn activity_bonus(season_games: u32) -> f64 {
    if season_games == 0 {
        0.0
    } else {
        ((season_games as f64).log10() * ACTIVITY_MULTIPLIER).min(ACTIVITY_CAP)
    }
}

/// Role-conditional farm/vision bonus. Support performance is not
/// meaningfully measured by creep score, so UTILITY players are scored on
/// vision per minute instead.
pub fn role_stats_bonus(preferred_lane: Option<Role>, cs_per_min: f64, vision_per_min: f64) -> f64 {
    match preferred_lane {
        Some(Role::Utility) => (vision_per_min - VISION_CENTER) * VISION_MULTIPLIER,
        _ => (cs_per_min - CS_CENTER) * CS_MULTIPLIER,
    }
}

/// Full composite score, rounded to 2 decimal places.
pub fn team_contribution(
    rank: Option<&RankEntry>,
    kda: f64,
    win_rate: f64,
    preferred_lane: Option<Role>,
    cs_per_min: f64,
    vision_per_min: f64,
) -> f64 {
    let season_games = rank.map(|r| r.season_games()).unwrap_or(0);
    round2(
        tier_score(rank)
            + kda_bonus(kda)
            + win_rate_bonus(win_rate)
            + activity_bonus(season_games)
            + role_stats_bonus(preferred_lane, cs_per_min, vision_per_min),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Division, Queue, Tier};

    fn entry(tier: Tier, division: Option<Division>, lp: u32, wins: u32, losses: u32) -> RankEntry {
        RankEntry {
            queue: Queue::SoloDuo,
            tier,
            division,
            league_points: lp,
            wins,
            losses,
        }
    }

    #[test]
    fn test_tier_score_sub_apex() {
        let e = entry(Tier::Gold, Some(Division::II), 45, 0, 0);
        // 1200 base + 200 division + 45 LP
        assert_eq!(tier_score(Some(&e)), 1445.0);
    }

    #[test]
    fn test_tier_score_apex_ignores_division_adds_lp() {
        let e = entry(Tier::Challenger, None, 1250, 0, 0);
        assert_eq!(tier_score(Some(&e)), 4050.0);
    }

    #[test]
    fn test_tier_score_unranked_default() {
        assert_eq!(tier_score(None), UNRANKED_TIER_SCORE);
        assert_eq!(UNRANKED_TIER_SCORE, Tier::Gold.base_score());
    }

    #[test]
    fn test_kda_bonus_center_is_zero() {
        assert_eq!(kda_bonus(3.0), 0.0);
    }

    #[test]
    fn test_kda_bonus_scales() {
        assert_eq!(kda_bonus(4.0), 30.0);
        assert_eq!(kda_bonus(2.0), -30.0);
    }

    #[test]
    fn test_kda_bonus_clamped_exactly() {
        // Raw value 210 truncates to the cap.
        assert_eq!(kda_bonus(10.0), 150.0);
        assert_eq!(kda_bonus(0.0), -90.0);
        assert_eq!(kda_bonus(-10.0), -150.0);
        // Boundary: exactly at the cap.
        assert_eq!(kda_bonus(8.0), 150.0);
    }

    #[test]
    fn test_win_rate_bonus_center_and_uncapped() {
        assert_eq!(win_rate_bonus(50.0), 0.0);
        assert_eq!(win_rate_bonus(60.0), 50.0);
        assert_eq!(win_rate_bonus(100.0), 250.0);
        assert_eq!(win_rate_bonus(0.0), -250.0);
    }

    #[test]
    fn test_activity_bonus_zero_games() {
        assert_eq!(activity_bonus(0), 0.0);
    }

    #[test]
    fn test_activity_bonus_diminishing_and_capped() {
        assert_eq!(activity_bonus(10), 15.0);
        assert_eq!(activity_bonus(100), 30.0);
        assert_eq!(activity_bonus(1000), 45.0);
        // log10(100000) * 15 = 75, capped at 50.
        assert_eq!(activity_bonus(100_000), 50.0);
    }

    #[test]
    fn test_role_stats_bonus_laner_uses_cs() {
        assert_eq!(role_stats_bonus(Some(Role::Middle), 7.0, 0.0), 5.0);
        assert_eq!(role_stats_bonus(Some(Role::Top), 6.5, 0.0), 0.0);
        assert_eq!(role_stats_bonus(None, 5.5, 0.0), -10.0);
    }

    #[test]
    fn test_role_stats_bonus_support_uses_vision() {
        assert_eq!(role_stats_bonus(Some(Role::Utility), 2.0, 2.5), 10.0);
        assert_eq!(role_stats_bonus(Some(Role::Utility), 9.0, 2.0), 0.0);
    }

    #[test]
    fn test_reference_point_from_contract() {
        // KDA 3.0, win rate 50%, CS/min 7.0 against a fixed tier baseline:
        // every bonus is zero except role stats at +5.
        let e = entry(Tier::Gold, Some(Division::IV), 0, 0, 0);
        let score = team_contribution(Some(&e), 3.0, 50.0, Some(Role::Middle), 7.0, 0.0);
        assert_eq!(score, 1200.0 + 5.0);
    }

    #[test]
    fn test_team_contribution_is_pure() {
        let e = entry(Tier::Platinum, Some(Division::I), 75, 120, 100);
        let a = team_contribution(Some(&e), 4.2, 55.0, Some(Role::Utility), 1.2, 2.4);
        let b = team_contribution(Some(&e), 4.2, 55.0, Some(Role::Utility), 1.2, 2.4);
        assert_eq!(a, b);
    }

    #[test]
    fn test_team_contribution_uses_season_games_for_activity() {
        let active = entry(Tier::Gold, Some(Division::IV), 0, 500, 500);
        let fresh = entry(Tier::Gold, Some(Division::IV), 0, 0, 0);

        let with_activity = team_contribution(Some(&active), 3.0, 50.0, None, 6.5, 0.0);
        let without = team_contribution(Some(&fresh), 3.0, 50.0, None, 6.5, 0.0);

        assert_eq!(without, 1200.0);
        assert_eq!(with_activity, 1245.0);
    }
}
