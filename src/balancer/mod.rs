//! Team partitioning: snake draft plus greedy lane assignment.
//!
//! Players are sorted by contribution and dealt to teams in a snake draft,
//! which equalizes cumulative score without an optimization search. Each
//! team then gets a two-pass lane assignment that reduces (not eliminates)
//! role overlap.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use crate::models::{round2, PlayerStats, Role, Team};

/// Teams are always exactly five players.
pub const TEAM_SIZE: usize = 5;

/// A balancing run needs at least two full teams.
pub const MIN_PLAYERS: usize = 10;

/// Balancing errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BalanceError {
    #[error("need at least {MIN_PLAYERS} players in multiples of {TEAM_SIZE}, got {0}")]
    InvalidInput(usize),
}

/// Output of one balancing run.
#[derive(Debug, Clone)]
pub struct BalanceReport {
    pub teams: Vec<Team>,

    /// Population standard deviation of per-team average scores.
    /// Lower is more balanced.
    pub balance_metric: f64,
}

impl BalanceReport {
    /// Narrative label for the metric. Presentation only, not contract.
    pub fn rating(&self) -> &'static str {
        if self.balance_metric < 5.0 {
            "excellent"
        } else if self.balance_metric < 10.0 {
            "good"
        } else if self.balance_metric < 20.0 {
            "fair"
        } else {
            "lopsided"
        }
    }
}

/// Partition players into balanced teams of five.
///
/// The sort is stable: players with equal contribution keep their relative
/// input order, so results are deterministic.
pub fn divide(players: Vec<PlayerStats>) -> Result<BalanceReport, BalanceError> {
    let count = players.len();
    if count < MIN_PLAYERS || count % TEAM_SIZE != 0 {
        return Err(BalanceError::InvalidInput(count));
    }

    let mut sorted = players;
    sorted.sort_by(|a, b| {
        b.team_contribution
            .partial_cmp(&a.team_contribution)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let team_count = count / TEAM_SIZE;
    let mut rosters: Vec<Vec<PlayerStats>> = (0..team_count).map(|_| Vec::new()).collect();
    for (pick, player) in sorted.into_iter().enumerate() {
        rosters[snake_index(pick, team_count)].push(player);
    }

    let teams: Vec<Team> = rosters
        .into_iter()
        .enumerate()
        .map(|(i, members)| {
            let mut team = Team::new((i + 1) as u32, members);
            team.lane_assignment = assign_lanes(&team.members);
            team
        })
        .collect();

    let averages: Vec<f64> = teams.iter().map(|t| t.avg_score).collect();
    let balance_metric = round2(population_std_dev(&averages));
    debug!(
        "balanced {} players into {} teams, metric {:.2}",
        count, team_count, balance_metric
    );

    Ok(BalanceReport {
        teams,
        balance_metric,
    })
}

/// Snake draft target for the nth pick: team indices ascend, then descend,
/// repeating. Each team gets one pick from every successive tier-of-five
/// in alternating direction.
fn snake_index(pick: usize, team_count: usize) -> usize {
    let round = pick / team_count;
    let pos = pick % team_count;
    if round % 2 == 0 {
        pos
    } else {
        team_count - 1 - pos
    }
}

/// Two-pass lane assignment.
///
/// Pass one walks roles in the fixed order and gives each to the
/// still-unassigned member with the most games on it (first such member on
/// ties; skipped entirely when the best count is zero). Pass two fills
/// whatever is left with unassigned members in input order. Pure function
/// of the member list, so re-running it changes nothing.
pub fn assign_lanes(members: &[PlayerStats]) -> BTreeMap<Role, usize> {
    let mut assignment = BTreeMap::new();
    let mut taken = vec![false; members.len()];

    for role in Role::ORDER {
        let mut best: Option<(usize, u32)> = None;
        for (i, member) in members.iter().enumerate() {
            if taken[i] {
                continue;
            }
            let count = member.role_counts.count(role);
            if best.map_or(true, |(_, best_count)| count > best_count) {
                best = Some((i, count));
            }
        }
        if let Some((i, count)) = best {
            if count > 0 {
                assignment.insert(role, i);
                taken[i] = true;
            }
        }
    }

    let mut remaining = (0..members.len()).filter(|&i| !taken[i]);
    for role in Role::ORDER {
        if assignment.contains_key(&role) {
            continue;
        }
        if let Some(i) = remaining.next() {
            assignment.insert(role, i);
        }
    }

    assignment
}

fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}
