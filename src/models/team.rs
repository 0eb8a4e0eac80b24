//! Balanced team output types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{round2, PlayerStats, Role};

/// One balanced team. Built once per balancing run; not mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    /// 1-based team number for display.
    pub team_number: u32,

    /// Members in draft order.
    pub members: Vec<PlayerStats>,

    /// Average team contribution across members, rounded to 2 dp.
    pub avg_score: f64,

    /// Role to member index (into `members`). At most one occupant per role.
    pub lane_assignment: BTreeMap<Role, usize>,
}

impl Team {
    pub fn new(team_number: u32, members: Vec<PlayerStats>) -> Self {
        let avg_score = if members.is_empty() {
            0.0
        } else {
            round2(
                members.iter().map(|m| m.team_contribution).sum::<f64>() / members.len() as f64,
            )
        };
        Self {
            team_number,
            members,
            avg_score,
            lane_assignment: BTreeMap::new(),
        }
    }

    /// Member assigned to a role, if the role is occupied.
    pub fn assigned(&self, role: Role) -> Option<&PlayerStats> {
        self.lane_assignment.get(&role).map(|&i| &self.members[i])
    }
}
