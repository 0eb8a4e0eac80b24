//! Per-player analysis pipeline.
//!
//! For each identity: resolve the account, pick a ranked entry, list recent
//! ranked matches, fan out match-detail fetches through the shared cache and
//! limiter, then aggregate and score. Per-player and per-match failures are
//! absorbed into defaults so one bad identity never blocks the batch.

pub mod scoring;

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::cache::{Cache, FailurePolicy};
use crate::limiter::RateLimiter;
use crate::models::{
    round1, round2, AccountRef, Identity, MatchRecord, PlayerStats, RankEntry, RoleCounts,
};
use crate::progress::ProgressSink;
use crate::riot::GameApi;

/// Drives account → rank → match list → match detail retrieval and derives
/// a [`PlayerStats`] per identity.
pub struct PlayerAnalyzer {
    api: Arc<dyn GameApi>,
    limiter: Arc<RateLimiter>,
    /// Match records are immutable, so entries live for the process
    /// lifetime; a failed fetch frees the key for a later retry.
    matches: Cache<String, MatchRecord>,
    match_count: u32,
}

#[derive(Default)]
struct Aggregates {
    games: u32,
    kills: u32,
    deaths: u32,
    assists: u32,
    wins: u32,
    /// Games with a positive duration, the divisor for per-minute rates.
    timed_games: u32,
    cs_per_min_sum: f64,
    vision_per_min_sum: f64,
    role_counts: RoleCounts,
}

impl PlayerAnalyzer {
    pub fn new(api: Arc<dyn GameApi>, limiter: Arc<RateLimiter>, match_count: u32) -> Self {
        Self {
            api,
            limiter,
            matches: Cache::new(FailurePolicy::Retry),
            match_count,
        }
    }

    /// Analyze one player. Never fails: an unresolvable identity yields a
    /// zero-value placeholder instead.
    pub async fn analyze_player(&self, identity: &Identity, sink: &dyn ProgressSink) -> PlayerStats {
        let account = match self
            .limiter
            .run(|| self.api.account_by_riot_id(identity))
            .await
        {
            Ok(account) => account,
            Err(err) => {
                warn!("failed to resolve {}: {}", identity, err);
                sink.notify(&format!("analysis failed for {}: {}", identity, err));
                return PlayerStats::unresolved(identity.clone());
            }
        };

        let rank = self.fetch_rank(&account, identity, sink).await;

        let match_ids = self.fetch_match_ids(&account, identity, sink).await;

        if match_ids.is_empty() {
            // New or inactive player: score from the ladder entry alone.
            return self.tier_only_stats(identity.clone(), account, rank);
        }

        let records = self.fetch_matches(&match_ids, identity, sink).await;
        if records.is_empty() {
            return self.tier_only_stats(identity.clone(), account, rank);
        }

        let agg = aggregate(&records, &account);
        sink.notify(&format!(
            "{}: aggregated {} of {} matches",
            identity,
            agg.games,
            match_ids.len()
        ));

        derive_stats(identity.clone(), account, rank, agg)
    }

    /// Analyze a whole lobby concurrently. Results come back in input order;
    /// the shared limiter interleaves the actual upstream traffic.
    pub async fn analyze_batch(
        &self,
        identities: &[Identity],
        sink: &dyn ProgressSink,
    ) -> Vec<PlayerStats> {
        join_all(
            identities
                .iter()
                .map(|identity| self.analyze_player(identity, sink)),
        )
        .await
    }

    /// Rank fetch failure is non-fatal: the player is scored as unranked.
    async fn fetch_rank(
        &self,
        account: &AccountRef,
        identity: &Identity,
        sink: &dyn ProgressSink,
    ) -> Option<RankEntry> {
        match self
            .limiter
            .run(|| self.api.rank_entries_by_puuid(account))
            .await
        {
            Ok(entries) => {
                let picked = RankEntry::preferred(&entries).cloned();
                match &picked {
                    Some(entry) => sink.notify(&format!(
                        "{}: ranked {} {}",
                        identity,
                        entry.tier,
                        entry
                            .division
                            .map(|d| d.to_string())
                            .unwrap_or_else(|| format!("{} LP", entry.league_points)),
                    )),
                    None => sink.notify(&format!("{}: unranked", identity)),
                }
                picked
            }
            Err(err) => {
                debug!("rank lookup failed for {}: {}", identity, err);
                sink.notify(&format!("{}: rank unavailable, scoring as unranked", identity));
                None
            }
        }
    }

    /// Match-list failure is non-fatal and treated like an empty history.
    async fn fetch_match_ids(
        &self,
        account: &AccountRef,
        identity: &Identity,
        sink: &dyn ProgressSink,
    ) -> Vec<String> {
        match self
            .limiter
            .run(|| self.api.ranked_match_ids(account, self.match_count))
            .await
        {
            Ok(ids) => {
                sink.notify(&format!("{}: found {} recent ranked matches", identity, ids.len()));
                ids
            }
            Err(err) => {
                debug!("match list failed for {}: {}", identity, err);
                sink.notify(&format!("{}: match history unavailable", identity));
                Vec::new()
            }
        }
    }

    /// Fan out detail fetches; a failed match is dropped, not fatal.
    async fn fetch_matches(
        &self,
        match_ids: &[String],
        identity: &Identity,
        sink: &dyn ProgressSink,
    ) -> Vec<MatchRecord> {
        let fetches = match_ids.iter().map(|id| async move {
            let outcome = self
                .matches
                .get_or_fetch(id.clone(), || {
                    self.limiter.run(|| self.api.match_by_id(id))
                })
                .await;
            match outcome {
                Ok(record) => {
                    sink.notify(&format!("{}: fetched match {}", identity, id));
                    Some(record)
                }
                Err(err) => {
                    debug!("match {} failed: {}", id, err);
                    sink.notify(&format!("{}: skipping match {} ({})", identity, id, err));
                    None
                }
            }
        });

        join_all(fetches).await.into_iter().flatten().collect()
    }

    fn tier_only_stats(
        &self,
        identity: Identity,
        account: AccountRef,
        rank: Option<RankEntry>,
    ) -> PlayerStats {
        let score = round2(scoring::tier_score(rank.as_ref()));
        PlayerStats {
            team_contribution: score,
            rank,
            account,
            resolved: true,
            ..PlayerStats::unresolved(identity)
        }
    }
}

/// Accumulate the target player's participant rows across match records.
fn aggregate(records: &[MatchRecord], account: &AccountRef) -> Aggregates {
    let mut agg = Aggregates::default();

    for record in records {
        let Some(row) = record.participant(&account.puuid) else {
            continue;
        };

        agg.games += 1;
        agg.kills += row.kills;
        agg.deaths += row.deaths;
        agg.assists += row.assists;
        if row.win {
            agg.wins += 1;
        }

        // Per-minute rates skip matches with a non-positive duration.
        if record.duration_secs > 0 {
            let minutes = record.duration_minutes();
            agg.timed_games += 1;
            agg.cs_per_min_sum += row.creep_score() as f64 / minutes;
            agg.vision_per_min_sum += row.vision_score as f64 / minutes;
        }

        if let Some(role) = row.role() {
            agg.role_counts.record(role);
        }
    }

    agg
}

/// Turn aggregates into rounded, scored [`PlayerStats`].
fn derive_stats(
    identity: Identity,
    account: AccountRef,
    rank: Option<RankEntry>,
    agg: Aggregates,
) -> PlayerStats {
    if agg.games == 0 {
        // Every surviving record was missing the player's row.
        let score = round2(scoring::tier_score(rank.as_ref()));
        return PlayerStats {
            team_contribution: score,
            rank,
            account,
            resolved: true,
            ..PlayerStats::unresolved(identity)
        };
    }

    let games = agg.games as f64;
    let kda = if agg.deaths > 0 {
        (agg.kills + agg.assists) as f64 / agg.deaths as f64
    } else {
        (agg.kills + agg.assists) as f64
    };
    let kda = round2(kda);
    let win_rate = round2(agg.wins as f64 / games * 100.0);

    let (cs_per_minute, vision_per_minute) = if agg.timed_games > 0 {
        let timed = agg.timed_games as f64;
        (
            round1(agg.cs_per_min_sum / timed),
            round2(agg.vision_per_min_sum / timed),
        )
    } else {
        (0.0, 0.0)
    };

    let preferred_lane = agg.role_counts.preferred();

    let team_contribution = scoring::team_contribution(
        rank.as_ref(),
        kda,
        win_rate,
        preferred_lane,
        cs_per_minute,
        vision_per_minute,
    );

    PlayerStats {
        identity,
        account,
        resolved: true,
        rank,
        games_analyzed: agg.games,
        avg_kills: round2(agg.kills as f64 / games),
        avg_deaths: round2(agg.deaths as f64 / games),
        avg_assists: round2(agg.assists as f64 / games),
        kda,
        win_rate,
        cs_per_minute,
        vision_per_minute,
        role_counts: agg.role_counts,
        preferred_lane,
        team_contribution,
    }
}
