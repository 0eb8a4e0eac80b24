//! Upstream game-data API client.
//!
//! The core depends only on the [`GameApi`] trait: account lookup by riot id,
//! rank entries by puuid, recent ranked match ids, and match detail by id.
//! [`RiotClient`] is the reqwest implementation against the public API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::ApiConfig;
use crate::models::{AccountRef, Division, Identity, MatchRecord, Participant, Queue, RankEntry, Tier};

/// Errors from the upstream data source.
///
/// `Clone` so a coalescing cache can hand one failure to every waiter.
/// Rate limiting is the only transient variant; everything else is terminal
/// for the request that produced it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Upstream rejected the request for budget reasons. Carries the
    /// server-suggested wait in seconds when the response included one.
    #[error("rate limited by upstream{}", .retry_after_secs.map(|s| format!(", retry after {}s", s)).unwrap_or_default())]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("resource not found")]
    NotFound,

    #[error("request forbidden (check API key)")]
    Forbidden,

    #[error("malformed upstream response: {0}")]
    Malformed(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Http(err.to_string())
    }
}

/// Behavioral contract of the upstream data source.
#[async_trait]
pub trait GameApi: Send + Sync {
    /// Resolve a `name#tag` identity to a stable account reference.
    async fn account_by_riot_id(&self, identity: &Identity) -> Result<AccountRef, FetchError>;

    /// All ranked ladder entries for an account (zero, one, or two).
    async fn rank_entries_by_puuid(&self, account: &AccountRef)
        -> Result<Vec<RankEntry>, FetchError>;

    /// Up to `count` most recent ranked match ids, newest first.
    async fn ranked_match_ids(
        &self,
        account: &AccountRef,
        count: u32,
    ) -> Result<Vec<String>, FetchError>;

    /// Full detail for one match.
    async fn match_by_id(&self, match_id: &str) -> Result<MatchRecord, FetchError>;
}

// Wire DTOs. Field names follow the upstream JSON.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountDto {
    puuid: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeagueEntryDto {
    queue_type: Queue,
    tier: Tier,
    rank: Option<Division>,
    league_points: u32,
    wins: u32,
    losses: u32,
}

impl From<LeagueEntryDto> for RankEntry {
    fn from(dto: LeagueEntryDto) -> Self {
        RankEntry {
            queue: dto.queue_type,
            tier: dto.tier,
            division: dto.rank,
            league_points: dto.league_points,
            wins: dto.wins,
            losses: dto.losses,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchDto {
    metadata: MatchMetadataDto,
    info: MatchInfoDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchMetadataDto {
    match_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchInfoDto {
    /// Epoch milliseconds.
    game_creation: Option<i64>,
    /// Seconds.
    game_duration: i64,
    participants: Vec<ParticipantDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParticipantDto {
    puuid: String,
    kills: u32,
    deaths: u32,
    assists: u32,
    #[serde(default)]
    total_minions_killed: u32,
    #[serde(default)]
    neutral_minions_killed: u32,
    #[serde(default)]
    vision_score: u32,
    individual_position: Option<String>,
    team_position: Option<String>,
    win: bool,
}

impl From<MatchDto> for MatchRecord {
    fn from(dto: MatchDto) -> Self {
        MatchRecord {
            match_id: dto.metadata.match_id,
            game_creation: dto
                .info
                .game_creation
                .and_then(DateTime::<Utc>::from_timestamp_millis),
            duration_secs: dto.info.game_duration,
            participants: dto
                .info
                .participants
                .into_iter()
                .map(|p| Participant {
                    puuid: p.puuid,
                    kills: p.kills,
                    deaths: p.deaths,
                    assists: p.assists,
                    total_minions_killed: p.total_minions_killed,
                    neutral_minions_killed: p.neutral_minions_killed,
                    vision_score: p.vision_score,
                    individual_position: p.individual_position,
                    team_position: p.team_position,
                    win: p.win,
                })
                .collect(),
        }
    }
}

/// Reqwest-backed [`GameApi`] implementation.
pub struct RiotClient {
    client: Client,
    config: ApiConfig,
}

impl RiotClient {
    pub fn new(config: ApiConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }

    /// GET a JSON endpoint, mapping status codes onto the error taxonomy.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T, FetchError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("X-Riot-Token", &self.config.api_key)
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_secs = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse().ok());
                Err(FetchError::RateLimited { retry_after_secs })
            }
            StatusCode::NOT_FOUND => Err(FetchError::NotFound),
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => Err(FetchError::Forbidden),
            s if !s.is_success() => Err(FetchError::Status(s.as_u16())),
            _ => {
                let body = response.bytes().await?;
                serde_json::from_slice(&body).map_err(|e| FetchError::Malformed(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl GameApi for RiotClient {
    async fn account_by_riot_id(&self, identity: &Identity) -> Result<AccountRef, FetchError> {
        let url = format!(
            "{}/riot/account/v1/accounts/by-riot-id/{}/{}",
            self.config.regional_base_url, identity.game_name, identity.tag_line
        );
        let dto: AccountDto = self.get_json(url).await?;
        Ok(AccountRef::new(dto.puuid))
    }

    async fn rank_entries_by_puuid(
        &self,
        account: &AccountRef,
    ) -> Result<Vec<RankEntry>, FetchError> {
        let url = format!(
            "{}/lol/league/v4/entries/by-puuid/{}",
            self.config.platform_base_url, account.puuid
        );
        let dtos: Vec<LeagueEntryDto> = self.get_json(url).await?;
        Ok(dtos.into_iter().map(RankEntry::from).collect())
    }

    async fn ranked_match_ids(
        &self,
        account: &AccountRef,
        count: u32,
    ) -> Result<Vec<String>, FetchError> {
        let url = format!(
            "{}/lol/match/v5/matches/by-puuid/{}/ids?type=ranked&start=0&count={}",
            self.config.regional_base_url, account.puuid, count
        );
        self.get_json(url).await
    }

    async fn match_by_id(&self, match_id: &str) -> Result<MatchRecord, FetchError> {
        let url = format!(
            "{}/lol/match/v5/matches/{}",
            self.config.regional_base_url, match_id
        );
        let dto: MatchDto = self.get_json(url).await?;
        Ok(MatchRecord::from(dto))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_dto_conversion() {
        let json = r#"{
            "metadata": { "matchId": "EUW1_7000000001" },
            "info": {
                "gameCreation": 1700000000000,
                "gameDuration": 1845,
                "participants": [
                    {
                        "puuid": "p1",
                        "kills": 7,
                        "deaths": 3,
                        "assists": 11,
                        "totalMinionsKilled": 190,
                        "neutralMinionsKilled": 12,
                        "visionScore": 28,
                        "individualPosition": "MIDDLE",
                        "teamPosition": "MIDDLE",
                        "win": true
                    }
                ]
            }
        }"#;

        let dto: MatchDto = serde_json::from_str(json).unwrap();
        let record = MatchRecord::from(dto);

        assert_eq!(record.match_id, "EUW1_7000000001");
        assert_eq!(record.duration_secs, 1845);
        assert!(record.game_creation.is_some());
        assert_eq!(record.participants.len(), 1);
        assert_eq!(record.participants[0].creep_score(), 202);
        assert!(record.participants[0].win);
    }

    #[test]
    fn test_participant_dto_defaults_missing_counters() {
        // Older match payloads omit some counters; they default to zero.
        let json = r#"{
            "puuid": "p1",
            "kills": 1,
            "deaths": 1,
            "assists": 1,
            "win": false
        }"#;
        let dto: ParticipantDto = serde_json::from_str(json).unwrap();
        assert_eq!(dto.total_minions_killed, 0);
        assert_eq!(dto.vision_score, 0);
        assert_eq!(dto.individual_position, None);
    }

    #[test]
    fn test_league_entry_dto_conversion() {
        let json = r#"{
            "queueType": "RANKED_SOLO_5x5",
            "tier": "PLATINUM",
            "rank": "II",
            "leaguePoints": 57,
            "wins": 88,
            "losses": 74
        }"#;
        let dto: LeagueEntryDto = serde_json::from_str(json).unwrap();
        let entry = RankEntry::from(dto);

        assert_eq!(entry.queue, Queue::SoloDuo);
        assert_eq!(entry.tier, Tier::Platinum);
        assert_eq!(entry.division, Some(Division::II));
        assert_eq!(entry.season_games(), 162);
    }

    #[test]
    fn test_apex_entry_without_division() {
        let json = r#"{
            "queueType": "RANKED_SOLO_5x5",
            "tier": "CHALLENGER",
            "leaguePoints": 1250,
            "wins": 300,
            "losses": 250
        }"#;
        let dto: LeagueEntryDto = serde_json::from_str(json).unwrap();
        assert_eq!(dto.tier, Tier::Challenger);
        assert_eq!(dto.rank, None);
    }

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::RateLimited {
            retry_after_secs: Some(10),
        };
        assert_eq!(err.to_string(), "rate limited by upstream, retry after 10s");

        let err = FetchError::RateLimited {
            retry_after_secs: None,
        };
        assert_eq!(err.to_string(), "rate limited by upstream");
    }
}
