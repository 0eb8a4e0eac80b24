//! End-to-end batch operation: analyze a lobby and balance it.
//!
//! Structural violations (bad batch size, too few resolved identities) are
//! the only fatal errors; everything below them is absorbed into defaults
//! by the analyzer.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::analyzer::PlayerAnalyzer;
use crate::balancer::{self, BalanceReport, MIN_PLAYERS, TEAM_SIZE};
use crate::config::AppConfig;
use crate::limiter::RateLimiter;
use crate::models::Identity;
use crate::progress::ProgressSink;
use crate::riot::GameApi;

/// Batch-level failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("invalid lobby size {count}: need at least {MIN_PLAYERS} players in multiples of {TEAM_SIZE}")]
    InvalidInput { count: usize },

    #[error("only {resolved} of {required} required identities resolved")]
    InsufficientResults { resolved: usize, required: usize },
}

/// Owns the shared limiter, analyzer, and thresholds for batch runs.
pub struct Pipeline {
    analyzer: PlayerAnalyzer,
    min_resolved_fraction: f64,
}

impl Pipeline {
    pub fn new(api: Arc<dyn GameApi>, config: &AppConfig) -> Self {
        let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
        Self {
            analyzer: PlayerAnalyzer::new(api, limiter, config.analysis.match_count),
            min_resolved_fraction: config.analysis.min_resolved_fraction,
        }
    }

    /// Analyze every identity and divide the lobby into balanced teams.
    ///
    /// Size constraints are checked before any fetching. Unresolved
    /// identities become zero-score placeholders that still occupy team
    /// slots; the batch only fails when fewer than
    /// `ceil(min_resolved_fraction * count)` identities resolved.
    pub async fn analyze_and_balance(
        &self,
        identities: &[Identity],
        sink: &dyn ProgressSink,
    ) -> Result<BalanceReport, BatchError> {
        let count = identities.len();
        if count < MIN_PLAYERS || count % TEAM_SIZE != 0 {
            return Err(BatchError::InvalidInput { count });
        }

        info!("analyzing lobby of {} players", count);
        let stats = self.analyzer.analyze_batch(identities, sink).await;

        let resolved = stats.iter().filter(|s| s.resolved).count();
        let required = (self.min_resolved_fraction * count as f64).ceil() as usize;
        if resolved < required {
            return Err(BatchError::InsufficientResults { resolved, required });
        }

        sink.notify(&format!(
            "analysis complete: {} of {} identities resolved",
            resolved, count
        ));

        // Size was validated up front, so divide cannot reject here.
        balancer::divide(stats).map_err(|_| BatchError::InvalidInput { count })
    }
}
