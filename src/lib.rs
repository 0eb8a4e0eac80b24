//! # Rift Balancer
//!
//! Analyzes recent ranked history for a lobby of players and splits them
//! into balanced, role-optimized teams of five.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (identities, ranks, matches, teams)
//! - **riot**: Upstream game-data API client behind the `GameApi` trait
//! - **limiter**: Process-global token-bucket request budget
//! - **cache**: Coalescing memo cache for immutable match records
//! - **analyzer**: Per-player retrieval, aggregation, and scoring
//! - **balancer**: Snake draft and lane assignment
//! - **pipeline**: Caller-facing analyze-and-balance operation
//! - **progress**: Advisory progress sinks
//! - **config**: Configuration loading and validation

pub mod analyzer;
pub mod balancer;
pub mod cache;
pub mod config;
pub mod limiter;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod riot;

pub use models::*;

/// Parse a lobby roster: one `name#tag` per line, blank lines and `//`
/// comment lines skipped. Returns the malformed line on failure.
pub fn parse_roster(contents: &str) -> Result<Vec<Identity>, String> {
    let mut identities = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        match Identity::parse(line) {
            Some(identity) => identities.push(identity),
            None => return Err(line.to_string()),
        }
    }
    Ok(identities)
}
