//! Command-line entry point: read a roster, analyze it, print the teams.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use rift_balancer::balancer::BalanceReport;
use rift_balancer::config::AppConfig;
use rift_balancer::models::{Identity, Role};
use rift_balancer::pipeline::Pipeline;
use rift_balancer::progress::ChannelSink;
use rift_balancer::riot::RiotClient;

#[derive(Parser)]
#[command(name = "rift-balancer", about = "Balance a custom lobby into fair teams")]
struct Args {
    /// Roster file with one name#tag per line.
    roster: Option<PathBuf>,

    /// Add a player directly (repeatable). Combined with the roster file.
    #[arg(long = "player", value_name = "NAME#TAG")]
    players: Vec<String>,

    /// Configuration file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// API key override; falls back to the config file, then RIOT_API_KEY.
    #[arg(long)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = Args::parse();

    let mut config = if args.config.exists() {
        AppConfig::from_file(&args.config)
            .with_context(|| format!("loading {}", args.config.display()))?
    } else {
        AppConfig::default()
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    // take() so the flag's String leaves args without a partial move; args
    // is borrowed again below for the roster.
    if let Some(key) = args.api_key.take() {
        config.api.api_key = key;
    } else if config.api.api_key.is_empty() {
        if let Ok(key) = std::env::var("RIOT_API_KEY") {
            config.api.api_key = key;
        }
    }
    if config.api.api_key.is_empty() {
        bail!("no API key: pass --api-key, set api.api_key in config, or export RIOT_API_KEY");
    }

    let identities = collect_identities(&args)?;
    if identities.is_empty() {
        bail!("no players given: pass a roster file or --player flags");
    }

    let api = Arc::new(RiotClient::new(config.api.clone())?);
    let pipeline = Pipeline::new(api, &config);

    let (sink, mut progress_rx) = ChannelSink::new();
    let printer = tokio::spawn(async move {
        while let Some(message) = progress_rx.recv().await {
            println!("  {}", message);
        }
    });

    let report = pipeline.analyze_and_balance(&identities, &sink).await?;
    drop(sink);
    if let Err(err) = printer.await {
        warn!("progress printer task failed: {}", err);
    }

    print_report(&report);
    Ok(())
}

fn collect_identities(args: &Args) -> Result<Vec<Identity>> {
    let mut identities = Vec::new();

    if let Some(path) = &args.roster {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading roster {}", path.display()))?;
        identities = rift_balancer::parse_roster(&contents)
            .map_err(|line| anyhow::anyhow!("malformed roster line: {:?}", line))?;
    }

    for raw in &args.players {
        let identity = Identity::parse(raw)
            .with_context(|| format!("malformed player {:?}, expected name#tag", raw))?;
        identities.push(identity);
    }

    Ok(identities)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_identities_after_taking_api_key() {
        let mut args = Args {
            roster: None,
            players: vec!["Faker#KR1".to_string()],
            config: PathBuf::from("config.toml"),
            api_key: Some("RGAPI-test".to_string()),
        };

        // The key leaves args first, exactly as main() consumes it; args
        // must still be borrowable for the roster afterwards.
        let key = args.api_key.take();
        assert_eq!(key.as_deref(), Some("RGAPI-test"));

        let identities = collect_identities(&args).unwrap();
        assert_eq!(identities, vec![Identity::new("Faker", "KR1")]);
    }

    #[test]
    fn test_collect_identities_rejects_malformed_flag() {
        let args = Args {
            roster: None,
            players: vec!["no-separator".to_string()],
            config: PathBuf::from("config.toml"),
            api_key: None,
        };
        assert!(collect_identities(&args).is_err());
    }
}

fn print_report(report: &BalanceReport) {
    for team in &report.teams {
        println!();
        println!("Team {} (avg {:.2})", team.team_number, team.avg_score);
        for role in Role::ORDER {
            match team.assigned(role) {
                Some(member) => println!(
                    "  {:<8} {:<24} {:>8.2}",
                    role.to_string(),
                    member.identity.to_string(),
                    member.team_contribution
                ),
                None => println!("  {:<8} -", role.to_string()),
            }
        }
    }
    println!();
    println!(
        "Balance metric: {:.2} ({})",
        report.balance_metric,
        report.rating()
    );
}
