//! Cumulo - Cloud Account Inspection CLI
//!
//! ## Usage
//!
//! ```bash
//! # Which regions hold anything, with evidence
//! cumulo --account 123456789012 regions
//!
//! # Composite reports (cached; --force-refresh bypasses the read)
//! cumulo --account 123456789012 inventory
//! cumulo --account 123456789012 cost --force-refresh
//! cumulo --account 123456789012 security
//! cumulo --account 123456789012 optimize
//! cumulo --account 123456789012 reservations
//!
//! # Drop a cached aggregate after out-of-band changes
//! cumulo --account 123456789012 invalidate inventory
//! ```
//!
//! All output is JSON on stdout; logs go to stderr via `RUST_LOG`.

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cumulo_core::{AccountId, RegionId};
use cumulo_engine::{AwsInspector, EngineConfig, InspectionService, ScanFamily};

/// Cumulo: regional fan-out aggregation for cloud account inspection
#[derive(Parser)]
#[command(name = "cumulo")]
#[command(about = "Cloud account inspection: active regions, inventory, cost, security, optimization", long_about = None)]
struct Cli {
    /// Account id (the partition key for every cache entry)
    #[arg(long, global = true)]
    account: Option<String>,

    /// Bypass the cache read but still write the fresh result
    #[arg(long, global = true)]
    force_refresh: bool,

    /// Restrict scanning to a region (repeatable)
    #[arg(long = "region", global = true)]
    regions: Vec<String>,

    /// Per-unit deadline in seconds; 0 waits indefinitely
    #[arg(long, global = true, default_value_t = 30)]
    unit_timeout_secs: u64,

    /// TTL for the cached active-region set, in seconds
    #[arg(long, global = true, default_value_t = 900)]
    probe_ttl_secs: u64,

    /// TTL for cached aggregates, in seconds
    #[arg(long, global = true, default_value_t = 300)]
    aggregate_ttl_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the active regions with the evidence that made them active
    Regions,

    /// Composite resource inventory across all active regions
    Inventory,

    /// Composite spend summary
    Cost,

    /// Composite security posture
    Security,

    /// Composite optimization recommendations
    Optimize,

    /// Commitment-discount utilization
    Reservations,

    /// Drop one family's cached aggregate for the account
    Invalidate {
        /// Scan family to invalidate
        #[arg(value_enum)]
        family: FamilyArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FamilyArg {
    ActiveRegions,
    Inventory,
    Cost,
    Security,
    Optimization,
    Reservations,
}

impl From<FamilyArg> for ScanFamily {
    fn from(arg: FamilyArg) -> Self {
        match arg {
            FamilyArg::ActiveRegions => ScanFamily::ActiveRegions,
            FamilyArg::Inventory => ScanFamily::Inventory,
            FamilyArg::Cost => ScanFamily::Cost,
            FamilyArg::Security => ScanFamily::Security,
            FamilyArg::Optimization => ScanFamily::Optimization,
            FamilyArg::Reservations => ScanFamily::Reservations,
        }
    }
}

fn render<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cumulo=info,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let account = AccountId::new(
        cli.account
            .clone()
            .ok_or_else(|| anyhow::anyhow!("--account required"))?,
    );

    let mut config = EngineConfig::new()
        .with_probe_ttl(Duration::from_secs(cli.probe_ttl_secs))
        .with_aggregate_ttl(Duration::from_secs(cli.aggregate_ttl_secs))
        .with_unit_timeout(match cli.unit_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        });
    if !cli.regions.is_empty() {
        config = config.with_region_allowlist(
            cli.regions.iter().map(|region| RegionId::new(region.clone())).collect(),
        );
    }

    info!(account = %account, "starting inspection");
    let provider = Arc::new(AwsInspector::new().await);
    let service = InspectionService::new(provider, config)?;
    let force = cli.force_refresh;

    let output = match cli.command {
        Commands::Regions => render(&service.regions(&account, force).await?)?,
        Commands::Inventory => render(&service.inventory(&account, force).await?)?,
        Commands::Cost => render(&service.cost(&account, force).await?)?,
        Commands::Security => render(&service.security(&account, force).await?)?,
        Commands::Optimize => render(&service.optimize(&account, force).await?)?,
        Commands::Reservations => render(&service.reservations(&account, force).await?)?,
        Commands::Invalidate { family } => {
            let family: ScanFamily = family.into();
            service.invalidate(&account, family).await;
            render(&serde_json::json!({
                "invalidated": family.domain(),
                "account": account.to_string(),
            }))?
        }
    };

    println!("{output}");
    Ok(())
}
