use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use erp_service::config::ErpConfig;
use erp_service::services::metrics::{get_metrics, init_metrics};
use erp_service::services::{reports, scoring, stock, support};
use erp_service::services::{BackupService, FileStateStore, PullOutcome, StateStore};
use service_core::observability::init_tracing;
use tracing::info;

/// Back-office engine over the local state document
#[derive(Parser)]
#[command(name = "erp-service")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// State document path (overrides configuration)
    #[arg(long, global = true, env = "ERP_STATE_PATH")]
    state: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the seeded default document if none exists
    Init,

    /// Rescore drivers and raise SLA breach alerts
    Pulse,

    /// Print client scores and segments, best first
    Segments {
        #[arg(long)]
        top: Option<usize>,
    },

    /// Print products at or below their minimum stock
    LowStock,

    /// Print the financial summary: revenue, costs, fleet, stock and support
    Report,

    /// Remote backup of the state document
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },

    /// Print Prometheus metrics gathered during this run
    Metrics,
}

#[derive(Subcommand)]
enum BackupAction {
    /// Upload the local document
    Push {
        #[arg(long)]
        owner: String,
    },
    /// Download the owner's backup, optionally replacing the local document
    Pull {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        restore: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ErpConfig::load().context("Failed to load configuration")?;

    init_tracing(&config.service_name, &config.log_level, config.log_json);
    init_metrics();

    let path = cli.state.unwrap_or_else(|| config.storage.state_path.clone());
    let store = FileStateStore::new(path);

    match cli.command {
        Commands::Init => {
            let created = store.initialize(Utc::now())?;
            info!(created, path = %store.path().display(), "Init complete");
        }
        Commands::Pulse => {
            let mut doc = store.load();
            let alerts = support::run_pulse(&mut doc, Utc::now());
            store.save_checked(&mut doc)?;
            info!(alerts, "Pulse complete");
        }
        Commands::Segments { top } => {
            let doc = store.load();
            let mut scores = scoring::client_segments(&doc, Utc::now(), &config.scoring);
            if let Some(top) = top {
                scores.truncate(top);
            }
            println!("{}", serde_json::to_string_pretty(&scores)?);
        }
        Commands::LowStock => {
            let doc = store.load();
            println!("{}", serde_json::to_string_pretty(&stock::low_stock(&doc))?);
        }
        Commands::Report => {
            let doc = store.load();
            let summary = reports::summary(&doc, &config.reports);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Backup { action } => {
            let backup = BackupService::from_config(&config.backup)
                .context("Remote backup is not configured (set ERP__BACKUP__ENDPOINT)")?;
            match action {
                BackupAction::Push { owner } => {
                    let doc = store.load();
                    if !backup.push(&doc, &owner).await {
                        anyhow::bail!("backup push failed, local document untouched");
                    }
                }
                BackupAction::Pull { owner, restore: true } => {
                    if !backup.restore(&owner, &store).await {
                        anyhow::bail!("restore failed, local document untouched");
                    }
                }
                BackupAction::Pull { owner, restore: false } => match backup.pull(&owner).await {
                    PullOutcome::Restored(doc) => {
                        println!("{}", serde_json::to_string_pretty(&doc)?)
                    }
                    PullOutcome::NotFound => info!(owner = %owner, "No backup for owner"),
                    PullOutcome::Failed => anyhow::bail!("backup pull failed"),
                },
            }
        }
        Commands::Metrics => print!("{}", get_metrics()),
    }

    Ok(())
}
