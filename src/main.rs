// ABOUTME: Entry point for the slipway CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use slipway::config::{self, Settings};
use slipway::deploy::PipelineEnv;
use slipway::error::Result;
use slipway::external::{DockerComposeCli, DockerWorkloads, GitCli, LogNotifier};
use slipway::health::HealthcheckEngine;
use slipway::lock::{LockError, LockManager};
use slipway::store::RecordStore;
use slipway::webhook::{Gateway, ProjectId};
use std::env;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cwd = env::current_dir()?;

    if let Commands::Init { force } = &cli.command {
        config::init_settings(&cwd, *force)?;
        println!("✓ wrote {}", config::SETTINGS_FILENAME);
        return Ok(());
    }

    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::discover(&cwd)?,
    };
    let store = RecordStore::open(&settings.store)?;
    let locks = LockManager::new(store.clone());

    match cli.command {
        Commands::Init { .. } => unreachable!("handled above"),

        Commands::Lock { project } => {
            let project = ProjectId::new(&project);
            locks.set(&project, true, false).await?;
            println!("✓ {project} locked");
            Ok(())
        }

        Commands::Unlock { project } => {
            let project = ProjectId::new(&project);
            locks.set(&project, false, false).await?;
            println!("✓ {project} unlocked");
            Ok(())
        }

        Commands::Status { project } => {
            let project = ProjectId::new(&project);
            match locks.lookup(&project).await {
                Ok(record) if record.locked => {
                    let kind = if record.is_system_lock() {
                        "system"
                    } else {
                        "user"
                    };
                    println!("{project}: locked ({kind})");
                }
                Ok(_) | Err(LockError::NotFound(_)) => println!("{project}: unlocked"),
                Err(e) => return Err(e.into()),
            }

            let (records, total) = store.deployments(Some(&project.key()), 5).await?;
            if total > 0 {
                println!("recent deployments ({total} total):");
                for record in records {
                    println!(
                        "  {}  {}  {}",
                        record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        record.commit,
                        record.status
                    );
                }
            }
            Ok(())
        }

        Commands::History { project, limit } => {
            let project = project.map(|p| ProjectId::new(&p));
            let key = project.as_ref().map(|p| p.key());
            let (records, total) = store.deployments(key.as_deref(), limit).await?;
            for record in &records {
                println!(
                    "{}  {}  {}  {}",
                    record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    record.project,
                    record.commit,
                    record.status
                );
            }
            if total > records.len() {
                println!("({} of {total} records shown)", records.len());
            }
            Ok(())
        }

        Commands::Redeploy { project } => {
            let project = ProjectId::new(&project);
            let gateway = build_gateway(settings, store, locks)?;
            println!("→ redeploying {project}...");
            gateway.redeploy(&project).await?;
            println!("✓ redeploy finished; see `slipway status {project}`");
            Ok(())
        }

        Commands::Sweep { max_age_hours } => {
            let swept = store
                .fail_stale_in_progress(chrono::Duration::hours(max_age_hours as i64))
                .await?;
            println!("✓ swept {swept} stale deployment(s)");
            Ok(())
        }
    }
}

/// Wire the full pipeline environment with production collaborators.
fn build_gateway(settings: Settings, store: RecordStore, locks: LockManager) -> Result<Gateway> {
    let settings = Arc::new(settings);
    let workloads = Arc::new(DockerWorkloads::connect()?);
    let health = HealthcheckEngine::new(
        workloads,
        settings.healthcheck_retries,
        settings.healthcheck_backoff,
    );

    let env = PipelineEnv {
        vcs: Arc::new(GitCli::new(settings.vcs_timeout)),
        compose: Arc::new(DockerComposeCli::new(settings.compose_timeout)),
        notifier: Arc::new(LogNotifier),
        health,
        settings,
        store,
        locks,
    };
    Ok(Gateway::new(env))
}
