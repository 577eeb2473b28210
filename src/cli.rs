// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "slipway")]
#[command(about = "Webhook-driven deployment orchestrator for compose projects")]
#[command(version)]
pub struct Cli {
    /// Path to slipway.yml (defaults to discovery in the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a template slipway.yml in the current directory
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Freeze deployments for a project (operator lock, never auto-released)
    Lock {
        /// Project as owner/repo
        project: String,
    },

    /// Unfreeze deployments for a project
    Unlock {
        /// Project as owner/repo
        project: String,
    },

    /// Show the lock state and recent deployments for a project
    Status {
        /// Project as owner/repo
        project: String,
    },

    /// List deployment history, newest first
    History {
        /// Restrict to one project (owner/repo)
        project: Option<String>,

        /// Maximum records to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Replay the last cached webhook for a project
    Redeploy {
        /// Project as owner/repo
        project: String,
    },

    /// Force stale In-Progress records to Failure
    Sweep {
        /// Age in hours after which an In-Progress record is stale
        #[arg(long, default_value_t = 24)]
        max_age_hours: u64,
    },
}
