//! # sprint
//!
//! Command-line interface for Sprint.
//!
//! Every command runs as the principal given by `--user` / `--role`
//! (or `SPRINT_USER` / `SPRINT_ROLE`). Identity is taken as already
//! verified; this tool does not authenticate.
//!
//! - `sprint profile register/show` — user profiles
//! - `sprint goal create/show/list/invite/join/leave/extend/complete/delete`
//! - `sprint task create/list/submit/approve/submission/delete`

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sprint_goal::{Principal, ProjectLayout, SprintError, SprintService};
use tracing_subscriber::EnvFilter;

/// Sprint CLI — goals, mentors, and task reviews.
#[derive(Parser)]
#[command(name = "sprint", version, about)]
struct Cli {
    /// Project root directory (defaults to current directory).
    #[arg(long, default_value = ".")]
    project_root: PathBuf,

    /// Username of the caller.
    #[arg(long, env = "SPRINT_USER", global = true)]
    user: Option<String>,

    /// Coarse role of the caller (e.g. USER, ADMIN).
    #[arg(long, env = "SPRINT_ROLE", default_value = "USER", global = true)]
    role: String,

    /// Print entities as JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, join, and manage goals.
    Goal {
        #[command(subcommand)]
        command: commands::goal::GoalCommands,
    },
    /// Create, submit, and review tasks within a goal.
    Task {
        #[command(subcommand)]
        command: commands::task::TaskCommands,
    },
    /// Register and inspect user profiles.
    Profile {
        #[command(subcommand)]
        command: commands::profile::ProfileCommands,
    },
}

fn main() {
    let cli = Cli::parse();
    let project_root = cli
        .project_root
        .canonicalize()
        .unwrap_or_else(|_| cli.project_root.clone());
    let layout = ProjectLayout::for_project(&project_root);
    let config = layout.load_config();

    // Logs go to stderr so they don't mix with command output on stdout.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::debug!(root = %project_root.display(), "starting sprint");

    if let Err(e) = run(&cli, &layout, config) {
        match e.downcast_ref::<SprintError>() {
            Some(err) => eprintln!("Error [{}]: {}", err.http_status(), err),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: &Cli, layout: &ProjectLayout, config: sprint_goal::SprintConfig) -> anyhow::Result<()> {
    let service = SprintService::open(layout, config)?;
    let ctx = commands::Context {
        service,
        principal: cli
            .user
            .as_ref()
            .map(|user| Principal::new(user, &cli.role)),
        json: cli.json,
    };

    match &cli.command {
        Commands::Goal { command } => commands::goal::execute(command, &ctx),
        Commands::Task { command } => commands::task::execute(command, &ctx),
        Commands::Profile { command } => commands::profile::execute(command, &ctx),
    }
}
