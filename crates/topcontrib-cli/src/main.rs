//! topcontrib - Top GitHub users for a location
//!
//! Runs a paginated, rate-limited GitHub user search and prints the
//! results as JSON or a table.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "topcontrib")]
#[command(about = "Top GitHub users for a location")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./topcontrib.toml or ~/.config/topcontrib/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// GitHub API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// GitHub token (default: config file, then GITHUB_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Whole-request timeout in seconds
    #[arg(long, global = true)]
    request_timeout: Option<u64>,

    /// Times a rate-limited rejection is waited out before failing
    #[arg(long, global = true)]
    max_throttle_retries: Option<u32>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the top users for a location
    Top(cmd::top::TopArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(topcontrib_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug, the spinner shows activity
    //   non-TTY: info unless --debug
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = is_tty && !cli.debug;
    topcontrib_core::init_logging(quiet, cli.debug, multi);

    let mut config = if let Some(path) = &cli.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    // CLI overrides
    if let Some(api_url) = cli.api_url {
        config.github.api_url = api_url;
    }
    if let Some(token) = cli.token {
        config.github.token = Some(token);
    }
    if let Some(secs) = cli.request_timeout {
        config.http.request_timeout = secs;
    }
    if let Some(retries) = cli.max_throttle_retries {
        config.http.max_throttle_retries = retries;
    }

    match cli.command {
        Command::Top(args) => cmd::top::run(args, &config, &progress),
        Command::Config => cmd::show_config::run(&config),
    }
}
