//! muse-status: status-bar aggregator daemon and its clients.
//!
//! # Usage
//!
//! ```text
//! muse-status daemon [--mode lemonbar|i3] [--primary-color C] [--secondary-color C] [--font F] [--stdout]
//! muse-status notify <block>
//! muse-status listen
//! muse-status config
//! ```
//!
//! `--config <path>` and `--socket <path>` apply to every subcommand.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{daemon::DaemonArgs, notify::NotifyArgs, Context};

#[derive(Parser, Debug)]
#[command(
    name = "muse-status",
    version,
    about = "Aggregate status blocks into one bar line and stream it to bar clients",
    long_about = None,
)]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/muse-status/config.yaml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Daemon socket (default: $XDG_RUNTIME_DIR/muse-status.sock).
    #[arg(long, global = true)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the aggregator in the foreground.
    Daemon(DaemonArgs),

    /// Refresh one block now and rebroadcast.
    Notify(NotifyArgs),

    /// Print every status line the daemon streams (pipe into the bar).
    Listen,

    /// Show the resolved config path, socket and effective config.
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = Context::resolve(cli.config, cli.socket)?;
    match cli.command {
        Commands::Daemon(args) => args.run(context),
        Commands::Notify(args) => args.run(&context),
        Commands::Listen => commands::listen::run(&context),
        Commands::Config => commands::config::run(&context),
    }
}
