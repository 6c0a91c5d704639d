//! Command-line interface for hasami.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Hasami shogi rooms over a shared record store
#[derive(Parser, Debug)]
#[command(name = "hasami")]
#[command(about = "Hasami shogi rules engine and room synchronization", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the room catalog with clock allotments
    Rooms {
        /// Path to game config (TOML). Defaults apply if omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Play a short scripted match between two in-process clients
    Demo {
        /// Room to play in
        #[arg(short, long, default_value = "kiho")]
        room: String,

        /// Path to game config (TOML). Defaults apply if omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
