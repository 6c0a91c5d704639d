//! Hasami - room catalog and scripted demo match
//!
//! Runs two in-process clients against a shared in-memory store.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use hasami_shogi::{
    GameConfig, MemoryConnection, MemoryStore, Position, RoomId, RoomSession, SyncEvent,
    format_clock,
};
use std::path::PathBuf;
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Rooms { config } => list_rooms(config),
        Command::Demo { room, config } => run_demo(room, config).await,
    }
}

fn load_config(path: Option<PathBuf>) -> Result<GameConfig> {
    match path {
        Some(path) => GameConfig::from_file(&path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(GameConfig::default()),
    }
}

/// Print the room catalog with clock allotments
///
/// Occupancy lives in a shared store this process does not connect to, so
/// only the static catalog is shown.
#[instrument]
fn list_rooms(config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config)?;
    for room in RoomId::all() {
        let clock = room.initial_seconds(*config.initial_seconds());
        println!(
            "{:<8} {:<20} {:>5}",
            room.to_string(),
            room.name(),
            format_clock(clock)
        );
    }
    Ok(())
}

/// Play a scripted match in one room
#[instrument]
async fn run_demo(room: String, config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config)?;
    let room = RoomId::parse(&room)?;
    let store = MemoryStore::new();

    info!(%room, "Starting demo match");
    let mut host = RoomSession::enter_room(store.connect()?, room, config).await?;
    let mut guest = RoomSession::enter_room(store.connect()?, room, config).await?;
    while host.next_event().await != SyncEvent::Started {}

    let script = [
        ((8, 1), (4, 1)),
        ((0, 0), (4, 0)),
        ((8, 0), (5, 0)),
        ((0, 8), (1, 8)),
        ((8, 2), (3, 2)),
        ((1, 8), (2, 8)),
        ((3, 2), (3, 0)),
    ];
    for (turn, (from, to)) in script.into_iter().enumerate() {
        let (mover, watcher) = if turn % 2 == 0 {
            (&mut host, &mut guest)
        } else {
            (&mut guest, &mut host)
        };
        play(mover, watcher, from, to).await?;
    }

    if let Some(state) = host.match_state() {
        println!("{}", state.board().display());
    }
    if let Some(reading) = host.clock_reading() {
        let (first, second) = reading.display();
        println!("Sente {first}  Gote {second}");
    }

    guest.resign().await?;
    if let SyncEvent::Finished(outcome) = host.next_event().await {
        println!("{outcome}");
    }

    host.leave_room().await?;
    guest.leave_room().await?;
    Ok(())
}

async fn play(
    mover: &mut RoomSession<MemoryConnection>,
    watcher: &mut RoomSession<MemoryConnection>,
    from: (usize, usize),
    to: (usize, usize),
) -> Result<()> {
    let from = Position::new(from.0, from.1).context("source off board")?;
    let to = Position::new(to.0, to.1).context("destination off board")?;
    let captured = mover.apply_move(from, to).await?;
    if !captured.is_empty() {
        info!(?captured, "Pieces captured");
    }
    if watcher.next_event().await == SyncEvent::Closed {
        warn!("Room closed mid-demo");
    }
    Ok(())
}
