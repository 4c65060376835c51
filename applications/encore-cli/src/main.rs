/// Encore - headless player driven from the terminal
use anyhow::Context;
use clap::{Parser, Subcommand};
use encore_playback::{
    load_settings, resolver, side_effect_channel, HistoryLog, MemoryHistoryLog,
    MemorySettingsStore, NoticeLevel, PlaybackConfig, PlaybackEngine, PlayerEvent, SettingsStore,
    SyncWorker, Track,
};
use encore_remote::{RemoteClient, ServerConfig};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod sim;

use commands::{Command, HELP};
use sim::{SharedDeck, SimClock, SimulatedBackend};

const TICK: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "encore")]
#[command(about = "Headless Encore music player", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a library file interactively (commands on stdin)
    Play {
        /// JSON array of tracks
        library: PathBuf,
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Backend URL for settings and history (in-memory when absent)
        #[arg(long, env = "ENCORE_SERVER_URL")]
        server: Option<String>,
        /// Bearer token for the backend
        #[arg(long, env = "ENCORE_ACCESS_TOKEN")]
        token: Option<String>,
        /// Queue the whole library and start at this index
        #[arg(long)]
        start: Option<usize>,
        /// Playlist context for history records
        #[arg(long)]
        playlist: Option<String>,
        /// Length of every simulated track, in seconds
        #[arg(long, default_value_t = 30)]
        track_length: u64,
    },
    /// Show how each track's audio source resolves
    Resolve {
        /// JSON array of tracks
        library: PathBuf,
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "encore=info,encore_playback=info,encore_remote=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            library,
            config,
            server,
            token,
            start,
            playlist,
            track_length,
        } => {
            let session = Session {
                library: load_library(&library)?,
                config: PlaybackConfig::load(config.as_deref())?,
                server: server.map(|url| ServerConfig {
                    url,
                    access_token: token,
                }),
                start,
                playlist,
                track_length: Duration::from_secs(track_length),
            };
            play(session).await?;
        }
        Commands::Resolve { library, config } => {
            let config = PlaybackConfig::load(config.as_deref())?;
            for track in load_library(&library)? {
                let source = resolver::resolve_with_base(&track, config.media_base_url.as_deref());
                println!(
                    "{:<12} {:<32} {}",
                    track.id,
                    track.song_name,
                    source.as_deref().unwrap_or("(no audio available)")
                );
            }
        }
    }

    Ok(())
}

struct Session {
    library: Vec<Track>,
    config: PlaybackConfig,
    server: Option<ServerConfig>,
    start: Option<usize>,
    playlist: Option<String>,
    track_length: Duration,
}

fn load_library(path: &std::path::Path) -> anyhow::Result<Vec<Track>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read library {}", path.display()))?;
    let tracks: Vec<Track> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse library {}", path.display()))?;
    tracing::info!(tracks = tracks.len(), path = %path.display(), "Library loaded");
    Ok(tracks)
}

async fn play(session: Session) -> anyhow::Result<()> {
    // Collaborators: remote backend or in-memory
    let (settings, history): (Arc<dyn SettingsStore>, Arc<dyn HistoryLog>) = match session.server
    {
        Some(server) => {
            let client = RemoteClient::new(server)?;
            tracing::info!(url = %client.url(), "Using remote settings and history");
            (Arc::new(client.settings()), Arc::new(client.history()))
        }
        None => {
            tracing::info!("No server configured, keeping settings and history in memory");
            (
                Arc::new(MemorySettingsStore::default()),
                Arc::new(MemoryHistoryLog::new()),
            )
        }
    };

    let persisted = load_settings(settings.as_ref()).await;
    let (sender, rx) = side_effect_channel();
    let worker = SyncWorker::new(rx, settings, history).spawn();

    // Simulated audio output
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let deck = SharedDeck::default();
    let backend = SimulatedBackend::new(Arc::clone(&deck), event_tx, session.track_length);
    let clock = SimClock::new(deck);

    let mut engine =
        PlaybackEngine::new(session.config, Box::new(backend)).with_side_effects(sender);
    engine.subscribe(print_event);
    engine.apply_settings(&persisted);

    let library = session.library;
    if let Some(start) = session.start {
        if let Err(err) = engine.play_all(library.clone(), start, session.playlist.as_deref()) {
            tracing::warn!(error = %err, "Could not start playback");
        }
    }

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(TICK);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => {
                        if let Err(err) = execute(&mut engine, &library, command, session.playlist.as_deref()) {
                            tracing::debug!(error = %err, "Command failed");
                        }
                    }
                    Err(err) => println!("{:#}", err),
                }
            }
            Some(event) = event_rx.recv() => engine.handle_audio_event(event),
            _ = ticker.tick() => {
                for event in clock.tick(TICK) {
                    engine.handle_audio_event(event);
                }
            }
        }
    }

    engine.dispose();
    // Dropping the engine closes the side-effect channel
    drop(engine);
    worker.await.context("Sync worker panicked")?;

    Ok(())
}

fn execute(
    engine: &mut PlaybackEngine,
    library: &[Track],
    command: Command,
    playlist: Option<&str>,
) -> encore_playback::Result<()> {
    let pick = move |index: usize| {
        let track = library.get(index);
        if track.is_none() {
            println!("No library track at index {}", index);
        }
        track
    };

    match command {
        Command::Library => {
            for (i, track) in library.iter().enumerate() {
                let mark = if track.is_playable() { ' ' } else { '-' };
                println!(
                    "{:>3}{} {} - {}",
                    i,
                    mark,
                    track.song_name,
                    track.artist.as_deref().unwrap_or("Unknown artist")
                );
            }
        }
        Command::Play(index) => {
            if let Some(track) = pick(index) {
                engine.play(track, playlist)?;
            }
        }
        Command::PlayAll(index) => engine.play_all(library.to_vec(), index, playlist)?,
        Command::PlayNow(index) => {
            if let Some(track) = pick(index) {
                engine.play_now(track.clone(), playlist)?;
            }
        }
        Command::Pause => engine.pause(),
        Command::Toggle => engine.toggle_play_pause()?,
        Command::Next => engine.next()?,
        Command::Previous => engine.previous()?,
        Command::Seek(position) => engine.seek(position)?,
        Command::Volume(level) => engine.set_volume(level),
        Command::Mute => engine.toggle_mute(),
        Command::Shuffle => engine.toggle_shuffle(),
        Command::Repeat(None) => engine.toggle_repeat(),
        Command::Repeat(Some(mode)) => engine.set_repeat(mode),
        Command::Autoplay(enabled) => engine.set_autoplay(enabled),
        Command::Queue => {
            let current = engine.current_queue_index();
            for (i, track) in engine.queue().iter().enumerate() {
                let mark = if Some(i) == current { '>' } else { ' ' };
                println!("{} {:>3} {} ({})", mark, i, track.song_name, track.id);
            }
            if engine.queue().is_empty() {
                println!("Queue is empty");
            }
        }
        Command::Add(index) => {
            if let Some(track) = pick(index) {
                engine.add_to_queue(track.clone());
            }
        }
        Command::AddAll => engine.add_all_to_queue(library.to_vec()),
        Command::Remove(id) => {
            if engine.remove_from_queue(&id).is_none() {
                println!("{} is not queued", id);
            }
        }
        Command::Move(from, to) => {
            if !engine.reorder_queue(from, to) {
                println!("Queue positions out of range");
            }
        }
        Command::Clear => engine.clear_queue(),
        Command::Status => match serde_json::to_string_pretty(&engine.snapshot()) {
            Ok(json) => println!("{}", json),
            Err(err) => tracing::warn!(error = %err, "Could not render player state"),
        },
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }

    Ok(())
}

fn print_event(event: &PlayerEvent) {
    match event {
        PlayerEvent::Notice(notice) => match notice.level {
            NoticeLevel::Info => println!("* {}", notice.message),
            NoticeLevel::Error => eprintln!("! {}", notice.message),
        },
        PlayerEvent::TrackChanged { track_id, .. } => println!("> now playing {}", track_id),
        PlayerEvent::StateChanged { state, .. } => {
            tracing::debug!(?state, "Transport state changed");
        }
        PlayerEvent::RepeatChanged { .. }
        | PlayerEvent::ShuffleChanged { .. }
        | PlayerEvent::AutoplayChanged { .. }
        | PlayerEvent::VolumeChanged { .. } => tracing::debug!(?event, "Player setting changed"),
        PlayerEvent::PositionChanged { .. }
        | PlayerEvent::DurationChanged { .. }
        | PlayerEvent::QueueChanged { .. } => {}
    }
}
