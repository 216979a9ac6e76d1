//! boardtap agent entry point.
//!
//! Wires together the inbox transport, the message poller, the move
//! dispatcher, and the console control surface, then runs the Tokio async
//! event loop.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load AppConfig          -- calibration, credential, cadence
//!  └─ spawn MessagePoller     -- long-poll loop, extracts move tokens
//!  └─ spawn dispatch loop     -- maps tokens to taps, drives TapBackend
//!  └─ command loop
//!       ├─ start/stop/pause/resume -> DispatchControl
//!       ├─ flip                    -> mirror flag
//!       ├─ status                  -> state snapshot
//!       └─ quit / Ctrl-C           -> shutdown flag
//! ```
//!
//! # Shared state (for beginners)
//!
//! Three scalars cross task boundaries, each with exactly one writer:
//!
//! - the dispatcher state (`DispatchControl`, written by the command loop),
//! - the mirror flag (`AtomicBool`, written by the command loop),
//! - the poll cursor and reply target (written by the poller).
//!
//! Everything else moves over `mpsc` channels: extracted move tokens flow
//! from the poller to the dispatch loop; parsed console commands flow from
//! the stdin reader to the command loop.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use boardtap_agent::application::dispatch_moves::{
    DispatchControl, MoveDispatcher, TapBackend,
};
use boardtap_agent::application::poll_messages::{
    InboxTransport, MessagePoller, MoveRelay, PollerConfig,
};
use boardtap_agent::infrastructure::console::{read_commands, ControlCommand};
use boardtap_agent::infrastructure::gesture::{adb::AdbTapBackend, mock::MockTapBackend};
use boardtap_agent::infrastructure::storage::config::{config_file_path, load_config, save_config};
use boardtap_agent::infrastructure::telegram::TelegramInbox;
use boardtap_core::{BoardMapper, MoveToken};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// boardtap agent.
///
/// Polls a Telegram bot inbox for chess moves and replays them as tap
/// gestures on a connected Android device.
#[derive(Debug, Parser)]
#[command(
    name = "boardtap-agent",
    about = "Replays chess moves from a Telegram inbox as device taps",
    version
)]
struct Cli {
    /// Path to the TOML config file.
    ///
    /// Defaults to the platform config directory
    /// (e.g. `~/.config/boardtap/config.toml` on Linux).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bot credential. Overrides the config file value.
    #[arg(long, env = "BOARDTAP_BOT_TOKEN")]
    token: Option<String>,

    /// Device serial passed to `adb -s`. Overrides the config file value.
    #[arg(long, env = "BOARDTAP_DEVICE_SERIAL")]
    serial: Option<String>,

    /// Log taps instead of sending them to a device.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Start with the board treated as rotated 180°.
    #[arg(long, default_value_t = false)]
    mirrored: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Configuration ─────────────────────────────────────────────────────────
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config_file_path().context("no config path given and no platform config dir")?,
    };
    let mut config = load_config(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    // First run: write the defaults out so the calibration numbers are easy
    // to find and edit.
    if !config_path.exists() {
        if let Err(e) = save_config(&config_path, &config) {
            eprintln!("could not write initial config to {}: {e}", config_path.display());
        }
    }

    if let Some(token) = &cli.token {
        config.telegram.bot_token = token.clone();
    }
    if let Some(serial) = &cli.serial {
        config.agent.device_serial = Some(serial.clone());
    }

    // ── Logging setup ─────────────────────────────────────────────────────────
    // `RUST_LOG` wins; the config file's log level is the fallback.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.agent.log_level.clone())),
        )
        .init();

    if config.telegram.bot_token.is_empty() {
        anyhow::bail!(
            "no bot credential configured; pass --token, set BOARDTAP_BOT_TOKEN, \
             or fill telegram.bot_token in {}",
            config_path.display()
        );
    }

    info!("boardtap agent starting (config {})", config_path.display());

    // ── Shared state ──────────────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let control = Arc::new(DispatchControl::new());
    let mirror = Arc::new(AtomicBool::new(config.board.start_mirrored || cli.mirrored));

    // ── Inbox transport + poller ──────────────────────────────────────────────
    let transport: Arc<dyn InboxTransport> = Arc::new(TelegramInbox::new(
        config.telegram.api_base.clone(),
        config.telegram.bot_token.clone(),
    ));

    let (moves_tx, moves_rx) = mpsc::channel::<MoveToken>(64);
    let poller = MessagePoller::new(
        Arc::clone(&transport),
        PollerConfig {
            batch_limit: config.telegram.batch_limit,
            long_poll_timeout_secs: config.telegram.long_poll_timeout_secs,
            idle_delay: Duration::from_millis(config.telegram.idle_delay_ms),
            failure_delay: Duration::from_millis(config.telegram.failure_delay_ms),
        },
        moves_tx,
    );
    let cursor = poller.cursor_handle();
    let relay = MoveRelay::new(Arc::clone(&transport), poller.reply_target());

    let poll_running = Arc::clone(&running);
    tokio::spawn(async move { poller.run(poll_running).await });

    // ── Tap backend + dispatcher ──────────────────────────────────────────────
    let backend: Arc<dyn TapBackend> = if cli.dry_run {
        info!("dry run: taps will be logged, not dispatched");
        Arc::new(MockTapBackend::logging())
    } else {
        Arc::new(AdbTapBackend::new(
            config.agent.adb_path.clone(),
            config.agent.device_serial.clone(),
        ))
    };

    let dispatcher = MoveDispatcher::new(backend, Arc::clone(&control), config.board.rect())
        .with_tap_interval(Duration::from_millis(config.dispatch.tap_interval_ms));

    let mapper = {
        let mut mapper = BoardMapper::new(config.board.rect());
        mapper.set_mirrored(mirror.load(Ordering::Relaxed));
        mapper
    };

    let move_delay = Duration::from_millis(config.dispatch.move_delay_ms);
    let dispatch_mirror = Arc::clone(&mirror);
    tokio::spawn(async move {
        dispatch_loop(dispatcher, mapper, dispatch_mirror, relay, moves_rx, move_delay).await;
    });

    // ── Console control surface ───────────────────────────────────────────────
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<ControlCommand>(16);
    tokio::spawn(read_commands(cmd_tx));

    info!("agent ready; dispatcher is Idle until you type `start`");

    // ── Command loop ──────────────────────────────────────────────────────────
    loop {
        tokio::select! {
            maybe_cmd = cmd_rx.recv() => {
                let Some(command) = maybe_cmd else { break };
                match command {
                    ControlCommand::Start => {
                        control.start();
                        info!("dispatching enabled");
                    }
                    ControlCommand::Stop => {
                        control.stop();
                        info!("dispatching stopped");
                    }
                    ControlCommand::Pause => {
                        if control.pause() {
                            info!("dispatching paused");
                        } else {
                            warn!("pause ignored, dispatcher is {:?}", control.state());
                        }
                    }
                    ControlCommand::Resume => {
                        if control.resume() {
                            info!("dispatching resumed");
                        } else {
                            warn!("resume ignored, dispatcher is {:?}", control.state());
                        }
                    }
                    ControlCommand::Flip => {
                        let now = !mirror.fetch_xor(true, Ordering::Relaxed);
                        info!("mirror mode {}", if now { "on" } else { "off" });
                    }
                    ControlCommand::Status => {
                        info!(
                            "dispatcher {:?}, mirror {}, cursor {}",
                            control.state(),
                            if mirror.load(Ordering::Relaxed) { "on" } else { "off" },
                            cursor.get()
                        );
                    }
                    ControlCommand::Quit => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                control.emergency_stop();
                break;
            }
        }
    }

    running.store(false, Ordering::Relaxed);
    info!("boardtap agent stopped");
    Ok(())
}

// ── Dispatch loop ─────────────────────────────────────────────────────────────

/// Consumes extracted move tokens and replays them as taps.
///
/// Tokens that arrive alone go through `execute`; a burst already queued on
/// the channel is drained and handed to `execute_sequence` so the inter-move
/// delay and the pause gate apply across the whole run. Dispatched single
/// moves are echoed back to the sender as confirmation.
async fn dispatch_loop(
    dispatcher: MoveDispatcher,
    mut mapper: BoardMapper,
    mirror: Arc<AtomicBool>,
    relay: MoveRelay,
    mut moves_rx: mpsc::Receiver<MoveToken>,
    move_delay: Duration,
) {
    while let Some(first) = moves_rx.recv().await {
        // The control surface may have flipped the board since the last move.
        mapper.set_mirrored(mirror.load(Ordering::Relaxed));

        let mut tokens = vec![first];
        while let Ok(next) = moves_rx.try_recv() {
            tokens.push(next);
        }

        let mut mapped = Vec::new();
        for token in tokens {
            match mapper.move_to_points(&token.to_string()) {
                Ok(mv) => mapped.push((token, mv)),
                Err(e) => warn!("cannot map {token}: {e}"),
            }
        }

        match mapped.as_slice() {
            [] => {}
            [(token, mv)] => match dispatcher.execute(mv).await {
                Ok(()) => {
                    info!("dispatched {token}");
                    if let Err(e) = relay.send(&token.to_string()).await {
                        warn!("could not confirm {token}: {e}");
                    }
                }
                Err(e) => warn!("move {token} dropped: {e}"),
            },
            batch => {
                let moves: Vec<_> = batch.iter().map(|(_, mv)| *mv).collect();
                let executed = dispatcher.execute_sequence(&moves, move_delay).await;
                info!("executed {executed} of {} queued moves", moves.len());
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
