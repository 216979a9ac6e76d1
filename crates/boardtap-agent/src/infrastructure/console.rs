//! Console control surface.
//!
//! The agent is controlled with single-word commands read line-by-line from
//! stdin. Each command maps one-to-one onto a dispatcher or mapper call in
//! the main loop:
//!
//! | command  | effect                                   |
//! |----------|------------------------------------------|
//! | `start`  | open the dispatch gate (state → Running) |
//! | `stop`   | close it (state → Idle)                  |
//! | `pause`  | hold between moves (Running → Paused)    |
//! | `resume` | release a pause (Paused → Running)       |
//! | `flip`   | toggle the board mirror mode             |
//! | `status` | print dispatcher/mirror/cursor state     |
//! | `quit`   | shut the agent down                      |

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::warn;

/// A parsed control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Start,
    Stop,
    Pause,
    Resume,
    Flip,
    Status,
    Quit,
}

impl ControlCommand {
    /// Parses one input line. Case-insensitive, surrounding whitespace
    /// ignored. Returns `None` for empty lines and unknown words.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "start" => Some(ControlCommand::Start),
            "stop" => Some(ControlCommand::Stop),
            "pause" => Some(ControlCommand::Pause),
            "resume" => Some(ControlCommand::Resume),
            "flip" => Some(ControlCommand::Flip),
            "status" => Some(ControlCommand::Status),
            "quit" | "exit" => Some(ControlCommand::Quit),
            _ => None,
        }
    }
}

/// Reads stdin until EOF, forwarding parsed commands on `tx`.
///
/// Unknown input is reported and skipped. Returns when stdin closes or the
/// receiving side goes away.
pub async fn read_commands(tx: mpsc::Sender<ControlCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        match ControlCommand::parse(&line) {
            Some(command) => {
                if tx.send(command).await.is_err() {
                    break;
                }
            }
            None => warn!("unknown command {:?} (try start/stop/pause/resume/flip/status/quit)", line.trim()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
