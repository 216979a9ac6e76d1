//! MessagePoller: long-polls the remote inbox and extracts move tokens.
//!
//! The poller is one long-running loop: fetch updates newer than the cursor
//! watermark, scan each message text for the first move token, and forward
//! valid tokens to the move sink. Failures never end the loop; they delay
//! the next attempt by a fixed interval. The network transport is behind the
//! [`InboxTransport`] trait so tests can script batches and failures without
//! a server.
//!
//! # Cursor semantics
//!
//! `cursor` is the highest update identifier processed so far; each fetch
//! requests `cursor + 1` onwards. The cursor advances with `max` rather than
//! assuming the batch is ordered, so a single out-of-order batch cannot move
//! it backwards. It lives in memory only: a restarted agent begins at zero
//! and may replay the last unacknowledged batch, which the loop logs on
//! startup.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use boardtap_core::{extract_move_token, MoveToken, Update};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, info, warn};

/// Error type for inbox transport operations.
///
/// HTTP-level failures and application-level (`ok: false`) failures are kept
/// distinct so logs show which side declined, but the poller retries both on
/// the same fixed cadence.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request did not complete (connect failure, timeout, DNS, ...).
    #[error("transport error: {0}")]
    Http(String),

    /// The server answered with a non-success HTTP status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// The server answered `ok: false` with an optional description.
    #[error("inbox rejected the request: {0}")]
    Api(String),

    /// The response body could not be decoded.
    #[error("malformed response payload: {0}")]
    Payload(String),
}

/// Remote inbox transport trait.
///
/// The infrastructure implementation speaks HTTP to the Telegram Bot API;
/// test implementations script batches and failures.
#[async_trait]
pub trait InboxTransport: Send + Sync {
    /// Long-polls for updates with identifiers `>= offset`.
    ///
    /// The call may block for up to `timeout_secs` waiting for new updates
    /// and returns at most `limit` of them.
    async fn fetch_updates(
        &self,
        offset: i64,
        limit: u8,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TransportError>;

    /// Sends `text` to the given conversation. Single best-effort attempt.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError>;
}

/// Cadence and batch settings for the polling loop.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Maximum updates requested per fetch.
    pub batch_limit: u8,
    /// Long-poll hold time requested from the server.
    pub long_poll_timeout_secs: u64,
    /// Delay between polls after a successful response.
    pub idle_delay: Duration,
    /// Delay before retrying after a failed response.
    pub failure_delay: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            batch_limit: 10,
            long_poll_timeout_secs: 30,
            idle_delay: Duration::from_secs(1),
            failure_delay: Duration::from_secs(5),
        }
    }
}

/// The cursor watermark: the highest update identifier processed so far.
///
/// Written only by the poller, readable from other tasks (the console's
/// `status` command). `fetch_max` keeps it monotonically non-decreasing no
/// matter what order a batch arrives in.
#[derive(Debug, Default)]
pub struct PollCursor(AtomicI64);

impl PollCursor {
    /// The highest update identifier processed so far (zero before any).
    pub fn get(&self) -> i64 {
        self.0.load(Ordering::Relaxed)
    }

    fn advance(&self, update_id: i64) {
        self.0.fetch_max(update_id, Ordering::Relaxed);
    }
}

/// The conversation to answer into, captured from the first message seen.
///
/// Written once by the poller, read by [`MoveRelay`]. Zero doubles as the
/// "not captured yet" sentinel; real chat identifiers are never zero.
#[derive(Debug, Default)]
pub struct ReplyTarget(AtomicI64);

impl ReplyTarget {
    /// The captured chat id, or `None` before the first message arrives.
    pub fn get(&self) -> Option<i64> {
        match self.0.load(Ordering::Relaxed) {
            0 => None,
            id => Some(id),
        }
    }

    fn capture(&self, chat_id: i64) {
        self.0.store(chat_id, Ordering::Relaxed);
    }
}

/// The Message Poller use case.
///
/// Sole writer of the cursor watermark and the reply target; both live in
/// shared cells so other tasks can read them.
pub struct MessagePoller {
    transport: Arc<dyn InboxTransport>,
    config: PollerConfig,
    cursor: Arc<PollCursor>,
    reply_target: Arc<ReplyTarget>,
    moves_tx: mpsc::Sender<MoveToken>,
}

impl MessagePoller {
    /// Creates a poller with a fresh (zero) cursor.
    pub fn new(
        transport: Arc<dyn InboxTransport>,
        config: PollerConfig,
        moves_tx: mpsc::Sender<MoveToken>,
    ) -> Self {
        Self {
            transport,
            config,
            cursor: Arc::new(PollCursor::default()),
            reply_target: Arc::new(ReplyTarget::default()),
            moves_tx,
        }
    }

    /// Handle to the reply-target cell, for wiring a [`MoveRelay`].
    pub fn reply_target(&self) -> Arc<ReplyTarget> {
        Arc::clone(&self.reply_target)
    }

    /// Handle to the cursor watermark, for read-only status reporting.
    pub fn cursor_handle(&self) -> Arc<PollCursor> {
        Arc::clone(&self.cursor)
    }

    /// The highest update identifier processed so far.
    pub fn cursor(&self) -> i64 {
        self.cursor.get()
    }

    /// Absorbs one fetched batch: advances the cursor, captures the reply
    /// target, and extracts move tokens.
    ///
    /// Messages without a token are silently skipped; that is normal chatter,
    /// not an error.
    pub fn ingest_batch(&self, updates: &[Update]) -> Vec<MoveToken> {
        let mut tokens = Vec::new();

        for update in updates {
            // Max-based advance: tolerates an out-of-order batch.
            self.cursor.advance(update.update_id);

            let Some(message) = &update.message else {
                continue;
            };

            if self.reply_target.get().is_none() {
                info!("captured reply target chat {}", message.chat.id);
                self.reply_target.capture(message.chat.id);
            }

            let Some(text) = &message.text else {
                continue;
            };

            match extract_move_token(text) {
                Some(token) => {
                    info!("move {token} extracted from message {}", message.message_id);
                    tokens.push(token);
                }
                None => {
                    debug!("no move token in message {}", message.message_id);
                }
            }
        }

        tokens
    }

    /// One fetch-and-forward iteration.
    ///
    /// Returns the number of tokens forwarded to the move sink.
    ///
    /// # Errors
    ///
    /// Propagates the [`TransportError`] from the fetch; the cursor is left
    /// untouched on failure.
    pub async fn poll_once(&self) -> Result<usize, TransportError> {
        let updates = self
            .transport
            .fetch_updates(
                self.cursor.get() + 1,
                self.config.batch_limit,
                self.config.long_poll_timeout_secs,
            )
            .await?;

        let tokens = self.ingest_batch(&updates);
        let mut forwarded = 0;
        for token in tokens {
            if self.moves_tx.send(token).await.is_ok() {
                forwarded += 1;
            } else {
                warn!("move sink closed, dropping {token}");
            }
        }
        Ok(forwarded)
    }

    /// Runs the polling loop until `running` is cleared.
    ///
    /// Every failure is logged and retried after the fixed failure delay —
    /// there is no distinction between transient network trouble and a
    /// permanently bad credential, and no adaptive backoff.
    pub async fn run(&self, running: Arc<AtomicBool>) {
        info!(
            "inbox polling started at cursor {}; messages since the last run may replay",
            self.cursor.get()
        );

        while running.load(Ordering::Relaxed) {
            let delay = match self.poll_once().await {
                Ok(forwarded) => {
                    if forwarded > 0 {
                        debug!("forwarded {forwarded} move(s), cursor now {}", self.cursor.get());
                    }
                    self.config.idle_delay
                }
                Err(e) => {
                    warn!("inbox poll failed: {e}; retrying");
                    self.config.failure_delay
                }
            };

            if running.load(Ordering::Relaxed) {
                time::sleep(delay).await;
            }
        }

        info!("inbox polling stopped");
    }
}

/// Error type for outbound move relay.
#[derive(Debug, Error)]
pub enum RelayError {
    /// No message has been received yet, so there is nowhere to send to.
    #[error("no reply target captured yet")]
    NoReplyTarget,

    /// The underlying send failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Relays locally generated move text back to the remote party.
///
/// Reads the reply target the poller captured. Sends are single best-effort
/// requests; failures are surfaced to the caller and not retried.
pub struct MoveRelay {
    transport: Arc<dyn InboxTransport>,
    reply_target: Arc<ReplyTarget>,
}

impl MoveRelay {
    /// Creates a relay over the shared reply-target cell.
    pub fn new(transport: Arc<dyn InboxTransport>, reply_target: Arc<ReplyTarget>) -> Self {
        Self {
            transport,
            reply_target,
        }
    }

    /// Sends `text` to the captured reply target.
    ///
    /// # Errors
    ///
    /// [`RelayError::NoReplyTarget`] before any message has arrived (the
    /// omission is also logged), or the transport error from the send.
    pub async fn send(&self, text: &str) -> Result<(), RelayError> {
        let Some(chat_id) = self.reply_target.get() else {
            warn!("no reply target captured yet, dropping outbound text {text:?}");
            return Err(RelayError::NoReplyTarget);
        };
        self.transport.send_text(chat_id, text).await?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
