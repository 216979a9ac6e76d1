//! JSON message types for the remote inbox protocol.
//!
//! The remote inbox is a Telegram bot: two JSON-bodied HTTP POST shapes
//! against a fixed base endpoint plus a credential path segment.
//!
//! # Message flow
//!
//! ```text
//! Agent → Inbox:  fetch-updates  {offset, limit, timeout}
//! Inbox → Agent:  {ok, result: [{update_id, message?}], description?}
//!
//! Agent → Inbox:  send-message   {chat_id, text}
//! Inbox → Agent:  {ok, description?}
//! ```
//!
//! An `ok: false` response is an application-level failure (for example an
//! invalid credential) and is distinct from an HTTP-level failure; the
//! transport surfaces the two differently so the poller can log the
//! description the server provides.
//!
//! Unknown fields are ignored on deserialization: the real API attaches many
//! more fields to a message than the agent reads, and the structs here name
//! only the ones that are consumed.

use serde::{Deserialize, Serialize};

/// Body of a fetch-updates request.
///
/// ```json
/// {"offset":42,"limit":10,"timeout":30}
/// ```
///
/// `offset` is the last processed update id plus one; the server holds the
/// request open for up to `timeout` seconds waiting for new updates
/// (long-poll) and returns at most `limit` of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchUpdatesRequest {
    pub offset: i64,
    pub limit: u8,
    pub timeout: u64,
}

/// Envelope of a fetch-updates response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatesResponse {
    /// `false` signals an application-level failure; `description` says why.
    pub ok: bool,
    /// The new updates, oldest first. Absent on failure.
    #[serde(default)]
    pub result: Vec<Update>,
    /// Human-readable failure description supplied by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One inbox update.
///
/// Updates carry a monotonically increasing identifier used as the poll
/// watermark. Not every update carries a message (other update kinds exist
/// on the wire); those without one are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<IncomingMessage>,
}

/// A text message inside an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i64,
    /// The conversation this message belongs to; its id is the reply target
    /// for locally generated moves.
    pub chat: Chat,
    /// Message text. Absent for stickers, photos, and similar payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// The conversation a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Body of a send-message request.
///
/// ```json
/// {"chat_id":123456789,"text":"e2e4"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub chat_id: i64,
    pub text: String,
}

/// Envelope of a send-message response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
