//! # boardtap-core
//!
//! Shared library for boardtap containing the board coordinate domain, the
//! move-token grammar, and the JSON wire types for the remote inbox protocol.
//!
//! This crate is used by the agent binary and by every test suite.
//! It has zero dependencies on network sockets, processes, or devices.
//!
//! # Architecture overview (for beginners)
//!
//! boardtap is a small automation agent: a remote party sends chess moves as
//! plain text to a Telegram bot, and the agent replays them as tap gestures on
//! a phone whose chess app occupies a known, calibrated region of the screen.
//!
//! This crate (`boardtap-core`) is the shared foundation. It defines:
//!
//! - **`domain`** – Pure logic with no I/O. A `Square` addresses one of the
//!   64 board cells; the `BoardMapper` converts squares to pixel centres
//!   inside the calibration rectangle (optionally reflected 180° for a
//!   flipped board view); the token module finds UCI-style move tokens such
//!   as `e2e4` or `a7a8q` inside free-form message text.
//!
//! - **`protocol`** – How the agent talks to the remote inbox. Messages are
//!   plain JSON over HTTP; the structs here mirror the fetch-updates and
//!   send-message request/response shapes.

// Declare the two top-level modules. Rust will look for each in a
// subdirectory with the same name (e.g., src/domain/mod.rs).
pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `boardtap_core::BoardMapper` instead of `boardtap_core::domain::board::BoardMapper`.
pub use domain::board::{BoardMapper, BoardRect, Point, TapMove};
pub use domain::square::{Square, SquareError};
pub use domain::token::{extract_move_token, MoveToken, Promotion, TokenError};
pub use protocol::messages::{
    Chat, FetchUpdatesRequest, IncomingMessage, SendMessageRequest, SendMessageResponse, Update,
    UpdatesResponse,
};
