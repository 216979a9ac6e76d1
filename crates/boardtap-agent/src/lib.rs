//! boardtap-agent library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does boardtap-agent do? (for beginners)
//!
//! The agent is the running half of boardtap. A remote party texts chess
//! moves (`"e2e4"`, `"Bot move: a7a8q"`) to a Telegram bot; the agent:
//!
//! 1. Long-polls the bot inbox for new messages, tracking a watermark so no
//!    message is processed twice within a run.
//! 2. Extracts the first UCI-style move token from each message text.
//! 3. Converts the token to a pair of screen points with the calibrated
//!    `BoardMapper` from `boardtap-core`.
//! 4. Dispatches tap-down/tap-down gesture pairs through a pluggable
//!    `TapBackend` (a real device over `adb`, or a recording backend in
//!    tests and dry runs).
//! 5. Echoes dispatched moves back to the sender as confirmation.
//!
//! A console control surface gates all of this: `start`, `stop`, `pause`,
//! `resume`, and `flip` map one-to-one onto dispatcher and mapper calls.

/// Application layer: use cases for the agent.
pub mod application;

/// Infrastructure layer: inbox transport, gesture backends, console, config.
pub mod infrastructure;
