//! Wire types for the remote inbox protocol.

pub mod messages;
