//! Application-layer use cases.
//!
//! Both use cases depend only on traits ([`dispatch_moves::TapBackend`],
//! [`poll_messages::InboxTransport`]) and domain types from `boardtap-core`.
//! All infrastructure implementations are injected at construction time,
//! making the use cases fully unit-testable.

pub mod dispatch_moves;
pub mod poll_messages;
