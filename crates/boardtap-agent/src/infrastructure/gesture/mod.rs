//! Gesture backend implementations.
//!
//! The application layer only knows the `TapBackend` trait; the modules here
//! provide the device-facing implementation and the recording fake used by
//! tests and dry runs.

pub mod adb;
pub mod mock;
