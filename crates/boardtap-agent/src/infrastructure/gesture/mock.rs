//! Mock tap backend for unit testing and dry runs.
//!
//! # Why a mock backend?
//!
//! The real backend (`AdbTapBackend`) launches a subprocess that taps on an
//! actual phone. That requires a connected device, visibly moves pieces
//! around, and cannot be observed from test code.
//!
//! The `MockTapBackend` replaces the device call with in-memory recording.
//! Each tap is pushed into a `Mutex<Vec<Point>>` so assertions can inspect
//! exactly what was tapped and in what order. The same backend powers the
//! agent's `--dry-run` mode, where taps are logged instead of dispatched.
//!
//! # `should_fail` flag
//!
//! Set `should_fail = true` before calling `tap` to simulate the gesture
//! host refusing a tap, which exercises error-handling paths in the
//! dispatcher without a broken device.

use std::sync::Mutex;

use async_trait::async_trait;
use boardtap_core::Point;
use tracing::info;

use crate::application::dispatch_moves::{TapBackend, TapError};

/// A tap backend that records all calls without touching a device.
#[derive(Default)]
pub struct MockTapBackend {
    /// Records each point passed to `tap`, in call order.
    pub taps: Mutex<Vec<Point>>,
    /// When `true`, every `tap` immediately returns a refusal.
    pub should_fail: bool,
    /// When `true`, each recorded tap is also logged at info level
    /// (the dry-run mode of the agent binary).
    pub log_taps: bool,
}

impl MockTapBackend {
    /// Creates a backend with empty records and `should_fail = false`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend that logs every tap, for `--dry-run`.
    pub fn logging() -> Self {
        Self {
            log_taps: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl TapBackend for MockTapBackend {
    /// Records the tap, or returns a refusal if `should_fail` is set.
    async fn tap(&self, point: Point) -> Result<(), TapError> {
        if self.should_fail {
            return Err(TapError::Refused("mock failure".to_string()));
        }
        if self.log_taps {
            info!("dry-run tap at {point}");
        }
        self.taps.lock().unwrap().push(point);
        Ok(())
    }
}
