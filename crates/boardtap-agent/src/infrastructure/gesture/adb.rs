//! Tap backend driving an Android device through `adb`.
//!
//! Each tap shells out to `adb [-s SERIAL] shell input tap X Y`, which
//! injects a single-point press-and-release on the device. This is the
//! host-side equivalent of an on-device accessibility gesture: slower, but
//! it needs nothing installed on the phone beyond USB debugging.
//!
//! A non-zero exit status from `adb` is treated as the host refusing the
//! gesture; failing to launch `adb` at all (not installed, not on PATH) is
//! reported separately.

use async_trait::async_trait;
use boardtap_core::Point;
use tokio::process::Command;
use tracing::debug;

use crate::application::dispatch_moves::{TapBackend, TapError};

/// Tap backend backed by the `adb` command-line tool.
pub struct AdbTapBackend {
    adb_path: String,
    serial: Option<String>,
}

impl AdbTapBackend {
    /// Creates a backend using `adb_path` (normally just `"adb"`) and an
    /// optional device serial for multi-device hosts.
    pub fn new(adb_path: impl Into<String>, serial: Option<String>) -> Self {
        Self {
            adb_path: adb_path.into(),
            serial,
        }
    }

    fn build_command(&self, point: Point) -> Command {
        let mut cmd = Command::new(&self.adb_path);
        if let Some(serial) = &self.serial {
            cmd.arg("-s").arg(serial);
        }
        cmd.arg("shell")
            .arg("input")
            .arg("tap")
            .arg(point.x.to_string())
            .arg(point.y.to_string());
        cmd
    }
}

#[async_trait]
impl TapBackend for AdbTapBackend {
    async fn tap(&self, point: Point) -> Result<(), TapError> {
        debug!("adb tap at {point}");

        let output = self
            .build_command(point)
            .output()
            .await
            .map_err(|e| TapError::Unavailable(format!("could not run {}: {e}", self.adb_path)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TapError::Refused(stderr.trim().to_string()));
        }

        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_adb_binary_reports_unavailable() {
        // Arrange – a path that certainly does not exist
        let backend = AdbTapBackend::new("/nonexistent/path/to/adb", None);

        // Act
        let result = backend.tap(Point { x: 10, y: 20 }).await;

        // Assert
        assert!(matches!(result, Err(TapError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_nonzero_exit_reports_refused() {
        // Arrange – `false` ignores its arguments and exits 1, standing in
        // for adb rejecting the gesture.
        let backend = AdbTapBackend::new("false", None);

        // Act
        let result = backend.tap(Point { x: 10, y: 20 }).await;

        // Assert
        assert!(matches!(result, Err(TapError::Refused(_))));
    }

    #[tokio::test]
    async fn test_zero_exit_is_success() {
        // `true` also ignores its arguments and exits 0.
        let backend = AdbTapBackend::new("true", None);

        let result = backend.tap(Point { x: 10, y: 20 }).await;

        assert!(result.is_ok());
    }
}
