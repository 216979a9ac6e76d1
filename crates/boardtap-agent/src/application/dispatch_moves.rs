//! MoveDispatcher: replays mapped moves as synthetic tap gesture pairs.
//!
//! A chess move on screen is two taps: one on the origin cell, a short pause,
//! one on the destination cell. The dispatcher owns that sequencing and the
//! Idle/Running/Paused gate in front of it; the actual gesture injection is
//! behind the [`TapBackend`] trait so tests can substitute a recording fake
//! and the binary can choose between a device and a dry run.
//!
//! # Architecture
//!
//! This use case depends only on the [`TapBackend`] trait and domain types
//! from `boardtap-core`. The backend is injected at construction time, making
//! the dispatcher fully unit-testable.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use boardtap_core::{BoardRect, Point, TapMove};
use thiserror::Error;
use tokio::time;
use tracing::{debug, warn};

/// Pause between the origin tap and the destination tap. Long enough for the
/// target app to register one tap before the next begins.
pub const DEFAULT_TAP_INTERVAL: Duration = Duration::from_millis(150);

/// Default delay between consecutive moves of a sequence.
pub const DEFAULT_MOVE_DELAY: Duration = Duration::from_secs(1);

/// How often a paused sequence re-checks the control state.
const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Error type for tap injection.
#[derive(Debug, Error)]
pub enum TapError {
    /// The gesture host could not be reached at all.
    #[error("gesture host unavailable: {0}")]
    Unavailable(String),
    /// The gesture host declined to perform the tap.
    #[error("gesture host refused the tap: {0}")]
    Refused(String),
}

/// Host-agnostic tap injection trait.
///
/// Infrastructure implementations drive a device; test implementations
/// record calls.
#[async_trait]
pub trait TapBackend: Send + Sync {
    /// Performs a single-point, short-duration press-and-release at `point`.
    async fn tap(&self, point: Point) -> Result<(), TapError>;
}

/// Whether incoming moves are executed or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DispatcherState {
    Idle = 0,
    Running = 1,
    Paused = 2,
}

impl DispatcherState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => DispatcherState::Running,
            2 => DispatcherState::Paused,
            _ => DispatcherState::Idle,
        }
    }
}

/// Shared dispatcher state gate.
///
/// The control surface is the only writer; the dispatcher and its sequences
/// read it at each step boundary. A single atomic keeps the cross-task
/// handoff lock-free.
#[derive(Debug)]
pub struct DispatchControl {
    state: AtomicU8,
}

impl Default for DispatchControl {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchControl {
    /// Creates a control in the Idle state.
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(DispatcherState::Idle as u8),
        }
    }

    /// The current state.
    pub fn state(&self) -> DispatcherState {
        DispatcherState::from_u8(self.state.load(Ordering::Relaxed))
    }

    /// Transitions to Running from any state.
    pub fn start(&self) {
        self.state
            .store(DispatcherState::Running as u8, Ordering::Relaxed);
    }

    /// Transitions Running → Paused.
    ///
    /// Returns `false` (and changes nothing) when the state was not Running.
    pub fn pause(&self) -> bool {
        self.state
            .compare_exchange(
                DispatcherState::Running as u8,
                DispatcherState::Paused as u8,
                Ordering::Relaxed,
                Ordering::Relaxed,
            )
            .is_ok()
    }

    /// Transitions Paused → Running.
    ///
    /// Returns `false` (and changes nothing) when the state was not Paused.
    pub fn resume(&self) -> bool {
        self.state
            .compare_exchange(
                DispatcherState::Paused as u8,
                DispatcherState::Running as u8,
                Ordering::Relaxed,
                Ordering::Relaxed,
            )
            .is_ok()
    }

    /// Transitions to Idle from any state.
    pub fn stop(&self) {
        self.state
            .store(DispatcherState::Idle as u8, Ordering::Relaxed);
    }

    /// Unconditionally forces Paused.
    ///
    /// The only operation guaranteed to succeed regardless of current state.
    /// It does not retract an in-flight tap pair, only prevents subsequent
    /// ones.
    pub fn emergency_stop(&self) {
        self.state
            .store(DispatcherState::Paused as u8, Ordering::Relaxed);
    }
}

/// Error type for move dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The dispatcher gate was not open; no gesture was attempted.
    #[error("dispatcher is {0:?}, move dropped")]
    NotRunning(DispatcherState),

    /// An endpoint fell outside the calibrated rectangle; no gesture was
    /// attempted. `which` names the offending endpoint.
    #[error("{which} point {point} is outside the calibrated board")]
    OutOfBounds { which: &'static str, point: Point },

    /// The gesture host failed a tap.
    #[error(transparent)]
    Tap(#[from] TapError),
}

/// The Move Dispatcher use case.
///
/// Validates tap targets against the calibration rectangle and replays them
/// through the injected [`TapBackend`], gated by a shared [`DispatchControl`].
pub struct MoveDispatcher {
    backend: Arc<dyn TapBackend>,
    control: Arc<DispatchControl>,
    bounds: BoardRect,
    tap_interval: Duration,
}

impl MoveDispatcher {
    /// Creates a dispatcher with the default inter-tap interval.
    pub fn new(
        backend: Arc<dyn TapBackend>,
        control: Arc<DispatchControl>,
        bounds: BoardRect,
    ) -> Self {
        Self {
            backend,
            control,
            bounds,
            tap_interval: DEFAULT_TAP_INTERVAL,
        }
    }

    /// Overrides the pause between the two taps of a move.
    pub fn with_tap_interval(mut self, tap_interval: Duration) -> Self {
        self.tap_interval = tap_interval;
        self
    }

    /// The current dispatcher state.
    pub fn status(&self) -> DispatcherState {
        self.control.state()
    }

    /// Executes one move: tap origin, short pause, tap destination.
    ///
    /// Fails without side effects unless the state is Running and both
    /// endpoints lie within the calibrated rectangle.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NotRunning`] when the gate is closed,
    /// [`DispatchError::OutOfBounds`] naming the invalid endpoint, or
    /// [`DispatchError::Tap`] when the gesture host fails a tap.
    pub async fn execute(&self, mv: &TapMove) -> Result<(), DispatchError> {
        let state = self.control.state();
        if state != DispatcherState::Running {
            return Err(DispatchError::NotRunning(state));
        }

        if !self.bounds.contains(mv.origin) {
            return Err(DispatchError::OutOfBounds {
                which: "origin",
                point: mv.origin,
            });
        }
        if !self.bounds.contains(mv.dest) {
            return Err(DispatchError::OutOfBounds {
                which: "destination",
                point: mv.dest,
            });
        }

        debug!("tapping {} then {}", mv.origin, mv.dest);
        self.backend.tap(mv.origin).await?;
        time::sleep(self.tap_interval).await;
        self.backend.tap(mv.dest).await?;
        Ok(())
    }

    /// Executes `moves` in order with `inter_move_delay` between them.
    ///
    /// The control state is checked before each move, never mid-move: a
    /// pause issued while move N runs lets N complete both taps, then holds
    /// the sequence until resume. A stop aborts the remainder. Individual
    /// failures (refused gestures, out-of-bounds endpoints) are reported and
    /// the sequence continues with the next move.
    ///
    /// Returns the number of moves that completed.
    pub async fn execute_sequence(&self, moves: &[TapMove], inter_move_delay: Duration) -> usize {
        let mut executed = 0;

        for (index, mv) in moves.iter().enumerate() {
            if index > 0 {
                time::sleep(inter_move_delay).await;
            }

            loop {
                match self.control.state() {
                    DispatcherState::Paused => {
                        time::sleep(PAUSE_POLL_INTERVAL).await;
                        continue;
                    }
                    DispatcherState::Idle => {
                        debug!("sequence stopped after {executed} of {} moves", moves.len());
                        return executed;
                    }
                    DispatcherState::Running => {}
                }

                match self.execute(mv).await {
                    Ok(()) => {
                        executed += 1;
                        break;
                    }
                    // The gate closed between our check and execute's own:
                    // wait the pause out (or abort) instead of skipping the move.
                    Err(DispatchError::NotRunning(DispatcherState::Paused)) => continue,
                    Err(DispatchError::NotRunning(_)) => return executed,
                    Err(e) => {
                        warn!("move {} of {} failed: {e}", index + 1, moves.len());
                        break;
                    }
                }
            }
        }

        executed
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const BOUNDS: BoardRect = BoardRect {
        left: 0,
        top: 0,
        right: 800,
        bottom: 800,
    };

    // ── Recording backend ─────────────────────────────────────────────────────

    #[derive(Default)]
    struct RecordingBackend {
        taps: Mutex<Vec<Point>>,
        /// Taps landing exactly here fail with a refusal.
        fail_at: Option<Point>,
    }

    #[async_trait]
    impl TapBackend for RecordingBackend {
        async fn tap(&self, point: Point) -> Result<(), TapError> {
            if self.fail_at == Some(point) {
                return Err(TapError::Refused("injected failure".to_string()));
            }
            self.taps.lock().unwrap().push(point);
            Ok(())
        }
    }

    fn make_dispatcher(
        backend: RecordingBackend,
    ) -> (MoveDispatcher, Arc<RecordingBackend>, Arc<DispatchControl>) {
        let backend = Arc::new(backend);
        let control = Arc::new(DispatchControl::new());
        let dispatcher = MoveDispatcher::new(
            Arc::clone(&backend) as Arc<dyn TapBackend>,
            Arc::clone(&control),
            BOUNDS,
        )
        .with_tap_interval(Duration::ZERO);
        (dispatcher, backend, control)
    }

    fn mv(ox: i32, oy: i32, dx: i32, dy: i32) -> TapMove {
        TapMove {
            origin: Point { x: ox, y: oy },
            dest: Point { x: dx, y: dy },
        }
    }

    // ── DispatchControl transitions ───────────────────────────────────────────

    #[test]
    fn test_control_starts_idle() {
        let control = DispatchControl::new();
        assert_eq!(control.state(), DispatcherState::Idle);
    }

    #[test]
    fn test_pause_only_succeeds_from_running() {
        let control = DispatchControl::new();
        assert!(!control.pause(), "pause from Idle must be a no-op");
        assert_eq!(control.state(), DispatcherState::Idle);

        control.start();
        assert!(control.pause());
        assert_eq!(control.state(), DispatcherState::Paused);
    }

    #[test]
    fn test_resume_only_succeeds_from_paused() {
        let control = DispatchControl::new();
        assert!(!control.resume(), "resume from Idle must be a no-op");

        control.start();
        control.pause();
        assert!(control.resume());
        assert_eq!(control.state(), DispatcherState::Running);
    }

    #[test]
    fn test_emergency_stop_forces_paused_from_any_state() {
        let control = DispatchControl::new();
        for setup in [
            DispatchControl::stop as fn(&DispatchControl),
            DispatchControl::start,
            DispatchControl::emergency_stop,
        ] {
            setup(&control);
            control.emergency_stop();
            assert_eq!(control.state(), DispatcherState::Paused);
        }
    }

    // ── execute ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_execute_fails_without_taps_when_idle() {
        // Arrange
        let (dispatcher, backend, _control) = make_dispatcher(RecordingBackend::default());

        // Act
        let result = dispatcher.execute(&mv(10, 10, 20, 20)).await;

        // Assert
        assert!(matches!(
            result,
            Err(DispatchError::NotRunning(DispatcherState::Idle))
        ));
        assert!(backend.taps.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_execute_fails_without_taps_when_paused() {
        let (dispatcher, backend, control) = make_dispatcher(RecordingBackend::default());
        control.start();
        control.pause();

        let result = dispatcher.execute(&mv(10, 10, 20, 20)).await;

        assert!(matches!(
            result,
            Err(DispatchError::NotRunning(DispatcherState::Paused))
        ));
        assert!(backend.taps.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_execute_taps_origin_then_destination() {
        // Arrange
        let (dispatcher, backend, control) = make_dispatcher(RecordingBackend::default());
        control.start();

        // Act
        dispatcher.execute(&mv(100, 200, 300, 400)).await.unwrap();

        // Assert – both taps, in order
        assert_eq!(
            *backend.taps.lock().unwrap(),
            vec![Point { x: 100, y: 200 }, Point { x: 300, y: 400 }]
        );
    }

    #[tokio::test]
    async fn test_execute_rejects_out_of_bounds_origin_without_taps() {
        let (dispatcher, backend, control) = make_dispatcher(RecordingBackend::default());
        control.start();

        let result = dispatcher.execute(&mv(-5, 10, 20, 20)).await;

        match result {
            Err(DispatchError::OutOfBounds { which, point }) => {
                assert_eq!(which, "origin");
                assert_eq!(point, Point { x: -5, y: 10 });
            }
            other => panic!("expected OutOfBounds, got {other:?}"),
        }
        assert!(backend.taps.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_execute_rejects_out_of_bounds_destination_without_taps() {
        let (dispatcher, backend, control) = make_dispatcher(RecordingBackend::default());
        control.start();

        let result = dispatcher.execute(&mv(10, 10, 801, 20)).await;

        match result {
            Err(DispatchError::OutOfBounds { which, .. }) => assert_eq!(which, "destination"),
            other => panic!("expected OutOfBounds, got {other:?}"),
        }
        assert!(backend.taps.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_execute_surfaces_tap_refusal() {
        let (dispatcher, _backend, control) = make_dispatcher(RecordingBackend {
            fail_at: Some(Point { x: 100, y: 200 }),
            ..Default::default()
        });
        control.start();

        let result = dispatcher.execute(&mv(100, 200, 300, 400)).await;

        assert!(matches!(result, Err(DispatchError::Tap(TapError::Refused(_)))));
    }

    // ── execute_sequence ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_sequence_executes_all_moves_in_order() {
        let (dispatcher, backend, control) = make_dispatcher(RecordingBackend::default());
        control.start();
        let moves = [mv(1, 1, 2, 2), mv(3, 3, 4, 4)];

        let executed = dispatcher.execute_sequence(&moves, Duration::ZERO).await;

        assert_eq!(executed, 2);
        assert_eq!(backend.taps.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_sequence_continues_past_a_refused_move() {
        // Arrange – second move's origin tap is refused
        let (dispatcher, backend, control) = make_dispatcher(RecordingBackend {
            fail_at: Some(Point { x: 3, y: 3 }),
            ..Default::default()
        });
        control.start();
        let moves = [mv(1, 1, 2, 2), mv(3, 3, 4, 4), mv(5, 5, 6, 6)];

        // Act
        let executed = dispatcher.execute_sequence(&moves, Duration::ZERO).await;

        // Assert – moves 1 and 3 complete, move 2 is reported and skipped
        assert_eq!(executed, 2);
        let taps = backend.taps.lock().unwrap();
        assert_eq!(
            *taps,
            vec![
                Point { x: 1, y: 1 },
                Point { x: 2, y: 2 },
                Point { x: 5, y: 5 },
                Point { x: 6, y: 6 },
            ]
        );
    }

    #[tokio::test]
    async fn test_sequence_continues_past_out_of_bounds_move() {
        let (dispatcher, backend, control) = make_dispatcher(RecordingBackend::default());
        control.start();
        let moves = [mv(1, 1, 2, 2), mv(900, 900, 4, 4), mv(5, 5, 6, 6)];

        let executed = dispatcher.execute_sequence(&moves, Duration::ZERO).await;

        assert_eq!(executed, 2);
        assert_eq!(backend.taps.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_sequence_aborts_when_stopped() {
        let (dispatcher, backend, control) = make_dispatcher(RecordingBackend::default());
        // Never started: gate reads Idle at the first step boundary.
        let moves = [mv(1, 1, 2, 2), mv(3, 3, 4, 4)];

        let executed = dispatcher.execute_sequence(&moves, Duration::ZERO).await;

        assert_eq!(executed, 0);
        assert!(backend.taps.lock().unwrap().is_empty());
    }
}
