use crate::host::{FrameHandle, FrameScheduler};

/// Whether the loop has a frame callback outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running { pending: FrameHandle },
}

/// Self-rescheduling per-frame driver.
///
/// Exactly one frame request is outstanding while running. A tick is
/// admitted only for that request's handle, so stale or cancelled callbacks
/// are dropped and ticks never overlap.
#[derive(Debug)]
pub struct RenderLoop {
    state: LoopState,
    ticks: u64,
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Stopped,
            ticks: 0,
        }
    }

    /// Register the first frame.
    pub fn start(&mut self, scheduler: &mut impl FrameScheduler) {
        if let LoopState::Running { pending } = self.state {
            tracing::warn!(?pending, "render loop already running");
            return;
        }
        let pending = scheduler.request_frame();
        self.state = LoopState::Running { pending };
        tracing::debug!(?pending, "render loop started");
    }

    /// Claim the tick for `handle`. Returns `false` unless `handle` is the
    /// outstanding request of a running loop.
    pub fn accept(&mut self, handle: FrameHandle) -> bool {
        match self.state {
            LoopState::Running { pending } if pending == handle => {
                self.ticks += 1;
                true
            }
            _ => {
                tracing::debug!(?handle, state = ?self.state, "ignoring stale frame");
                false
            }
        }
    }

    /// Register the frame after the one just processed.
    pub fn reschedule(&mut self, scheduler: &mut impl FrameScheduler) {
        if let LoopState::Running { .. } = self.state {
            let pending = scheduler.request_frame();
            self.state = LoopState::Running { pending };
        }
    }

    /// Cancel the outstanding frame request and stop.
    pub fn stop(&mut self, scheduler: &mut impl FrameScheduler) {
        if let LoopState::Running { pending } = self.state {
            scheduler.cancel_frame(pending);
            self.state = LoopState::Stopped;
            tracing::debug!(ticks = self.ticks, "render loop stopped");
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, LoopState::Running { .. })
    }

    /// Number of admitted ticks since creation.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessHost;
    use starscape_common::Viewport;

    #[test]
    fn start_requests_exactly_one_frame() {
        let mut host = HeadlessHost::new(Viewport::default());
        let mut lp = RenderLoop::new();
        lp.start(&mut host);
        lp.start(&mut host);
        assert!(lp.is_running());
        assert_eq!(host.pending_frames(), 1);
    }

    #[test]
    fn tick_cycle_keeps_one_request_outstanding() {
        let mut host = HeadlessHost::new(Viewport::default());
        let mut lp = RenderLoop::new();
        lp.start(&mut host);

        for _ in 0..5 {
            let handle = host.take_due_frame().unwrap();
            assert_eq!(host.pending_frames(), 0);
            assert!(lp.accept(handle));
            lp.reschedule(&mut host);
            assert_eq!(host.pending_frames(), 1);
        }
        assert_eq!(lp.ticks(), 5);
    }

    #[test]
    fn stale_handle_is_rejected() {
        let mut host = HeadlessHost::new(Viewport::default());
        let mut lp = RenderLoop::new();
        lp.start(&mut host);
        let first = host.take_due_frame().unwrap();
        assert!(lp.accept(first));
        lp.reschedule(&mut host);

        assert!(!lp.accept(first));
        assert_eq!(lp.ticks(), 1);
    }

    #[test]
    fn stop_cancels_pending_request() {
        let mut host = HeadlessHost::new(Viewport::default());
        let mut lp = RenderLoop::new();
        lp.start(&mut host);
        let pending = match lp.state() {
            LoopState::Running { pending } => pending,
            LoopState::Stopped => panic!("loop should be running"),
        };

        lp.stop(&mut host);
        assert_eq!(lp.state(), LoopState::Stopped);
        assert_eq!(host.pending_frames(), 0);
        assert!(!lp.accept(pending));

        // Rescheduling a stopped loop must not resurrect it.
        lp.reschedule(&mut host);
        assert_eq!(host.pending_frames(), 0);
    }
}
