//! Backdrop transition sequencing.
//!
//! Replacing the visible backdrop is an animated crossfade performed by
//! the panel. The controller guarantees that at most one crossfade runs
//! at a time, queues at most one pending replacement (latest wins), and
//! rejects applications tagged with a superseded flow id. Completion is
//! signalled by the panel's transition-finished event, raced against a
//! safety timeout so a silent panel can never wedge the state machine.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, mpsc, watch};
use tokio::time::Instant;

use super::flow::{FlowId, FlowSequencer};
use crate::host::RenderSurface;

/// Why a backdrop application is allowed to happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyReason {
    /// Result of the regeneration cycle with this flow id. Discarded when
    /// a newer flow has been issued since.
    Flow(FlowId),
    /// Re-application of an artifact that is already valid (startup
    /// restore, cached reuse). Not subject to the flow check.
    CacheRestore,
}

/// Transition state of the visible backdrop.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TransitionState {
    /// No crossfade in progress.
    #[default]
    Idle,
    /// A crossfade to this artifact is in progress.
    Transitioning(PathBuf),
}

/// A queued application request.
#[derive(Debug)]
struct ApplyRequest {
    path: PathBuf,
    reason: ApplyReason,
}

/// Handle used by the engine (and the pipeline) to talk to the
/// transition task.
#[derive(Debug, Clone)]
pub struct TransitionHandle {
    requests: mpsc::UnboundedSender<ApplyRequest>,
    finished: Arc<Notify>,
    applied: watch::Receiver<Option<PathBuf>>,
}

impl TransitionHandle {
    /// Spawns the transition task.
    ///
    /// `timeout` is the full safety window (crossfade duration plus
    /// margin) waited per transition when the panel never reports
    /// completion.
    #[must_use]
    pub fn spawn(
        surface: Arc<dyn RenderSurface>,
        flows: Arc<FlowSequencer>,
        timeout: Duration,
    ) -> Self {
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        let (applied_tx, applied_rx) = watch::channel(None);
        let finished = Arc::new(Notify::new());

        let controller = TransitionController {
            requests: requests_rx,
            finished: Arc::clone(&finished),
            applied: applied_tx,
            surface,
            flows,
            timeout,
            state: TransitionState::Idle,
            pending: None,
        };
        tokio::spawn(controller.run());

        Self {
            requests: requests_tx,
            finished,
            applied: applied_rx,
        }
    }

    /// Requests that `path` become the visible backdrop.
    pub fn apply(&self, path: PathBuf, reason: ApplyReason) {
        let _ = self.requests.send(ApplyRequest { path, reason });
    }

    /// Forwards the panel's transition-finished signal.
    pub fn notify_finished(&self) { self.finished.notify_one(); }

    /// The currently applied backdrop artifact, if any.
    #[must_use]
    pub fn applied(&self) -> Option<PathBuf> { self.applied.borrow().clone() }

    /// A watch receiver that fires whenever an artifact is (re-)applied.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<PathBuf>> { self.applied.clone() }
}

/// The transition task state.
struct TransitionController {
    requests: mpsc::UnboundedReceiver<ApplyRequest>,
    finished: Arc<Notify>,
    applied: watch::Sender<Option<PathBuf>>,
    surface: Arc<dyn RenderSurface>,
    flows: Arc<FlowSequencer>,
    timeout: Duration,
    state: TransitionState,
    pending: Option<PathBuf>,
}

impl TransitionController {
    async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            let Some(request) = self.accept(request) else {
                continue;
            };

            // Artifacts live under fixed names, so a flow-tagged request
            // for the applied path still carries new pixels and must
            // crossfade. Only a cache restore of the applied path is a
            // true repeat; it skips the crossfade but still pings
            // dependents (overlay recompute).
            let repeat = request.reason == ApplyReason::CacheRestore
                && self.applied.borrow().as_deref() == Some(request.path.as_path());
            if repeat {
                let _ = self.applied.send(Some(request.path));
                continue;
            }

            self.run_transitions(request.path).await;
        }
    }

    /// Validates a request against the current flow.
    fn accept(&self, request: ApplyRequest) -> Option<ApplyRequest> {
        match request.reason {
            ApplyReason::CacheRestore => Some(request),
            ApplyReason::Flow(id) if self.flows.is_current(id) => Some(request),
            ApplyReason::Flow(id) => {
                tracing::debug!(flow = id, path = %request.path.display(), "discarding stale backdrop");
                None
            }
        }
    }

    /// Runs crossfades until no pending replacement remains.
    async fn run_transitions(&mut self, mut path: PathBuf) {
        loop {
            self.state = TransitionState::Transitioning(path.clone());
            tracing::trace!(state = ?self.state, "crossfade started");
            self.surface.show_backdrop(&path);

            self.wait_for_completion().await;

            self.state = TransitionState::Idle;
            let _ = self.applied.send(Some(path.clone()));

            match self.pending.take() {
                Some(next) => path = next,
                None => break,
            }
        }
    }

    /// Waits for the panel's completion signal or the safety timeout,
    /// coalescing replacement requests that arrive in the meantime.
    async fn wait_for_completion(&mut self) {
        enum Waited {
            Done,
            TimedOut,
            Request(Option<ApplyRequest>),
        }

        let deadline = Instant::now() + self.timeout;
        let mut requests_open = true;

        loop {
            let waited = tokio::select! {
                () = self.finished.notified() => Waited::Done,
                () = tokio::time::sleep_until(deadline) => Waited::TimedOut,
                request = self.requests.recv(), if requests_open => Waited::Request(request),
            };

            match waited {
                Waited::Done => break,
                Waited::TimedOut => {
                    tracing::debug!("transition-finished signal timed out");
                    break;
                }
                Waited::Request(Some(request)) => {
                    if let Some(accepted) = self.accept(request) {
                        // Only the latest queued replacement survives
                        self.pending = Some(accepted.path);
                    }
                }
                Waited::Request(None) => requests_open = false,
            }
        }
    }
}
