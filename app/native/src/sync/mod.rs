//! The backdrop synchronization engine.
//!
//! Owns the single event loop that keeps the cached blurred backdrop and
//! the scrim overlay in sync with the current wallpaper and the panel's
//! geometry. All mutable state lives on this task; suspension points are
//! `.await`s, and every continuation that crosses one re-validates its
//! flow id before touching visible state.

pub mod flow;
pub mod manager;
pub mod metadata;
pub mod scheduler;
pub mod transition;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::brightness;
use crate::config::FrostConfig;
use crate::constants::timing::{
    GEOMETRY_SETTLE_MS, TRANSITION_DURATION_MS, TRANSITION_TIMEOUT_MARGIN_MS,
};
use crate::geometry::debouncer::KeyDebouncer;
use crate::geometry::{GeometryTracker, Point};
use crate::host::{HostEvent, RenderSurface, SourceProvider, Theme};
use crate::overlay::{self, OverlayState};
use crate::processing::{self, BlurTransform};
use self::flow::FlowSequencer;
use self::manager::{BackdropManager, PipelineResult};
use self::metadata::Dimensions;
use self::scheduler::RefreshSchedule;
use self::transition::{ApplyReason, TransitionHandle};

/// Kinds of geometry changes coalesced before the brightness recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum GeometryChange {
    Moved,
    Resized,
    Displays,
    Fullscreen,
}

/// The top-level synchronization engine.
pub struct SyncEngine {
    config: FrostConfig,
    source: Arc<dyn SourceProvider>,
    surface: Arc<dyn RenderSurface>,
    events: mpsc::UnboundedReceiver<HostEvent>,
    geometry: GeometryTracker,
    theme: Theme,
    flows: Arc<FlowSequencer>,
    manager: BackdropManager,
    transitions: TransitionHandle,
    applied: watch::Receiver<Option<std::path::PathBuf>>,
    results_tx: mpsc::UnboundedSender<PipelineResult>,
    results_rx: mpsc::UnboundedReceiver<PipelineResult>,
    schedule: RefreshSchedule,
    settle: KeyDebouncer<GeometryChange>,
    overlay: OverlayState,
    last_offset: Option<Point>,
    force_next: bool,
}

impl SyncEngine {
    /// Wires up a new engine.
    ///
    /// `backdrop_dir` must already have passed the writability probe.
    #[must_use]
    pub fn new(
        config: FrostConfig,
        source: Arc<dyn SourceProvider>,
        surface: Arc<dyn RenderSurface>,
        transform: Arc<dyn BlurTransform>,
        events: mpsc::UnboundedReceiver<HostEvent>,
        backdrop_dir: &Path,
    ) -> Self {
        let flows = Arc::new(FlowSequencer::new());
        let transitions =
            TransitionHandle::spawn(Arc::clone(&surface), Arc::clone(&flows), transition_timeout());
        let applied = transitions.subscribe();
        let manager = BackdropManager::new(backdrop_dir, transform);
        let (results_tx, results_rx) = mpsc::unbounded_channel();

        Self {
            config,
            source,
            surface,
            events,
            geometry: GeometryTracker::new(),
            theme: Theme::default(),
            flows,
            manager,
            transitions,
            applied,
            results_tx,
            results_rx,
            schedule: RefreshSchedule::immediately(),
            settle: KeyDebouncer::new(Duration::from_millis(GEOMETRY_SETTLE_MS)),
            overlay: OverlayState::new(),
            last_offset: None,
            force_next: false,
        }
    }

    /// Runs the engine until a shutdown event arrives or every event
    /// sender is dropped.
    pub async fn run(mut self) {
        // Host facts queued before startup (initial geometry, theme)
        // should inform the first cycle.
        while let Ok(event) = self.events.try_recv() {
            if event == HostEvent::Shutdown {
                return;
            }
            self.handle_event(event);
        }

        self.restore_from_cache();

        enum Wake {
            Event(Option<HostEvent>),
            Pipeline(Option<PipelineResult>),
            Applied(bool),
            Settled,
            Cycle,
        }

        loop {
            let cycle_at = self.schedule.deadline();
            let settle_at = self.settle.next_deadline().map(tokio::time::Instant::from_std);

            let wake = tokio::select! {
                // Host facts and pipeline results take priority over
                // starting a new cycle against outdated geometry.
                biased;

                event = self.events.recv() => Wake::Event(event),
                result = self.results_rx.recv() => Wake::Pipeline(result),
                changed = self.applied.changed() => Wake::Applied(changed.is_ok()),
                () = tokio::time::sleep_until(
                    settle_at.unwrap_or_else(tokio::time::Instant::now)
                ), if settle_at.is_some() => Wake::Settled,
                () = tokio::time::sleep_until(cycle_at) => Wake::Cycle,
            };

            match wake {
                Wake::Event(Some(HostEvent::Shutdown) | None) => break,
                Wake::Event(Some(event)) => self.handle_event(event),
                Wake::Pipeline(Some(result)) => self.handle_pipeline_result(result),
                Wake::Pipeline(None) => {}
                Wake::Applied(ok) => {
                    if ok {
                        self.reposition();
                        self.recompute_overlay();
                    }
                }
                Wake::Settled => self.flush_settled_geometry(),
                Wake::Cycle => self.run_cycle(),
            }
        }

        tracing::debug!("sync engine stopped");
    }

    /// Shows the previous run's final artifact before the first cycle, so
    /// a cold start is never blank while the first regeneration runs.
    fn restore_from_cache(&mut self) {
        if let Some(path) = self.manager.restorable() {
            tracing::info!(path = %path.display(), "restoring cached backdrop");
            self.transitions.apply(path.to_path_buf(), ApplyReason::CacheRestore);
        }
    }

    /// One synchronization cycle: staleness decision, then either cached
    /// reuse or a freshly issued regeneration flow.
    fn run_cycle(&mut self) {
        let force = std::mem::take(&mut self.force_next);

        let Some(source) = self.source.current_source() else {
            tracing::debug!("source image unavailable, retrying later");
            self.force_next = force;
            self.schedule = RefreshSchedule::after_failure(&self.config.backdrop);
            return;
        };

        let display = self.geometry.snapshot().active_display();
        let (width, height) = display.pixel_size();
        if width == 0 || height == 0 {
            tracing::debug!("display bounds unavailable, retrying later");
            self.force_next = force;
            self.schedule = RefreshSchedule::after_failure(&self.config.backdrop);
            return;
        }
        let target = Dimensions { width, height };

        if !self.manager.is_stale(&source, target, force) {
            // Fresh: reuse the final artifact without touching the
            // transform; re-apply only when it is not already visible.
            let full = self.manager.paths().full.clone();
            if self.transitions.applied().as_deref() != Some(full.as_path()) {
                self.transitions.apply(full, ApplyReason::CacheRestore);
            }
            self.schedule = RefreshSchedule::after_success(&self.config.backdrop);
            return;
        }

        let flow = self.flows.issue();
        tracing::info!(flow, source = %source, width, height, "regenerating backdrop");

        self.manager.spawn_regeneration(
            source,
            target,
            flow,
            self.config.backdrop.clone(),
            Arc::clone(&self.flows),
            self.transitions.clone(),
            self.results_tx.clone(),
        );

        // Provisional; the pipeline result refines this when it lands
        self.schedule = RefreshSchedule::after_success(&self.config.backdrop);
    }

    fn handle_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::ViewportMoved(rect) => {
                self.geometry.update_viewport(rect);
                self.reposition();
                self.settle.touch(GeometryChange::Moved);
            }
            HostEvent::ViewportResized(rect) => {
                self.geometry.update_viewport(rect);
                self.reposition();
                self.settle.touch(GeometryChange::Resized);
            }
            HostEvent::DisplaysChanged(displays) => {
                self.geometry.update_displays(displays);
                self.reposition();
                self.settle.touch(GeometryChange::Displays);
            }
            HostEvent::ThemeChanged(theme) => {
                if self.theme != theme {
                    self.theme = theme;
                    self.recompute_overlay();
                }
            }
            HostEvent::FullscreenChanged(active) => {
                tracing::debug!(active, "panel fullscreen state changed");
                self.reposition();
                self.settle.touch(GeometryChange::Fullscreen);
            }
            HostEvent::TransitionFinished => self.transitions.notify_finished(),
            HostEvent::RefreshRequested { force } => {
                self.force_next |= force;
                self.schedule = RefreshSchedule::immediately();
            }
            HostEvent::Shutdown => {}
        }
    }

    fn handle_pipeline_result(&mut self, result: PipelineResult) {
        match result {
            PipelineResult::Completed { flow, source, display } => {
                if self.flows.is_current(flow) {
                    self.manager.record_success(source, display);
                    self.schedule = RefreshSchedule::after_success(&self.config.backdrop);
                    // Geometry may have moved on while the pipeline ran;
                    // the fresh artifacts could already be the wrong size.
                    self.check_display_staleness();
                } else {
                    tracing::debug!(flow, "completed pipeline was superseded before landing");
                }
            }
            PipelineResult::Failed { flow, error } => {
                if self.flows.is_current(flow) {
                    tracing::warn!(flow, error = %error, "regeneration failed, backing off");
                    self.schedule = RefreshSchedule::after_failure(&self.config.backdrop);
                }
            }
            PipelineResult::Superseded { flow } => {
                tracing::debug!(flow, "pipeline superseded");
            }
        }
    }

    /// Geometry bursts settled: run the expensive follow-ups once.
    fn flush_settled_geometry(&mut self) {
        let settled = self.settle.drain_settled_keys();
        if settled.is_empty() {
            return;
        }

        self.recompute_overlay();
        self.check_display_staleness();
    }

    /// A display-size change stales both artifacts; schedule a cycle as
    /// soon as the geometry has settled.
    fn check_display_staleness(&mut self) {
        let display = self.geometry.snapshot().active_display();
        let (width, height) = display.pixel_size();
        let target = Dimensions { width, height };

        if self.manager.last_display().is_some_and(|recorded| recorded != target) {
            tracing::debug!(width, height, "display target changed, scheduling regeneration");
            self.schedule = RefreshSchedule::immediately();
        }
    }

    /// Positions the display-sized backdrop under the viewport. This is a
    /// pure translation, so it runs on every geometry notification;
    /// redundant writes are skipped.
    fn reposition(&mut self) {
        let snapshot = self.geometry.snapshot();
        let offset =
            snapshot.backdrop_offset(self.config.panel.margin, self.config.panel.titlebar_offset);

        if self.last_offset != Some(offset) {
            self.last_offset = Some(offset);
            self.surface.set_backdrop_offset(offset);
        }
    }

    /// Derives the scrim color from the applied artifact and the current
    /// geometry. Sampling failures degrade to the mode's extreme alpha
    /// instead of leaving a stale overlay.
    fn recompute_overlay(&mut self) {
        if !self.config.overlay.is_enabled() {
            return;
        }
        let Some(applied) = self.transitions.applied() else {
            return;
        };

        let mode = overlay::resolve_mode(self.config.overlay.mode, self.theme);
        let snapshot = self.geometry.snapshot();
        let display = snapshot.active_display();

        // Points-to-artifact-pixels ratio: backing scale times the
        // rendition scale the applied artifact was generated at.
        let render_scale = if applied == self.manager.paths().preview {
            self.config.backdrop.preview_scale()
        } else {
            self.config.backdrop.final_scale()
        };
        let scale = display.scale_factor.max(0.0) * render_scale;

        let brightness = match processing::load_rgb(&applied) {
            Ok(image) => brightness::sample_extreme_brightness(
                &image,
                &snapshot.viewport,
                &display.bounds,
                self.config.panel.margin,
                self.config.panel.titlebar_offset,
                mode,
                scale,
            ),
            Err(err) => {
                tracing::warn!(error = %err, "brightness sampling failed, using fallback");
                mode.fallback_brightness()
            }
        };

        let color = overlay::overlay_color(brightness, mode, &self.config.overlay);
        if self.overlay.update(color.clone()) {
            self.surface.set_overlay_color(&color);
        }
    }
}

/// Full safety window waited per transition.
fn transition_timeout() -> Duration {
    Duration::from_millis(TRANSITION_DURATION_MS + TRANSITION_TIMEOUT_MARGIN_MS)
}

// ============================================================================
// Tests
// ============================================================================
