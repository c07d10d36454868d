//! Backdrop cache management and the two-stage regeneration pipeline.
//!
//! Decides when the cached artifacts are stale, and drives the
//! preview-then-final regeneration pipeline when they are. Both stages
//! delegate the actual rendering to the [`BlurTransform`] collaborator on
//! the blocking pool; every result is re-validated against the current
//! flow id before it is handed to the transition controller. Artifacts
//! live under fixed names and are overwritten in place.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use super::flow::{FlowId, FlowSequencer};
use super::metadata::{Dimensions, MetadataStore, PersistedMetadata};
use super::transition::{ApplyReason, TransitionHandle};
use crate::config::BackdropConfig;
use crate::constants::{FINAL_ARTIFACT_FILENAME, METADATA_FILENAME, PREVIEW_ARTIFACT_FILENAME};
use crate::processing::{BlurTransform, ProcessingError, TransformRequest};

// ============================================================================
// Types
// ============================================================================

/// Fixed on-disk locations of the two artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Fast preview artifact.
    pub preview: PathBuf,
    /// High-quality final artifact.
    pub full: PathBuf,
}

impl ArtifactPaths {
    /// Creates the artifact paths inside the given cache directory.
    #[must_use]
    pub fn new(dir: &Path) -> Self {
        Self {
            preview: dir.join(PREVIEW_ARTIFACT_FILENAME),
            full: dir.join(FINAL_ARTIFACT_FILENAME),
        }
    }

    /// Whether both artifacts exist on disk.
    #[must_use]
    pub fn both_exist(&self) -> bool { self.preview.exists() && self.full.exists() }
}

/// Terminal outcome of one pipeline run, reported back to the engine.
#[derive(Debug)]
pub enum PipelineResult {
    /// Both stages finished and the final artifact was applied.
    Completed {
        flow: FlowId,
        source: String,
        display: Dimensions,
    },
    /// A stage failed; previously applied artifacts remain visible.
    Failed { flow: FlowId, error: ProcessingError },
    /// The flow was superseded mid-pipeline; results were discarded.
    Superseded { flow: FlowId },
}

// ============================================================================
// BackdropManager
// ============================================================================

/// Owns artifact bookkeeping and launches regeneration pipelines.
pub struct BackdropManager {
    paths: ArtifactPaths,
    transform: Arc<dyn BlurTransform>,
    metadata: MetadataStore,
    last_source: Option<String>,
    last_display: Option<Dimensions>,
}

impl BackdropManager {
    /// Creates a manager rooted at the given (writable) cache directory.
    ///
    /// Persisted metadata from a previous run is honored only when both
    /// artifacts are actually present, so a wiped cache behaves like a
    /// first run.
    #[must_use]
    pub fn new(dir: &Path, transform: Arc<dyn BlurTransform>) -> Self {
        let paths = ArtifactPaths::new(dir);
        let metadata = MetadataStore::new(dir.join(METADATA_FILENAME));

        let persisted = metadata.load().filter(|_| paths.both_exist());
        let (last_source, last_display) = persisted
            .map_or((None, None), |m| (Some(m.last_source), Some(m.last_display)));

        Self {
            paths,
            transform,
            metadata,
            last_source,
            last_display,
        }
    }

    /// The artifact locations.
    #[must_use]
    pub const fn paths(&self) -> &ArtifactPaths { &self.paths }

    /// The display size the current artifacts were generated for.
    #[must_use]
    pub const fn last_display(&self) -> Option<Dimensions> { self.last_display }

    /// The final artifact from a previous run, if it can be shown
    /// immediately at startup.
    #[must_use]
    pub fn restorable(&self) -> Option<&Path> {
        (self.last_source.is_some() && self.paths.full.exists())
            .then_some(self.paths.full.as_path())
    }

    /// Staleness rule: regenerate iff forced, the identity changed, the
    /// display target size changed, or either artifact is missing.
    ///
    /// A target-size change stales both artifacts, since both renditions
    /// are resolution-dependent.
    #[must_use]
    pub fn is_stale(&self, source: &str, display: Dimensions, force: bool) -> bool {
        force
            || self.last_source.as_deref() != Some(source)
            || self.last_display != Some(display)
            || !self.paths.both_exist()
    }

    /// Records a completed regeneration and persists the metadata.
    pub fn record_success(&mut self, source: String, display: Dimensions) {
        let record = PersistedMetadata {
            last_source: source.clone(),
            last_display: display,
        };
        if let Err(err) = self.metadata.store(&record) {
            tracing::warn!(error = %err, "failed to persist sync metadata");
        }

        self.last_source = Some(source);
        self.last_display = Some(display);
    }

    /// Launches the two-stage pipeline for a newly issued flow.
    ///
    /// Returns immediately; the terminal outcome arrives on `results`.
    /// Stage results are applied through `transitions` only while `flow`
    /// is still the current one.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn_regeneration(
        &self,
        source: String,
        display: Dimensions,
        flow: FlowId,
        config: BackdropConfig,
        flows: Arc<FlowSequencer>,
        transitions: TransitionHandle,
        results: UnboundedSender<PipelineResult>,
    ) {
        let transform = Arc::clone(&self.transform);
        let paths = self.paths.clone();

        tokio::spawn(run_pipeline(
            transform, paths, source, display, flow, config, flows, transitions, results,
        ));
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Scales display dimensions by a rendition scale, clamped to >= 1px.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scaled_target(display: Dimensions, scale: f64) -> (u32, u32) {
    (
        ((f64::from(display.width) * scale).round().max(1.0)) as u32,
        ((f64::from(display.height) * scale).round().max(1.0)) as u32,
    )
}

#[allow(clippy::too_many_arguments)]
async fn run_pipeline(
    transform: Arc<dyn BlurTransform>,
    paths: ArtifactPaths,
    source: String,
    display: Dimensions,
    flow: FlowId,
    config: BackdropConfig,
    flows: Arc<FlowSequencer>,
    transitions: TransitionHandle,
    results: UnboundedSender<PipelineResult>,
) {
    // Stage 1: fast preview for near-instant feedback
    let (preview_width, preview_height) = scaled_target(display, config.preview_scale());
    let preview = TransformRequest {
        source: PathBuf::from(&source),
        output: paths.preview.clone(),
        target_width: preview_width,
        target_height: preview_height,
        blur_radius: config.preview_radius,
        quality: config.preview_quality,
    };

    match run_stage(&transform, preview).await {
        Ok(()) => {
            if flows.is_current(flow) {
                transitions.apply(paths.preview.clone(), ApplyReason::Flow(flow));
            } else {
                tracing::debug!(flow, "preview finished for a superseded flow");
            }
        }
        Err(error) => {
            tracing::warn!(flow, error = %error, "preview generation failed");
            let _ = results.send(PipelineResult::Failed { flow, error });
            return;
        }
    }

    // A superseded flow stops before the expensive stage; the preview
    // write above stays on disk for later reuse.
    if !flows.is_current(flow) {
        let _ = results.send(PipelineResult::Superseded { flow });
        return;
    }

    // Stage 2: full-quality rendition at the display target size
    let (final_width, final_height) = scaled_target(display, config.final_scale());
    let full = TransformRequest {
        source: PathBuf::from(&source),
        output: paths.full.clone(),
        target_width: final_width,
        target_height: final_height,
        blur_radius: config.final_radius,
        quality: config.final_quality,
    };

    match run_stage(&transform, full).await {
        Ok(()) => {
            if flows.is_current(flow) {
                transitions.apply(paths.full.clone(), ApplyReason::Flow(flow));
                let _ = results.send(PipelineResult::Completed { flow, source, display });
            } else {
                tracing::debug!(flow, "final artifact finished for a superseded flow");
                let _ = results.send(PipelineResult::Superseded { flow });
            }
        }
        Err(error) => {
            tracing::warn!(flow, error = %error, "final generation failed");
            let _ = results.send(PipelineResult::Failed { flow, error });
        }
    }
}

/// Runs one transform stage on the blocking pool.
async fn run_stage(
    transform: &Arc<dyn BlurTransform>,
    request: TransformRequest,
) -> Result<(), ProcessingError> {
    let transform = Arc::clone(transform);

    tokio::task::spawn_blocking(move || transform.transform(&request))
        .await
        .map_err(|_| ProcessingError::Interrupted)?
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use tokio::sync::mpsc;

    use super::*;
    use crate::geometry::Point;
    use crate::host::RenderSurface;

    #[derive(Default)]
    struct FakeTransform {
        calls: Mutex<Vec<TransformRequest>>,
        fail: bool,
    }

    impl BlurTransform for FakeTransform {
        fn transform(&self, request: &TransformRequest) -> Result<(), ProcessingError> {
            self.calls.lock().push(request.clone());
            if self.fail {
                return Err(ProcessingError::ImageRead(request.source.display().to_string()));
            }
            std::fs::write(&request.output, b"artifact").unwrap();
            Ok(())
        }
    }

    #[derive(Default)]
    struct NullSurface;

    impl RenderSurface for NullSurface {
        fn show_backdrop(&self, _path: &Path) {}
        fn set_backdrop_offset(&self, _offset: Point) {}
        fn set_overlay_color(&self, _color: &str) {}
    }

    const DISPLAY: Dimensions = Dimensions { width: 1920, height: 1080 };

    fn manager_with(dir: &Path, transform: Arc<FakeTransform>) -> BackdropManager {
        BackdropManager::new(dir, transform)
    }

    fn touch_artifacts(paths: &ArtifactPaths) {
        std::fs::write(&paths.preview, b"p").unwrap();
        std::fs::write(&paths.full, b"f").unwrap();
    }

    #[test]
    fn test_stale_on_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_with(dir.path(), Arc::default());

        assert!(manager.is_stale("wall.jpg", DISPLAY, false));
    }

    #[test]
    fn test_fresh_when_nothing_changed() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = manager_with(dir.path(), Arc::default());
        touch_artifacts(manager.paths());
        manager.record_success("wall.jpg".to_string(), DISPLAY);

        assert!(!manager.is_stale("wall.jpg", DISPLAY, false));
    }

    #[test]
    fn test_stale_when_forced() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = manager_with(dir.path(), Arc::default());
        touch_artifacts(manager.paths());
        manager.record_success("wall.jpg".to_string(), DISPLAY);

        assert!(manager.is_stale("wall.jpg", DISPLAY, true));
    }

    #[test]
    fn test_stale_when_identity_changed() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = manager_with(dir.path(), Arc::default());
        touch_artifacts(manager.paths());
        manager.record_success("wall.jpg".to_string(), DISPLAY);

        assert!(manager.is_stale("other.jpg", DISPLAY, false));
    }

    #[test]
    fn test_stale_when_display_size_changed() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = manager_with(dir.path(), Arc::default());
        touch_artifacts(manager.paths());
        manager.record_success("wall.jpg".to_string(), DISPLAY);

        let larger = Dimensions { width: 2560, height: 1440 };
        assert!(manager.is_stale("wall.jpg", larger, false));
    }

    #[test]
    fn test_stale_when_artifact_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = manager_with(dir.path(), Arc::default());
        touch_artifacts(manager.paths());
        manager.record_success("wall.jpg".to_string(), DISPLAY);

        std::fs::remove_file(&manager.paths().preview).unwrap();
        assert!(manager.is_stale("wall.jpg", DISPLAY, false));
    }

    #[test]
    fn test_metadata_survives_restart_with_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut manager = manager_with(dir.path(), Arc::default());
            touch_artifacts(manager.paths());
            manager.record_success("wall.jpg".to_string(), DISPLAY);
        }

        let restarted = manager_with(dir.path(), Arc::default());
        assert!(!restarted.is_stale("wall.jpg", DISPLAY, false));
        assert!(restarted.restorable().is_some());
    }

    #[test]
    fn test_metadata_ignored_without_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut manager = manager_with(dir.path(), Arc::default());
            manager.record_success("wall.jpg".to_string(), DISPLAY);
            // Artifacts were never written
        }

        let restarted = manager_with(dir.path(), Arc::default());
        assert!(restarted.is_stale("wall.jpg", DISPLAY, false));
        assert!(restarted.restorable().is_none());
    }

    #[test]
    fn test_scaled_target_clamps_to_one_pixel() {
        let tiny = Dimensions { width: 2, height: 2 };
        assert_eq!(scaled_target(tiny, 0.1), (1, 1));
        assert_eq!(scaled_target(DISPLAY, 0.25), (480, 270));
        assert_eq!(scaled_target(DISPLAY, 1.0), (1920, 1080));
    }

    #[tokio::test]
    async fn test_pipeline_runs_both_stages_for_one_flow() {
        let dir = tempfile::tempdir().unwrap();
        let transform = Arc::new(FakeTransform::default());
        let manager = manager_with(dir.path(), Arc::clone(&transform));

        let flows = Arc::new(FlowSequencer::new());
        let transitions = TransitionHandle::spawn(
            Arc::new(NullSurface),
            Arc::clone(&flows),
            std::time::Duration::from_millis(5),
        );
        let (results_tx, mut results_rx) = mpsc::unbounded_channel();

        let flow = flows.issue();
        manager.spawn_regeneration(
            "wall.jpg".to_string(),
            DISPLAY,
            flow,
            BackdropConfig::default(),
            Arc::clone(&flows),
            transitions,
            results_tx,
        );

        let result = results_rx.recv().await.unwrap();
        assert!(matches!(result, PipelineResult::Completed { flow: f, .. } if f == flow));

        let calls = transform.calls.lock();
        assert_eq!(calls.len(), 2, "expected exactly preview + final invocations");
        assert_eq!(calls[0].output, manager.paths().preview);
        assert_eq!(calls[1].output, manager.paths().full);
        // Preview renders at a reduced size
        assert!(calls[0].target_width < calls[1].target_width);
    }

    #[tokio::test]
    async fn test_pipeline_failure_reports_failed() {
        let dir = tempfile::tempdir().unwrap();
        let transform = Arc::new(FakeTransform { fail: true, ..Default::default() });
        let manager = manager_with(dir.path(), Arc::clone(&transform));

        let flows = Arc::new(FlowSequencer::new());
        let transitions = TransitionHandle::spawn(
            Arc::new(NullSurface),
            Arc::clone(&flows),
            std::time::Duration::from_millis(5),
        );
        let (results_tx, mut results_rx) = mpsc::unbounded_channel();

        let flow = flows.issue();
        manager.spawn_regeneration(
            "missing.jpg".to_string(),
            DISPLAY,
            flow,
            BackdropConfig::default(),
            Arc::clone(&flows),
            transitions,
            results_tx,
        );

        let result = results_rx.recv().await.unwrap();
        assert!(matches!(result, PipelineResult::Failed { flow: f, .. } if f == flow));
        // Only the preview stage ran
        assert_eq!(transform.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_pipeline_superseded_flow_skips_final_stage() {
        let dir = tempfile::tempdir().unwrap();
        let transform = Arc::new(FakeTransform::default());
        let manager = manager_with(dir.path(), Arc::clone(&transform));

        let flows = Arc::new(FlowSequencer::new());
        let transitions = TransitionHandle::spawn(
            Arc::new(NullSurface),
            Arc::clone(&flows),
            std::time::Duration::from_millis(5),
        );
        let (results_tx, mut results_rx) = mpsc::unbounded_channel();

        let flow = flows.issue();
        // Supersede before the pipeline even starts polling the flow
        flows.issue();

        manager.spawn_regeneration(
            "wall.jpg".to_string(),
            DISPLAY,
            flow,
            BackdropConfig::default(),
            Arc::clone(&flows),
            transitions,
            results_tx,
        );

        let result = results_rx.recv().await.unwrap();
        assert!(matches!(result, PipelineResult::Superseded { flow: f } if f == flow));
        assert_eq!(transform.calls.lock().len(), 1, "final stage must not run");
        // The preview write was still allowed to finish
        assert!(manager.paths().preview.exists());
    }
}
