use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{error, info, warn};
use parking_lot::RwLock;

use crate::bitmap::{placeholder, Bitmap};
use crate::compositor::apply_shadow_or_passthrough;
use crate::error::IconError;
use crate::framing::ViewFramer;
use crate::render::Renderer;
use crate::scene::GeometrySource;
use crate::settings::IconSettings;
use crate::sink::{clean_object_name, AssetSink};

/// Point-in-time view of a running batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusSnapshot {
    pub is_generating: bool,
    /// Fraction of targets started, in `[0, 1]`.
    pub progress: f32,
    pub message: String,
}

/// Shared, thread-safe batch status that observers can poll.
#[derive(Debug, Default)]
pub struct GenerationStatus {
    inner: Arc<RwLock<StatusSnapshot>>,
}

impl Clone for GenerationStatus {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl GenerationStatus {
    pub fn snapshot(&self) -> StatusSnapshot {
        self.inner.read().clone()
    }

    fn update(&self, is_generating: bool, progress: f32, message: impl Into<String>) {
        let mut guard = self.inner.write();
        guard.is_generating = is_generating;
        guard.progress = progress;
        guard.message = message.into();
    }
}

/// Requests that a running batch stop before its next target.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Reported to the progress callback before each target is processed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress<'a> {
    pub index: usize,
    pub total: usize,
    pub name: &'a str,
}

/// Outcome of a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Icons rendered and stored.
    pub generated: usize,
    /// Targets replaced by a placeholder image.
    pub placeholders: usize,
    /// Targets whose image could not be stored.
    pub failed: usize,
    pub cancelled: bool,
    pub outputs: Vec<PathBuf>,
}

/// Frames, renders, shadows and stores icons one target at a time.
pub struct IconPipeline<R, S> {
    settings: IconSettings,
    framer: ViewFramer,
    renderer: R,
    sink: S,
    status: GenerationStatus,
    cancel: CancelHandle,
}

impl<R, S> IconPipeline<R, S>
where
    R: Renderer,
    S: AssetSink,
{
    pub fn new(settings: IconSettings, renderer: R, sink: S) -> Self {
        Self {
            settings,
            framer: ViewFramer::new(),
            renderer,
            sink,
            status: GenerationStatus::default(),
            cancel: CancelHandle::default(),
        }
    }

    pub fn settings(&self) -> &IconSettings {
        &self.settings
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn status(&self) -> GenerationStatus {
        self.status.clone()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Renders one icon without storing it.
    pub fn render_icon(&mut self, target: &dyn GeometrySource) -> Result<Bitmap, IconError> {
        let viewpoint = self.settings.camera.viewpoint();
        let placement = self.framer.frame(target, &viewpoint)?;
        let image = self.renderer.render(
            target,
            &placement,
            &self.settings.light,
            self.settings.texture.size,
        )?;
        if self.settings.shadow.enabled {
            Ok(apply_shadow_or_passthrough(image, &self.settings.shadow))
        } else {
            Ok(image)
        }
    }

    /// Renders every target, substituting placeholders for failures.
    pub fn preview<T>(&mut self, targets: &[T]) -> Vec<Bitmap>
    where
        T: GeometrySource,
    {
        targets
            .iter()
            .map(|target| self.render_or_placeholder(target).0)
            .collect()
    }

    /// Renders and stores every target in order.
    ///
    /// Per-target failures never abort the batch: framing and render errors
    /// become placeholder images, storage errors are counted as failures.
    pub fn generate<T, F>(&mut self, targets: &[T], mut on_progress: F) -> BatchReport
    where
        T: GeometrySource,
        F: FnMut(Progress<'_>),
    {
        self.cancel.reset();
        let total = targets.len();
        let mut report = BatchReport::default();
        self.status.update(true, 0.0, "Preparing...");

        for (index, target) in targets.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!("icon generation cancelled after {index} of {total} target(s)");
                report.cancelled = true;
                break;
            }

            let name = clean_object_name(target.name());
            self.status.update(
                true,
                index as f32 / total as f32,
                format!("Processing {} of {total}", index + 1),
            );
            on_progress(Progress {
                index,
                total,
                name: &name,
            });

            let (image, rendered) = self.render_or_placeholder(target);
            if !rendered {
                report.placeholders += 1;
            }
            match self.sink.store(&name, image) {
                Ok(path) => {
                    if rendered {
                        report.generated += 1;
                    }
                    report.outputs.push(path);
                }
                Err(err) => {
                    error!("failed to save icon {name}: {err}");
                    report.failed += 1;
                }
            }
        }

        self.status.update(false, 0.0, "");
        report
    }

    fn render_or_placeholder(&mut self, target: &dyn GeometrySource) -> (Bitmap, bool) {
        match self.render_icon(target) {
            Ok(image) => (image, true),
            Err(err) => {
                warn!("using placeholder for {}: {err}", target.name());
                let image = placeholder(self.settings.texture.size, self.settings.placeholder_color);
                (image, false)
            }
        }
    }
}
