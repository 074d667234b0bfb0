use crate::recognition::client::RecognitionService;
use crate::recognition::entry::RecognitionEntry;
use crate::recognition::error::RecognitionError;
use crate::settings::SketchSettings;
use crate::sketch::bindings::VariableBindings;
use crate::sketch::model::{PaintMode, Point, Theme};
use crate::sketch::overlay::{AnnotationId, Position, ResultAnnotation, ResultOverlay};
use crate::sketch::raster::DirtyRect;
use crate::sketch::snapshot::{ImagePayload, SnapshotEncoder, SnapshotError};
use crate::sketch::surface::StrokeSurface;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Identifies one recognition round. The generation changes on every reset,
/// which turns replies to pre-reset requests into stale tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecognitionTicket {
    generation: u64,
    sequence: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionRequest {
    pub ticket: RecognitionTicket,
    pub image: ImagePayload,
    pub bindings: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum BeginError {
    #[error("a recognition request is already in flight")]
    AlreadyPending,
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

#[derive(Debug, thiserror::Error)]
pub enum CalculateError {
    #[error(transparent)]
    Begin(#[from] BeginError),
    #[error(transparent)]
    Recognition(#[from] RecognitionError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Applied { added: Vec<ResultAnnotation> },
    Failed(RecognitionError),
    /// The reply belongs to a request superseded by a reset.
    Discarded,
}

/// Session-scoped state behind the sketching controls.
#[derive(Debug, Clone)]
pub struct SketchSession {
    surface: StrokeSurface,
    bindings: VariableBindings,
    overlay: ResultOverlay,
    theme: Theme,
    flatten_snapshot: bool,
    pending: Option<RecognitionTicket>,
    generation: u64,
    next_sequence: u64,
}

impl SketchSession {
    pub fn new(width: u32, height: u32, settings: &SketchSettings) -> Self {
        Self {
            surface: StrokeSurface::new(width, height, settings.stroke_config()),
            bindings: VariableBindings::new(),
            overlay: ResultOverlay::new(settings.overlay_layout()),
            theme: settings.theme,
            flatten_snapshot: settings.flatten_snapshot,
            pending: None,
            generation: 0,
            next_sequence: 0,
        }
    }

    pub fn surface(&self) -> &StrokeSurface {
        &self.surface
    }

    pub fn bindings(&self) -> &VariableBindings {
        &self.bindings
    }

    pub fn overlay(&self) -> &ResultOverlay {
        &self.overlay
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn is_recognition_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pointer_down(&mut self, point: Point) {
        self.surface.begin_stroke(point);
    }

    pub fn pointer_move(&mut self, point: Point) -> Option<DirtyRect> {
        self.surface.extend_stroke(point, self.theme.ink_color())
    }

    pub fn pointer_up(&mut self) {
        self.surface.end_stroke();
    }

    pub fn pointer_leave(&mut self) {
        self.surface.pointer_leave();
    }

    pub fn set_mode(&mut self, mode: PaintMode) {
        self.surface.set_mode(mode);
    }

    pub fn toggle_mode(&mut self) -> PaintMode {
        self.surface.toggle_mode()
    }

    pub fn set_ink_width(&mut self, width: u32) {
        let erase = self.surface.config().erase_width();
        self.surface.set_widths(width, erase);
    }

    pub fn set_erase_width(&mut self, width: u32) {
        let ink = self.surface.config().ink_width();
        self.surface.set_widths(ink, width);
    }

    /// Affects ink painted from now on; existing strokes keep their color.
    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface.resize(width, height);
    }

    pub fn snapshot_encoder(&self) -> SnapshotEncoder {
        if self.flatten_snapshot {
            SnapshotEncoder::flattened(self.theme.background_color())
        } else {
            SnapshotEncoder::transparent()
        }
    }

    /// Clears the drawing, the bindings and the annotations together, and
    /// orphans any request still in flight.
    pub fn reset(&mut self) {
        self.surface.clear();
        self.bindings.clear();
        self.overlay.clear_all();
        if self.pending.take().is_some() {
            debug!("reset while recognition in flight; reply will be discarded");
        }
        self.generation = self.generation.wrapping_add(1);
    }

    /// Captures the surface and the current bindings for one recognition round.
    pub fn begin_recognition(&mut self) -> Result<RecognitionRequest, BeginError> {
        self.begin_recognition_with(self.snapshot_encoder(), None)
    }

    pub fn begin_region_recognition(
        &mut self,
        region: DirtyRect,
    ) -> Result<RecognitionRequest, BeginError> {
        self.begin_recognition_with(self.snapshot_encoder(), Some(region))
    }

    fn begin_recognition_with(
        &mut self,
        encoder: SnapshotEncoder,
        region: Option<DirtyRect>,
    ) -> Result<RecognitionRequest, BeginError> {
        if self.pending.is_some() {
            return Err(BeginError::AlreadyPending);
        }
        let image = match region {
            Some(region) => encoder.capture_region(&self.surface, region)?,
            None => encoder.capture(&self.surface)?,
        };
        let ticket = RecognitionTicket {
            generation: self.generation,
            sequence: self.next_sequence,
        };
        self.next_sequence = self.next_sequence.wrapping_add(1);
        self.pending = Some(ticket);
        debug!(sequence = ticket.sequence, "recognition request prepared");
        Ok(RecognitionRequest {
            ticket,
            image,
            bindings: self.bindings.get().clone(),
        })
    }

    /// Applies a finished round against the state as it is now.
    pub fn complete_recognition(
        &mut self,
        ticket: RecognitionTicket,
        result: Result<Vec<RecognitionEntry>, RecognitionError>,
    ) -> ApplyOutcome {
        if self.pending == Some(ticket) {
            self.pending = None;
        }
        if ticket.generation != self.generation {
            debug!(sequence = ticket.sequence, "discarding stale recognition reply");
            return ApplyOutcome::Discarded;
        }

        match result {
            Ok(entries) => {
                let added = self.overlay.ingest(&entries, &mut self.bindings);
                info!(
                    received = entries.len(),
                    displayed = added.len(),
                    bindings = self.bindings.len(),
                    "applied recognition results"
                );
                ApplyOutcome::Applied { added }
            }
            Err(err) => {
                warn!(kind = err.kind(), "recognition failed: {err}");
                ApplyOutcome::Failed(err)
            }
        }
    }

    /// Runs one round synchronously against `service`.
    pub fn calculate(
        &mut self,
        service: &dyn RecognitionService,
    ) -> Result<Vec<ResultAnnotation>, CalculateError> {
        let request = self.begin_recognition()?;
        let result = service.solve(&request.image, &request.bindings);
        match self.complete_recognition(request.ticket, result) {
            ApplyOutcome::Applied { added } => Ok(added),
            ApplyOutcome::Failed(err) => Err(err.into()),
            ApplyOutcome::Discarded => Ok(Vec::new()),
        }
    }

    pub fn drag_annotation(&mut self, id: AnnotationId, dx: f32, dy: f32) -> bool {
        self.overlay.drag_by(id, dx, dy)
    }

    pub fn move_annotation(&mut self, id: AnnotationId, position: Position) -> bool {
        self.overlay.move_to(id, position)
    }
}
