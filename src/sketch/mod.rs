pub mod bindings;
pub mod export;
pub mod model;
pub mod overlay;
pub mod raster;
pub mod replay;
pub mod session;
pub mod snapshot;
pub mod surface;

pub use bindings::VariableBindings;
pub use model::{PaintMode, Point, Rgba, StrokeConfig, Theme};
pub use overlay::{AnnotationId, OverlayLayout, Position, ResultAnnotation, ResultOverlay};
pub use session::{
    ApplyOutcome, BeginError, CalculateError, RecognitionRequest, RecognitionTicket, SketchSession,
};
pub use snapshot::{ImagePayload, SnapshotEncoder};
pub use surface::{StrokeState, StrokeSurface};
