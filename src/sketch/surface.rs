use crate::sketch::model::{PaintMode, Point, Rgba, StrokeConfig};
use crate::sketch::raster::{clear_square, draw_segment, DirtyRect, RgbaBuffer};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeState {
    Idle,
    Drawing,
}

impl StrokeState {
    pub fn is_drawing(self) -> bool {
        matches!(self, Self::Drawing)
    }
}

/// Raster drawing surface driven by pointer events.
///
/// Individual points are not retained: each move paints straight into the
/// raster and only the previous point is kept as the next segment's anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeSurface {
    raster: RgbaBuffer,
    state: StrokeState,
    last_point: Option<Point>,
    mode: PaintMode,
    config: StrokeConfig,
}

impl StrokeSurface {
    pub fn new(width: u32, height: u32, config: StrokeConfig) -> Self {
        Self {
            raster: RgbaBuffer::transparent(width, height),
            state: StrokeState::Idle,
            last_point: None,
            mode: PaintMode::Ink,
            config,
        }
    }

    pub fn raster(&self) -> &RgbaBuffer {
        &self.raster
    }

    pub fn width(&self) -> u32 {
        self.raster.width
    }

    pub fn height(&self) -> u32 {
        self.raster.height
    }

    pub fn state(&self) -> StrokeState {
        self.state
    }

    pub fn is_drawing(&self) -> bool {
        self.state.is_drawing()
    }

    pub fn mode(&self) -> PaintMode {
        self.mode
    }

    pub fn config(&self) -> StrokeConfig {
        self.config
    }

    pub fn begin_stroke(&mut self, point: Point) {
        if self.state.is_drawing() {
            return;
        }
        self.state = StrokeState::Drawing;
        self.last_point = Some(point);
    }

    /// Paints from the previous point to `point` in the current mode and
    /// returns the damaged area. Ignored unless a stroke is in progress.
    pub fn extend_stroke(&mut self, point: Point, ink: Rgba) -> Option<DirtyRect> {
        if !self.state.is_drawing() {
            return None;
        }
        let from = self.last_point.unwrap_or(point);
        self.last_point = Some(point);
        match self.mode {
            PaintMode::Ink => draw_segment(&mut self.raster, from, point, ink, self.config.ink_width()),
            PaintMode::Erase => clear_square(&mut self.raster, point, self.config.erase_width()),
        }
    }

    pub fn end_stroke(&mut self) {
        self.state = StrokeState::Idle;
        self.last_point = None;
    }

    /// Leaving the surface ends the stroke so re-entry cannot draw a
    /// connecting segment from the stale anchor.
    pub fn pointer_leave(&mut self) {
        if self.state.is_drawing() {
            debug!("pointer left surface mid-stroke; ending stroke");
        }
        self.end_stroke();
    }

    pub fn clear(&mut self) {
        self.raster.fill(Rgba::TRANSPARENT);
    }

    pub fn set_mode(&mut self, mode: PaintMode) {
        self.mode = mode;
    }

    pub fn toggle_mode(&mut self) -> PaintMode {
        self.mode = self.mode.toggled();
        self.mode
    }

    pub fn set_widths(&mut self, ink_width: u32, erase_width: u32) {
        self.config = StrokeConfig::new(ink_width, erase_width);
    }

    /// Reallocates the raster, keeping the drawing inside the overlapping area.
    pub fn resize(&mut self, width: u32, height: u32) {
        debug!(
            from_width = self.raster.width,
            from_height = self.raster.height,
            width,
            height,
            "resizing stroke surface"
        );
        self.raster.resize_preserving(width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::{StrokeState, StrokeSurface};
    use crate::sketch::model::{PaintMode, Rgba, StrokeConfig};

    fn surface() -> StrokeSurface {
        StrokeSurface::new(64, 64, StrokeConfig::new(3, 6))
    }

    #[test]
    fn stroke_returns_to_idle_after_end() {
        let mut surface = surface();
        surface.begin_stroke((5, 5));
        assert_eq!(surface.state(), StrokeState::Drawing);
        surface.extend_stroke((10, 10), Rgba::BLACK);
        surface.extend_stroke((20, 12), Rgba::BLACK);
        surface.end_stroke();
        assert_eq!(surface.state(), StrokeState::Idle);
        assert!(!surface.raster().is_blank());
    }

    #[test]
    fn move_without_begin_paints_nothing() {
        let mut surface = surface();
        assert_eq!(surface.extend_stroke((10, 10), Rgba::BLACK), None);
        assert!(surface.raster().is_blank());
    }

    #[test]
    fn pointer_leave_prevents_connecting_segment_on_reentry() {
        let mut surface = surface();
        surface.begin_stroke((2, 2));
        surface.extend_stroke((4, 2), Rgba::BLACK);
        surface.pointer_leave();
        assert_eq!(surface.state(), StrokeState::Idle);

        surface.extend_stroke((60, 60), Rgba::BLACK);
        assert_eq!(surface.raster().pixel(30, 30), Rgba::TRANSPARENT);
        assert_eq!(surface.raster().pixel(60, 60), Rgba::TRANSPARENT);
    }

    #[test]
    fn begin_while_drawing_keeps_original_anchor() {
        let mut surface = surface();
        surface.begin_stroke((0, 10));
        surface.begin_stroke((50, 50));
        surface.extend_stroke((10, 10), Rgba::BLACK);
        assert_eq!(surface.raster().pixel(5, 10), Rgba::BLACK);
        assert_eq!(surface.raster().pixel(30, 30), Rgba::TRANSPARENT);
    }

    #[test]
    fn erase_clears_square_and_mode_applies_mid_stroke() {
        let mut surface = surface();
        surface.begin_stroke((10, 20));
        surface.extend_stroke((40, 20), Rgba::BLACK);
        let painted = surface.raster().painted_pixel_count();

        surface.set_mode(PaintMode::Erase);
        surface.extend_stroke((25, 20), Rgba::BLACK);
        assert_eq!(surface.raster().pixel(25, 20), Rgba::TRANSPARENT);
        assert!(surface.raster().painted_pixel_count() < painted);
        assert_eq!(surface.raster().pixel(12, 20), Rgba::BLACK);
    }

    #[test]
    fn stroke_through_far_off_surface_point_keeps_drawing() {
        let mut surface = surface();
        surface.begin_stroke((10, 10));
        surface.extend_stroke((200_000_000, 10), Rgba::BLACK);
        surface.extend_stroke((10, 40), Rgba::BLACK);
        assert!(surface.is_drawing());
        assert_eq!(surface.raster().pixel(63, 10), Rgba::BLACK);

        surface.set_mode(PaintMode::Erase);
        assert_eq!(surface.extend_stroke((i32::MAX, i32::MIN), Rgba::BLACK), None);
        surface.end_stroke();
        assert_eq!(surface.state(), StrokeState::Idle);
    }

    #[test]
    fn clear_keeps_drawing_state() {
        let mut surface = surface();
        surface.begin_stroke((1, 1));
        surface.extend_stroke((9, 9), Rgba::BLACK);
        surface.clear();
        assert!(surface.raster().is_blank());
        assert!(surface.is_drawing());
    }

    #[test]
    fn width_change_is_not_retroactive() {
        let mut surface = surface();
        surface.begin_stroke((10, 10));
        surface.extend_stroke((30, 10), Rgba::BLACK);
        surface.end_stroke();
        let before = surface.raster().clone();

        surface.set_widths(9, 20);
        assert_eq!(surface.raster(), &before);
        assert_eq!(surface.config().ink_width(), 9);
        assert_eq!(surface.config().erase_width(), 20);
    }
}
