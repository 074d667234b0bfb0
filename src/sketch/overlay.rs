use crate::recognition::entry::RecognitionEntry;
use crate::sketch::bindings::VariableBindings;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

pub type AnnotationId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A displayed expression/answer label. Only the position ever changes.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultAnnotation {
    id: AnnotationId,
    expression: String,
    answer: String,
    position: Position,
}

impl ResultAnnotation {
    pub fn id(&self) -> AnnotationId {
        self.id
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn label(&self) -> String {
        format!("{} = {}", self.expression, self.answer)
    }

    fn matches(&self, entry: &RecognitionEntry) -> bool {
        self.expression == entry.expr && self.answer == entry.result
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayLayout {
    pub anchor: Position,
    pub spacing: f32,
    /// Estimated glyph advance used for hit testing labels.
    pub char_width: f32,
    pub line_height: f32,
}

impl Default for OverlayLayout {
    fn default() -> Self {
        Self {
            anchor: Position::new(30.0, 200.0),
            spacing: 30.0,
            char_width: 9.0,
            line_height: 24.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultOverlay {
    annotations: Vec<ResultAnnotation>,
    layout: OverlayLayout,
}

impl ResultOverlay {
    pub fn new(layout: OverlayLayout) -> Self {
        Self {
            annotations: Vec::new(),
            layout,
        }
    }

    pub fn layout(&self) -> OverlayLayout {
        self.layout
    }

    pub fn annotations(&self) -> &[ResultAnnotation] {
        &self.annotations
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn get(&self, id: AnnotationId) -> Option<&ResultAnnotation> {
        self.annotations.iter().find(|annotation| annotation.id == id)
    }

    /// Applies a validated batch at the layout anchor. Returns the annotations
    /// that were newly displayed.
    pub fn ingest(
        &mut self,
        entries: &[RecognitionEntry],
        bindings: &mut VariableBindings,
    ) -> Vec<ResultAnnotation> {
        let anchor = self.layout.anchor;
        self.ingest_at(entries, bindings, anchor)
    }

    /// Like [`ResultOverlay::ingest`] but stacks survivors below `anchor`.
    ///
    /// Assignments always reach `bindings`, even when their label is dropped
    /// as a duplicate of one already on screen.
    pub fn ingest_at(
        &mut self,
        entries: &[RecognitionEntry],
        bindings: &mut VariableBindings,
        anchor: Position,
    ) -> Vec<ResultAnnotation> {
        let mut added = Vec::new();
        for entry in entries {
            if entry.assign {
                bindings.set(entry.expr.clone(), entry.result.clone());
            }

            if self.annotations.iter().any(|existing| existing.matches(entry)) {
                debug!(expr = %entry.expr, result = %entry.result, "dropping duplicate result");
                continue;
            }

            let annotation = ResultAnnotation {
                id: Uuid::new_v4(),
                expression: entry.expr.clone(),
                answer: entry.result.clone(),
                position: Position::new(
                    anchor.x,
                    anchor.y + added.len() as f32 * self.layout.spacing,
                ),
            };
            self.annotations.push(annotation.clone());
            added.push(annotation);
        }
        added
    }

    pub fn move_to(&mut self, id: AnnotationId, position: Position) -> bool {
        match self.annotations.iter_mut().find(|annotation| annotation.id == id) {
            Some(annotation) => {
                annotation.position = position;
                true
            }
            None => false,
        }
    }

    pub fn drag_by(&mut self, id: AnnotationId, dx: f32, dy: f32) -> bool {
        let Some(current) = self.get(id).map(ResultAnnotation::position) else {
            return false;
        };
        self.move_to(id, Position::new(current.x + dx, current.y + dy))
    }

    /// Estimated label box as `(origin, width, height)`.
    pub fn label_bounds(&self, annotation: &ResultAnnotation) -> (Position, f32, f32) {
        let width = annotation.label().chars().count() as f32 * self.layout.char_width;
        (annotation.position, width, self.layout.line_height)
    }

    /// Topmost annotation under `point`; later annotations draw on top.
    pub fn annotation_at(&self, point: Position) -> Option<AnnotationId> {
        self.annotations
            .iter()
            .rev()
            .find(|annotation| {
                let (origin, width, height) = self.label_bounds(annotation);
                point.x >= origin.x
                    && point.y >= origin.y
                    && point.x < origin.x + width
                    && point.y < origin.y + height
            })
            .map(ResultAnnotation::id)
    }

    pub fn clear_all(&mut self) {
        self.annotations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{OverlayLayout, Position, ResultOverlay};
    use crate::recognition::entry::RecognitionEntry;
    use crate::sketch::bindings::VariableBindings;

    #[test]
    fn assignment_and_expression_both_display() {
        let mut overlay = ResultOverlay::default();
        let mut bindings = VariableBindings::new();
        let added = overlay.ingest(
            &[
                RecognitionEntry::assignment("x", "4"),
                RecognitionEntry::new("x+1", "5"),
            ],
            &mut bindings,
        );

        assert_eq!(bindings.value("x"), Some("4"));
        assert_eq!(bindings.len(), 1);
        let labels: Vec<String> = added.iter().map(|a| a.label()).collect();
        assert_eq!(labels, vec!["x = 4", "x+1 = 5"]);
        assert_eq!(overlay.len(), 2);
    }

    #[test]
    fn repeated_result_is_not_displayed_twice() {
        let mut overlay = ResultOverlay::default();
        let mut bindings = VariableBindings::new();
        let batch = [RecognitionEntry::assignment("x", "4")];

        assert_eq!(overlay.ingest(&batch, &mut bindings).len(), 1);
        bindings.clear();
        assert!(overlay.ingest(&batch, &mut bindings).is_empty());
        assert_eq!(overlay.len(), 1);
        assert_eq!(bindings.value("x"), Some("4"));
    }

    #[test]
    fn duplicates_inside_one_batch_collapse() {
        let mut overlay = ResultOverlay::default();
        let mut bindings = VariableBindings::new();
        let added = overlay.ingest(
            &[RecognitionEntry::new("1+1", "2"), RecognitionEntry::new("1+1", "2")],
            &mut bindings,
        );
        assert_eq!(added.len(), 1);
    }

    #[test]
    fn same_expression_with_new_answer_is_displayed() {
        let mut overlay = ResultOverlay::default();
        let mut bindings = VariableBindings::new();
        overlay.ingest(&[RecognitionEntry::new("x", "4")], &mut bindings);
        let added = overlay.ingest(&[RecognitionEntry::new("x", "4.0")], &mut bindings);
        assert_eq!(added.len(), 1);
    }

    #[test]
    fn survivors_stack_from_anchor_skipping_dropped_entries() {
        let layout = OverlayLayout {
            anchor: Position::new(10.0, 100.0),
            spacing: 25.0,
            ..OverlayLayout::default()
        };
        let mut overlay = ResultOverlay::new(layout);
        let mut bindings = VariableBindings::new();
        overlay.ingest(&[RecognitionEntry::new("a", "1")], &mut bindings);

        let added = overlay.ingest(
            &[
                RecognitionEntry::new("a", "1"),
                RecognitionEntry::new("b", "2"),
                RecognitionEntry::new("c", "3"),
            ],
            &mut bindings,
        );
        assert_eq!(added[0].position(), Position::new(10.0, 100.0));
        assert_eq!(added[1].position(), Position::new(10.0, 125.0));
    }

    #[test]
    fn explicit_anchor_overrides_layout() {
        let mut overlay = ResultOverlay::default();
        let mut bindings = VariableBindings::new();
        let added = overlay.ingest_at(
            &[RecognitionEntry::new("a", "1"), RecognitionEntry::new("b", "2")],
            &mut bindings,
            Position::new(400.0, 50.0),
        );
        assert_eq!(added[1].position(), Position::new(400.0, 80.0));
    }

    #[test]
    fn dragging_moves_only_the_target() {
        let mut overlay = ResultOverlay::default();
        let mut bindings = VariableBindings::new();
        let added = overlay.ingest(
            &[RecognitionEntry::new("a", "1"), RecognitionEntry::new("b", "2")],
            &mut bindings,
        );
        let other_before = added[1].position();

        assert!(overlay.drag_by(added[0].id(), 15.0, -5.0));
        assert_eq!(
            overlay.get(added[0].id()).map(|a| a.position()),
            Some(Position::new(45.0, 195.0))
        );
        assert_eq!(overlay.get(added[1].id()).map(|a| a.position()), Some(other_before));
        assert!(!overlay.move_to(uuid::Uuid::new_v4(), Position::default()));
    }

    #[test]
    fn hit_test_prefers_most_recent_label() {
        let mut overlay = ResultOverlay::default();
        let mut bindings = VariableBindings::new();
        let added = overlay.ingest(
            &[RecognitionEntry::new("a", "1"), RecognitionEntry::new("b", "2")],
            &mut bindings,
        );
        overlay.move_to(added[1].id(), Position::new(30.0, 200.0));

        assert_eq!(overlay.annotation_at(Position::new(35.0, 205.0)), Some(added[1].id()));
        assert_eq!(overlay.annotation_at(Position::new(5.0, 5.0)), None);
    }

    #[test]
    fn identities_are_unique_and_clear_all_empties() {
        let mut overlay = ResultOverlay::default();
        let mut bindings = VariableBindings::new();
        let added = overlay.ingest(
            &[RecognitionEntry::new("a", "1"), RecognitionEntry::new("b", "2")],
            &mut bindings,
        );
        assert_ne!(added[0].id(), added[1].id());
        overlay.clear_all();
        assert!(overlay.is_empty());
    }
}
