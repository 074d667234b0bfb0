use maths_notes::recognition::{parse_entries, RecognitionEntry, RecognitionError};
use maths_notes::settings::SketchSettings;
use maths_notes::sketch::{
    CalculateError, PaintMode, Position, Rgba, SketchSession, StrokeConfig, StrokeState,
    StrokeSurface, VariableBindings,
};

use mock_service::ScriptedService;

fn session() -> SketchSession {
    SketchSession::new(120, 80, &SketchSettings::default())
}

fn labels(session: &SketchSession) -> Vec<String> {
    session
        .overlay()
        .annotations()
        .iter()
        .map(|annotation| annotation.label())
        .collect()
}

#[test]
fn every_stroke_sequence_ends_idle_on_release_or_leave() {
    let paths: [&[(i32, i32)]; 3] = [&[], &[(3, 3)], &[(3, 3), (40, 10), (80, 70), (119, 79)]];
    for points in paths {
        for leave in [false, true] {
            let mut surface = StrokeSurface::new(120, 80, StrokeConfig::default());
            surface.begin_stroke((1, 1));
            for point in points {
                surface.extend_stroke(*point, Rgba::BLACK);
            }
            if leave {
                surface.pointer_leave();
            } else {
                surface.end_stroke();
            }
            assert_eq!(surface.state(), StrokeState::Idle);
        }
    }
}

#[test]
fn ink_never_clears_and_erase_never_paints_across_mode_switches() {
    let mut surface = StrokeSurface::new(120, 80, StrokeConfig::new(5, 9));
    surface.begin_stroke((10, 10));
    let moves = [(30, 10), (50, 30), (50, 30), (70, 50), (20, 60), (100, 20), (60, 40)];
    for (step, point) in moves.iter().enumerate() {
        if step % 2 == 1 {
            surface.toggle_mode();
        }
        let before = surface.raster().clone();
        let mode = surface.mode();
        surface.extend_stroke(*point, Rgba::BLACK);
        let after = surface.raster();

        for (old, new) in before.pixels.chunks_exact(4).zip(after.pixels.chunks_exact(4)) {
            match mode {
                PaintMode::Ink => assert!(new[3] >= old[3], "ink cleared a pixel"),
                PaintMode::Erase => assert!(
                    new == old || new[3] == 0,
                    "erase painted a pixel"
                ),
            }
        }
    }
}

#[test]
fn binding_store_is_empty_after_clear() {
    let mut bindings = VariableBindings::new();
    bindings.set("x", "4");
    bindings.clear();
    assert!(bindings.get().is_empty());
}

#[test]
fn identical_result_twice_yields_no_new_annotation() {
    let service = ScriptedService::new(vec![
        Ok(vec![RecognitionEntry::assignment("x", "4")]),
        Ok(vec![RecognitionEntry::assignment("x", "4")]),
    ]);
    let mut session = session();

    assert_eq!(session.calculate(&service).expect("first").len(), 1);
    assert!(session.calculate(&service).expect("second").is_empty());
    assert_eq!(session.bindings().value("x"), Some("4"));
    assert_eq!(labels(&session), vec!["x = 4"]);
}

#[test]
fn assignment_and_dependent_expression_from_one_response() {
    let entries = parse_entries(
        r#"[{"expr":"x","result":"4","assign":true},{"expr":"x+1","result":"5"}]"#,
    )
    .expect("parse");
    let service = ScriptedService::new(vec![Ok(entries)]);
    let mut session = session();

    let added = session.calculate(&service).expect("calculate");
    assert_eq!(added.len(), 2);
    assert_eq!(session.bindings().value("x"), Some("4"));
    assert_eq!(session.bindings().len(), 1);
    assert_eq!(labels(&session), vec!["x = 4", "x+1 = 5"]);
}

#[test]
fn malformed_body_changes_nothing() {
    let mut session = session();
    let seed = ScriptedService::new(vec![Ok(vec![RecognitionEntry::assignment("y", "2")])]);
    session.calculate(&seed).expect("seed");

    let err = parse_entries("{oops").expect_err("malformed");
    let service = ScriptedService::new(vec![Err(err)]);
    let result = session.calculate(&service);

    assert!(matches!(
        result,
        Err(CalculateError::Recognition(RecognitionError::Parse { .. }))
    ));
    assert_eq!(session.bindings().value("y"), Some("2"));
    assert_eq!(labels(&session), vec!["y = 2"]);
    assert!(!session.is_recognition_pending());
}

#[test]
fn dragging_one_annotation_leaves_others_and_service_alone() {
    let service = ScriptedService::new(vec![Ok(vec![
        RecognitionEntry::new("1+1", "2"),
        RecognitionEntry::new("2*3", "6"),
    ])]);
    let mut session = session();
    let added = session.calculate(&service).expect("calculate");
    let calls = service.calls();

    assert!(session.drag_annotation(added[0].id(), 100.0, 40.0));
    assert!(session.move_annotation(added[0].id(), Position::new(5.0, 6.0)));

    let second = session.overlay().get(added[1].id()).expect("second");
    assert_eq!(second.position(), added[1].position());
    assert_eq!(
        session.overlay().get(added[0].id()).map(|a| a.position()),
        Some(Position::new(5.0, 6.0))
    );
    assert_eq!(service.calls(), calls);
}

#[test]
fn later_requests_see_earlier_assignments_until_reset() {
    let service = ScriptedService::new(vec![
        Ok(vec![RecognitionEntry::assignment("x", "4")]),
        Ok(vec![RecognitionEntry::new("x*2", "8")]),
        Ok(Vec::new()),
    ]);
    let mut session = session();
    session.pointer_down((10, 10));
    session.pointer_move((30, 30));
    session.pointer_up();

    session.calculate(&service).expect("first");
    session.calculate(&service).expect("second");
    session.reset();
    session.calculate(&service).expect("third");

    let seen = service.seen_bindings();
    assert!(seen[0].is_empty());
    assert_eq!(seen[1].get("x").map(String::as_str), Some("4"));
    assert!(seen[2].is_empty());
    assert!(session.surface().raster().is_blank());
    assert!(session.overlay().is_empty());
}

#[test]
fn configuration_failure_keeps_drawing_usable() {
    let service = ScriptedService::new(vec![Err(RecognitionError::Configuration(
        "no credential".into(),
    ))]);
    let mut session = session();
    session.pointer_down((5, 5));
    session.pointer_move((25, 5));
    session.pointer_up();

    assert!(session.calculate(&service).is_err());
    assert!(!session.surface().raster().is_blank());

    session.pointer_down((5, 40));
    session.pointer_move((25, 40));
    session.pointer_up();
    assert_eq!(session.surface().raster().pixel(15, 40), Rgba::BLACK);
}

#[test]
fn theme_selects_ink_color_for_new_strokes_only() {
    let mut session = session();
    session.pointer_down((5, 5));
    session.pointer_move((20, 5));
    session.pointer_up();

    session.toggle_theme();
    session.pointer_down((5, 30));
    session.pointer_move((20, 30));
    session.pointer_up();

    let raster = session.surface().raster();
    assert_eq!(raster.pixel(10, 5), Rgba::BLACK);
    assert_eq!(raster.pixel(10, 30), Rgba::WHITE);
}

#[test]
fn resize_preserves_existing_drawing() {
    let mut session = session();
    session.pointer_down((5, 5));
    session.pointer_move((20, 5));
    session.pointer_up();

    session.resize(200, 200);
    assert_eq!(session.surface().width(), 200);
    assert_eq!(session.surface().raster().pixel(10, 5), Rgba::BLACK);
    assert_eq!(session.surface().raster().pixel(150, 150), Rgba::TRANSPARENT);
}
