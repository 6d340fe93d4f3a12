//! Annotator Integration Tests
//!
//! Drives the annotator through event sequences the way a host would:
//! - Pan, zoom and annotate in one session
//! - Removal after the view has moved
//! - Save records and reload them
//! - Viewport properties under random input

use iconmark_core::viewport::{MAX_SCALE, MIN_SCALE};
use iconmark_core::{
    Annotator, IconSize, ImageSource, InputEvent, InteractionMode, Key, Point, QueuedInput,
    RecordingSurface, Rect, ViewportTransform,
};
use proptest::prelude::*;

fn pin() -> ImageSource {
    ImageSource::new("icons/pin.png")
}

fn wheel(x: f32, y: f32, delta_y: f32) -> InputEvent {
    InputEvent::Wheel { x, y, delta_y }
}

fn drag(from: (f32, f32), to: (f32, f32)) -> [InputEvent; 3] {
    [
        InputEvent::PointerDown {
            x: from.0,
            y: from.1,
        },
        InputEvent::PointerMove { x: to.0, y: to.1 },
        InputEvent::PointerUp,
    ]
}

// ============================================================================
// Session Workflow Tests
// ============================================================================

#[test]
fn test_icon_placed_after_pan_and_zoom_stays_under_cursor() {
    let mut annotator = Annotator::default();
    let mut input: QueuedInput = drag((0.0, 0.0), (40.0, -25.0)).into_iter().collect();
    input.push(wheel(300.0, 200.0, -120.0));
    input.push(wheel(300.0, 200.0, -120.0));
    input.push(InputEvent::SelectIcon(pin()));
    input.push(InputEvent::PointerMove { x: 350.0, y: 260.0 });
    input.push(InputEvent::Click { x: 350.0, y: 260.0 });

    assert!(annotator.drain(&mut input).is_needed());
    assert!(input.is_empty());
    assert_eq!(annotator.store().len(), 1);

    let icon = &annotator.store().as_slice()[0];
    let on_screen = annotator.viewport().image_to_screen(icon.center());
    assert!((on_screen.x - 350.0).abs() < 1e-3);
    assert!((on_screen.y - 260.0).abs() < 1e-3);

    let mut surface = RecordingSurface::new(annotator.canvas_size());
    annotator.redraw(&mut surface);
    let drawn = surface.drawn_images();
    let (_, icon_rect) = drawn[0];
    let (_, preview_rect) = drawn[1];
    assert!((icon_rect.width - preview_rect.width).abs() < 1e-3);
    assert!((icon_rect.x - preview_rect.x).abs() < 1e-3);
}

#[test]
fn test_remove_after_zoom_uses_transformed_bounds() {
    let mut annotator = Annotator::default();
    annotator.place(100.0, 100.0, 50.0, pin());
    annotator.handle_event(&wheel(0.0, 0.0, -1.0));

    // Icon now spans [82.5, 137.5] on screen.
    annotator.handle_event(&InputEvent::KeyDown(Key::RemoveModifier));
    assert!(!annotator
        .handle_event(&InputEvent::Click { x: 140.0, y: 110.0 })
        .is_needed());
    assert!(annotator
        .handle_event(&InputEvent::Click { x: 136.0, y: 110.0 })
        .is_needed());
    assert!(annotator.store().is_empty());
}

#[test]
fn test_overlapping_icons_removed_top_first() {
    let mut annotator = Annotator::default();
    annotator.place(100.0, 100.0, 50.0, ImageSource::new("bottom.png"));
    annotator.place(110.0, 110.0, 50.0, ImageSource::new("top.png"));

    annotator.handle_event(&InputEvent::KeyDown(Key::RemoveModifier));
    annotator.handle_event(&InputEvent::Click { x: 105.0, y: 105.0 });

    let remaining: Vec<_> = annotator.store().iter().map(|i| i.image.as_str()).collect();
    assert_eq!(remaining, ["bottom.png"]);
}

#[test]
fn test_removal_modifier_blocks_panning() {
    let mut annotator = Annotator::default();
    annotator.handle_event(&InputEvent::KeyDown(Key::RemoveModifier));
    let mut input: QueuedInput = drag((0.0, 0.0), (100.0, 100.0)).into_iter().collect();
    annotator.drain(&mut input);
    assert_eq!(*annotator.viewport(), ViewportTransform::default());
    assert_eq!(annotator.mode(), InteractionMode::Removing);
}

#[test]
fn test_records_survive_reload_into_fresh_annotator() {
    let mut source = Annotator::default();
    source.place(10.0, 20.0, 30.0, ImageSource::new("a.png"));
    source.place(40.0, 50.0, 60.0, ImageSource::new("b.png"));

    let json = serde_json::to_string(&source.records()).expect("serialize");
    assert!(json.contains("\"imgSrc\":\"a.png\""));

    let mut target = Annotator::default();
    target.place(1.0, 1.0, 10.0, ImageSource::new("old.png"));
    let ticket = target.begin_load();
    let records = serde_json::from_str(&json).expect("deserialize");
    target.apply_load(ticket, records).expect("fresh load");

    assert_eq!(target.store(), source.store());
}

#[test]
fn test_export_draws_at_native_coordinates() {
    let mut annotator = Annotator::default().with_background(ImageSource::new("car.jpg"));
    annotator.place(200.0, 150.0, 40.0, pin());
    let mut input: QueuedInput = drag((0.0, 0.0), (-300.0, 80.0)).into_iter().collect();
    input.push(wheel(10.0, 10.0, 1.0));
    annotator.drain(&mut input);

    let mut surface = RecordingSurface::new(annotator.canvas_size());
    annotator.render_export(&mut surface);
    let drawn = surface.drawn_images();
    assert_eq!(drawn[0].1, Rect::new(0.0, 0.0, 800.0, 600.0));
    assert_eq!(drawn[1].1, Rect::new(180.0, 130.0, 40.0, 40.0));
}

#[test]
fn test_icon_size_floor_applies_to_new_placements() {
    let mut annotator = Annotator::default();
    for _ in 0..20 {
        annotator.handle_event(&InputEvent::DecreaseIconSize);
    }
    assert!((annotator.icon_size() - IconSize::MIN).abs() < f32::EPSILON);

    annotator.handle_event(&InputEvent::SelectIcon(pin()));
    annotator.handle_event(&InputEvent::Click { x: 5.0, y: 5.0 });
    assert!((annotator.store().as_slice()[0].size - IconSize::MIN).abs() < f32::EPSILON);
}

// ============================================================================
// Viewport Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_screen_image_round_trip(
        scale in 0.1f32..5.0,
        tx in -2000.0f32..2000.0,
        ty in -2000.0f32..2000.0,
        x in -1000.0f32..1000.0,
        y in -1000.0f32..1000.0,
    ) {
        let vp = ViewportTransform::new(scale, tx, ty);
        let back = vp.screen_to_image(vp.image_to_screen(Point::new(x, y)));
        prop_assert!((back.x - x).abs() < 1e-2, "x {} -> {}", x, back.x);
        prop_assert!((back.y - y).abs() < 1e-2, "y {} -> {}", y, back.y);
    }

    #[test]
    fn prop_wheel_keeps_scale_in_bounds(
        deltas in prop::collection::vec(-3.0f32..3.0, 0..80),
    ) {
        let mut annotator = Annotator::default();
        for delta in deltas {
            annotator.handle_event(&wheel(400.0, 300.0, delta));
            let scale = annotator.viewport().scale();
            prop_assert!((MIN_SCALE..=MAX_SCALE).contains(&scale), "scale {}", scale);
        }
    }

    #[test]
    fn prop_wheel_zoom_keeps_focus_fixed(
        px in 0.0f32..800.0,
        py in 0.0f32..600.0,
        zoom_in in any::<bool>(),
    ) {
        let mut vp = ViewportTransform::new(1.5, -30.0, 45.0);
        let pointer = Point::new(px, py);
        let before = vp.screen_to_image(pointer);
        vp.zoom_at(pointer, if zoom_in { -1.0 } else { 1.0 });
        let after = vp.screen_to_image(pointer);
        prop_assert!((before.x - after.x).abs() < 1e-2);
        prop_assert!((before.y - after.y).abs() < 1e-2);
    }

    #[test]
    fn prop_placed_icon_is_hit_at_its_own_center(
        scale in 0.1f32..5.0,
        tx in -500.0f32..500.0,
        ty in -500.0f32..500.0,
        sx in 0.0f32..800.0,
        sy in 0.0f32..600.0,
    ) {
        let mut annotator = Annotator::default();
        let vp = ViewportTransform::new(scale, tx, ty);
        let at = vp.screen_to_image(Point::new(sx, sy));
        annotator.place(at.x, at.y, 50.0, pin());
        prop_assert!(annotator.store().hit_test(Point::new(sx, sy), &vp).is_some());
    }
}
