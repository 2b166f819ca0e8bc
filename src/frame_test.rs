#![allow(clippy::float_cmp)]

use super::*;
use crate::test_support::FakeHost;

fn screen() -> ScreenBounds {
    ScreenBounds { left: 50.0, top: 40.0, right: 1000.0, bottom: 700.0 }
}

fn make_frame(shape: MapShape, position: MapPosition) -> (Frame, FakeHost) {
    let mut host = FakeHost::new();
    let mut frame = Frame::new();
    let settings = MinimapSettings { shape, position, pad_x: 10.0, pad_y: 5.0, ..MinimapSettings::default() };
    frame.configure(&mut host, &settings);
    (frame, host)
}

#[test]
fn layout_pins_each_corner() {
    let cases = [
        (MapPosition::BottomLeft, Point::new(60.0, 495.0)),
        (MapPosition::BottomRight, Point::new(690.0, 495.0)),
        (MapPosition::TopLeft, Point::new(60.0, 45.0)),
        (MapPosition::TopRight, Point::new(690.0, 45.0)),
    ];
    for (position, expected) in cases {
        let (mut frame, _) = make_frame(MapShape::Rectangle, position);
        assert_eq!(frame.layout(screen()), expected, "{position:?}");
        assert_eq!(frame.origin(), expected);
    }
}

#[test]
fn to_local_is_relative_to_origin() {
    let (mut frame, _) = make_frame(MapShape::Rectangle, MapPosition::TopLeft);
    frame.layout(screen());
    assert_eq!(frame.to_local(Point::new(70.0, 55.0)), Point::new(10.0, 10.0));
    assert!(frame.contains_screen(Point::new(70.0, 55.0)));
    assert!(!frame.contains_screen(Point::new(20.0, 55.0)));
}

#[test]
fn rectangle_contains_its_corners() {
    let (frame, _) = make_frame(MapShape::Rectangle, MapPosition::TopLeft);
    assert!(frame.contains(Point::new(0.0, 0.0)));
    assert!(frame.contains(Point::new(300.0, 200.0)));
    assert!(!frame.contains(Point::new(301.0, 100.0)));
}

#[test]
fn circle_uses_inscribed_radius() {
    let (frame, _) = make_frame(MapShape::Circle, MapPosition::TopLeft);
    assert!(frame.contains(Point::new(150.0, 100.0)));
    assert!(frame.contains(Point::new(150.0, 1.0)));
    // Inside the rectangle but outside the 100px circle.
    assert!(!frame.contains(Point::new(10.0, 10.0)));
    assert!(!frame.contains(Point::new(260.0, 100.0)));
}

#[test]
fn diamond_excludes_corners() {
    let (frame, _) = make_frame(MapShape::Diamond, MapPosition::TopLeft);
    assert!(frame.contains(Point::new(150.0, 100.0)));
    assert!(frame.contains(Point::new(75.0, 50.0)));
    assert!(!frame.contains(Point::new(20.0, 20.0)));
}

#[test]
fn configure_bakes_mask_once() {
    let mut host = FakeHost::new();
    let mut frame = Frame::new();
    let settings = MinimapSettings::default();
    frame.configure(&mut host, &settings);
    frame.configure(&mut host, &settings);
    assert_eq!(host.rasterized("mask"), 1);
    assert_eq!((frame.mask().width, frame.mask().height), (300.0, 200.0));
}

#[test]
fn resize_rebakes_mask_and_releases_old() {
    let mut host = FakeHost::new();
    let mut frame = Frame::new();
    frame.configure(&mut host, &MinimapSettings::default());
    let old = frame.mask().texture().unwrap().id;
    frame.configure(&mut host, &MinimapSettings { width: 400.0, ..MinimapSettings::default() });
    assert_eq!(host.rasterized("mask"), 2);
    assert_eq!(host.released(), vec![old]);
}

#[test]
fn image_mask_loads_texture() {
    let mut host = FakeHost::new();
    host.pending.insert("masks/round.png".into());
    let mut frame = Frame::new();
    let settings = MinimapSettings { shape: MapShape::Mask, mask: "masks/round.png".into(), ..MinimapSettings::default() };
    frame.configure(&mut host, &settings);
    assert_eq!(host.rasterized("mask"), 0);
    assert!(frame.mask().is_provisional());

    let ticket = host.finish_load("masks/round.png").unwrap();
    assert!(frame.asset_ready(&mut host, ticket));
    assert!(!frame.mask().is_provisional());
}

#[test]
fn image_mask_without_source_falls_back_to_rectangle() {
    let mut host = FakeHost::new();
    let mut frame = Frame::new();
    frame.configure(&mut host, &MinimapSettings { shape: MapShape::Mask, ..MinimapSettings::default() });
    assert_eq!(host.rasterized("mask"), 1);
}

#[test]
fn overlay_slices_follow_texture() {
    let mut host = FakeHost::new();
    host.sizes.insert("border.png".into(), (90.0, 60.0));
    let mut frame = Frame::new();
    let overlay = OverlaySettings { visible: true, file: "border.png".into(), left: 10.0, right: 20.0, top: 5.0, bottom: 15.0 };
    frame.configure(&mut host, &MinimapSettings { overlay_settings: overlay, ..MinimapSettings::default() });

    let slices = frame.overlay_slices();
    assert_eq!(slices.len(), 9);
    assert_eq!(slices[0].dst, Rect::new(0.0, 0.0, 10.0, 5.0));
    assert_eq!(slices[4].src, Rect::new(10.0, 5.0, 60.0, 40.0));
    assert_eq!(slices[4].dst, Rect::new(10.0, 5.0, 270.0, 180.0));
    assert_eq!(slices[8].dst, Rect::new(280.0, 185.0, 20.0, 15.0));
}

#[test]
fn hidden_overlay_has_no_slices() {
    let mut host = FakeHost::new();
    let mut frame = Frame::new();
    let overlay = OverlaySettings { visible: false, file: "border.png".into(), ..OverlaySettings::default() };
    frame.configure(&mut host, &MinimapSettings { overlay_settings: overlay, ..MinimapSettings::default() });
    assert!(frame.overlay_slices().is_empty());
}

#[test]
fn clearing_overlay_file_releases_texture() {
    let mut host = FakeHost::new();
    let mut frame = Frame::new();
    let overlay = OverlaySettings { visible: true, file: "border.png".into(), ..OverlaySettings::default() };
    frame.configure(&mut host, &MinimapSettings { overlay_settings: overlay, ..MinimapSettings::default() });
    let id = frame.overlay().texture().unwrap().id;

    frame.configure(&mut host, &MinimapSettings::default());
    assert!(host.released().contains(&id));
    assert!(!frame.overlay().renderable);
}

#[test]
fn mask_failure_is_not_fatal() {
    let mut host = FakeHost::new();
    host.fail_rasterize = true;
    let mut frame = Frame::new();
    frame.configure(&mut host, &MinimapSettings::default());
    assert!(frame.mask().is_provisional());
    assert_eq!(frame.width(), 300.0);
}
