#![allow(clippy::float_cmp)]

use super::*;
use crate::host::{Texture, TextureId};
use crate::test_support::FakeHost;

fn texture(id: u64) -> Texture {
    Texture { id: TextureId(id), width: 10.0, height: 10.0, video: false }
}

fn label(text: &str) -> TextLabel {
    TextLabel {
        text: text.into(),
        font_family: "Signika".into(),
        font_size: 24.0,
        color: "#FFFFFF".into(),
        word_wrap_width: None,
        anchor: Point::new(0.5, 0.5),
        offset: Point::new(0.0, 0.0),
        renderable: true,
    }
}

#[test]
fn new_sprite_is_provisional_and_untinted() {
    let sprite = Sprite::new("a");
    assert!(sprite.is_provisional());
    assert_eq!(sprite.tint, "#FFFFFF");
    assert_eq!(sprite.alpha, 1.0);
    assert_eq!(sprite.scale_sign(), (1.0, 1.0));
}

#[test]
fn centered_sprite_anchors_at_middle() {
    let sprite = Sprite::centered("a");
    assert_eq!(sprite.anchor, Point::new(0.5, 0.5));
}

#[test]
fn replace_texture_releases_previous() {
    let mut gfx = FakeHost::new();
    let mut sprite = Sprite::new("a");
    sprite.replace_texture(&mut gfx, texture(1));
    assert!(gfx.released().is_empty());
    sprite.replace_texture(&mut gfx, texture(2));
    assert_eq!(gfx.released(), vec![TextureId(1)]);
    assert_eq!(sprite.texture().map(|t| t.id), Some(TextureId(2)));
}

#[test]
fn replace_with_same_texture_does_not_release() {
    let mut gfx = FakeHost::new();
    let mut sprite = Sprite::new("a");
    sprite.replace_texture(&mut gfx, texture(1));
    sprite.replace_texture(&mut gfx, texture(1));
    assert!(gfx.released().is_empty());
}

#[test]
fn apply_scale_sign_is_idempotent() {
    let mut sprite = Sprite::new("a");
    sprite.apply_scale_sign(-1.0, 1.0);
    assert_eq!(sprite.scale_sign(), (-1.0, 1.0));
    sprite.apply_scale_sign(-1.0, 1.0);
    assert_eq!(sprite.scale_sign(), (-1.0, 1.0));
    sprite.apply_scale_sign(-2.0, -0.5);
    assert_eq!(sprite.scale_sign(), (-1.0, -1.0));
    sprite.apply_scale_sign(1.0, 1.0);
    assert_eq!(sprite.scale_sign(), (1.0, 1.0));
}

#[test]
fn set_label_replaces_existing() {
    let mut sprite = Sprite::new("a");
    sprite.set_label(label("one"));
    sprite.set_label(label("two"));
    assert_eq!(sprite.children().len(), 1);
    assert_eq!(sprite.label().map(|l| l.text.as_str()), Some("two"));
}

#[test]
fn remove_label_detaches() {
    let mut sprite = Sprite::new("a");
    sprite.set_label(label("one"));
    sprite.remove_label();
    assert!(sprite.label().is_none());
    assert!(sprite.children().is_empty());
}

#[test]
fn destroy_releases_once() {
    let mut gfx = FakeHost::new();
    let mut sprite = Sprite::new("a");
    sprite.replace_texture(&mut gfx, texture(7));
    sprite.set_label(label("x"));
    sprite.destroy(&mut gfx);
    sprite.destroy(&mut gfx);
    assert!(sprite.is_destroyed());
    assert!(sprite.children().is_empty());
    assert_eq!(gfx.released(), vec![TextureId(7)]);
}

#[test]
fn invalidate_marks_destroyed_without_backend() {
    let mut sprite = Sprite::new("a");
    sprite.invalidate();
    assert!(sprite.is_destroyed());
    assert!(sprite.texture().is_none());
}
