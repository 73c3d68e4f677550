use super::*;
use crate::render::block::AnimatedPlacement;

const SWATCH: Rgba<u8> = Rgba([9, 9, 9, 255]);
const A: Rgba<u8> = Rgba([200, 0, 0, 255]);
const B: Rgba<u8> = Rgba([0, 200, 0, 255]);

fn blinker() -> Arc<AnimatedEmote> {
    // Second frame leaves its right column transparent.
    let mut second = RgbaImage::from_pixel(2, 2, B);
    second.put_pixel(1, 0, Rgba([0, 0, 0, 0]));
    second.put_pixel(1, 1, Rgba([0, 0, 0, 0]));
    Arc::new(AnimatedEmote::new(vec![RgbaImage::from_pixel(2, 2, A), second], 40, 40).unwrap())
}

fn block_with(emote: Arc<AnimatedEmote>, x: i64, top: i64, height: u32) -> Block {
    Block {
        image: RgbaImage::from_pixel(20, height, SWATCH),
        background: SWATCH,
        animations: vec![AnimatedPlacement { emote, x, top }],
    }
}

#[test]
fn tracked_items_are_measured_from_bottom() {
    let mut tracker = AnimationTracker::new(100);
    tracker.track(&block_with(blinker(), 3, 10, 35));
    assert_eq!(tracker.len(), 1);
    assert_eq!(tracker.entries()[0].y, 25);
    assert_eq!(tracker.entries()[0].swatch, SWATCH);
}

#[test]
fn paint_selects_frame_by_wall_clock_and_clears_swatch() {
    let mut tracker = AnimationTracker::new(100);
    tracker.track(&block_with(blinker(), 3, 10, 35));
    let mut buf = RgbaImage::from_pixel(20, 100, Rgba([1, 1, 1, 255]));

    tracker.paint(&mut buf, 0);
    assert_eq!(buf.get_pixel(3, 75), &A);
    assert_eq!(buf.get_pixel(4, 76), &A);

    tracker.paint(&mut buf, 40);
    assert_eq!(buf.get_pixel(3, 75), &B);
    // Transparent frame pixels show the swatch, not the previous frame.
    assert_eq!(buf.get_pixel(4, 75), &SWATCH);

    tracker.paint(&mut buf, 80);
    assert_eq!(buf.get_pixel(4, 75), &A);
}

#[test]
fn scrolling_past_the_top_drops_entries() {
    let mut tracker = AnimationTracker::new(100);
    tracker.track(&block_with(blinker(), 0, 10, 35));
    tracker.scroll(60);
    assert_eq!(tracker.entries()[0].y, 85);
    tracker.scroll(15);
    assert_eq!(tracker.len(), 1);
    tracker.scroll(1);
    assert!(tracker.is_empty());
}

#[test]
fn items_outside_a_tall_block_are_not_tracked() {
    let mut tracker = AnimationTracker::new(50);
    tracker.track(&block_with(blinker(), 0, 5, 80));
    assert!(tracker.is_empty());

    tracker.track(&block_with(blinker(), 0, 60, 80));
    assert_eq!(tracker.len(), 1);
    tracker.clear();
    assert!(tracker.is_empty());
}

#[test]
fn painting_clips_at_buffer_edges() {
    let mut tracker = AnimationTracker::new(10);
    tracker.track(&block_with(blinker(), 19, 0, 10));
    let mut buf = RgbaImage::from_pixel(20, 10, Rgba([1, 1, 1, 255]));
    tracker.paint(&mut buf, 0);
    assert_eq!(buf.get_pixel(19, 0), &A);
}
