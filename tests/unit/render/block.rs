use image::Rgba;

use super::*;

const BG: Rgba<u8> = Rgba([0x1f, 0x19, 0x25, 0xff]);
const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

fn solid(w: u32, h: u32, c: Rgba<u8>) -> Arc<RgbaImage> {
    Arc::new(RgbaImage::from_pixel(w, h, c))
}

#[test]
fn rows_are_padded_and_vertically_centered() {
    let cfg = ChatConfig::default();
    let rows = vec![
        Row::new(vec![
            RenderedItem::Glyph(solid(10, 15, RED)),
            RenderedItem::StaticEmote(solid(4, 25, RED)),
        ]),
        Row::new(vec![RenderedItem::Glyph(solid(10, 15, RED))]),
    ];
    let block = compose_block(&rows, BG, &cfg);

    assert_eq!(block.image.dimensions(), (340, 60));
    assert_eq!(block.height(), 60);
    assert_eq!(block.background, BG);
    assert!(block.animations.is_empty());

    // Row 0 glyph: x 5..15, y 10..25.
    assert_eq!(block.image.get_pixel(5, 10), &RED);
    assert_eq!(block.image.get_pixel(14, 24), &RED);
    assert_eq!(block.image.get_pixel(5, 9), &BG);
    assert_eq!(block.image.get_pixel(4, 10), &BG);
    // Full-height emote right after it.
    assert_eq!(block.image.get_pixel(15, 5), &RED);
    assert_eq!(block.image.get_pixel(18, 29), &RED);
    assert_eq!(block.image.get_pixel(19, 10), &BG);
    // Row 1 glyph starts at y = 5 + 25 + 5.
    assert_eq!(block.image.get_pixel(5, 35), &RED);
    assert_eq!(block.image.get_pixel(5, 34), &BG);
    assert_eq!(block.image.get_pixel(339, 59), &BG);
}

#[test]
fn animated_items_are_placed_not_pasted() {
    let cfg = ChatConfig::default();
    let anim = Arc::new(
        AnimatedEmote::new(
            vec![
                RgbaImage::from_pixel(8, 21, RED),
                RgbaImage::from_pixel(8, 21, RED),
            ],
            50,
            40,
        )
        .unwrap(),
    );
    let rows = vec![Row::new(vec![
        RenderedItem::Glyph(solid(10, 15, RED)),
        RenderedItem::Animated(Arc::clone(&anim)),
    ])];
    let block = compose_block(&rows, BG, &cfg);

    assert_eq!(block.animations.len(), 1);
    let p = &block.animations[0];
    assert_eq!((p.x, p.top), (15, 7));
    assert!(Arc::ptr_eq(&p.emote, &anim));
    assert_eq!(block.image.get_pixel(16, 10), &BG);
}

#[test]
fn empty_rows_still_get_padding() {
    let cfg = ChatConfig::default();
    let block = compose_block(&[Row::default()], BG, &cfg);
    assert_eq!(block.height(), 35);
    assert!(block.image.pixels().all(|p| *p == BG));
}

#[test]
fn alternator_flips_per_block() {
    let a = Rgba([1, 0, 0, 255]);
    let b = Rgba([2, 0, 0, 255]);
    let mut alt = BackgroundAlternator::new([a, b]);
    let seq: Vec<_> = (0..5).map(|_| alt.next_color()).collect();
    assert_eq!(seq, vec![a, b, a, b, a]);
}
