use std::sync::Arc;

use image::{Rgba, RgbaImage};

use crate::assets::decode::AnimatedEmote;
use crate::foundation::core::ChatConfig;
use crate::layout::engine::{RenderedItem, Row};

/// Animated item position inside its block.
#[derive(Clone, Debug)]
pub struct AnimatedPlacement {
    /// Frames to cycle.
    pub emote: Arc<AnimatedEmote>,
    /// Left edge in pixels.
    pub x: i64,
    /// Top edge relative to the block's top.
    pub top: i64,
}

/// Composited image of one chat event.
#[derive(Clone, Debug)]
pub struct Block {
    /// Rows drawn over the background; animated items are left as background.
    pub image: RgbaImage,
    /// Solid fill behind the rows.
    pub background: Rgba<u8>,
    /// Animated items the tracker paints every frame.
    pub animations: Vec<AnimatedPlacement>,
}

impl Block {
    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Two-state background toggle; flips once per composed block.
#[derive(Clone, Debug)]
pub struct BackgroundAlternator {
    colors: [Rgba<u8>; 2],
    next: usize,
}

impl BackgroundAlternator {
    /// Start with `colors[0]`.
    pub fn new(colors: [Rgba<u8>; 2]) -> Self {
        Self { colors, next: 0 }
    }

    /// Background for the next block.
    pub fn next_color(&mut self) -> Rgba<u8> {
        let c = self.colors[self.next];
        self.next ^= 1;
        c
    }
}

/// Draw `rows` onto a `cfg.width` × [`ChatConfig::block_height`] image filled with `background`.
///
/// Items advance left to right from `pad_x` and are centered vertically within their row.
pub fn compose_block(rows: &[Row], background: Rgba<u8>, cfg: &ChatConfig) -> Block {
    let mut image = RgbaImage::from_pixel(cfg.width, cfg.block_height(rows.len()), background);
    let mut animations = Vec::new();
    let lh = i64::from(cfg.line_height);

    for (r, row) in rows.iter().enumerate() {
        let row_top = i64::from(cfg.pad_y) + lh * r as i64;
        let mut x = i64::from(cfg.pad_x);
        for item in row.items() {
            let top = row_top + (lh - i64::from(item.height())) / 2;
            match item {
                RenderedItem::Glyph(img) | RenderedItem::StaticEmote(img) => {
                    image::imageops::overlay(&mut image, img.as_ref(), x, top);
                }
                RenderedItem::Animated(emote) => animations.push(AnimatedPlacement {
                    emote: Arc::clone(emote),
                    x,
                    top,
                }),
            }
            x += i64::from(item.width());
        }
    }

    Block {
        image,
        background,
        animations,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/block.rs"]
mod tests;
