use std::sync::Arc;

use image::{Rgba, RgbaImage};

use crate::assets::decode::AnimatedEmote;
use crate::render::block::Block;

/// Live animated item in the scroll buffer.
#[derive(Clone, Debug)]
pub struct AnimationEntry {
    /// Frames to cycle.
    pub emote: Arc<AnimatedEmote>,
    /// Left edge in pixels.
    pub x: i64,
    /// Distance from the buffer bottom up to the item's top edge.
    pub y: i64,
    /// Background painted under each frame.
    pub swatch: Rgba<u8>,
}

/// Animated items currently inside the scroll buffer.
#[derive(Clone, Debug)]
pub struct AnimationTracker {
    entries: Vec<AnimationEntry>,
    height: i64,
}

impl AnimationTracker {
    /// Tracker for a buffer `buffer_height` pixels tall.
    pub fn new(buffer_height: u32) -> Self {
        Self {
            entries: Vec::new(),
            height: i64::from(buffer_height),
        }
    }

    /// Live entries, oldest first.
    pub fn entries(&self) -> &[AnimationEntry] {
        &self.entries
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is animating.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Move every entry up by `dh` pixels, dropping those whose top left the buffer.
    pub fn scroll(&mut self, dh: u32) {
        let height = self.height;
        for e in &mut self.entries {
            e.y += i64::from(dh);
        }
        self.entries.retain(|e| e.y <= height);
    }

    /// Register the animated items of `block`, which was just pasted at the buffer bottom.
    pub fn track(&mut self, block: &Block) {
        let block_h = i64::from(block.height());
        let height = self.height;
        self.entries.extend(
            block
                .animations
                .iter()
                .map(|p| AnimationEntry {
                    emote: Arc::clone(&p.emote),
                    x: p.x,
                    y: block_h - p.top,
                    swatch: block.background,
                })
                .filter(|e| e.y <= height),
        );
    }

    /// Paint the frame each entry shows at `wall_ms` over its background swatch.
    pub fn paint(&self, buffer: &mut RgbaImage, wall_ms: u64) {
        let buf_h = i64::from(buffer.height());
        for e in &self.entries {
            let top = buf_h - e.y;
            let frame = e.emote.frame_at(wall_ms);
            fill_rect(buffer, e.x, top, frame.width(), frame.height(), e.swatch);
            image::imageops::overlay(buffer, frame, e.x, top);
        }
    }
}

fn fill_rect(img: &mut RgbaImage, x: i64, y: i64, w: u32, h: u32, color: Rgba<u8>) {
    let (iw, ih) = (i64::from(img.width()), i64::from(img.height()));
    let x0 = x.clamp(0, iw);
    let y0 = y.clamp(0, ih);
    let x1 = (x + i64::from(w)).clamp(0, iw);
    let y1 = (y + i64::from(h)).clamp(0, ih);
    for py in y0..y1 {
        for px in x0..x1 {
            img.put_pixel(px as u32, py as u32, color);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/animation.rs"]
mod tests;
