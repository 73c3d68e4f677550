use std::ops::Range;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use image::RgbaImage;

use crate::assets::glyph::TextRasterizer;
use crate::assets::store::ChatAssets;
use crate::foundation::color::ColorSource;
use crate::foundation::core::ChatConfig;
use crate::layout::engine::LayoutEngine;
use crate::render::animation::AnimationTracker;
use crate::render::block::{BackgroundAlternator, compose_block};
use crate::render::scroll::ScrollBuffer;
use crate::transcript::load::Transcript;
use crate::transcript::model::ChatEvent;

/// Position of the next event to emit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cursor {
    index: usize,
    offset: f64,
}

impl Cursor {
    fn at(events: &[ChatEvent], index: usize) -> Self {
        Self {
            index,
            offset: events.get(index).map_or(f64::INFINITY, |e| e.offset),
        }
    }

    /// Index of the next event to emit; equals the event count once exhausted.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Offset of the next event, `+∞` once every event was emitted.
    pub fn current_offset(&self) -> f64 {
        self.offset
    }

    /// Whether the cursor sits on the terminal sentinel.
    pub fn is_exhausted(&self) -> bool {
        self.offset == f64::INFINITY
    }
}

/// Timestamp-driven chat renderer over one transcript.
///
/// Emits each event exactly once as playback time passes its offset, scrolling a fixed-size
/// history image. Rewinds and jumps go through [`seek`](Self::seek).
pub struct ChatReplay {
    cfg: ChatConfig,
    events: Arc<[ChatEvent]>,
    assets: Arc<ChatAssets>,
    layout: LayoutEngine,
    buffer: ScrollBuffer,
    animations: AnimationTracker,
    backgrounds: BackgroundAlternator,
    cursor: Cursor,
    last_emitted: Range<usize>,
}

impl ChatReplay {
    /// Fresh session positioned before the first event.
    pub fn new(
        cfg: ChatConfig,
        transcript: &Transcript,
        assets: Arc<ChatAssets>,
        raster: Arc<dyn TextRasterizer>,
        colors: Box<dyn ColorSource>,
    ) -> Self {
        let events = Arc::clone(transcript.events());
        Self {
            buffer: ScrollBuffer::new(cfg.width, cfg.buffer_height, cfg.base_color),
            animations: AnimationTracker::new(cfg.buffer_height),
            backgrounds: BackgroundAlternator::new(cfg.block_backgrounds),
            cursor: Cursor::at(&events, 0),
            last_emitted: 0..0,
            layout: LayoutEngine::new(cfg.clone(), raster, colors),
            cfg,
            events,
            assets,
        }
    }

    /// Geometry and palette in use.
    pub fn config(&self) -> &ChatConfig {
        &self.cfg
    }

    /// Events being replayed.
    pub fn events(&self) -> &Arc<[ChatEvent]> {
        &self.events
    }

    /// Next event to emit.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Event indices emitted by the most recent draw (empty after a seek).
    pub fn last_emitted(&self) -> Range<usize> {
        self.last_emitted.clone()
    }

    /// Animated items currently painted each frame.
    pub fn animations(&self) -> &AnimationTracker {
        &self.animations
    }

    /// Current buffer without drawing.
    pub fn image(&self) -> &RgbaImage {
        self.buffer.image()
    }

    /// [`draw_at`](Self::draw_at) with the system wall clock driving animations.
    pub fn draw(&mut self, t: f64) -> &RgbaImage {
        let wall_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64);
        self.draw_at(t, wall_ms)
    }

    /// Emit every pending event with `offset ≤ t`, repaint live animations for `wall_ms`, and
    /// return the whole buffer.
    pub fn draw_at(&mut self, t: f64, wall_ms: u64) -> &RgbaImage {
        let start = self.cursor.index;
        while !self.cursor.is_exhausted() && self.cursor.offset <= t {
            self.emit_next();
        }
        self.last_emitted = start..self.cursor.index;
        self.animations.paint(self.buffer.image_mut(), wall_ms);
        self.buffer.image()
    }

    fn emit_next(&mut self) {
        let index = self.cursor.index;
        let events = Arc::clone(&self.events);
        let event = &events[index];

        let rows = self.layout.layout(event, &self.assets);
        let block = compose_block(&rows, self.backgrounds.next_color(), &self.cfg);
        self.animations.scroll(block.height());
        self.buffer.push(&block.image);
        self.animations.track(&block);
        tracing::debug!(
            index,
            offset = event.offset,
            rows = rows.len(),
            animated = block.animations.len(),
            "emitted chat block"
        );

        self.cursor = Cursor::at(&events, index + 1);
    }

    /// Restart from `t`: clear the history, then place the cursor `lookback` events before the
    /// first event at or after `t`, or on the terminal sentinel when there is none.
    #[tracing::instrument(skip(self), fields(events = self.events.len()))]
    pub fn seek(&mut self, t: f64) {
        self.buffer.reset();
        self.animations.clear();
        let index = self
            .events
            .iter()
            .position(|e| e.offset >= t)
            .map_or(self.events.len(), |first| {
                first.saturating_sub(self.cfg.lookback)
            });
        self.cursor = Cursor::at(&self.events, index);
        self.last_emitted = index..index;
        tracing::info!(index, "seek applied");
    }

    /// Bottom `height` rows of the buffer, what a display of that height shows.
    pub fn window(&self, height: u32) -> RgbaImage {
        let img = self.buffer.image();
        let h = height.min(img.height());
        image::imageops::crop_imm(img, 0, img.height() - h, img.width(), h).to_image()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/replay.rs"]
mod tests;
