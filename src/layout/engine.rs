use std::sync::Arc;

use image::RgbaImage;
use unicode_segmentation::UnicodeSegmentation;

use crate::assets::decode::{AnimatedEmote, Emote};
use crate::assets::glyph::{GlyphCache, TextRasterizer};
use crate::assets::store::ChatAssets;
use crate::foundation::color::{ColorSource, parse_hex_color};
use crate::foundation::core::ChatConfig;
use crate::foundation::error::ChatResult;
use crate::transcript::model::{ChatEvent, Fragment};

/// One drawable unit of a laid-out row.
#[derive(Clone, Debug)]
pub enum RenderedItem {
    /// Rasterized text.
    Glyph(Arc<RgbaImage>),
    /// Badge or single-frame emote.
    StaticEmote(Arc<RgbaImage>),
    /// Multi-frame emote; pasted by the animation tracker, not the block compositor.
    Animated(Arc<AnimatedEmote>),
}

impl RenderedItem {
    fn from_emote(emote: Emote) -> Self {
        match emote {
            Emote::Static(img) => Self::StaticEmote(img),
            Emote::Animated(anim) => Self::Animated(anim),
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        match self {
            Self::Glyph(img) | Self::StaticEmote(img) => img.width(),
            Self::Animated(anim) => anim.width(),
        }
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        match self {
            Self::Glyph(img) | Self::StaticEmote(img) => img.height(),
            Self::Animated(anim) => anim.height(),
        }
    }
}

/// Items sharing one line of a block.
#[derive(Clone, Debug, Default)]
pub struct Row {
    items: Vec<RenderedItem>,
}

impl Row {
    /// Row holding `items` in drawing order.
    pub fn new(items: Vec<RenderedItem>) -> Self {
        Self { items }
    }

    /// Items in drawing order.
    pub fn items(&self) -> &[RenderedItem] {
        &self.items
    }

    /// Sum of item widths, padding excluded.
    pub fn width(&self) -> u32 {
        self.items.iter().map(RenderedItem::width).sum()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the row holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Split `text` into word tokens (maximal non-whitespace runs) and single whitespace characters.
///
/// Concatenating the tokens yields `text` again.
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut word_start = None;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(start) = word_start.take() {
                tokens.push(&text[start..i]);
            }
            tokens.push(&text[i..i + c.len_utf8()]);
        } else if word_start.is_none() {
            word_start = Some(i);
        }
    }
    if let Some(start) = word_start {
        tokens.push(&text[start..]);
    }
    tokens
}

fn is_word(token: &str) -> bool {
    token.chars().next().is_some_and(|c| !c.is_whitespace())
}

/// Greedy row filler: a new row starts when the next item would overflow the chat width, unless
/// the current row is still empty. Header items always stay on the first row.
struct RowPacker {
    rows: Vec<Row>,
    current: Row,
    used: u32,
    pad: u32,
    limit: u32,
}

impl RowPacker {
    fn new(cfg: &ChatConfig) -> Self {
        Self {
            rows: Vec::new(),
            current: Row::default(),
            used: 2 * cfg.pad_x,
            pad: 2 * cfg.pad_x,
            limit: cfg.width,
        }
    }

    fn push(&mut self, item: RenderedItem) {
        let w = item.width();
        if !self.current.is_empty() && self.used + w > self.limit {
            self.rows.push(std::mem::take(&mut self.current));
            self.used = self.pad;
        }
        self.used += w;
        self.current.items.push(item);
    }

    fn push_header(&mut self, item: RenderedItem) {
        self.used += item.width();
        self.current.items.push(item);
    }

    fn finish(mut self) -> Vec<Row> {
        if !self.current.is_empty() || self.rows.is_empty() {
            self.rows.push(self.current);
        }
        self.rows
    }
}

/// Turns chat events into rows of rendered items.
///
/// Owns the session's glyph cache and name-color source; assets come from the shared
/// [`ChatAssets`].
pub struct LayoutEngine {
    cfg: ChatConfig,
    glyphs: GlyphCache,
    colors: Box<dyn ColorSource>,
}

impl LayoutEngine {
    /// Engine over `raster` with name colors drawn from `colors`.
    pub fn new(
        cfg: ChatConfig,
        raster: Arc<dyn TextRasterizer>,
        colors: Box<dyn ColorSource>,
    ) -> Self {
        Self {
            cfg,
            glyphs: GlyphCache::new(raster),
            colors,
        }
    }

    /// Geometry in use.
    pub fn config(&self) -> &ChatConfig {
        &self.cfg
    }

    /// Glyph cache backing text items.
    pub fn glyphs(&self) -> &GlyphCache {
        &self.glyphs
    }

    /// Lay `event` out into rows. Never fails: unavailable images and glyphs are logged and
    /// left out, including words whose emote is known but cannot be loaded. At least one
    /// (possibly empty) row is returned.
    ///
    /// Badges, the name and `": "` always open row 0 together. Emotes wider than the usable
    /// width are scaled down to fit it.
    pub fn layout(&mut self, event: &ChatEvent, assets: &ChatAssets) -> Vec<Row> {
        let mut packer = RowPacker::new(&self.cfg);
        let usable = self.cfg.content_width();

        for badge in &event.badges {
            let key = badge.key();
            match assets.badge(&key) {
                Ok(img) => packer.push_header(RenderedItem::StaticEmote(img)),
                Err(err) => tracing::warn!(badge = %key, %err, "skipping badge"),
            }
        }

        let name_color = event.color.as_deref().and_then(|c| parse_hex_color(c).ok());
        match self
            .glyphs
            .name_glyph(&event.name, name_color, self.colors.as_mut())
        {
            Ok(img) => packer.push_header(RenderedItem::Glyph(img)),
            Err(err) => tracing::warn!(name = %event.name, %err, "skipping name glyph"),
        }
        match self.glyphs.glyph(": ", self.cfg.text_color) {
            Ok(img) => packer.push_header(RenderedItem::Glyph(img)),
            Err(err) => tracing::warn!(%err, "skipping name separator"),
        }

        for fragment in &event.fragments {
            match fragment {
                Fragment::EmoteRef(id) => {
                    match assets.twitch_emote(id).and_then(|e| e.fit_width(usable)) {
                        Ok(emote) => packer.push(RenderedItem::from_emote(emote)),
                        Err(err) => tracing::warn!(emote = %id, %err, "skipping twitch emote"),
                    }
                }
                Fragment::TextRun(text) => {
                    for token in tokenize(text) {
                        let emote = if is_word(token) {
                            assets.word_emote(token)
                        } else {
                            None
                        };
                        match emote {
                            Some((provider, res)) => match res.and_then(|e| e.fit_width(usable)) {
                                Ok(emote) => packer.push(RenderedItem::from_emote(emote)),
                                Err(err) => tracing::warn!(
                                    word = %token, %provider, %err,
                                    "skipping word emote"
                                ),
                            },
                            None => self.push_text(&mut packer, token),
                        }
                    }
                }
            }
        }

        packer.finish()
    }

    fn push_text(&mut self, packer: &mut RowPacker, token: &str) {
        if let Err(err) = self.try_push_text(packer, token) {
            tracing::warn!(%token, %err, "skipping text");
        }
    }

    fn try_push_text(&mut self, packer: &mut RowPacker, token: &str) -> ChatResult<()> {
        let color = self.cfg.text_color;
        let usable = self.cfg.content_width();
        if self.glyphs.width(token)? <= usable {
            packer.push(RenderedItem::Glyph(self.glyphs.glyph(token, color)?));
            return Ok(());
        }
        for chunk in self.split_to_fit(token, usable)? {
            packer.push(RenderedItem::Glyph(self.glyphs.glyph(chunk, color)?));
        }
        Ok(())
    }

    /// Cut `token` into consecutive chunks, each the longest grapheme prefix of the remainder
    /// that fits `max_width` (at least one grapheme).
    fn split_to_fit<'a>(&self, token: &'a str, max_width: u32) -> ChatResult<Vec<&'a str>> {
        let mut chunks = Vec::new();
        let mut rest = token;
        while !rest.is_empty() {
            let ends: Vec<usize> = rest
                .grapheme_indices(true)
                .map(|(i, g)| i + g.len())
                .collect();
            // Largest prefix length whose width fits; prefix widths grow with length.
            let (mut lo, mut hi) = (1, ends.len());
            while lo < hi {
                let mid = (lo + hi).div_ceil(2);
                if self.glyphs.measure(&rest[..ends[mid - 1]])? <= max_width {
                    lo = mid;
                } else {
                    hi = mid - 1;
                }
            }
            let cut = ends[lo - 1];
            chunks.push(&rest[..cut]);
            rest = &rest[cut..];
        }
        Ok(chunks)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/engine.rs"]
mod tests;
