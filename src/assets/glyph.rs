use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use image::{Rgba, RgbaImage};
use unicode_segmentation::UnicodeSegmentation;

use crate::foundation::color::ColorSource;
use crate::foundation::error::{ChatError, ChatResult};

/// Turns text into pixels.
pub trait TextRasterizer: Send + Sync {
    /// Advance width of `text` in pixels.
    fn measure(&self, text: &str) -> ChatResult<u32>;

    /// Render `text` in `color` onto a transparent image exactly [`measure`](Self::measure)
    /// pixels wide.
    fn render(&self, text: &str, color: Rgba<u8>) -> ChatResult<RgbaImage>;
}

/// Bold 12 px chat font rendered through `usvg`/`resvg` with system fonts.
pub struct SvgTextRasterizer {
    fontdb: Arc<usvg::fontdb::Database>,
    font_size: f32,
    height: u32,
}

impl SvgTextRasterizer {
    const FAMILIES: &'static str = "Tahoma, Arial, sans-serif";
    const MAX_WIDTH: u32 = 8192;

    /// Build with system fonts plus any `.ttf`/`.otf`/`.ttc` found in `font_dirs`.
    pub fn new(font_dirs: &[PathBuf]) -> ChatResult<Self> {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        for dir in font_dirs {
            load_fonts_from_dir(&mut db, dir);
        }
        if db.len() == 0 {
            return Err(ChatError::validation("no fonts available for chat text"));
        }
        tracing::debug!(faces = db.len(), "chat font database ready");

        let font_size = 12.0;
        Ok(Self {
            fontdb: Arc::new(db),
            font_size,
            height: (font_size * 1.25).ceil() as u32,
        })
    }

    fn tree(&self, text: &str, fill: Rgba<u8>, width: u32) -> ChatResult<usvg::Tree> {
        let svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}"><text x="0" y="{baseline}" xml:space="preserve" font-family="{families}" font-weight="bold" font-size="{size}" fill="rgb({r},{g},{b})" fill-opacity="{a}">{text}</text></svg>"#,
            w = width.max(1),
            h = self.height,
            baseline = self.font_size,
            families = Self::FAMILIES,
            size = self.font_size,
            r = fill[0],
            g = fill[1],
            b = fill[2],
            a = f32::from(fill[3]) / 255.0,
            text = escape_xml(text),
        );
        let opts = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            font_resolver: make_font_resolver(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(&svg, &opts).context("parse chat text svg")?;
        Ok(tree)
    }

    fn ink_width(&self, text: &str) -> ChatResult<f32> {
        let tree = self.tree(text, Rgba([0, 0, 0, 255]), Self::MAX_WIDTH)?;
        Ok(tree.root().abs_bounding_box().width())
    }
}

impl TextRasterizer for SvgTextRasterizer {
    fn measure(&self, text: &str) -> ChatResult<u32> {
        if text.is_empty() {
            return Ok(0);
        }
        // Ink bounds ignore trailing whitespace, so measure between two bars.
        let framed = self.ink_width(&format!("|{text}|"))?;
        let bars = self.ink_width("||")?;
        Ok((framed - bars).max(0.0).ceil() as u32)
    }

    fn render(&self, text: &str, color: Rgba<u8>) -> ChatResult<RgbaImage> {
        let width = self.measure(text)?.max(1);
        let tree = self.tree(text, color, width)?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, self.height)
            .ok_or_else(|| ChatError::validation("failed to allocate text pixmap"))?;
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::identity(),
            &mut pixmap.as_mut(),
        );

        let mut out = RgbaImage::new(width, self.height);
        for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
            let c = src.demultiply();
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
        Ok(out)
    }
}

/// Deterministic box-glyph rasterizer: every grapheme advances by a fixed width and
/// non-whitespace graphemes render as a solid box.
///
/// Used headless when no fonts are installed, and wherever pixel-exact output matters.
#[derive(Clone, Copy, Debug)]
pub struct FixedAdvanceRasterizer {
    /// Advance per grapheme.
    pub advance: u32,
    /// Glyph image height.
    pub height: u32,
}

impl Default for FixedAdvanceRasterizer {
    fn default() -> Self {
        Self {
            advance: 7,
            height: 15,
        }
    }
}

impl TextRasterizer for FixedAdvanceRasterizer {
    fn measure(&self, text: &str) -> ChatResult<u32> {
        Ok(text.graphemes(true).count() as u32 * self.advance)
    }

    fn render(&self, text: &str, color: Rgba<u8>) -> ChatResult<RgbaImage> {
        let width = self.measure(text)?.max(1);
        let mut out = RgbaImage::new(width, self.height);
        for (i, g) in text.graphemes(true).enumerate() {
            if g.chars().all(char::is_whitespace) {
                continue;
            }
            let x0 = i as u32 * self.advance;
            for x in (x0 + 1)..(x0 + self.advance).saturating_sub(1) {
                for y in 2..self.height.saturating_sub(2) {
                    out.put_pixel(x, y, color);
                }
            }
        }
        Ok(out)
    }
}

/// Memoized text widths and glyph images for one replay session.
///
/// Unbounded: a session's vocabulary of words and speaker names is small enough to keep.
pub struct GlyphCache {
    raster: Arc<dyn TextRasterizer>,
    widths: HashMap<String, u32>,
    glyphs: HashMap<(String, [u8; 4]), Arc<RgbaImage>>,
    auto_colored: HashMap<String, Arc<RgbaImage>>,
}

impl GlyphCache {
    /// Empty cache over `raster`.
    pub fn new(raster: Arc<dyn TextRasterizer>) -> Self {
        Self {
            raster,
            widths: HashMap::new(),
            glyphs: HashMap::new(),
            auto_colored: HashMap::new(),
        }
    }

    /// Memoized advance width of `text`.
    pub fn width(&mut self, text: &str) -> ChatResult<u32> {
        if let Some(&w) = self.widths.get(text) {
            return Ok(w);
        }
        let w = self.raster.measure(text)?;
        self.widths.insert(text.to_string(), w);
        Ok(w)
    }

    /// Width of `text` straight from the rasterizer, bypassing the memo.
    ///
    /// For one-off probes such as prefix measurements while splitting an oversized word.
    pub fn measure(&self, text: &str) -> ChatResult<u32> {
        self.raster.measure(text)
    }

    /// Memoized glyph image for `(text, color)`.
    pub fn glyph(&mut self, text: &str, color: Rgba<u8>) -> ChatResult<Arc<RgbaImage>> {
        let key = (text.to_string(), color.0);
        if let Some(img) = self.glyphs.get(&key) {
            return Ok(Arc::clone(img));
        }
        let img = Arc::new(self.raster.render(text, color)?);
        self.glyphs.insert(key, Arc::clone(&img));
        Ok(img)
    }

    /// Speaker name glyph. Without a color of its own, the name gets one pick from `colors`
    /// the first time it is seen and keeps it for the session.
    pub fn name_glyph(
        &mut self,
        name: &str,
        color: Option<Rgba<u8>>,
        colors: &mut dyn ColorSource,
    ) -> ChatResult<Arc<RgbaImage>> {
        if let Some(color) = color {
            return self.glyph(name, color);
        }
        if let Some(img) = self.auto_colored.get(name) {
            return Ok(Arc::clone(img));
        }
        let img = Arc::new(self.raster.render(name, colors.pick())?);
        self.auto_colored.insert(name.to_string(), Arc::clone(&img));
        Ok(img)
    }

    /// Number of distinct glyph images held.
    pub fn len(&self) -> usize {
        self.glyphs.len() + self.auto_colored.len()
    }

    /// Whether no glyph image has been rendered yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

/// Resolves the requested families first, then any sans-serif, serif or monospace face, then
/// whatever face the database holds.
fn make_font_resolver() -> usvg::FontResolver<'static> {
    use usvg::FontResolver;

    FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families: Vec<usvg::fontdb::Family<'_>> = font
                .families()
                .iter()
                .map(|family| match family {
                    usvg::FontFamily::Serif => usvg::fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => usvg::fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => usvg::fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => usvg::fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => usvg::fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => usvg::fontdb::Family::Name(s),
                })
                .collect();
            families.extend([
                usvg::fontdb::Family::SansSerif,
                usvg::fontdb::Family::Serif,
                usvg::fontdb::Family::Monospace,
            ]);

            let style = match font.style() {
                usvg::FontStyle::Normal => usvg::fontdb::Style::Normal,
                usvg::FontStyle::Italic => usvg::fontdb::Style::Italic,
                usvg::FontStyle::Oblique => usvg::fontdb::Style::Oblique,
            };
            let query = usvg::fontdb::Query {
                families: &families,
                weight: usvg::fontdb::Weight(font.weight()),
                stretch: usvg::fontdb::Stretch::Normal,
                style,
            };

            fontdb
                .query(&query)
                .or_else(|| fontdb.faces().next().map(|f| f.id))
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        if let Err(err) = db.load_font_file(&path) {
            tracing::warn!(path = %path.display(), %err, "skipping unreadable font");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/glyph.rs"]
mod tests;
