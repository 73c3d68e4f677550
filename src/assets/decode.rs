use std::io::Cursor;
use std::sync::Arc;

use anyhow::Context;
use image::imageops::{self, FilterType};
use image::{AnimationDecoder, ImageFormat, RgbaImage};

use crate::foundation::error::{ChatError, ChatResult};

/// Decoded emote image.
#[derive(Clone, Debug)]
pub enum Emote {
    /// Single RGBA frame.
    Static(Arc<RgbaImage>),
    /// Multi-frame emote, drawn by the animation tracker.
    Animated(Arc<AnimatedEmote>),
}

impl Emote {
    /// Width in pixels.
    pub fn width(&self) -> u32 {
        match self {
            Self::Static(img) => img.width(),
            Self::Animated(anim) => anim.width(),
        }
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        match self {
            Self::Static(img) => img.height(),
            Self::Animated(anim) => anim.height(),
        }
    }

    /// This emote, scaled down with its aspect ratio kept when wider than `max_width`.
    pub fn fit_width(self, max_width: u32) -> ChatResult<Self> {
        let (w, h) = (self.width(), self.height());
        if w <= max_width || max_width == 0 {
            return Ok(self);
        }
        let fit_h = (u64::from(h) * u64::from(max_width) / u64::from(w)).max(1) as u32;
        let scale = |img: &RgbaImage| imageops::resize(img, max_width, fit_h, FilterType::Triangle);
        Ok(match self {
            Self::Static(img) => Self::Static(Arc::new(scale(&img))),
            Self::Animated(anim) => Self::Animated(Arc::new(AnimatedEmote::new(
                anim.frames.iter().map(scale).collect(),
                anim.frame_ms,
                anim.frame_ms,
            )?)),
        })
    }
}

/// Frames of an animated emote plus their shared frame duration.
#[derive(Debug)]
pub struct AnimatedEmote {
    frames: Vec<RgbaImage>,
    frame_ms: u32,
}

impl AnimatedEmote {
    /// Build from decoded frames. `frame_ms == 0` falls back to `default_frame_ms`.
    pub fn new(frames: Vec<RgbaImage>, frame_ms: u32, default_frame_ms: u32) -> ChatResult<Self> {
        let Some(first) = frames.first() else {
            return Err(ChatError::decode("animated emote has no frames"));
        };
        let dims = first.dimensions();
        if frames.iter().any(|f| f.dimensions() != dims) {
            return Err(ChatError::decode("animated emote frames differ in size"));
        }
        let frame_ms = if frame_ms == 0 {
            default_frame_ms.max(1)
        } else {
            frame_ms
        };
        Ok(Self { frames, frame_ms })
    }

    /// Frame duration in milliseconds (never zero).
    pub fn frame_ms(&self) -> u32 {
        self.frame_ms
    }

    /// Number of frames (never zero).
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.frames[0].width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.frames[0].height()
    }

    /// Frame shown at wall-clock time `wall_ms`.
    pub fn frame_at(&self, wall_ms: u64) -> &RgbaImage {
        &self.frames[frame_index(wall_ms, self.frame_ms, self.frames.len())]
    }
}

/// `floor(wall_ms / frame_ms) mod frame_count`.
///
/// A zero `frame_ms` is treated as 1 and a zero `frame_count` yields 0.
pub fn frame_index(wall_ms: u64, frame_ms: u32, frame_count: usize) -> usize {
    if frame_count == 0 {
        return 0;
    }
    ((wall_ms / u64::from(frame_ms.max(1))) % frame_count as u64) as usize
}

/// Decode emote or badge bytes.
///
/// GIF and animated WebP sources with more than one frame become [`Emote::Animated`]; the first
/// frame's delay is used for every frame. Everything else becomes a static RGBA image.
pub fn decode_emote(bytes: &[u8], default_frame_ms: u32) -> ChatResult<Emote> {
    let format = image::guess_format(bytes).map_err(|e| ChatError::decode(e.to_string()))?;

    let frames = match format {
        ImageFormat::Gif => {
            let decoder = image::codecs::gif::GifDecoder::new(Cursor::new(bytes))
                .context("open gif decoder")?;
            Some(decoder.into_frames().collect_frames().context("decode gif frames")?)
        }
        ImageFormat::WebP => {
            let decoder = image::codecs::webp::WebPDecoder::new(Cursor::new(bytes))
                .context("open webp decoder")?;
            if decoder.has_animation() {
                Some(decoder.into_frames().collect_frames().context("decode webp frames")?)
            } else {
                None
            }
        }
        _ => None,
    };

    match frames {
        Some(frames) if frames.len() > 1 => {
            let (num, den) = frames[0].delay().numer_denom_ms();
            let frame_ms = if den == 0 { 0 } else { num / den };
            let frames = frames.into_iter().map(|f| f.into_buffer()).collect();
            Ok(Emote::Animated(Arc::new(AnimatedEmote::new(
                frames,
                frame_ms,
                default_frame_ms,
            )?)))
        }
        Some(mut frames) if frames.len() == 1 => {
            Ok(Emote::Static(Arc::new(frames.remove(0).into_buffer())))
        }
        _ => decode_static(bytes).map(|img| Emote::Static(Arc::new(img))),
    }
}

/// Decode any supported image format into straight-alpha RGBA8.
pub fn decode_static(bytes: &[u8]) -> ChatResult<RgbaImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(dyn_img.to_rgba8())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
