use image::Rgba;
use rand::seq::IndexedRandom;

use crate::foundation::error::{ChatError, ChatResult};

/// Twitch's default chat name colors, used for speakers without a color of their own.
pub const DEFAULT_NAME_COLORS: [Rgba<u8>; 15] = [
    Rgba([0x00, 0x00, 0xff, 0xff]), // blue
    Rgba([0xff, 0x7f, 0x50, 0xff]), // coral
    Rgba([0x00, 0x5a, 0x9c, 0xff]), // dodger blue
    Rgba([0x00, 0xff, 0x7f, 0xff]), // spring green
    Rgba([0x9a, 0xcd, 0x32, 0xff]), // yellow green
    Rgba([0x00, 0xff, 0x00, 0xff]), // green
    Rgba([0xff, 0x45, 0x00, 0xff]), // orange red
    Rgba([0xff, 0x00, 0x00, 0xff]), // red
    Rgba([0xda, 0xa5, 0x20, 0xff]), // golden rod
    Rgba([0xff, 0x69, 0xb4, 0xff]), // hot pink
    Rgba([0x5f, 0x9e, 0xa0, 0xff]), // cadet blue
    Rgba([0x2e, 0x8b, 0x57, 0xff]), // sea green
    Rgba([0xd2, 0x69, 0x1e, 0xff]), // chocolate
    Rgba([0x8a, 0x2b, 0xe2, 0xff]), // blue violet
    Rgba([0xb2, 0x22, 0x22, 0xff]), // firebrick
];

/// Parse `#RRGGBB` / `#RRGGBBAA` (leading `#` optional, case-insensitive).
pub fn parse_hex_color(s: &str) -> ChatResult<Rgba<u8>> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);

    fn hex_byte(pair: &str) -> ChatResult<u8> {
        u8::from_str_radix(pair, 16)
            .map_err(|_| ChatError::validation(format!("invalid hex byte \"{pair}\"")))
    }

    if !s.is_ascii() {
        return Err(ChatError::validation("hex color must be ASCII"));
    }

    match s.len() {
        6 => Ok(Rgba([
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            0xff,
        ])),
        8 => Ok(Rgba([
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            hex_byte(&s[6..8])?,
        ])),
        _ => Err(ChatError::validation(
            "hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)",
        )),
    }
}

/// Picks a name color for speakers whose event carries none.
pub trait ColorSource: Send {
    /// Return the color for the next uncolored speaker.
    fn pick(&mut self) -> Rgba<u8>;
}

/// Uniform pick from [`DEFAULT_NAME_COLORS`] using the thread-local RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomPalette;

impl RandomPalette {
    /// Create a palette picker.
    pub fn new() -> Self {
        Self
    }
}

impl ColorSource for RandomPalette {
    fn pick(&mut self) -> Rgba<u8> {
        DEFAULT_NAME_COLORS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(DEFAULT_NAME_COLORS[0])
    }
}

/// Deterministic round-robin over a fixed list of colors.
#[derive(Clone, Debug)]
pub struct CyclePalette {
    colors: Vec<Rgba<u8>>,
    next: usize,
}

impl CyclePalette {
    /// Cycle through `colors` in order. An empty list falls back to [`DEFAULT_NAME_COLORS`].
    pub fn new(colors: Vec<Rgba<u8>>) -> Self {
        let colors = if colors.is_empty() {
            DEFAULT_NAME_COLORS.to_vec()
        } else {
            colors
        };
        Self { colors, next: 0 }
    }
}

impl ColorSource for CyclePalette {
    fn pick(&mut self) -> Rgba<u8> {
        let c = self.colors[self.next % self.colors.len()];
        self.next = self.next.wrapping_add(1);
        c
    }
}
