use std::time::Duration;

pub use image::{Rgba, RgbaImage};

/// Geometry, palette and timing constants for chat replay.
///
/// `Default` yields the values the player ships with; tests and the CLI override individual
/// fields.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatConfig {
    /// Chat canvas width in pixels.
    pub width: u32,
    /// Height of one wrapped row.
    pub line_height: u32,
    /// Horizontal padding on each side of a block.
    pub pad_x: u32,
    /// Vertical padding above and below a block's rows.
    pub pad_y: u32,
    /// Height of the retained scroll history.
    pub buffer_height: u32,
    /// Events preloaded above the viewport on seek.
    pub lookback: usize,
    /// Frame duration for animated emotes whose source carries none (or zero).
    pub default_frame_ms: u32,
    /// Fill color of an empty scroll buffer.
    pub base_color: Rgba<u8>,
    /// Alternating block backgrounds, first one used for the first block of a session.
    pub block_backgrounds: [Rgba<u8>; 2],
    /// Color of message text and the `": "` separator.
    pub text_color: Rgba<u8>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            width: 340,
            line_height: 25,
            pad_x: 5,
            pad_y: 5,
            buffer_height: 2000,
            lookback: 30,
            default_frame_ms: 40,
            base_color: Rgba([0x33, 0x39, 0x3b, 0xff]),
            block_backgrounds: [Rgba([0x1f, 0x19, 0x25, 0xff]), Rgba([0x19, 0x17, 0x1c, 0xff])],
            text_color: Rgba([0xda, 0xd8, 0xda, 0xff]),
        }
    }
}

impl ChatConfig {
    /// Width available to row items once both paddings are removed.
    pub fn content_width(&self) -> u32 {
        self.width.saturating_sub(2 * self.pad_x)
    }

    /// Pixel height of a block holding `rows` rows.
    pub fn block_height(&self, rows: usize) -> u32 {
        2 * self.pad_y + self.line_height * rows as u32
    }
}

/// Options for the render worker.
#[derive(Clone, Debug)]
pub struct WorkerOpts {
    /// Minimum pause after each published frame; caps the redraw rate.
    pub tick: Duration,
    /// Name given to the worker thread.
    pub thread_name: String,
}

impl Default for WorkerOpts {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(20),
            thread_name: "vodchat-render".to_string(),
        }
    }
}

/// Format playback seconds as `HH:MM:SS`.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() {
        seconds.max(0.0).round() as u64
    } else {
        0
    };
    let (hours, rest) = (total / 3600, total % 3600);
    format!("{hours:02}:{:02}:{:02}", rest / 60, rest % 60)
}
