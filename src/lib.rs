//! vodchat replays a recorded Twitch chat in sync with VOD playback.
//!
//! A [`Transcript`] of timestamped events is turned into a scrolling chat image:
//!
//! - [`LayoutEngine`] packs badges, names, text and emotes into rows
//! - [`ChatReplay`] composites one block per event into a fixed-size [`ScrollBuffer`] as playback
//!   time passes each event's offset, and restarts from any point through `seek`
//! - [`RenderWorker`] drives a replay from a single-slot mailbox on its own thread and publishes
//!   frames to a [`ChatSurface`]
//!
//! Emote and badge images come from [`ChatAssets`], lazily decoded from local asset folders and
//! fetched through an [`AssetFetcher`] when missing.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod assets;
pub mod foundation;
pub mod layout;
pub mod render;
pub mod transcript;

pub use crate::assets::decode::{AnimatedEmote, Emote, decode_emote, frame_index};
pub use crate::assets::fetch::{AssetFetcher, OfflineFetcher, Provider};
pub use crate::assets::glyph::{
    FixedAdvanceRasterizer, GlyphCache, SvgTextRasterizer, TextRasterizer,
};
pub use crate::assets::store::{
    BadgeCache, ChannelRef, ChatAssets, EmoteTable, PrefetchStats, ProviderCache, spawn_prefetch,
};
pub use crate::foundation::color::{
    ColorSource, CyclePalette, DEFAULT_NAME_COLORS, RandomPalette, parse_hex_color,
};
pub use crate::foundation::core::{ChatConfig, WorkerOpts, format_time};
pub use crate::foundation::error::{ChatError, ChatResult};
pub use crate::layout::engine::{LayoutEngine, RenderedItem, Row, tokenize};
pub use crate::render::block::{BackgroundAlternator, Block, compose_block};
pub use crate::render::replay::{ChatReplay, Cursor};
pub use crate::render::scheduler::{
    ChatMsg, ChatSurface, InMemorySurface, Mailbox, RenderWorker, ReplayHandle,
};
pub use crate::render::scroll::ScrollBuffer;
pub use crate::transcript::load::Transcript;
pub use crate::transcript::model::{Badge, ChatEvent, Fragment};
