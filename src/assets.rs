//! Image and glyph sources: provider metadata, lazy fetch-and-decode caches, and text rendering.

/// Emote and badge image decoding.
pub mod decode;
/// Provider identities and the remote fetch seam.
pub mod fetch;
/// Text measurement, rasterization and glyph memoization.
pub mod glyph;
pub mod providers;
/// Metadata tables and shared image caches.
pub mod store;
