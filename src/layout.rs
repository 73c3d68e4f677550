//! Event-to-row layout.

/// Tokenizing, emote substitution and row packing.
pub mod engine;
