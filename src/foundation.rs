//! Shared configuration, colors and the error taxonomy.

/// Palette and name-color sources.
pub mod color;
/// Configuration structs and small shared helpers.
pub mod core;
/// Error taxonomy.
pub mod error;
