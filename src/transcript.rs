//! Chat transcripts: event records and the JSON-lines loader.

/// Transcript files.
pub mod load;
/// Event records.
pub mod model;
