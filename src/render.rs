//! Block composition, the scrolling chat buffer, and the timestamp-driven render worker.

/// Animated items repainted every frame.
pub mod animation;
/// Per-event block composition.
pub mod block;
/// The replay engine.
pub mod replay;
/// Render worker, mailbox and output surfaces.
pub mod scheduler;
/// Fixed-size scroll history.
pub mod scroll;
