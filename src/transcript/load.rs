use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{ChatError, ChatResult};
use crate::transcript::model::ChatEvent;

/// A fully loaded chat transcript, ordered by non-decreasing offset.
///
/// The ordering is a property of how transcripts are recorded and is not re-validated here.
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    events: Arc<[ChatEvent]>,
}

impl Transcript {
    /// Wrap already-built events.
    pub fn from_events(events: Vec<ChatEvent>) -> Self {
        Self {
            events: events.into(),
        }
    }

    /// Load a transcript file with one JSON record per line.
    ///
    /// Any malformed line aborts the load.
    #[tracing::instrument]
    pub fn load(path: &Path) -> ChatResult<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("open transcript '{}'", path.display()))?;
        let transcript = Self::parse(std::io::BufReader::new(file))?;
        tracing::info!(events = transcript.len(), "transcript loaded");
        Ok(transcript)
    }

    /// Parse transcript records from any line-oriented reader.
    pub fn parse(reader: impl BufRead) -> ChatResult<Self> {
        let mut events = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.map_err(|e| ChatError::transcript(line_no, e.to_string()))?;
            let event: ChatEvent = serde_json::from_str(line.trim_end_matches('\r'))
                .map_err(|e| ChatError::transcript(line_no, e.to_string()))?;
            events.push(event);
        }
        Ok(Self::from_events(events))
    }

    /// Shared handle to the events.
    pub fn events(&self) -> &Arc<[ChatEvent]> {
        &self.events
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the transcript holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Offset of the last event, or `0.0` when empty.
    pub fn span_secs(&self) -> f64 {
        self.events.last().map_or(0.0, |e| e.offset)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transcript/load.rs"]
mod tests;
