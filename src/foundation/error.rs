/// Convenience result type used across vodchat.
pub type ChatResult<T> = Result<T, ChatError>;

/// Top-level error taxonomy used by loading and asset APIs.
///
/// The replay engine itself never returns these: asset failures inside a draw cycle are logged
/// and the affected glyph is skipped.
#[derive(thiserror::Error, Debug)]
pub enum ChatError {
    /// A transcript line could not be parsed. Loading aborts on the first such line.
    #[error("transcript error at line {line}: {message}")]
    Transcript {
        /// 1-based line number in the transcript file.
        line: usize,
        /// Parser diagnostic.
        message: String,
    },

    /// An image is not present locally and could not be obtained.
    #[error("missing asset: {0}")]
    MissingAsset(String),

    /// Fetching asset bytes from a remote source failed.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Asset bytes could not be decoded into an image.
    #[error("decode error: {0}")]
    Decode(String),

    /// Invalid caller-provided data (colors, metadata tables, options).
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ChatError {
    /// Build a [`ChatError::Transcript`] value.
    pub fn transcript(line: usize, message: impl Into<String>) -> Self {
        Self::Transcript {
            line,
            message: message.into(),
        }
    }

    /// Build a [`ChatError::MissingAsset`] value.
    pub fn missing_asset(msg: impl Into<String>) -> Self {
        Self::MissingAsset(msg.into())
    }

    /// Build a [`ChatError::Fetch`] value.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Build a [`ChatError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`ChatError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
