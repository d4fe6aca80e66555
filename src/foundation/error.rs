/// Convenience result type used across timeslice.
pub type TimesliceResult<T> = Result<T, TimesliceError>;

/// Top-level error taxonomy used by sampling APIs.
///
/// Every variant except `Other` maps to one precondition a caller can act on. All of them are
/// fatal for the whole sampling run: steps share one sequential pass over the source, so there is
/// no step-local recovery.
#[derive(thiserror::Error, Debug)]
pub enum TimesliceError {
    /// Invalid user-provided configuration, detected before any frame is read.
    #[error("configuration error: {0}")]
    Config(String),

    /// The video source could not be located, probed or opened.
    #[error("source open error: {0}")]
    SourceOpen(String),

    /// The source ended before a frame that was expected to exist.
    #[error(
        "stream exhausted: frame {requested} was requested but the source ended after {frames_read} frames"
    )]
    StreamExhausted {
        /// Frame index the sampler was advancing to.
        requested: u64,
        /// Frames successfully read before the source ran dry.
        frames_read: u64,
    },

    /// Malformed frame data or a decoder failure mid-stream.
    #[error("decode error: {0}")]
    Decode(String),

    /// Errors while writing rasters or encoding the output video.
    #[error("encode error: {0}")]
    Encode(String),

    /// The run was cancelled through a [`crate::CancelToken`].
    #[error("cancelled after {frames_read} frames")]
    Cancelled {
        /// Frames read before cancellation was observed.
        frames_read: u64,
    },

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TimesliceError {
    /// Build a [`TimesliceError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`TimesliceError::SourceOpen`] value.
    pub fn source_open(msg: impl Into<String>) -> Self {
        Self::SourceOpen(msg.into())
    }

    /// Build a [`TimesliceError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`TimesliceError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
