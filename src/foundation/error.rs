/// Convenience result type used across bitreel.
pub type BitreelResult<T> = Result<T, BitreelError>;

/// Top-level error type for bitreel APIs.
///
/// `Decoded::EndOfStream` is how a decoder says it is done; it never surfaces as an error.
#[derive(thiserror::Error, Debug)]
pub enum BitreelError {
    /// Invalid geometry, options, or config file contents.
    #[error("configuration error: {0}")]
    Config(String),

    /// The source file is unreadable, too small, or changed underneath the run.
    #[error("input error: {0}")]
    Input(String),

    /// The output stream or an extracted frame file could not be written.
    #[error("destination error: {0}")]
    Destination(String),

    /// The codec collaborator rejected a frame, failed, or produced malformed data.
    #[error("codec error: {0}")]
    Codec(String),

    /// Wrapped lower-level error with context.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BitreelError {
    /// Build a [`BitreelError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`BitreelError::Input`] value.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Build a [`BitreelError::Destination`] value.
    pub fn destination(msg: impl Into<String>) -> Self {
        Self::Destination(msg.into())
    }

    /// Build a [`BitreelError::Codec`] value.
    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
