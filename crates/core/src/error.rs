/// Result alias that carries the custom [`OverlayError`] type.
pub type Result<T> = std::result::Result<T, OverlayError>;

/// Common error type for the core crate.
///
/// Nothing in the frame loop itself is fallible — audio and viewport
/// problems degrade to neutral defaults instead of erroring. The variants
/// below cover the ambient surfaces that genuinely can fail: configuration
/// parsing, frame export, and audio tap attachment.
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    /// Free-form failure message, mainly used by tap implementations to
    /// report why the platform visualizer could not be attached.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Configuration or frame data failed to (de)serialise.
    #[error("{0}")]
    Serde(#[from] serde_json::Error),
}

impl OverlayError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for OverlayError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for OverlayError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
