//! Error handling module for BoxTrim

use thiserror::Error;

/// Main error type for BoxTrim operations
#[derive(Error, Debug)]
pub enum TrimError {
    /// Source file missing, unreadable or without a decodable video stream
    #[error("Cannot open video {path}: {message}")]
    CannotOpen { path: String, message: String },

    /// Source opened but reports no frames
    #[error("Video has no frames: {path}")]
    EmptyVideo { path: String },

    /// Every encoder in the preference list failed to initialize
    #[error("No encoder available for {path} (tried: {tried})")]
    NoEncoderAvailable { path: String, tried: String },

    /// A frame reached a writer configured for a different size
    #[error("Frame size mismatch: writer expects {expected:?}, got {actual:?}")]
    FrameSizeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// Unrecoverable decoding failure
    #[error("Decoding failed: {message}")]
    Decode { message: String },

    /// Encoding or muxing failure on an open segment
    #[error("Encoding failed: {message}")]
    Encode { message: String },

    /// Terminal preview or key input failure
    #[error("Terminal error: {message}")]
    Terminal { message: String },

    /// Invalid configuration value or unreadable config file
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// FFmpeg error
    #[error("FFmpeg error: {0}")]
    FFmpeg(#[from] ffmpeg_next::Error),
}

impl TrimError {
    /// Per-file errors after which the batch moves on to the next source
    pub fn is_skippable(&self) -> bool {
        matches!(self, TrimError::CannotOpen { .. } | TrimError::EmptyVideo { .. })
    }
}

/// Result type alias for BoxTrim operations
pub type TrimResult<T> = std::result::Result<T, TrimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skippable_errors() {
        let cannot_open = TrimError::CannotOpen {
            path: "a.mp4".to_string(),
            message: "missing".to_string(),
        };
        let empty = TrimError::EmptyVideo { path: "b.mp4".to_string() };
        let decode = TrimError::Decode { message: "broken".to_string() };

        assert!(cannot_open.is_skippable());
        assert!(empty.is_skippable());
        assert!(!decode.is_skippable());
    }

    #[test]
    fn test_no_encoder_message_lists_candidates() {
        let err = TrimError::NoEncoderAvailable {
            path: "out.mp4".to_string(),
            tried: "libx264, mpeg4".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No encoder available for out.mp4 (tried: libx264, mpeg4)"
        );
    }
}
