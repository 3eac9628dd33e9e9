//! BoxTrim Interactive Video Trimmer Library
//!
//! Plays a folder of videos one after another, letterboxed into a square
//! preview, and writes operator-marked segments as square MP4 files.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod engine;
pub mod error;
pub mod output;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use app::{BatchInteractor, KeyCommandDispatcher, StopReason, TrimSessionController};
pub use config_initialization::{CliOverrides, SessionConfig};
pub use domain::model::{
    BatchReport, Command, EncoderCandidate, Frame, Key, SegmentReport, SessionReport, VideoInfo,
};
pub use engine::LetterboxResizer;
pub use error::{TrimError, TrimResult};

/// Initialize BoxTrim library
pub fn init() -> TrimResult<()> {
    ffmpeg_next::init()?;
    // libav logs straight to stderr, underneath the preview
    ffmpeg_next::util::log::set_level(ffmpeg_next::util::log::Level::Error);
    Ok(())
}
