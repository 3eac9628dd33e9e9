// Ports - Interface definitions (contracts)

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::model::*;
use crate::error::TrimResult;

/// Port for sequential, seekable frame retrieval from one source video
pub trait FrameSource {
    /// Metadata captured when the source was opened
    fn info(&self) -> &VideoInfo;

    /// Index of the next frame `next_frame` will produce
    fn position(&self) -> u64;

    /// Decode the next frame; `Ok(None)` signals end of stream
    fn next_frame(&mut self) -> TrimResult<Option<Frame>>;

    /// Move the read cursor; the target is clamped into `[0, frame_count]`
    /// and the resulting position is returned
    fn seek(&mut self, target: i64) -> TrimResult<u64>;

    /// Release decode resources; calling it again is a no-op
    fn close(&mut self);
}

/// Port for opening source videos
pub trait SourceProvider {
    type Source: FrameSource;

    /// Open a source, failing with `CannotOpen` or `EmptyVideo`
    fn open(&self, path: &Path) -> TrimResult<Self::Source>;
}

/// Parameters of a segment file to be encoded
#[derive(Debug, Clone, PartialEq)]
pub struct SinkSpec {
    pub path: PathBuf,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
}

/// Port for one initialized encoder writing one output file
pub trait FrameSink {
    /// Encode and mux one frame
    fn write(&mut self, frame: &Frame) -> TrimResult<()>;

    /// Flush the encoder and finalize the container
    fn finish(&mut self) -> TrimResult<()>;
}

/// Port for initializing encoders
pub trait EncoderBackend {
    type Sink: FrameSink;

    /// Try to initialize a single encoder candidate for `spec`
    fn open_sink(&self, candidate: EncoderCandidate, spec: &SinkSpec) -> TrimResult<Self::Sink>;
}

/// Port for the single preview surface
pub trait PreviewSurface {
    /// Show a frame together with the session status
    fn present(&mut self, frame: &Frame, status: &StatusLine) -> TrimResult<()>;

    /// Release the surface; calling it again is a no-op
    fn close(&mut self);
}

/// Port for raw keyboard input
pub trait KeyInput {
    /// Wait for one key; `None` timeout waits indefinitely.
    /// Returns `Ok(None)` when the timeout elapses without input.
    fn wait_key(&mut self, timeout: Option<Duration>) -> TrimResult<Option<Key>>;

    /// Take a key that is already pending without blocking
    fn pending_key(&mut self) -> TrimResult<Option<Key>>;
}
