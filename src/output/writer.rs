//! Segment writer with ordered encoder fallback

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::domain::model::{EncoderCandidate, Frame, SegmentReport};
use crate::error::{TrimError, TrimResult};
use crate::ports::{EncoderBackend, FrameSink, SinkSpec};

/// One open output segment.
///
/// Owns exactly one encoder sink. `close` finalizes the file and may be called
/// any number of times; dropping an open writer closes it as well.
pub struct SegmentWriter<S: FrameSink> {
    path: PathBuf,
    encoder: EncoderCandidate,
    frame_size: (u32, u32),
    sink: Option<S>,
    frames_written: u64,
}

impl<S: FrameSink> SegmentWriter<S> {
    /// Open a segment with the first encoder candidate that initializes.
    ///
    /// Each failed attempt removes whatever file it left behind, so a
    /// `NoEncoderAvailable` failure leaves no partial output.
    pub fn open_segment<B>(
        backend: &B,
        candidates: &[EncoderCandidate],
        spec: SinkSpec,
    ) -> TrimResult<Self>
    where
        B: EncoderBackend<Sink = S>,
    {
        for candidate in candidates {
            match backend.open_sink(*candidate, &spec) {
                Ok(sink) => {
                    info!(
                        path = %spec.path.display(),
                        encoder = %candidate,
                        "Segment writer opened"
                    );
                    return Ok(Self {
                        path: spec.path.clone(),
                        encoder: *candidate,
                        frame_size: (spec.width, spec.height),
                        sink: Some(sink),
                        frames_written: 0,
                    });
                }
                Err(e) => {
                    debug!("Encoder {} failed to initialize: {}", candidate, e);
                    remove_partial(&spec.path);
                }
            }
        }

        let tried = candidates
            .iter()
            .map(|c| c.name())
            .collect::<Vec<_>>()
            .join(", ");
        Err(TrimError::NoEncoderAvailable {
            path: spec.path.display().to_string(),
            tried,
        })
    }

    /// Append one frame; its size must match the configured frame size
    pub fn write(&mut self, frame: &Frame) -> TrimResult<()> {
        if frame.dimensions() != self.frame_size {
            return Err(TrimError::FrameSizeMismatch {
                expected: self.frame_size,
                actual: frame.dimensions(),
            });
        }

        let sink = self.sink.as_mut().ok_or_else(|| TrimError::Encode {
            message: format!("Segment already closed: {}", self.path.display()),
        })?;
        sink.write(frame)?;
        self.frames_written += 1;
        Ok(())
    }

    /// Flush and finalize the output file; a no-op once closed
    pub fn close(&mut self) -> TrimResult<()> {
        let Some(mut sink) = self.sink.take() else {
            return Ok(());
        };

        sink.finish()?;
        info!(
            path = %self.path.display(),
            frames = self.frames_written,
            "Segment saved"
        );
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.sink.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Summary of what this segment wrote
    pub fn report(&self) -> SegmentReport {
        SegmentReport {
            path: self.path.clone(),
            frames_written: self.frames_written,
            encoder: self.encoder,
        }
    }
}

impl<S: FrameSink> Drop for SegmentWriter<S> {
    fn drop(&mut self) {
        if self.is_open() {
            warn!("Segment dropped while open, finalizing: {}", self.path.display());
            if let Err(e) = self.close() {
                warn!("Failed to finalize segment {}: {}", self.path.display(), e);
            }
        }
    }
}

fn remove_partial(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed partial output: {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove partial output {}: {}", path.display(), e),
    }
}
