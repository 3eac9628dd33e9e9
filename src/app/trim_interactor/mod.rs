// Trim interactor - Playback/record state machine for one source file

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::app::dispatcher::KeyCommandDispatcher;
use crate::config_initialization::SessionConfig;
use crate::domain::model::*;
use crate::domain::rules::{PlaybackTiming, SeekPolicy};
use crate::engine::LetterboxResizer;
use crate::error::TrimResult;
use crate::output::{OutputNaming, SegmentWriter};
use crate::ports::*;
use crate::utils::path::display_name;

/// Why a session reached its terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    Quit,
}

/// Drives one source file: pulls frames, letterboxes and presents them,
/// polls one operator command per tick and writes frames to the open segment.
///
/// At most one segment is open at a time. Every exit path (end of stream,
/// quit, error) closes the open segment and releases the source before
/// `run` returns.
pub struct TrimSessionController<'a, S, B, P, I>
where
    S: FrameSource,
    B: EncoderBackend,
    P: PreviewSurface,
    I: KeyInput,
{
    config: &'a SessionConfig,
    naming: OutputNaming,
    source_path: PathBuf,
    source: S,
    backend: &'a B,
    preview: &'a mut P,
    dispatcher: &'a mut KeyCommandDispatcher<I>,
    resizer: LetterboxResizer,
    state: SessionState,
    segment: Option<SegmentWriter<B::Sink>>,
    report: SessionReport,
    message: Option<String>,
    fps: f64,
    seek_step: u64,
}

impl<'a, S, B, P, I> TrimSessionController<'a, S, B, P, I>
where
    S: FrameSource,
    B: EncoderBackend,
    P: PreviewSurface,
    I: KeyInput,
{
    /// Create a session for an already opened source
    pub fn new(
        config: &'a SessionConfig,
        source_path: &Path,
        source: S,
        backend: &'a B,
        preview: &'a mut P,
        dispatcher: &'a mut KeyCommandDispatcher<I>,
    ) -> Self {
        let fps = source.info().effective_fps(config.fallback_fps);
        let seek_step = SeekPolicy::step_frames(fps, config.seek_seconds);

        Self {
            config,
            naming: OutputNaming::new(&config.output_dir, &config.date_tag),
            source_path: source_path.to_path_buf(),
            source,
            backend,
            preview,
            dispatcher,
            resizer: LetterboxResizer::new(config.target_size),
            state: SessionState::new(),
            segment: None,
            report: SessionReport::new(source_path.to_path_buf()),
            message: None,
            fps,
            seek_step,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Frame rate used for the tick delay, seek distance and output files
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Frames covered by one seek command
    pub fn seek_step(&self) -> u64 {
        self.seek_step
    }

    /// Run until end of stream, quit or an unrecoverable error
    pub fn run(mut self) -> TrimResult<SessionReport> {
        let info = self.source.info().clone();
        info!(
            "Processing: {} | Original: {}x{} | Output: {}x{} | FPS: {}",
            display_name(&self.source_path),
            info.width,
            info.height,
            self.config.target_size,
            self.config.target_size,
            info.fps
        );
        if info.fps <= 0.0 || !info.fps.is_finite() {
            warn!("Source reports no frame rate, using {} fps", self.fps);
        }

        let outcome = self.run_loop();

        // Cleanup runs on every exit path
        self.end_segment();
        self.source.close();

        let reason = outcome?;
        self.report.quit = reason == StopReason::Quit;
        info!(
            "Finished {} ({:?}): {} frames shown, {} segments",
            display_name(&self.source_path),
            reason,
            self.report.frames_shown,
            self.report.segments.len()
        );
        Ok(self.report)
    }

    fn run_loop(&mut self) -> TrimResult<StopReason> {
        let mut current: Option<Frame> = None;
        loop {
            if let Some(reason) = self.tick(&mut current)? {
                return Ok(reason);
            }
        }
    }

    /// One iteration: acquire, present, poll, dispatch, record
    fn tick(&mut self, current: &mut Option<Frame>) -> TrimResult<Option<StopReason>> {
        let mut acquired = false;

        if !self.state.is_paused() {
            match self.source.next_frame()? {
                Some(frame) => {
                    *current = Some(self.resizer.resize(&frame));
                    acquired = true;
                    self.report.frames_shown += 1;
                }
                None => {
                    debug!("End of stream reached");
                    return Ok(Some(StopReason::EndOfStream));
                }
            }
            self.state.current_frame_index = self.source.position();
        }

        if let Some(frame) = current.as_ref() {
            let status = self.status_line();
            self.preview.present(frame, &status)?;
        }

        let timeout = PlaybackTiming::poll_timeout(self.state.playback, self.fps);
        if let Some(command) = self.dispatcher.poll(timeout)? {
            debug!(%command, frame = self.state.current_frame_index, "Command received");
            if command == Command::Quit {
                info!("User exited");
                return Ok(Some(StopReason::Quit));
            }
            self.dispatch(command);
        }

        // Only frames acquired this tick are recorded, never a paused repeat
        if acquired {
            if let Some(frame) = current.as_ref() {
                self.record(frame);
            }
        }

        Ok(None)
    }

    fn dispatch(&mut self, command: Command) {
        match command {
            Command::StartSegment => self.start_segment(),
            Command::EndSegment => self.end_segment(),
            Command::SeekForward | Command::SeekBack => self.seek(command),
            Command::TogglePause => {
                self.state.playback = self.state.playback.toggled();
                info!("{}", if self.state.is_paused() { "Paused" } else { "Resumed" });
                self.message = None;
            }
            Command::Quit => {}
        }
    }

    fn start_segment(&mut self) {
        if self.segment.is_some() {
            debug!("Start ignored, already recording");
            return;
        }

        self.state.trim_counter += 1;
        let path = self.naming.segment_path(&self.source_path, self.state.trim_counter);
        let spec = SinkSpec {
            path: path.clone(),
            fps: self.fps,
            width: self.config.target_size,
            height: self.config.target_size,
        };

        match SegmentWriter::open_segment(self.backend, &self.config.encoders, spec) {
            Ok(writer) => {
                info!("Recording started: {}", path.display());
                self.message = Some(format!("Recording started: {}", display_name(&path)));
                self.state.active_segment = Some(path);
                self.segment = Some(writer);
            }
            Err(e) => {
                error!("Could not initialize video writer for {}: {}", path.display(), e);
                self.message = Some(format!("ERROR: {}", e));
            }
        }
    }

    /// Close the open segment, if any; a no-op when not recording
    fn end_segment(&mut self) {
        let Some(mut writer) = self.segment.take() else {
            return;
        };
        self.state.active_segment = None;

        match writer.close() {
            Ok(()) => {
                info!("Saved: {} ({} frames)", writer.path().display(), writer.frames_written());
                self.message = Some(format!("Saved: {}", display_name(writer.path())));
                self.report.segments.push(writer.report());
            }
            Err(e) => {
                error!("Failed to finalize {}: {}", writer.path().display(), e);
                self.message = Some(format!("ERROR: {}", e));
            }
        }
    }

    fn seek(&mut self, command: Command) {
        let frame_count = self.source.info().frame_count;
        let current = self.source.position();
        let Some(target) = SeekPolicy::target_for(command, current, self.seek_step, frame_count) else {
            return;
        };

        let target = target.min(i64::MAX as u64) as i64;
        match self.source.seek(target) {
            Ok(position) => {
                self.state.current_frame_index = position;
                let verb = if command == Command::SeekForward {
                    "Fast-forwarded"
                } else {
                    "Rewound"
                };
                info!("{} to frame: {}", verb, position);
                self.message = Some(format!("{} to frame {}", verb, position));
            }
            Err(e) => {
                warn!("Seek to frame {} failed: {}", target, e);
                self.message = Some(format!("Seek failed: {}", e));
                self.state.current_frame_index = self.source.position();
            }
        }
    }

    fn record(&mut self, frame: &Frame) {
        let Some(writer) = self.segment.as_mut() else {
            return;
        };
        if let Err(e) = writer.write(frame) {
            error!("Failed to write frame {}: {}", frame.index, e);
            self.end_segment();
            self.message = Some(format!("Recording stopped: {}", e));
        }
    }

    fn status_line(&self) -> StatusLine {
        StatusLine {
            file_name: display_name(&self.source_path),
            frame_index: self.state.current_frame_index,
            frame_count: self.source.info().frame_count,
            fps: self.fps,
            playback: self.state.playback,
            recording: self.state.active_segment.as_deref().map(display_name),
            message: self.message.clone(),
        }
    }
}
