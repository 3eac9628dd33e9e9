// Domain models - Core types and data structures

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use image::RgbImage;

use crate::error::TrimError;

/// Frame rate used whenever the source does not report a usable one
pub const DEFAULT_FPS: f64 = 30.0;

/// A decoded RGB frame and its position in the source stream.
///
/// Frames live for a single controller tick; the letterbox resizer produces a
/// new `Frame` with the same index rather than mutating the decoded one.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub index: u64,
    pub image: RgbImage,
}

impl Frame {
    /// Create a new frame
    pub fn new(index: u64, image: RgbImage) -> Self {
        Self { index, image }
    }

    /// Create a black frame of the given size
    pub fn black(index: u64, width: u32, height: u32) -> Self {
        Self {
            index,
            image: RgbImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Get (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Metadata of an opened source video
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    /// Reported frame rate, 0 when unknown
    pub fps: f64,
    /// Total number of frames, 0 means the source is unusable
    pub frame_count: u64,
    pub width: u32,
    pub height: u32,
}

impl VideoInfo {
    /// Create new video info
    pub fn new(fps: f64, frame_count: u64, width: u32, height: u32) -> Self {
        Self {
            fps,
            frame_count,
            width,
            height,
        }
    }

    /// Frame rate to drive playback and encoding, falling back when unreported
    pub fn effective_fps(&self, fallback: f64) -> f64 {
        if self.fps.is_finite() && self.fps > 0.0 {
            self.fps
        } else {
            fallback
        }
    }

    /// Check if the source has no frames
    pub fn is_empty(&self) -> bool {
        self.frame_count == 0
    }

    /// Duration in seconds at the effective frame rate
    pub fn duration_seconds(&self, fallback_fps: f64) -> f64 {
        self.frame_count as f64 / self.effective_fps(fallback_fps)
    }
}

/// Abstract operator commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    SeekForward,
    SeekBack,
    TogglePause,
    StartSegment,
    EndSegment,
    Quit,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::SeekForward => "seek-forward",
            Command::SeekBack => "seek-back",
            Command::TogglePause => "toggle-pause",
            Command::StartSegment => "start-segment",
            Command::EndSegment => "end-segment",
            Command::Quit => "quit",
        };
        write!(f, "{}", name)
    }
}

/// Raw key symbols produced by an input backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Space,
    Left,
    Right,
    Escape,
    /// Ctrl+C while the terminal is in raw mode
    Interrupt,
    Other,
}

/// Playback half of the controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Paused,
}

impl PlaybackState {
    /// Flip between playing and paused
    pub fn toggled(self) -> Self {
        match self {
            PlaybackState::Playing => PlaybackState::Paused,
            PlaybackState::Paused => PlaybackState::Playing,
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Playing => write!(f, "PLAYING"),
            PlaybackState::Paused => write!(f, "PAUSED"),
        }
    }
}

/// Per-source session state, reset for every file
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Index of the next frame the source will produce
    pub current_frame_index: u64,
    pub playback: PlaybackState,
    /// Output path of the open segment, if recording
    pub active_segment: Option<PathBuf>,
    /// Monotonic per-source counter, incremented before each segment opens
    pub trim_counter: u32,
}

impl SessionState {
    /// Initial state: playing, not recording
    pub fn new() -> Self {
        Self {
            current_frame_index: 0,
            playback: PlaybackState::Playing,
            active_segment: None,
            trim_counter: 0,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.playback == PlaybackState::Paused
    }

    pub fn is_recording(&self) -> bool {
        self.active_segment.is_some()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// One encoder candidate in the ordered preference list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderCandidate {
    /// x264 via its registered encoder name
    Libx264,
    /// Whatever encoder the linked FFmpeg registers as default for H.264
    H264,
    /// Cisco OpenH264
    OpenH264,
    /// MPEG-4 Part 2, the most widely available fallback
    Mpeg4,
}

impl EncoderCandidate {
    /// Default preference order, best compression first
    pub fn default_preferences() -> Vec<EncoderCandidate> {
        vec![
            EncoderCandidate::Libx264,
            EncoderCandidate::H264,
            EncoderCandidate::OpenH264,
            EncoderCandidate::Mpeg4,
        ]
    }

    /// Name used in configuration and logs
    pub fn name(&self) -> &'static str {
        match self {
            EncoderCandidate::Libx264 => "libx264",
            EncoderCandidate::H264 => "h264",
            EncoderCandidate::OpenH264 => "libopenh264",
            EncoderCandidate::Mpeg4 => "mpeg4",
        }
    }

    /// Check if this candidate produces H.264
    pub fn is_h264(&self) -> bool {
        !matches!(self, EncoderCandidate::Mpeg4)
    }
}

impl fmt::Display for EncoderCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for EncoderCandidate {
    type Err = TrimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "libx264" | "x264" | "avc1" => Ok(EncoderCandidate::Libx264),
            "h264" => Ok(EncoderCandidate::H264),
            "libopenh264" | "openh264" => Ok(EncoderCandidate::OpenH264),
            "mpeg4" | "mp4v" => Ok(EncoderCandidate::Mpeg4),
            other => Err(TrimError::Config {
                message: format!(
                    "Unknown encoder: {}. Valid encoders: libx264, h264, libopenh264, mpeg4",
                    other
                ),
            }),
        }
    }
}

/// What the preview shows beneath the frame
#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub file_name: String,
    pub frame_index: u64,
    pub frame_count: u64,
    pub fps: f64,
    pub playback: PlaybackState,
    /// File name of the segment being recorded
    pub recording: Option<String>,
    /// Last operator-facing message
    pub message: Option<String>,
}

/// One finished output segment
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentReport {
    pub path: PathBuf,
    pub frames_written: u64,
    pub encoder: EncoderCandidate,
}

/// Outcome of processing one source file
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub source: PathBuf,
    pub segments: Vec<SegmentReport>,
    pub frames_shown: u64,
    /// The operator issued QUIT; the batch stops after this file
    pub quit: bool,
}

impl SessionReport {
    /// Create an empty report for a source
    pub fn new(source: PathBuf) -> Self {
        Self {
            source,
            segments: Vec::new(),
            frames_shown: 0,
            quit: false,
        }
    }
}

/// Outcome of a whole batch run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub sessions: Vec<SessionReport>,
    pub skipped: Vec<PathBuf>,
    pub quit: bool,
}

impl BatchReport {
    /// Total number of segment files written
    pub fn segment_count(&self) -> usize {
        self.sessions.iter().map(|s| s.segments.len()).sum()
    }
}
