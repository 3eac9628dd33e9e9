//! In-memory ports shared by the integration tests
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use boxtrim::domain::model::*;
use boxtrim::error::{TrimError, TrimResult};
use boxtrim::ports::*;
use boxtrim::SessionConfig;
use image::{Rgb, RgbImage};
use tempfile::TempDir;

/// Config writing into `dir` with a fixed date tag
pub fn test_config(dir: &TempDir) -> SessionConfig {
    let mut config = SessionConfig::with_defaults("1_may");
    config.source_dir = dir.path().join("videos");
    config.output_dir = dir.path().join("trimmed");
    config
}

/// Synthetic source of `frame_count` small landscape frames
pub struct FakeSource {
    info: VideoInfo,
    position: u64,
    fail_at: Option<u64>,
    pub seeks: Rc<RefCell<Vec<u64>>>,
    pub closes: Rc<Cell<u32>>,
}

impl FakeSource {
    pub fn new(frame_count: u64, fps: f64) -> Self {
        Self {
            info: VideoInfo::new(fps, frame_count, 32, 18),
            position: 0,
            fail_at: None,
            seeks: Rc::new(RefCell::new(Vec::new())),
            closes: Rc::new(Cell::new(0)),
        }
    }

    /// Fail with a decode error when frame `index` is requested
    pub fn failing_at(mut self, index: u64) -> Self {
        self.fail_at = Some(index);
        self
    }
}

impl FrameSource for FakeSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn next_frame(&mut self) -> TrimResult<Option<Frame>> {
        if self.position >= self.info.frame_count {
            return Ok(None);
        }
        if self.fail_at == Some(self.position) {
            return Err(TrimError::Decode {
                message: format!("corrupt frame {}", self.position),
            });
        }

        let shade = (self.position % 256) as u8;
        let image = RgbImage::from_pixel(self.info.width, self.info.height, Rgb([shade, 128, 255 - shade]));
        let frame = Frame::new(self.position, image);
        self.position += 1;
        Ok(Some(frame))
    }

    fn seek(&mut self, target: i64) -> TrimResult<u64> {
        let target = target.clamp(0, self.info.frame_count as i64) as u64;
        self.seeks.borrow_mut().push(target);
        self.position = target;
        Ok(target)
    }

    fn close(&mut self) {
        self.closes.set(self.closes.get() + 1);
    }
}

/// What one fake provider `open` should produce
#[derive(Debug, Clone, Copy)]
pub enum FakeFile {
    Video { frame_count: u64, fps: f64 },
    Unreadable,
    Empty,
}

/// Provider serving `FakeSource`s by file name
#[derive(Default)]
pub struct FakeProvider {
    files: HashMap<String, FakeFile>,
    pub opened: RefCell<Vec<String>>,
}

impl FakeProvider {
    pub fn with(mut self, name: &str, file: FakeFile) -> Self {
        self.files.insert(name.to_string(), file);
        self
    }
}

impl SourceProvider for FakeProvider {
    type Source = FakeSource;

    fn open(&self, path: &Path) -> TrimResult<FakeSource> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.opened.borrow_mut().push(name.clone());

        match self.files.get(&name) {
            Some(FakeFile::Video { frame_count, fps }) => Ok(FakeSource::new(*frame_count, *fps)),
            Some(FakeFile::Empty) => Err(TrimError::EmptyVideo {
                path: path.display().to_string(),
            }),
            Some(FakeFile::Unreadable) | None => Err(TrimError::CannotOpen {
                path: path.display().to_string(),
                message: "unsupported container".to_string(),
            }),
        }
    }
}

/// One sink the fake backend handed out
#[derive(Debug, Clone, Default)]
pub struct SinkRecord {
    pub path: PathBuf,
    pub encoder: Option<EncoderCandidate>,
    pub frame_indices: Vec<u64>,
    pub sizes: Vec<(u32, u32)>,
    pub finishes: u32,
}

#[derive(Debug, Default)]
pub struct BackendLog {
    pub attempts: Vec<EncoderCandidate>,
    pub sinks: Vec<SinkRecord>,
    pub open_now: u32,
    pub max_open: u32,
}

/// Backend recording every attempt and frame
#[derive(Default)]
pub struct FakeBackend {
    pub log: Rc<RefCell<BackendLog>>,
    unavailable: Vec<EncoderCandidate>,
    fail_all: bool,
    fail_write_after: Option<usize>,
}

impl FakeBackend {
    pub fn without(mut self, candidate: EncoderCandidate) -> Self {
        self.unavailable.push(candidate);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_all = true;
        self
    }

    /// Every sink errors once it has accepted `frames` frames
    pub fn failing_writes_after(mut self, frames: usize) -> Self {
        self.fail_write_after = Some(frames);
        self
    }

    pub fn sinks(&self) -> Vec<SinkRecord> {
        self.log.borrow().sinks.clone()
    }
}

pub struct FakeSink {
    log: Rc<RefCell<BackendLog>>,
    slot: usize,
    fail_write_after: Option<usize>,
}

impl EncoderBackend for FakeBackend {
    type Sink = FakeSink;

    fn open_sink(&self, candidate: EncoderCandidate, spec: &SinkSpec) -> TrimResult<FakeSink> {
        let mut log = self.log.borrow_mut();
        log.attempts.push(candidate);
        if self.fail_all || self.unavailable.contains(&candidate) {
            return Err(TrimError::Encode {
                message: format!("{} unavailable", candidate),
            });
        }

        log.sinks.push(SinkRecord {
            path: spec.path.clone(),
            encoder: Some(candidate),
            ..SinkRecord::default()
        });
        log.open_now += 1;
        let max_open = log.max_open.max(log.open_now);
        log.max_open = max_open;

        Ok(FakeSink {
            log: Rc::clone(&self.log),
            slot: log.sinks.len() - 1,
            fail_write_after: self.fail_write_after,
        })
    }
}

impl FrameSink for FakeSink {
    fn write(&mut self, frame: &Frame) -> TrimResult<()> {
        let mut log = self.log.borrow_mut();
        let record = &mut log.sinks[self.slot];
        if Some(record.frame_indices.len()) == self.fail_write_after {
            return Err(TrimError::Encode {
                message: "disk full".to_string(),
            });
        }
        record.frame_indices.push(frame.index);
        record.sizes.push(frame.dimensions());
        Ok(())
    }

    fn finish(&mut self) -> TrimResult<()> {
        let mut log = self.log.borrow_mut();
        log.sinks[self.slot].finishes += 1;
        let open_now = log.open_now.saturating_sub(1);
        log.open_now = open_now;
        Ok(())
    }
}

/// Preview that remembers what it was asked to show
#[derive(Default)]
pub struct NullPreview {
    pub presented: Vec<(u64, (u32, u32))>,
    pub statuses: Vec<StatusLine>,
    pub closes: u32,
}

impl PreviewSurface for NullPreview {
    fn present(&mut self, frame: &Frame, status: &StatusLine) -> TrimResult<()> {
        self.presented.push((frame.index, frame.dimensions()));
        self.statuses.push(status.clone());
        Ok(())
    }

    fn close(&mut self) {
        self.closes += 1;
    }
}

/// Key input scripted per poll: the n-th `wait_key` returns `script[n]`
pub struct ScriptedKeys {
    script: HashMap<usize, Vec<Key>>,
    pending: VecDeque<Key>,
    pub polls: usize,
    pub timeouts: Vec<Option<Duration>>,
}

/// Safety net so a broken controller cannot spin forever
const MAX_POLLS: usize = 100_000;

impl ScriptedKeys {
    pub fn new() -> Self {
        Self {
            script: HashMap::new(),
            pending: VecDeque::new(),
            polls: 0,
            timeouts: Vec::new(),
        }
    }

    /// Press `key` during poll `poll`
    pub fn at(mut self, poll: usize, key: Key) -> Self {
        self.script.entry(poll).or_default().push(key);
        self
    }

    pub fn char_at(self, poll: usize, c: char) -> Self {
        self.at(poll, Key::Char(c))
    }
}

impl KeyInput for ScriptedKeys {
    fn wait_key(&mut self, timeout: Option<Duration>) -> TrimResult<Option<Key>> {
        let poll = self.polls;
        self.polls += 1;
        self.timeouts.push(timeout);
        if poll >= MAX_POLLS {
            return Ok(Some(Key::Char('q')));
        }

        let mut keys: VecDeque<Key> = self.script.remove(&poll).unwrap_or_default().into();
        let first = keys.pop_front();
        self.pending = keys;
        Ok(first)
    }

    fn pending_key(&mut self) -> TrimResult<Option<Key>> {
        Ok(self.pending.pop_front())
    }
}
