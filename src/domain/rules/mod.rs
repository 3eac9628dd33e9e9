// Domain rules - Playback, seeking and key binding policies

use std::collections::HashMap;
use std::time::Duration;

use crate::domain::model::*;

/// Seek distance and clamping rules
pub struct SeekPolicy;

impl SeekPolicy {
    /// Number of frames covered by a jump of `seconds` at `fps`
    pub fn step_frames(fps: f64, seconds: f64) -> u64 {
        let step = (fps * seconds).round();
        if step.is_finite() && step > 0.0 {
            step as u64
        } else {
            0
        }
    }

    /// Move `current` by `delta` frames, clamped into `[0, frame_count]`
    pub fn clamp_target(current: u64, delta: i64, frame_count: u64) -> u64 {
        let target = current as i128 + delta as i128;
        target.clamp(0, frame_count as i128) as u64
    }

    /// Clamp an absolute (possibly negative) target into `[0, frame_count]`
    pub fn clamp_absolute(target: i64, frame_count: u64) -> u64 {
        (target as i128).clamp(0, frame_count as i128) as u64
    }

    /// Target index for a seek command, `None` for other commands
    pub fn target_for(command: Command, current: u64, step: u64, frame_count: u64) -> Option<u64> {
        let step = step.min(i64::MAX as u64) as i64;
        match command {
            Command::SeekForward => Some(Self::clamp_target(current, step, frame_count)),
            Command::SeekBack => Some(Self::clamp_target(current, -step, frame_count)),
            _ => None,
        }
    }
}

/// Input-poll timing while playing or paused
pub struct PlaybackTiming;

impl PlaybackTiming {
    /// Per-tick wait while playing: whole milliseconds of one frame, at least 1 ms.
    ///
    /// Callers pass the effective rate, so a stream without a usable rate
    /// waits `floor(1000 / DEFAULT_FPS)` = 33 ms rather than a flat 30 ms.
    pub fn frame_delay(fps: f64) -> Duration {
        let millis = (1000.0 / fps).floor();
        if millis.is_finite() && millis >= 1.0 {
            Duration::from_millis(millis as u64)
        } else {
            Duration::from_millis(1)
        }
    }

    /// Poll timeout for a playback state; `None` waits indefinitely
    pub fn poll_timeout(playback: PlaybackState, fps: f64) -> Option<Duration> {
        match playback {
            PlaybackState::Playing => Some(Self::frame_delay(fps)),
            PlaybackState::Paused => None,
        }
    }
}

/// Mapping from raw keys to commands
#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: HashMap<Key, Command>,
}

impl Keymap {
    /// Create an empty keymap
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Bind a key, replacing any previous binding for it
    pub fn bind(mut self, key: Key, command: Command) -> Self {
        self.bindings.insert(key, command);
        self
    }

    /// Look up the command for a key; unmapped keys yield `None`
    pub fn command_for(&self, key: Key) -> Option<Command> {
        match key {
            // Uppercase letters share the lowercase binding
            Key::Char(c) if c.is_ascii_uppercase() => self
                .bindings
                .get(&Key::Char(c.to_ascii_lowercase()))
                .or_else(|| self.bindings.get(&key))
                .copied(),
            _ => self.bindings.get(&key).copied(),
        }
    }

    /// Keys bound to a command
    pub fn keys_for(&self, command: Command) -> Vec<Key> {
        self.bindings
            .iter()
            .filter(|(_, c)| **c == command)
            .map(|(k, _)| *k)
            .collect()
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::empty()
            .bind(Key::Char('s'), Command::StartSegment)
            .bind(Key::Char('e'), Command::EndSegment)
            .bind(Key::Char('f'), Command::SeekForward)
            .bind(Key::Right, Command::SeekForward)
            .bind(Key::Char('p'), Command::SeekBack)
            .bind(Key::Left, Command::SeekBack)
            .bind(Key::Space, Command::TogglePause)
            .bind(Key::Char('q'), Command::Quit)
            .bind(Key::Escape, Command::Quit)
            .bind(Key::Interrupt, Command::Quit)
    }
}
