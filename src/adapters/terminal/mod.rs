//! Terminal preview and keyboard input using crossterm
//!
//! The preview draws two pixel rows per character cell with the upper half
//! block, foreground for the top pixel and background for the bottom one.

use std::io::{self, BufWriter, Stdout, Write};
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use image::imageops::{self, FilterType};
use tracing::{debug, warn};

use crate::domain::model::{Frame, Key, StatusLine};
use crate::error::{TrimError, TrimResult};
use crate::ports::{KeyInput, PreviewSurface};
use crate::utils::Utils;

const HALF_BLOCK: char = '▀';

fn terminal_err(e: io::Error) -> TrimError {
    TrimError::Terminal {
        message: e.to_string(),
    }
}

/// Full-screen preview window in the controlling terminal
pub struct TerminalPreview {
    out: BufWriter<Stdout>,
    active: bool,
    last_size: (u16, u16),
}

impl TerminalPreview {
    /// Take over the terminal: raw mode, alternate screen, hidden cursor
    pub fn open() -> TrimResult<Self> {
        terminal::enable_raw_mode().map_err(terminal_err)?;
        let mut out = BufWriter::new(io::stdout());
        if let Err(e) = execute!(out, EnterAlternateScreen, Hide, Clear(ClearType::All)) {
            let _ = terminal::disable_raw_mode();
            return Err(terminal_err(e));
        }
        debug!("Terminal preview opened");

        Ok(Self {
            out,
            active: true,
            last_size: (0, 0),
        })
    }

    fn draw(&mut self, frame: &Frame, status: &StatusLine) -> io::Result<()> {
        let (cols, rows) = terminal::size()?;
        if (cols, rows) != self.last_size {
            queue!(self.out, Clear(ClearType::All))?;
            self.last_size = (cols, rows);
        }

        let side = preview_side(cols, rows);
        if side >= 2 {
            let thumb = imageops::resize(&frame.image, side, side, FilterType::Triangle);
            for cell_row in 0..side / 2 {
                queue!(self.out, MoveTo(0, cell_row as u16))?;
                for x in 0..side {
                    let top = thumb.get_pixel(x, cell_row * 2).0;
                    let bottom = thumb.get_pixel(x, cell_row * 2 + 1).0;
                    queue!(
                        self.out,
                        SetForegroundColor(Color::Rgb {
                            r: top[0],
                            g: top[1],
                            b: top[2]
                        }),
                        SetBackgroundColor(Color::Rgb {
                            r: bottom[0],
                            g: bottom[1],
                            b: bottom[2]
                        }),
                        Print(HALF_BLOCK)
                    )?;
                }
                queue!(self.out, ResetColor)?;
            }
        }

        let text = status_text(status, cols as usize);
        queue!(
            self.out,
            MoveTo(0, rows.saturating_sub(1)),
            ResetColor,
            Clear(ClearType::CurrentLine),
            Print(text)
        )?;
        self.out.flush()
    }
}

impl PreviewSurface for TerminalPreview {
    fn present(&mut self, frame: &Frame, status: &StatusLine) -> TrimResult<()> {
        if !self.active {
            return Err(TrimError::Terminal {
                message: "Preview already closed".to_string(),
            });
        }
        self.draw(frame, status).map_err(terminal_err)
    }

    fn close(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;

        if let Err(e) = execute!(self.out, ResetColor, Show, LeaveAlternateScreen) {
            warn!("Failed to restore terminal screen: {}", e);
        }
        if let Err(e) = terminal::disable_raw_mode() {
            warn!("Failed to leave raw mode: {}", e);
        }
        debug!("Terminal preview closed");
    }
}

impl Drop for TerminalPreview {
    fn drop(&mut self) {
        self.close();
    }
}

/// Side of the square preview in pixels for a terminal of `cols`x`rows`.
///
/// One row is reserved for the status line and each cell holds two pixel
/// rows; the result is even so every cell is fully covered.
pub fn preview_side(cols: u16, rows: u16) -> u32 {
    let width = cols as u32;
    let height = rows.saturating_sub(1) as u32 * 2;
    width.min(height) & !1
}

/// Single status line, cut to `width` characters
pub fn status_text(status: &StatusLine, width: usize) -> String {
    let time = Utils::format_duration(Utils::frame_time(status.frame_index, status.fps));
    let progress = Utils::calculate_progress(status.frame_index, status.frame_count);

    let mut text = format!(
        "{} | {}/{} ({:.0}%) | {} | {}",
        status.file_name, status.frame_index, status.frame_count, progress, time, status.playback
    );
    if let Some(recording) = &status.recording {
        text.push_str(&format!(" | REC {}", recording));
    }
    if let Some(message) = &status.message {
        text.push_str(&format!(" | {}", message));
    }

    text.chars().take(width).collect()
}

/// Keyboard input from the controlling terminal
#[derive(Debug, Default)]
pub struct TerminalKeys;

impl TerminalKeys {
    pub fn new() -> Self {
        Self
    }

    fn read_key(&mut self) -> TrimResult<Option<Key>> {
        Ok(map_event(event::read().map_err(terminal_err)?))
    }
}

impl KeyInput for TerminalKeys {
    fn wait_key(&mut self, timeout: Option<Duration>) -> TrimResult<Option<Key>> {
        match timeout {
            Some(timeout) => {
                let deadline = std::time::Instant::now() + timeout;
                loop {
                    let remaining = deadline.saturating_duration_since(std::time::Instant::now());
                    if !event::poll(remaining).map_err(terminal_err)? {
                        return Ok(None);
                    }
                    if let Some(key) = self.read_key()? {
                        return Ok(Some(key));
                    }
                }
            }
            None => loop {
                if let Some(key) = self.read_key()? {
                    return Ok(Some(key));
                }
            },
        }
    }

    fn pending_key(&mut self) -> TrimResult<Option<Key>> {
        while event::poll(Duration::ZERO).map_err(terminal_err)? {
            if let Some(key) = self.read_key()? {
                return Ok(Some(key));
            }
        }
        Ok(None)
    }
}

/// Translate a terminal event into a key.
///
/// A resize comes back as `Key::Other`: it maps to no command but still ends
/// the wait, so a paused session re-presents its frame at the new size.
pub fn map_event(event: Event) -> Option<Key> {
    match event {
        Event::Key(key_event) => map_key_event(key_event),
        Event::Resize(..) => Some(Key::Other),
        _ => None,
    }
}

/// Translate a crossterm key event; key releases are ignored
pub fn map_key_event(event: KeyEvent) -> Option<Key> {
    if event.kind == KeyEventKind::Release {
        return None;
    }

    let key = match event.code {
        KeyCode::Char('c') | KeyCode::Char('C') if event.modifiers.contains(KeyModifiers::CONTROL) => {
            Key::Interrupt
        }
        KeyCode::Char(' ') => Key::Space,
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Esc => Key::Escape,
        _ => Key::Other,
    };
    Some(key)
}
