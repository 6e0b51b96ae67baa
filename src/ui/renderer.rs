//! ANSI art and text renderer
//!
//! Writes to any `io::Write` (stdout for a live door, a `Vec<u8>` in
//! tests). Art bytes pass through untouched so CP437 files render as the
//! artist drew them; only the SAUCE tail is cut off first.
//!
//! Three ways to place a document:
//! - **stream**: line after line, optionally paced
//! - **positioned**: each line at an absolute row/column
//! - **centered**: positioned, anchored from the session's modal geometry

use std::io::{self, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use crossterm::queue;
use crossterm::style::Print;
use thiserror::Error;
use tracing::debug;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::ansi::{ClearLine, ClearScreen, MoveCursor, ResetStyle, Style};
use super::sauce::strip_sauce;
use crate::core::geometry::{ModalGeometry, Placement};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to read art file {}: {source}", .path.display())]
    ArtFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write to terminal: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Split a document into lines, dropping `\r` before `\n`.
/// A trailing newline does not produce an empty last line.
pub fn lines(doc: &[u8]) -> impl Iterator<Item = &[u8]> {
    let body = doc.strip_suffix(b"\n").unwrap_or(doc);
    let empty = doc.is_empty();
    body.split(|&b| b == b'\n')
        .filter(move |_| !empty)
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
}

/// Display width of text, in terminal columns
pub fn display_width(text: &str) -> u16 {
    u16::try_from(text.width()).unwrap_or(u16::MAX)
}

/// Shorten `text` to at most `max` columns, ending in `...` when cut
pub fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let budget = max.saturating_sub(3);
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push_str("...");
    out
}

/// Center `text` in a field `width` columns wide
pub fn center(text: &str, width: usize) -> String {
    let len = text.width();
    let pad_left = ((width + len) / 2).saturating_sub(len);
    let pad_right = width.saturating_sub(pad_left + len);
    format!("{}{}{}", " ".repeat(pad_left), text, " ".repeat(pad_right))
}

/// Art and text output for one session
pub struct AnsiRenderer<W: Write> {
    out: W,
    line_delay: Duration,
}

impl<W: Write> AnsiRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            line_delay: Duration::ZERO,
        }
    }

    /// Pause between lines in stream mode
    pub fn with_line_delay(mut self, delay: Duration) -> Self {
        self.line_delay = delay;
        self
    }

    pub fn line_delay(&self) -> Duration {
        self.line_delay
    }

    /// Print each line in order
    pub fn stream(&mut self, doc: &[u8]) -> Result<()> {
        let doc = strip_sauce(doc);
        for line in lines(doc) {
            self.out.write_all(line)?;
            self.out.write_all(b"\r\n")?;
            self.out.flush()?;
            if !self.line_delay.is_zero() {
                thread::sleep(self.line_delay);
            }
        }
        Ok(())
    }

    /// Print each line at `(row + i, col)`
    pub fn positioned(&mut self, doc: &[u8], row: u16, col: u16) -> Result<()> {
        let doc = strip_sauce(doc);
        for (i, line) in lines(doc).enumerate() {
            let row = row.saturating_add(u16::try_from(i).unwrap_or(u16::MAX));
            queue!(self.out, MoveCursor::new(row, col))?;
            self.out.write_all(line)?;
        }
        self.out.flush()?;
        Ok(())
    }

    /// Center art `width` columns wide, two rows above the middle
    pub fn centered_art(&mut self, doc: &[u8], width: u16, modal: ModalGeometry) -> Result<()> {
        let (row, col) = modal.anchor(width, Placement::Art);
        debug!("Centered art at {};{}", row, col);
        self.positioned(doc, row, col)
    }

    /// Center a single line of styled text on the middle row
    pub fn centered_text(&mut self, text: &str, modal: ModalGeometry, style: Style) -> Result<()> {
        let (row, col) = modal.anchor(display_width(text), Placement::Text);
        queue!(self.out, MoveCursor::new(row, col), style, Print(text), ResetStyle)?;
        self.out.flush()?;
        Ok(())
    }

    /// Text at an absolute position
    pub fn print_at(&mut self, text: &str, row: u16, col: u16) -> Result<()> {
        queue!(self.out, MoveCursor::new(row, col), Print(text))?;
        self.out.flush()?;
        Ok(())
    }

    /// Replace a whole row with `text`
    pub fn status_line(&mut self, text: &str, row: u16) -> Result<()> {
        queue!(self.out, MoveCursor::new(row, 1), ClearLine, Print(text))?;
        self.out.flush()?;
        Ok(())
    }

    /// Bytes as-is (CP437 glyphs, a raw alias)
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes)?;
        self.out.flush()?;
        Ok(())
    }

    /// Plain text, no positioning
    pub fn print(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    /// Text followed by CRLF
    pub fn println(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes())?;
        self.out.write_all(b"\r\n")?;
        self.out.flush()?;
        Ok(())
    }

    /// Styled text, reset afterwards
    pub fn styled(&mut self, text: &str, style: Style) -> Result<()> {
        queue!(self.out, style, Print(text), ResetStyle)?;
        self.out.flush()?;
        Ok(())
    }

    /// Styled raw bytes, reset afterwards
    pub fn styled_bytes(&mut self, bytes: &[u8], style: Style) -> Result<()> {
        queue!(self.out, style)?;
        self.out.write_all(bytes)?;
        queue!(self.out, ResetStyle)?;
        self.out.flush()?;
        Ok(())
    }

    /// Any crossterm command
    pub fn command(&mut self, cmd: impl crossterm::Command) -> Result<()> {
        queue!(self.out, cmd)?;
        self.out.flush()?;
        Ok(())
    }

    pub fn clear_screen(&mut self) -> Result<()> {
        self.command(ClearScreen)
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
