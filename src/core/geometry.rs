//! Terminal geometry discovery
//!
//! A door talks to a remote terminal over a byte stream, so the local
//! console size means nothing. Instead the cursor is pushed far past the
//! bottom-right corner and the terminal is asked where it ended up: the
//! clamped position is the screen size.
//!
//! ```text
//! door  -> ESC[999;999f ESC[6n
//! term  -> ESC[25;80R
//! ```
//!
//! Sizes are always `(height, width)`, i.e. rows then columns.

use std::fs::File;
use std::io::{self, Read, Write};
use std::sync::LazyLock;

use crossterm::{queue, terminal};
use regex::bytes::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ui::ansi::{MoveCursor, REPORT_CURSOR};

/// Longest reply accepted before giving up on the terminator
const MAX_REPLY_LEN: usize = 32;

static CURSOR_REPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+);([0-9]+)").expect("Invalid cursor report regex"));

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Failed to switch terminal mode: {0}")]
    Mode(#[source] io::Error),

    #[error("Failed to send size query: {0}")]
    Write(#[source] io::Error),

    #[error("Failed to read size reply: {0}")]
    Read(#[source] io::Error),

    #[error("Malformed cursor report {reply:?}")]
    Malformed { reply: String },
}

pub type Result<T> = std::result::Result<T, ProbeError>;

/// Screen size in character cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalGeometry {
    pub height: u16,
    pub width: u16,
}

impl TerminalGeometry {
    /// Used when the terminal does not answer: a classic 80x25 screen
    pub const FALLBACK: TerminalGeometry = TerminalGeometry {
        height: 25,
        width: 80,
    };

    pub const fn new(height: u16, width: u16) -> Self {
        Self { height, width }
    }

    /// Dimensions rounded down to even numbers, for symmetric centering
    pub fn modal(&self) -> ModalGeometry {
        ModalGeometry {
            height: self.height - self.height % 2,
            width: self.width - self.width % 2,
        }
    }
}

impl Default for TerminalGeometry {
    fn default() -> Self {
        Self::FALLBACK
    }
}

/// Where a centered block is anchored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Art sits two rows above the vertical center
    Art,
    /// Text sits on the vertical center
    Text,
}

impl Placement {
    fn row_offset(self) -> u16 {
        match self {
            Placement::Art => 2,
            Placement::Text => 0,
        }
    }
}

/// Even-sized geometry used for dialog centering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalGeometry {
    pub height: u16,
    pub width: u16,
}

impl ModalGeometry {
    /// Top-left (row, col) for a block `length` columns wide.
    ///
    /// `row = height/2 - offset`, `col = width - width/2 - length/2`,
    /// clamped to the first cell.
    pub fn anchor(&self, length: u16, placement: Placement) -> (u16, u16) {
        let row = (self.height / 2).saturating_sub(placement.row_offset());
        let col = (self.width - self.width / 2).saturating_sub(length / 2);
        (row.max(1), col.max(1))
    }
}

/// Switches the input stream between raw and line-buffered mode
pub trait RawMode {
    fn enable(&mut self) -> io::Result<()>;
    fn disable(&mut self) -> io::Result<()>;
}

impl<M: RawMode + ?Sized> RawMode for Box<M> {
    fn enable(&mut self) -> io::Result<()> {
        (**self).enable()
    }

    fn disable(&mut self) -> io::Result<()> {
        (**self).disable()
    }
}

/// Raw mode on the controlling terminal via crossterm
#[derive(Debug, Default)]
pub struct CrosstermRawMode;

impl RawMode for CrosstermRawMode {
    fn enable(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()
    }

    fn disable(&mut self) -> io::Result<()> {
        terminal::disable_raw_mode()
    }
}

/// No mode switching (input is not a tty, or already raw)
#[derive(Debug, Default)]
pub struct Passthrough;

impl RawMode for Passthrough {
    fn enable(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn disable(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Cursor-position round trip against the remote terminal
pub struct TerminalGeometryProbe<R, W, M> {
    input: R,
    output: W,
    mode: M,
}

impl<R: Read, W: Write, M: RawMode> TerminalGeometryProbe<R, W, M> {
    pub fn new(input: R, output: W, mode: M) -> Self {
        Self {
            input,
            output,
            mode,
        }
    }

    /// Ask the terminal for its size.
    ///
    /// A terminal that does not answer with `row;col` yields
    /// [`TerminalGeometry::FALLBACK`]. Only I/O failures and unparseable
    /// numbers inside a recognized reply are errors.
    pub fn probe(&mut self) -> Result<TerminalGeometry> {
        self.mode.enable().map_err(ProbeError::Mode)?;
        let reply = self.round_trip();
        // Always restore cooked mode, even if the exchange failed
        let restored = self.mode.disable().map_err(ProbeError::Mode);
        let reply = reply?;
        restored?;

        debug!("Cursor report: {:?}", String::from_utf8_lossy(&reply));
        let geometry = parse_cursor_report(&reply)?;
        info!("Terminal size: {}x{}", geometry.width, geometry.height);
        Ok(geometry)
    }

    fn round_trip(&mut self) -> Result<Vec<u8>> {
        queue!(self.output, MoveCursor::new(999, 999)).map_err(ProbeError::Write)?;
        self.output
            .write_all(REPORT_CURSOR.as_bytes())
            .map_err(ProbeError::Write)?;
        self.output.flush().map_err(ProbeError::Write)?;

        let mut reply = Vec::with_capacity(MAX_REPLY_LEN);
        let mut byte = [0u8; 1];
        while reply.len() < MAX_REPLY_LEN {
            match self.input.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => {
                    reply.push(byte[0]);
                    if byte[0] == b'R' {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ProbeError::Read(e)),
            }
        }
        Ok(reply)
    }

    /// Give back the underlying streams
    pub fn into_parts(self) -> (R, W, M) {
        (self.input, self.output, self.mode)
    }
}

/// Unbuffered handle on stdin for the probe.
///
/// `io::stdin()` reads ahead into its own buffer, so keys typed right after
/// the reply would never reach crossterm's event reader. This handle is a
/// duplicate of the descriptor and reads exactly what it is asked for.
pub fn raw_stdin() -> Result<File> {
    #[cfg(unix)]
    let owned = {
        use std::os::fd::AsFd;
        io::stdin().as_fd().try_clone_to_owned()
    };
    #[cfg(windows)]
    let owned = {
        use std::os::windows::io::AsHandle;
        io::stdin().as_handle().try_clone_to_owned()
    };
    owned.map(File::from).map_err(ProbeError::Read)
}

/// Extract `(height, width)` from a cursor position report
pub fn parse_cursor_report(reply: &[u8]) -> Result<TerminalGeometry> {
    let Some(caps) = CURSOR_REPORT_RE.captures(reply) else {
        warn!("Terminal did not report its size, using 80x25");
        return Ok(TerminalGeometry::FALLBACK);
    };

    let malformed = || ProbeError::Malformed {
        reply: String::from_utf8_lossy(reply).into_owned(),
    };
    let number = |idx: usize| -> Result<u16> {
        std::str::from_utf8(&caps[idx])
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .ok_or_else(malformed)
    };

    let height = number(1)?;
    let width = number(2)?;
    if height == 0 || width == 0 {
        warn!("Terminal reported a {}x{} screen, using 80x25", width, height);
        return Ok(TerminalGeometry::FALLBACK);
    }
    Ok(TerminalGeometry::new(height, width))
}
