//! ANSI escape vocabulary for door output
//!
//! BBS terminals (SyncTERM, NetRunner, mTelnet...) understand the classic
//! 16-color SGR set and `f`-style cursor addressing, so these are written
//! out by hand instead of using crossterm's RGB/256-color styling. Each
//! sequence is a crossterm [`Command`] and composes with `queue!`/`execute!`
//! on any writer.

use std::fmt;

use bitflags::bitflags;
use crossterm::Command;

/// Control Sequence Introducer
pub const CSI: &str = "\x1b[";
/// Reset all attributes
pub const RESET: &str = "\x1b[0m";
/// Erase the whole screen
pub const ERASE_SCREEN: &str = "\x1b[2J";
/// Erase the current line
pub const ERASE_LINE: &str = "\x1b[2K";
/// Ask the terminal to report the cursor position
pub const REPORT_CURSOR: &str = "\x1b[6n";

/// CP437 glyphs, written as raw bytes
pub mod glyph {
    pub const HEART: &[u8] = b"\x03";
    pub const ARROW_RIGHT: &[u8] = b"\x10";
    pub const ARROW_LEFT: &[u8] = b"\x11";
    pub const ARROW_UP_DOWN: &[u8] = b"\x17";
    pub const ARROW_UP: &[u8] = b"\x18";
    pub const ARROW_DOWN: &[u8] = b"\x19";
    pub const ARROW_DOWN_FAT: &[u8] = b"\x1f";
    /// Full block
    pub const BLOCK: &[u8] = b"\xdb";
}

// Commands here are pure ANSI; the winapi fallback is never taken.
macro_rules! ansi_only {
    () => {
        #[cfg(windows)]
        fn execute_winapi(&self) -> std::io::Result<()> {
            Ok(())
        }

        #[cfg(windows)]
        fn is_ansi_code_supported(&self) -> bool {
            true
        }
    };
}

/// The eight base colors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl Color {
    fn offset(self) -> u8 {
        match self {
            Color::Black => 0,
            Color::Red => 1,
            Color::Green => 2,
            Color::Yellow => 3,
            Color::Blue => 4,
            Color::Magenta => 5,
            Color::Cyan => 6,
            Color::White => 7,
        }
    }
}

bitflags! {
    /// Extra SGR attributes combined with a color
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Attrs: u8 {
        const BRIGHT = 0b0001;
        const BLINK  = 0b0010;
    }
}

impl Attrs {
    fn write_params(self, f: &mut impl fmt::Write) -> fmt::Result {
        if self.contains(Attrs::BRIGHT) {
            f.write_str(";1")?;
        }
        if self.contains(Attrs::BLINK) {
            f.write_str(";5")?;
        }
        Ok(())
    }
}

/// Set the foreground color (`ESC[3Xm`, `ESC[3X;1m` when bright)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fg(pub Color, pub Attrs);

impl Command for Fg {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        write!(f, "{}{}", CSI, 30 + self.0.offset())?;
        self.1.write_params(f)?;
        f.write_char('m')
    }

    ansi_only!();
}

/// Set the background color (`ESC[4Xm`, `ESC[4X;1m` when bright)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bg(pub Color, pub Attrs);

impl Command for Bg {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        write!(f, "{}{}", CSI, 40 + self.0.offset())?;
        self.1.write_params(f)?;
        f.write_char('m')
    }

    ansi_only!();
}

/// Foreground plus background pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub fg: Fg,
    pub bg: Option<Bg>,
}

impl Style {
    pub const fn fg(color: Color) -> Self {
        Self {
            fg: Fg(color, Attrs::empty()),
            bg: None,
        }
    }

    pub const fn bright(color: Color) -> Self {
        Self {
            fg: Fg(color, Attrs::BRIGHT),
            bg: None,
        }
    }

    pub const fn on(mut self, color: Color) -> Self {
        self.bg = Some(Bg(color, Attrs::empty()));
        self
    }
}

impl Command for Style {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        if let Some(bg) = self.bg {
            bg.write_ansi(f)?;
        }
        self.fg.write_ansi(f)
    }

    ansi_only!();
}

/// Reset colors and attributes
#[derive(Debug, Clone, Copy)]
pub struct ResetStyle;

impl Command for ResetStyle {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        f.write_str(RESET)
    }

    ansi_only!();
}

/// Absolute cursor move, 1-based (`ESC[row;colf`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveCursor {
    pub row: u16,
    pub col: u16,
}

impl MoveCursor {
    pub const fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }
}

impl Command for MoveCursor {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        write!(f, "{}{};{}f", CSI, self.row, self.col)
    }

    ansi_only!();
}

/// Relative cursor movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nudge {
    Up(u16),
    Down(u16),
    Forward(u16),
    Back(u16),
    NextLine(u16),
    PrevLine(u16),
    Column(u16),
}

impl Command for Nudge {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        let (n, code) = match *self {
            Nudge::Up(n) => (n, 'A'),
            Nudge::Down(n) => (n, 'B'),
            Nudge::Forward(n) => (n, 'C'),
            Nudge::Back(n) => (n, 'D'),
            Nudge::NextLine(n) => (n, 'E'),
            Nudge::PrevLine(n) => (n, 'F'),
            Nudge::Column(n) => (n, 'G'),
        };
        write!(f, "{}{}{}", CSI, n, code)
    }

    ansi_only!();
}

/// Erase the screen and home the cursor
#[derive(Debug, Clone, Copy)]
pub struct ClearScreen;

impl Command for ClearScreen {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        f.write_str(ERASE_SCREEN)?;
        MoveCursor::new(1, 1).write_ansi(f)
    }

    ansi_only!();
}

/// Erase the line the cursor is on
#[derive(Debug, Clone, Copy)]
pub struct ClearLine;

impl Command for ClearLine {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        f.write_str(ERASE_LINE)
    }

    ansi_only!();
}

/// Cursor visibility and alternate screen toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Private {
    ShowCursor,
    HideCursor,
    SaveScreen,
    RestoreScreen,
}

impl Command for Private {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        let seq = match self {
            Private::ShowCursor => "?25h",
            Private::HideCursor => "?25l",
            Private::SaveScreen => "?47h",
            Private::RestoreScreen => "?47l",
        };
        write!(f, "{}{}", CSI, seq)
    }

    ansi_only!();
}

/// Fonts selectable on SyncTERM (`ESC[0;N D`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Ibm,
    IbmThin,
    Topaz,
    TopazPlus,
    Microknight,
    MicroknightPlus,
    Mosoul,
    Potnoodle,
}

impl Font {
    pub const ALL: [Font; 8] = [
        Font::Topaz,
        Font::TopazPlus,
        Font::Microknight,
        Font::MicroknightPlus,
        Font::Mosoul,
        Font::Potnoodle,
        Font::Ibm,
        Font::IbmThin,
    ];

    fn slot(self) -> u8 {
        match self {
            Font::Ibm => 0,
            Font::IbmThin => 26,
            Font::Mosoul => 38,
            Font::Potnoodle => 37,
            Font::Microknight => 41,
            Font::MicroknightPlus => 39,
            Font::Topaz => 42,
            Font::TopazPlus => 40,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Font::Ibm => "IBM CP437",
            Font::IbmThin => "IBM CP437 Thin",
            Font::Topaz => "Topaz",
            Font::TopazPlus => "Topaz+",
            Font::Microknight => "Microknight",
            Font::MicroknightPlus => "Microknight+",
            Font::Mosoul => "mO'sOul",
            Font::Potnoodle => "P0T-NOoDLE",
        }
    }
}

impl Command for Font {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        write!(f, "{}0;{} D", CSI, self.slot())
    }

    ansi_only!();
}

/// Render a command to a string, for tests and string building
pub fn render(cmd: impl Command) -> String {
    let mut s = String::new();
    // Writing into a String cannot fail
    let _ = cmd.write_ansi(&mut s);
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreground_colors() {
        assert_eq!(render(Fg(Color::Red, Attrs::empty())), "\x1b[31m");
        assert_eq!(render(Fg(Color::Cyan, Attrs::BRIGHT)), "\x1b[36;1m");
        assert_eq!(render(Fg(Color::White, Attrs::BRIGHT | Attrs::BLINK)), "\x1b[37;1;5m");
    }

    #[test]
    fn test_background_colors() {
        assert_eq!(render(Bg(Color::Blue, Attrs::empty())), "\x1b[44m");
        assert_eq!(render(Bg(Color::Black, Attrs::BRIGHT)), "\x1b[40;1m");
    }

    #[test]
    fn test_style_writes_background_first() {
        let style = Style::bright(Color::White).on(Color::Cyan);
        assert_eq!(render(style), "\x1b[46m\x1b[37;1m");
    }

    #[test]
    fn test_cursor_sequences() {
        assert_eq!(render(MoveCursor::new(999, 999)), "\x1b[999;999f");
        assert_eq!(render(Nudge::Up(3)), "\x1b[3A");
        assert_eq!(render(Nudge::Column(10)), "\x1b[10G");
        assert_eq!(render(ClearScreen), "\x1b[2J\x1b[1;1f");
        assert_eq!(render(ClearLine), "\x1b[2K");
        assert_eq!(render(Private::HideCursor), "\x1b[?25l");
    }

    #[test]
    fn test_glyphs_are_cp437() {
        use crate::core::cp437;
        assert_eq!(cp437::decode(glyph::BLOCK), "█");
        assert_eq!(glyph::ARROW_RIGHT, b"\x10");
    }

    #[test]
    fn test_fonts() {
        assert_eq!(render(Font::Topaz), "\x1b[0;42 D");
        assert_eq!(render(Font::Ibm), "\x1b[0;0 D");
    }
}
