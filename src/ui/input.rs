//! Caller input
//!
//! Single keystroke reads and yes/no confirmation. Every read runs under
//! the idle guard: the countdown is armed right before waiting for a key
//! and disarmed as soon as one arrives, so only time spent waiting on the
//! caller counts as idle.

use std::io::{self, Write};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::queue;
use crossterm::style::Print;
use thiserror::Error;
use tracing::{debug, warn};

use super::ansi::{Color, ResetStyle, Style};
use crate::core::idle::{IdleError, IdleGuard, ShutdownToken};

/// How often a blocked read checks the shutdown token
const POLL_SLICE: Duration = Duration::from_millis(100);

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to read key: {0}")]
    Io(#[from] io::Error),

    #[error("Caller idle too long")]
    IdleTimeout,
}

impl From<IdleError> for InputError {
    fn from(_: IdleError) -> Self {
        InputError::IdleTimeout
    }
}

pub type Result<T> = std::result::Result<T, InputError>;

/// Keys with a name instead of a character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedKey {
    Enter,
    Escape,
    Backspace,
    Tab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    F(u8),
}

/// One keystroke: a character, a named key, or (rarely) neither
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyPress {
    pub ch: Option<char>,
    pub key: Option<NamedKey>,
}

impl KeyPress {
    pub const fn char(ch: char) -> Self {
        Self {
            ch: Some(ch),
            key: None,
        }
    }

    pub const fn named(key: NamedKey) -> Self {
        Self {
            ch: None,
            key: Some(key),
        }
    }

    /// Case-insensitive character match
    pub fn is(&self, ch: char) -> bool {
        self.ch.is_some_and(|c| c.eq_ignore_ascii_case(&ch))
    }

    pub fn is_key(&self, key: NamedKey) -> bool {
        self.key == Some(key)
    }

    /// Map a crossterm key event. Control chords are not keystrokes a door
    /// acts on and map to nothing.
    pub fn from_event(event: &KeyEvent) -> Option<Self> {
        let key = match event.code {
            KeyCode::Char(_) if event.modifiers.contains(KeyModifiers::CONTROL) => return None,
            KeyCode::Char(ch) => return Some(Self::char(ch)),
            KeyCode::Enter => NamedKey::Enter,
            KeyCode::Esc => NamedKey::Escape,
            KeyCode::Backspace => NamedKey::Backspace,
            KeyCode::Tab => NamedKey::Tab,
            KeyCode::Up => NamedKey::Up,
            KeyCode::Down => NamedKey::Down,
            KeyCode::Left => NamedKey::Left,
            KeyCode::Right => NamedKey::Right,
            KeyCode::Home => NamedKey::Home,
            KeyCode::End => NamedKey::End,
            KeyCode::PageUp => NamedKey::PageUp,
            KeyCode::PageDown => NamedKey::PageDown,
            KeyCode::Insert => NamedKey::Insert,
            KeyCode::Delete => NamedKey::Delete,
            KeyCode::F(n) => NamedKey::F(n),
            _ => return None,
        };
        Some(Self::named(key))
    }
}

/// Result of a yes/no prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    /// Any other key; ask again
    Unanswered,
}

impl Answer {
    /// `Y`/`y`/Enter is yes, `N`/`n`/Escape is no
    pub fn from_key(key: &KeyPress) -> Self {
        if key.is('y') || key.is_key(NamedKey::Enter) {
            Answer::Yes
        } else if key.is('n') || key.is_key(NamedKey::Escape) {
            Answer::No
        } else {
            Answer::Unanswered
        }
    }
}

/// Where keystrokes come from
pub trait KeySource {
    /// Wait up to `wait` for a key
    fn next_key(&mut self, wait: Duration) -> io::Result<Option<KeyPress>>;
}

/// Keys from the controlling terminal via crossterm (needs raw mode)
#[derive(Debug, Default)]
pub struct CrosstermKeys;

impl KeySource for CrosstermKeys {
    fn next_key(&mut self, wait: Duration) -> io::Result<Option<KeyPress>> {
        if !event::poll(wait)? {
            return Ok(None);
        }
        match event::read()? {
            // Windows reports releases too
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(KeyPress::from_event(&key)),
            _ => Ok(None),
        }
    }
}

/// What the timer thread does when the caller goes idle
pub type ExpireAction = Arc<dyn Fn() + Send + Sync>;

/// Idle notice on stdout, held on screen for `linger`
pub fn stdout_notice(linger: Duration) -> ExpireAction {
    Arc::new(move || {
        let mut stdout = io::stdout();
        let written = queue!(
            stdout,
            Print("\r\n\r\n"),
            Style::bright(Color::Red),
            Print("Idle time limit exceeded, disconnecting..."),
            ResetStyle,
            Print("\r\n")
        )
        .and_then(|_| stdout.flush());
        if let Err(e) = written {
            warn!("Failed to print idle notice: {}", e);
        }
        thread::sleep(linger);
    })
}

/// Idle-guarded keyboard
pub struct SessionInput<K> {
    keys: K,
    guard: IdleGuard,
    timeout: Duration,
    on_expire: ExpireAction,
}

impl<K: KeySource> SessionInput<K> {
    pub fn new(keys: K, timeout: Duration, on_expire: ExpireAction) -> Self {
        Self {
            keys,
            guard: IdleGuard::new(ShutdownToken::new()),
            timeout,
            on_expire,
        }
    }

    /// Token the session loop should watch
    pub fn token(&self) -> ShutdownToken {
        self.guard.token().clone()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Block for exactly one keystroke
    pub fn read_key(&mut self) -> Result<KeyPress> {
        let action = self.on_expire.clone();
        self.guard.arm(self.timeout, move || action())?;
        let key = self.wait_for_key();
        self.guard.disarm();

        if self.guard.has_expired() {
            return Err(InputError::IdleTimeout);
        }
        let key = key?;
        debug!("Key: {:?}", key);
        Ok(key)
    }

    fn wait_for_key(&mut self) -> Result<KeyPress> {
        let token = self.guard.token().clone();
        loop {
            if token.is_cancelled() {
                return Err(InputError::IdleTimeout);
            }
            if let Some(key) = self.keys.next_key(POLL_SLICE)? {
                return Ok(key);
            }
        }
    }

    /// One yes/no keystroke
    pub fn confirm(&mut self) -> Result<Answer> {
        Ok(Answer::from_key(&self.read_key()?))
    }

    /// Keep reading until the caller answers yes or no
    pub fn confirm_until_answered(&mut self) -> Result<bool> {
        loop {
            match self.confirm()? {
                Answer::Yes => return Ok(true),
                Answer::No => return Ok(false),
                Answer::Unanswered => continue,
            }
        }
    }

    /// Print the pause prompt and wait for any key
    pub fn pause<W: Write>(&mut self, out: &mut W) -> Result<()> {
        queue!(out, Print("\r\nPrEsS a KeY"))?;
        out.flush()?;
        self.read_key()?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays keys, then goes quiet
    pub(crate) struct ScriptedKeys(pub VecDeque<KeyPress>);

    impl ScriptedKeys {
        pub(crate) fn new(keys: &[KeyPress]) -> Self {
            Self(keys.iter().copied().collect())
        }
    }

    impl KeySource for ScriptedKeys {
        fn next_key(&mut self, wait: Duration) -> io::Result<Option<KeyPress>> {
            match self.0.pop_front() {
                Some(key) => Ok(Some(key)),
                None => {
                    thread::sleep(wait);
                    Ok(None)
                }
            }
        }
    }

    pub(crate) fn silent() -> ExpireAction {
        Arc::new(|| {})
    }

    #[test]
    fn test_answer_from_key() {
        assert_eq!(Answer::from_key(&KeyPress::char('Y')), Answer::Yes);
        assert_eq!(Answer::from_key(&KeyPress::char('y')), Answer::Yes);
        assert_eq!(Answer::from_key(&KeyPress::named(NamedKey::Enter)), Answer::Yes);
        assert_eq!(Answer::from_key(&KeyPress::char('n')), Answer::No);
        assert_eq!(Answer::from_key(&KeyPress::named(NamedKey::Escape)), Answer::No);
        assert_eq!(Answer::from_key(&KeyPress::char('x')), Answer::Unanswered);
        assert_eq!(Answer::from_key(&KeyPress::named(NamedKey::Up)), Answer::Unanswered);
    }

    #[test]
    fn test_map_crossterm_events() {
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(KeyPress::from_event(&enter), Some(KeyPress::named(NamedKey::Enter)));
        let q = KeyEvent::new(KeyCode::Char('Q'), KeyModifiers::SHIFT);
        assert!(KeyPress::from_event(&q).unwrap().is('q'));
        let null = KeyEvent::new(KeyCode::Null, KeyModifiers::NONE);
        assert_eq!(KeyPress::from_event(&null), None);
    }

    #[test]
    fn test_control_chords_are_ignored() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(KeyPress::from_event(&ctrl_c), None);
        let ctrl_y = KeyEvent::new(KeyCode::Char('y'), KeyModifiers::CONTROL | KeyModifiers::SHIFT);
        assert_eq!(KeyPress::from_event(&ctrl_y), None);
        // Alt still reaches the door
        let alt_y = KeyEvent::new(KeyCode::Char('y'), KeyModifiers::ALT);
        assert_eq!(KeyPress::from_event(&alt_y), Some(KeyPress::char('y')));
    }

    #[test]
    fn test_confirm_until_answered_skips_other_keys() {
        let keys = ScriptedKeys::new(&[KeyPress::char('x'), KeyPress::char('?'), KeyPress::char('N')]);
        let mut input = SessionInput::new(keys, Duration::from_secs(5), silent());
        assert!(!input.confirm_until_answered().unwrap());
    }

    #[test]
    fn test_read_key_times_out() {
        let fired = Arc::new(AtomicUsize::new(0));
        let hits = fired.clone();
        let action: ExpireAction = Arc::new(move || {
            hits.fetch_add(1, Ordering::SeqCst);
        });
        let mut input = SessionInput::new(ScriptedKeys::new(&[]), Duration::from_millis(50), action);

        assert!(matches!(input.read_key(), Err(InputError::IdleTimeout)));
        assert!(input.token().is_cancelled());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        // Once expired, every read fails
        assert!(matches!(input.read_key(), Err(InputError::IdleTimeout)));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_prompt_keys_do_not_trip_guard() {
        let keys = ScriptedKeys::new(&[KeyPress::char('a'), KeyPress::char('b')]);
        let mut input = SessionInput::new(keys, Duration::from_millis(200), silent());
        assert!(input.read_key().unwrap().is('a'));
        thread::sleep(Duration::from_millis(300));
        // Time between reads is not idle time
        assert!(input.read_key().unwrap().is('b'));
        assert!(!input.token().is_cancelled());
    }

    #[test]
    fn test_pause_prints_prompt() {
        let mut input = SessionInput::new(
            ScriptedKeys::new(&[KeyPress::char(' ')]),
            Duration::from_secs(5),
            silent(),
        );
        let mut out = Vec::new();
        input.pause(&mut out).unwrap();
        assert_eq!(out, b"\r\nPrEsS a KeY");
    }
}
