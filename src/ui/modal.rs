//! Yes/no modal dialog
//!
//! Background art centered on screen, prompt centered on top of it, then a
//! blocking yes/no answer acknowledged in color before control returns.

use std::io::Write;
use std::thread;
use std::time::Duration;

use tracing::info;

use super::ansi::{Color, Style};
use super::input::{KeySource, SessionInput};
use super::renderer::AnsiRenderer;
use super::sauce::ArtDocument;
use crate::core::session::Session;
use crate::error::Result;

/// Look of a modal dialog
#[derive(Debug, Clone)]
pub struct Modal {
    background: ArtDocument,
    /// Logical width of the background art
    width: u16,
    prompt_style: Style,
    ack_style: Style,
    ack_delay: Duration,
}

impl Modal {
    pub fn new(background: ArtDocument, width: u16) -> Self {
        Self {
            background,
            width,
            prompt_style: Style::bright(Color::White).on(Color::Cyan),
            ack_style: Style::bright(Color::Cyan).on(Color::Cyan),
            ack_delay: Duration::from_secs(1),
        }
    }

    /// How long the Yes/No acknowledgement stays before returning
    pub fn with_ack_delay(mut self, delay: Duration) -> Self {
        self.ack_delay = delay;
        self
    }

    pub fn with_prompt_style(mut self, style: Style) -> Self {
        self.prompt_style = style;
        self
    }

    /// Show the dialog and wait for an answer. Keys other than yes/no are ignored.
    pub fn ask<W, K>(
        &self,
        prompt: &str,
        session: &Session,
        renderer: &mut AnsiRenderer<W>,
        input: &mut SessionInput<K>,
    ) -> Result<bool>
    where
        W: Write,
        K: KeySource,
    {
        let modal = session.modal();
        renderer.centered_art(self.background.display(), self.width, modal)?;
        renderer.centered_text(prompt, modal, self.prompt_style)?;

        let answer = input.confirm_until_answered()?;
        info!("Modal {:?} answered {}", prompt, answer);

        let ack = if answer { " Yes" } else { " No" };
        renderer.styled(ack, self.ack_style)?;
        renderer.println("")?;
        if !self.ack_delay.is_zero() {
            thread::sleep(self.ack_delay);
        }
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dropfile::{Emulation, SessionDescriptor, TimeUnit};
    use crate::core::geometry::TerminalGeometry;
    use crate::ui::input::tests::{silent, ScriptedKeys};
    use crate::ui::input::{KeyPress, NamedKey};

    fn session() -> Session {
        let descriptor = SessionDescriptor {
            alias: "TESTER".to_string(),
            raw_alias: b"TESTER".to_vec(),
            time_left: 60,
            time_unit: TimeUnit::Minutes,
            emulation: Emulation::Ansi,
            node: Some(1),
        };
        Session::new(descriptor, TerminalGeometry::new(24, 80))
    }

    #[test]
    fn test_modal_renders_and_confirms() {
        let modal = Modal::new(ArtDocument::from_bytes(b"BOX\x1aSAUCE00".to_vec()), 14)
            .with_ack_delay(Duration::ZERO);
        let keys = ScriptedKeys::new(&[KeyPress::char('z'), KeyPress::named(NamedKey::Enter)]);
        let mut input = SessionInput::new(keys, Duration::from_secs(5), silent());
        let mut renderer = AnsiRenderer::new(Vec::new());

        let answer = modal.ask("Continue? Y/n!", &session(), &mut renderer, &mut input).unwrap();
        assert!(answer);

        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(
            out,
            "\x1b[10;33fBOX\
             \x1b[12;33f\x1b[46m\x1b[37;1mContinue? Y/n!\x1b[0m\
             \x1b[46m\x1b[36;1m Yes\x1b[0m\r\n"
        );
    }

    #[test]
    fn test_modal_no() {
        let modal = Modal::new(ArtDocument::from_bytes(Vec::new()), 33).with_ack_delay(Duration::ZERO);
        let keys = ScriptedKeys::new(&[KeyPress::char('n')]);
        let mut input = SessionInput::new(keys, Duration::from_secs(5), silent());
        let mut renderer = AnsiRenderer::new(Vec::new());

        assert!(!modal.ask("Quit?", &session(), &mut renderer, &mut input).unwrap());
        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(out.ends_with(" No\x1b[0m\r\n"));
    }
}
