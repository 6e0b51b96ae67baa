//! Caller-facing output and input.
//!
//! - **ansi**: escape sequences as crossterm commands
//! - **sauce**: SAUCE/COMNT stripping and art documents
//! - **renderer**: stream, positioned and centered rendering
//! - **input**: idle-guarded key reads and yes/no confirmation
//! - **modal**: centered yes/no dialog

pub mod ansi;
pub mod input;
pub mod modal;
pub mod renderer;
pub mod sauce;

pub use ansi::{Attrs, Color, Font, Style};
pub use input::{Answer, CrosstermKeys, KeyPress, KeySource, NamedKey, SessionInput};
pub use modal::Modal;
pub use renderer::AnsiRenderer;
pub use sauce::{strip_sauce, ArtDocument};
