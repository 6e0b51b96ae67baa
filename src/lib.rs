//! doorkit - building blocks for BBS door programs
//!
//! A door is launched by the BBS host for a single caller. doorkit covers
//! the plumbing every door needs before it can do anything interesting:
//!
//! - **Drop files**: read `door32.sys` / `DOOR.SYS` into a [`SessionDescriptor`]
//! - **Terminal size**: probe the remote terminal with a cursor position report
//! - **Idle timeout**: drop callers who stop typing
//! - **ANSI art**: strip SAUCE records, stream, position and center art
//! - **Dialogs**: centered yes/no modals
//!
//! # Quick Start
//!
//! ```no_run
//! use std::io;
//! use std::path::Path;
//! use std::time::Duration;
//!
//! use doorkit::core::geometry::{raw_stdin, CrosstermRawMode, TerminalGeometryProbe};
//! use doorkit::ui::input::stdout_notice;
//! use doorkit::{AnsiRenderer, CrosstermKeys, Dialect, Session, SessionInput};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut probe = TerminalGeometryProbe::new(raw_stdin()?, io::stdout(), CrosstermRawMode);
//!     let session = Session::bootstrap(Path::new("/bbs/temp/1"), None, Dialect::Door32, &mut probe)?;
//!
//!     let mut renderer = AnsiRenderer::new(io::stdout());
//!     let mut input = SessionInput::new(
//!         CrosstermKeys,
//!         Duration::from_secs(300),
//!         stdout_notice(Duration::from_secs(2)),
//!     );
//!     renderer.println(&format!("Hello, {}!", session.alias()))?;
//!     input.pause(renderer.get_mut())?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod ui;

pub use crate::config::Config;
pub use crate::core::dropfile::{Dialect, DropFileParser, Emulation, SessionDescriptor};
pub use crate::core::geometry::{ModalGeometry, TerminalGeometry, TerminalGeometryProbe};
pub use crate::core::idle::{IdleGuard, ShutdownToken};
pub use crate::core::session::Session;
pub use crate::error::{DoorError, Result};
pub use crate::ui::{AnsiRenderer, CrosstermKeys, SessionInput};
