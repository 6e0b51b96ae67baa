//! Session bootstrap.
//!
//! - **cp437**: IBM PC character set decoding for drop file text
//! - **dropfile**: host-written caller descriptor (`door32.sys`, `DOOR.SYS`)
//! - **geometry**: remote terminal size via cursor position report
//! - **idle**: idle timeout guard and shutdown token
//! - **session**: the immutable per-connection `Session`
//!
//! # Bootstrap order
//!
//! ```text
//! Session
//! ├── SessionDescriptor (DropFileParser)
//! └── TerminalGeometry  (TerminalGeometryProbe)
//!     └── ModalGeometry (even-rounded, cached)
//! ```

pub mod cp437;
pub mod dropfile;
pub mod geometry;
pub mod idle;
pub mod session;
