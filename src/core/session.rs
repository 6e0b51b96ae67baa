//! Session bootstrap
//!
//! Combines the drop file with the probed terminal size. A `Session` is
//! built once per connection and never changes afterwards.

use std::io::{Read, Write};
use std::path::Path;

use tracing::info;

use super::dropfile::{Dialect, DropFileParser, Emulation, SessionDescriptor};
use super::geometry::{ModalGeometry, RawMode, TerminalGeometry, TerminalGeometryProbe};
use crate::error::DoorError;

/// Everything a door needs to know about the current caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    descriptor: SessionDescriptor,
    geometry: TerminalGeometry,
    modal: ModalGeometry,
}

impl Session {
    pub fn new(descriptor: SessionDescriptor, geometry: TerminalGeometry) -> Self {
        Self {
            modal: geometry.modal(),
            descriptor,
            geometry,
        }
    }

    /// Read the drop file, then ask the terminal for its size.
    ///
    /// The drop file comes first: without an identity there is no point
    /// talking to the terminal.
    pub fn bootstrap<R, W, M>(
        dir: &Path,
        node: Option<u32>,
        dialect: Dialect,
        probe: &mut TerminalGeometryProbe<R, W, M>,
    ) -> Result<Self, DoorError>
    where
        R: Read,
        W: Write,
        M: RawMode,
    {
        let descriptor = DropFileParser::new(dialect).parse_dir(dir, node)?;
        let geometry = probe.probe()?;
        let session = Self::new(descriptor, geometry);
        info!(
            "Session ready for {} ({}x{})",
            session.descriptor.alias, session.geometry.width, session.geometry.height
        );
        Ok(session)
    }

    pub fn descriptor(&self) -> &SessionDescriptor {
        &self.descriptor
    }

    pub fn geometry(&self) -> TerminalGeometry {
        self.geometry
    }

    pub fn modal(&self) -> ModalGeometry {
        self.modal
    }

    pub fn alias(&self) -> &str {
        &self.descriptor.alias
    }

    pub fn supports_ansi(&self) -> bool {
        self.descriptor.emulation == Emulation::Ansi
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dropfile::TimeUnit;

    fn descriptor(emulation: Emulation) -> SessionDescriptor {
        SessionDescriptor {
            alias: "TESTER".to_string(),
            raw_alias: b"TESTER".to_vec(),
            time_left: 60,
            time_unit: TimeUnit::Minutes,
            emulation,
            node: Some(3),
        }
    }

    #[test]
    fn test_modal_cached_from_geometry() {
        let session = Session::new(descriptor(Emulation::Ansi), TerminalGeometry::new(25, 81));
        assert_eq!(session.geometry(), TerminalGeometry::new(25, 81));
        assert_eq!(session.modal(), ModalGeometry { height: 24, width: 80 });
    }

    #[test]
    fn test_supports_ansi() {
        assert!(Session::new(descriptor(Emulation::Ansi), TerminalGeometry::FALLBACK).supports_ansi());
        assert!(!Session::new(descriptor(Emulation::Ascii), TerminalGeometry::FALLBACK).supports_ansi());
    }
}
