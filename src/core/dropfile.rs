//! Drop file parsing
//!
//! The BBS host writes a small text file describing the caller before it
//! launches the door. Fields live at fixed line numbers; which numbers
//! depends on the file format, so the caller picks the [`Dialect`].
//!
//! | Dialect  | File        | alias | time | emulation | node |
//! |----------|-------------|-------|------|-----------|------|
//! | Door32   | `door32.sys`| 6     | 8    | 9         | 10   |
//! | DoorSys  | `DOOR.SYS`  | 7     | 9    | 10        | -    |
//!
//! Line numbers are 0-based. Parsing is all-or-nothing.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::cp437;
use crate::ui::renderer::lines;

#[derive(Error, Debug)]
pub enum DropFileError {
    #[error("No {file} found in {}", .dir.display())]
    NotFound { file: &'static str, dir: PathBuf },

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Drop file has {lines} lines, {dialect} needs at least {needed}")]
    TooShort {
        dialect: Dialect,
        lines: usize,
        needed: usize,
    },

    #[error("Line {line} ({field}) is empty")]
    Empty { line: usize, field: &'static str },

    #[error("Line {line} ({field}) is not a number: {value:?}")]
    NotANumber {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("Unknown emulation {0}, expected 0 (ASCII) or 1 (ANSI)")]
    UnknownEmulation(u32),
}

pub type Result<T> = std::result::Result<T, DropFileError>;

/// Remaining-time unit written by a dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Minutes,
    Seconds,
}

/// Line positions of each field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldIndex {
    pub alias: usize,
    pub time_left: usize,
    pub emulation: usize,
    pub node: Option<usize>,
    /// Minimum number of lines a well-formed file has
    pub min_lines: usize,
}

/// Supported drop file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Compact `door32.sys`
    #[default]
    Door32,
    /// Extended `DOOR.SYS`
    DoorSys,
}

impl Dialect {
    /// File name looked up (case-insensitively) in the drop directory
    pub fn file_name(self) -> &'static str {
        match self {
            Dialect::Door32 => "door32.sys",
            Dialect::DoorSys => "door.sys",
        }
    }

    pub fn fields(self) -> FieldIndex {
        match self {
            Dialect::Door32 => FieldIndex {
                alias: 6,
                time_left: 8,
                emulation: 9,
                node: Some(10),
                min_lines: 11,
            },
            Dialect::DoorSys => FieldIndex {
                alias: 7,
                time_left: 9,
                emulation: 10,
                node: None,
                min_lines: 51,
            },
        }
    }

    pub fn time_unit(self) -> TimeUnit {
        match self {
            Dialect::Door32 => TimeUnit::Minutes,
            Dialect::DoorSys => TimeUnit::Seconds,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Door32 => write!(f, "door32"),
            Dialect::DoorSys => write!(f, "doorsys"),
        }
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "door32" | "door32.sys" => Ok(Dialect::Door32),
            "doorsys" | "door.sys" => Ok(Dialect::DoorSys),
            other => Err(format!("Unknown drop file dialect: {}", other)),
        }
    }
}

/// Terminal capability announced by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emulation {
    Ascii = 0,
    Ansi = 1,
}

impl Emulation {
    pub fn name(self) -> &'static str {
        match self {
            Emulation::Ascii => "ASCII",
            Emulation::Ansi => "ANSI",
        }
    }
}

impl TryFrom<u32> for Emulation {
    type Error = DropFileError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Emulation::Ascii),
            1 => Ok(Emulation::Ansi),
            n => Err(DropFileError::UnknownEmulation(n)),
        }
    }
}

/// Who is calling and what they are entitled to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescriptor {
    /// Display name, decoded for logs and width math
    pub alias: String,
    /// Alias bytes exactly as the host wrote them, for echoing back
    pub raw_alias: Vec<u8>,
    pub time_left: u32,
    pub time_unit: TimeUnit,
    pub emulation: Emulation,
    pub node: Option<u32>,
}

impl SessionDescriptor {
    /// Remaining time as a duration
    pub fn time_left_duration(&self) -> Duration {
        match self.time_unit {
            TimeUnit::Minutes => Duration::from_secs(u64::from(self.time_left) * 60),
            TimeUnit::Seconds => Duration::from_secs(u64::from(self.time_left)),
        }
    }
}

/// Reads drop files of one dialect
#[derive(Debug, Clone, Copy)]
pub struct DropFileParser {
    dialect: Dialect,
}

impl DropFileParser {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Parse the drop file in `dir`, or in `dir/node<N>` when a node is given
    pub fn parse_dir(&self, dir: &Path, node: Option<u32>) -> Result<SessionDescriptor> {
        let dir = match node {
            Some(n) => dir.join(format!("node{}", n)),
            None => dir.to_path_buf(),
        };
        let path = self.locate(&dir)?;
        self.parse_file(&path)
    }

    /// Find the drop file, ignoring case (`DOOR32.SYS`, `door32.sys`...)
    pub fn locate(&self, dir: &Path) -> Result<PathBuf> {
        let wanted = self.dialect.file_name();
        let not_found = || DropFileError::NotFound {
            file: wanted,
            dir: dir.to_path_buf(),
        };

        let entries = fs::read_dir(dir).map_err(|_| not_found())?;
        for entry in entries.flatten() {
            if entry.file_name().to_string_lossy().eq_ignore_ascii_case(wanted) {
                return Ok(entry.path());
            }
        }
        Err(not_found())
    }

    pub fn parse_file(&self, path: &Path) -> Result<SessionDescriptor> {
        let bytes = fs::read(path).map_err(|source| DropFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let descriptor = self.parse_bytes(&bytes)?;
        info!(
            "Drop file {}: alias={} node={:?} time_left={} emulation={}",
            path.display(),
            descriptor.alias,
            descriptor.node,
            descriptor.time_left,
            descriptor.emulation.name()
        );
        Ok(descriptor)
    }

    /// Parse drop file bytes as written by the host. The alias is CP437.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<SessionDescriptor> {
        self.parse_lines(lines(bytes).collect(), cp437::decode)
    }

    /// Parse drop file text that is already Unicode
    pub fn parse_str(&self, text: &str) -> Result<SessionDescriptor> {
        self.parse_lines(lines(text.as_bytes()).collect(), |alias| {
            String::from_utf8_lossy(alias).into_owned()
        })
    }

    fn parse_lines<D>(&self, lines: Vec<&[u8]>, decode: D) -> Result<SessionDescriptor>
    where
        D: Fn(&[u8]) -> String,
    {
        let fields = self.dialect.fields();
        debug!("Parsing {} drop file with {} lines", self.dialect, lines.len());

        if lines.len() < fields.min_lines {
            return Err(DropFileError::TooShort {
                dialect: self.dialect,
                lines: lines.len(),
                needed: fields.min_lines,
            });
        }

        let alias = lines[fields.alias].trim_ascii();
        if alias.is_empty() {
            return Err(DropFileError::Empty {
                line: fields.alias,
                field: "alias",
            });
        }

        let time_left = number(&lines, fields.time_left, "time left")?;
        let emulation = Emulation::try_from(number(&lines, fields.emulation, "emulation")?)?;
        let node = match fields.node {
            Some(line) => Some(number(&lines, line, "node")?),
            None => None,
        };

        Ok(SessionDescriptor {
            alias: decode(alias),
            raw_alias: alias.to_vec(),
            time_left,
            time_unit: self.dialect.time_unit(),
            emulation,
            node,
        })
    }
}

fn number(lines: &[&[u8]], line: usize, field: &'static str) -> Result<u32> {
    let value = lines[line].trim_ascii();
    std::str::from_utf8(value)
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or_else(|| DropFileError::NotANumber {
            line,
            field,
            value: String::from_utf8_lossy(value).into_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn door32(alias: &str, time: &str, emulation: &str, node: &str) -> String {
        [
            "2", "5", "38400", "Mystic BBS", "1", "Real Name", alias, "100", time, emulation,
            node,
        ]
        .join("\r\n")
    }

    #[test]
    fn test_parse_door32() {
        let parser = DropFileParser::new(Dialect::Door32);
        let descriptor = parser.parse_str(&door32("TESTER", "60", "1", "3")).unwrap();
        assert_eq!(descriptor.alias, "TESTER");
        assert_eq!(descriptor.time_left, 60);
        assert_eq!(descriptor.emulation, Emulation::Ansi);
        assert_eq!(descriptor.node, Some(3));
        assert_eq!(descriptor.time_left_duration(), Duration::from_secs(3600));
    }

    #[test]
    fn test_non_numeric_time_is_fatal() {
        let parser = DropFileParser::new(Dialect::Door32);
        let err = parser.parse_str(&door32("TESTER", "sixty", "1", "3")).unwrap_err();
        assert!(matches!(err, DropFileError::NotANumber { line: 8, .. }));
    }

    #[test]
    fn test_bad_node_and_emulation() {
        let parser = DropFileParser::new(Dialect::Door32);
        assert!(matches!(
            parser.parse_str(&door32("TESTER", "60", "1", "x")),
            Err(DropFileError::NotANumber { field: "node", .. })
        ));
        assert!(matches!(
            parser.parse_str(&door32("TESTER", "60", "7", "1")),
            Err(DropFileError::UnknownEmulation(7))
        ));
    }

    #[test]
    fn test_missing_lines() {
        let parser = DropFileParser::new(Dialect::Door32);
        let err = parser.parse_str("1\n2\n3\n").unwrap_err();
        assert!(matches!(err, DropFileError::TooShort { lines: 3, needed: 11, .. }));
    }

    #[test]
    fn test_empty_alias() {
        let parser = DropFileParser::new(Dialect::Door32);
        let err = parser.parse_str(&door32("  ", "60", "1", "3")).unwrap_err();
        assert!(matches!(err, DropFileError::Empty { field: "alias", .. }));
    }

    #[test]
    fn test_parse_door_sys() {
        let mut lines: Vec<String> = (0..52).map(|i| format!("field{}", i)).collect();
        lines[7] = "SYSOP".to_string();
        lines[9] = "1800".to_string();
        lines[10] = "0".to_string();
        let parser = DropFileParser::new(Dialect::DoorSys);
        let descriptor = parser.parse_str(&lines.join("\n")).unwrap();
        assert_eq!(descriptor.alias, "SYSOP");
        assert_eq!(descriptor.time_left, 1800);
        assert_eq!(descriptor.emulation, Emulation::Ascii);
        assert_eq!(descriptor.node, None);
        assert_eq!(descriptor.time_left_duration(), Duration::from_secs(1800));
    }

    #[test]
    fn test_door_sys_needs_51_lines() {
        let text = (0..20).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let parser = DropFileParser::new(Dialect::DoorSys);
        assert!(matches!(parser.parse_str(&text), Err(DropFileError::TooShort { .. })));
    }

    #[test]
    fn test_locate_ignores_case() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("DOOR32.SYS"), door32("CASE", "5", "1", "1")).unwrap();
        let parser = DropFileParser::new(Dialect::Door32);
        let descriptor = parser.parse_dir(dir.path(), None).unwrap();
        assert_eq!(descriptor.alias, "CASE");
    }

    #[test]
    fn test_node_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("node2")).unwrap();
        fs::write(dir.path().join("node2").join("door32.sys"), door32("NODE", "5", "1", "2")).unwrap();
        let parser = DropFileParser::new(Dialect::Door32);
        assert_eq!(parser.parse_dir(dir.path(), Some(2)).unwrap().node, Some(2));
        assert!(matches!(
            parser.parse_dir(dir.path(), None),
            Err(DropFileError::NotFound { .. })
        ));
    }

    #[test]
    fn test_alias_keeps_host_bytes() {
        let mut file = b"2\r\n5\r\n38400\r\nMystic BBS\r\n1\r\nReal Name\r\n".to_vec();
        file.extend_from_slice(b"P\x96rpl\x82\r\n100\r\n60\r\n1\r\n4\r\n");
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("door32.sys"), &file).unwrap();

        let descriptor = DropFileParser::new(Dialect::Door32)
            .parse_dir(dir.path(), None)
            .unwrap();
        assert_eq!(descriptor.raw_alias, b"P\x96rpl\x82");
        assert_eq!(descriptor.alias, "Pûrplé");
        assert_eq!(descriptor.node, Some(4));
    }

    #[test]
    fn test_dialect_from_str() {
        assert_eq!("DOOR32".parse::<Dialect>().unwrap(), Dialect::Door32);
        assert_eq!("door.sys".parse::<Dialect>().unwrap(), Dialect::DoorSys);
        assert!("pcboard".parse::<Dialect>().is_err());
    }
}
