//! SAUCE metadata stripping
//!
//! ANSI art files usually carry a trailing SAUCE record (and optionally a
//! COMNT block) after the visible content. Neither is meant to be shown, so
//! everything from the first marker onwards is dropped before rendering.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::renderer::RenderError;

/// Comment block marker
pub const COMMENT_MARKER: &[u8] = b"COMNT";
/// SAUCE record marker (includes the version)
pub const SAUCE_MARKER: &[u8] = b"SAUCE00";

/// Return the display region of an art file.
///
/// Cuts at the first `COMNT` or `SAUCE00`, whichever comes first, and drops
/// the single code point sitting right before it (the EOF character).
/// Input without either marker is returned untouched.
pub fn strip_sauce(bytes: &[u8]) -> &[u8] {
    let cut = [COMMENT_MARKER, SAUCE_MARKER]
        .iter()
        .filter_map(|marker| find(bytes, marker))
        .min();

    match cut {
        Some(idx) => trim_last_char(&bytes[..idx]),
        None => bytes,
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Drop one trailing UTF-8 code point.
///
/// A trailing byte that does not end a valid sequence is kept as is.
fn trim_last_char(bytes: &[u8]) -> &[u8] {
    let len = bytes.len();
    for width in 1..=4.min(len) {
        let start = len - width;
        // Only a lead byte (or ASCII) can start the final code point
        if bytes[start] & 0xC0 == 0x80 {
            continue;
        }
        return match std::str::from_utf8(&bytes[start..]) {
            Ok(_) => &bytes[..start],
            Err(_) => bytes,
        };
    }
    bytes
}

/// Raw bytes of an art file
#[derive(Debug, Clone)]
pub struct ArtDocument {
    path: Option<PathBuf>,
    bytes: Vec<u8>,
}

impl ArtDocument {
    /// Wrap bytes already in memory
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: None,
            bytes: bytes.into(),
        }
    }

    /// Read an art file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| RenderError::ArtFile {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded art {} ({} bytes)", path.display(), bytes.len());
        Ok(Self {
            path: Some(path.to_path_buf()),
            bytes,
        })
    }

    /// File the document was read from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// All bytes, metadata included
    pub fn raw(&self) -> &[u8] {
        &self.bytes
    }

    /// The part of the document that may be rendered
    pub fn display(&self) -> &[u8] {
        strip_sauce(&self.bytes)
    }

    /// Whether the document carries trailing metadata
    pub fn has_metadata(&self) -> bool {
        self.display().len() != self.bytes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_sauce_record() {
        let art = b"\x1b[31mHELLO\x1b[0m\r\n\x1aSAUCE00title";
        assert_eq!(strip_sauce(art), b"\x1b[31mHELLO\x1b[0m\r\n");
    }

    #[test]
    fn test_strip_comment_before_sauce() {
        let art = b"art\x1aCOMNTsome comment SAUCE00rest";
        assert_eq!(strip_sauce(art), b"art");
    }

    #[test]
    fn test_earliest_marker_wins() {
        // SAUCE00 precedes a stray COMNT inside the record
        let art = b"art\x1aSAUCE00 COMNT";
        assert_eq!(strip_sauce(art), b"art");
    }

    #[test]
    fn test_no_marker_is_unchanged() {
        let art = b"plain text\r\nno metadata here";
        assert_eq!(strip_sauce(art), &art[..]);
    }

    #[test]
    fn test_multibyte_char_before_marker() {
        // "é" is two bytes; it must go as a whole
        let art = "caféSAUCE00".as_bytes();
        assert_eq!(strip_sauce(art), b"caf");
    }

    #[test]
    fn test_invalid_trailing_byte_is_kept() {
        // CP437 byte that is not valid UTF-8 on its own
        let art = b"box\xdbSAUCE00";
        assert_eq!(strip_sauce(art), b"box\xdb");
    }

    #[test]
    fn test_marker_at_start() {
        assert_eq!(strip_sauce(b"SAUCE00data"), b"");
    }

    #[test]
    fn test_art_document_display() {
        let doc = ArtDocument::from_bytes(b"line one\r\nline two\x1aSAUCE00".to_vec());
        assert!(doc.has_metadata());
        assert_eq!(doc.display(), b"line one\r\nline two");
        assert!(doc.path().is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let err = ArtDocument::load("/nonexistent/doorkit/art.ans").unwrap_err();
        assert!(matches!(err, RenderError::ArtFile { .. }));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Stripping twice is the same as stripping once
        #[test]
        fn strip_is_idempotent(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let once = strip_sauce(&bytes);
            prop_assert_eq!(strip_sauce(once), once);
        }

        /// Same property with markers planted in the input
        #[test]
        fn strip_is_idempotent_with_markers(
            head in ".{0,40}",
            tail in proptest::collection::vec(any::<u8>(), 0..64),
            marker in prop_oneof![Just("COMNT"), Just("SAUCE00")]
        ) {
            let mut bytes = head.into_bytes();
            bytes.extend_from_slice(marker.as_bytes());
            bytes.extend(tail);
            let once = strip_sauce(&bytes);
            prop_assert_eq!(strip_sauce(once), once);
        }

        /// Valid UTF-8 text stays valid UTF-8 after the cut
        #[test]
        fn strip_keeps_char_boundaries(head in "\\PC{0,40}", tail in "\\PC{0,20}") {
            let input = format!("{}SAUCE00{}", head, tail);
            let out = strip_sauce(input.as_bytes());
            prop_assert!(std::str::from_utf8(out).is_ok());
            let mut expected = head.clone();
            expected.pop();
            prop_assert_eq!(out, expected.as_bytes());
        }
    }
}
