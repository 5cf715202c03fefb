//! Content-based font detection
//!
//! Candidate files are classified by their leading bytes, never by extension.
//! Only the first [`SNIFF_LEN`] bytes are ever read.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Maximum number of leading bytes inspected per file
pub const SNIFF_LEN: usize = 512;

/// Font container formats recognised by [`detect`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontKind {
    /// TrueType outlines (`00 01 00 00`)
    TrueType,
    /// OpenType with CFF outlines (`OTTO`)
    OpenType,
    /// TrueType/OpenType collection (`ttcf`)
    Collection,
    /// Legacy Apple TrueType (`true`)
    AppleTrueType,
    /// Web Open Font Format 1.0 (`wOFF`)
    Woff,
    /// Web Open Font Format 2.0 (`wOF2`)
    Woff2,
}

impl FontKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::TrueType => "truetype",
            Self::OpenType => "opentype",
            Self::Collection => "collection",
            Self::AppleTrueType => "apple-truetype",
            Self::Woff => "woff",
            Self::Woff2 => "woff2",
        }
    }
}

const SIGNATURES: &[(&[u8], FontKind)] = &[
    (&[0x00, 0x01, 0x00, 0x00, 0x00], FontKind::TrueType),
    (b"OTTO\x00", FontKind::OpenType),
    (b"ttcf", FontKind::Collection),
    (b"true", FontKind::AppleTrueType),
    (b"wOFF", FontKind::Woff),
    (b"wOF2", FontKind::Woff2),
];

/// Identify the font container format of `bytes`, if any
pub fn detect(bytes: &[u8]) -> Option<FontKind> {
    SIGNATURES
        .iter()
        .find(|(magic, _)| bytes.starts_with(magic))
        .map(|(_, kind)| *kind)
}

/// Check whether `bytes` start with a known font signature
pub fn is_font(bytes: &[u8]) -> bool {
    detect(bytes).is_some()
}

/// Read up to [`SNIFF_LEN`] bytes of `path` and check for a font signature.
///
/// Files shorter than the sniff window are inspected as-is. Open and read
/// failures are logged and classify the file as "not a font".
pub fn sniff_file(path: &Path) -> bool {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!("Could not open {} for validation: {}", path.display(), e);
            return false;
        }
    };

    match sniff_reader(&mut file) {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!("Could not read {} for validation: {}", path.display(), e);
            false
        }
    }
}

/// Check the first [`SNIFF_LEN`] bytes of an already open reader.
///
/// The reader is left wherever the sniff stopped; callers that go on to
/// read the content must rewind it.
pub fn sniff_reader<R: Read>(reader: &mut R) -> io::Result<bool> {
    let mut buf = [0u8; SNIFF_LEN];
    let n = read_prefix(reader, &mut buf)?;
    Ok(is_font(&buf[..n]))
}

/// Fill `buf` from `reader`, stopping early at end of file
fn read_prefix<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
