//! BLAKE3 content fingerprints for change detection
//!
//! Fingerprints are short (16 hex chars) and only meant to tell two versions
//! of a file apart. They are not a security primitive.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

/// Sentinel stored in place of a digest for content that is not UTF-8 text
pub const BINARY_SENTINEL: &str = "binary";

/// Number of hex characters kept from the BLAKE3 digest
pub const FINGERPRINT_LEN: usize = 16;

/// Content fingerprint of a single file
#[derive(Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Fingerprint {
    /// Truncated hex digest of UTF-8 text content
    Digest(String),
    /// Content could not be decoded (or read) as text
    Binary,
}

impl Fingerprint {
    /// Fingerprint raw bytes
    ///
    /// Bytes that are not valid UTF-8 map to [`Fingerprint::Binary`].
    pub fn of_bytes(data: &[u8]) -> Self {
        if std::str::from_utf8(data).is_err() {
            return Fingerprint::Binary;
        }
        let hex = blake3::hash(data).to_hex();
        Fingerprint::Digest(hex.as_str()[..FINGERPRINT_LEN].to_string())
    }

    /// String form as persisted in the ledger
    pub fn as_str(&self) -> &str {
        match self {
            Fingerprint::Digest(hex) => hex,
            Fingerprint::Binary => BINARY_SENTINEL,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Fingerprint::Binary)
    }
}

impl From<String> for Fingerprint {
    fn from(value: String) -> Self {
        if value == BINARY_SENTINEL {
            Fingerprint::Binary
        } else {
            Fingerprint::Digest(value)
        }
    }
}

impl From<Fingerprint> for String {
    fn from(value: Fingerprint) -> Self {
        match value {
            Fingerprint::Digest(hex) => hex,
            Fingerprint::Binary => BINARY_SENTINEL.to_string(),
        }
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.as_str())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of fingerprinting a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashOutcome {
    /// File exists; its fingerprint (possibly the binary sentinel)
    Present(Fingerprint),
    /// File vanished (deleted or renamed mid-scan)
    Missing,
}

impl HashOutcome {
    pub fn fingerprint(self) -> Option<Fingerprint> {
        match self {
            HashOutcome::Present(fp) => Some(fp),
            HashOutcome::Missing => None,
        }
    }
}

/// Fingerprint a file on disk
///
/// Never fails: a missing file is reported as [`HashOutcome::Missing`], any
/// other read error degrades to the binary sentinel.
pub fn fingerprint_file(path: &Path) -> HashOutcome {
    match std::fs::read(path) {
        Ok(data) => HashOutcome::Present(Fingerprint::of_bytes(&data)),
        Err(e) if e.kind() == ErrorKind::NotFound => HashOutcome::Missing,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Unreadable file, using binary sentinel");
            HashOutcome::Present(Fingerprint::Binary)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_fingerprint_is_fixed_width_and_deterministic() {
        let a = Fingerprint::of_bytes(b"fn main() {}\n");
        let b = Fingerprint::of_bytes(b"fn main() {}\n");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), FINGERPRINT_LEN);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));

        let c = Fingerprint::of_bytes(b"fn main() { todo() }\n");
        assert_ne!(a, c);
    }

    #[test]
    fn test_non_utf8_is_binary() {
        let fp = Fingerprint::of_bytes(&[0xff, 0xfe, 0x00, 0x81]);
        assert!(fp.is_binary());
        assert_eq!(fp.to_string(), BINARY_SENTINEL);
    }

    #[test]
    fn test_fingerprint_file_outcomes() {
        let temp_dir = TempDir::new().unwrap();
        let text = temp_dir.path().join("a.py");
        let blob = temp_dir.path().join("logo.png");
        fs::write(&text, "print('hi')\n").unwrap();
        fs::write(&blob, [0x89, 0x50, 0x4e, 0x47, 0xff, 0xd8]).unwrap();

        match fingerprint_file(&text) {
            HashOutcome::Present(Fingerprint::Digest(hex)) => assert_eq!(hex.len(), FINGERPRINT_LEN),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(
            fingerprint_file(&blob),
            HashOutcome::Present(Fingerprint::Binary)
        );
        assert_eq!(
            fingerprint_file(&temp_dir.path().join("gone.rs")),
            HashOutcome::Missing
        );
    }

    #[test]
    fn test_sentinel_string_roundtrip() {
        assert_eq!(Fingerprint::from(BINARY_SENTINEL.to_string()), Fingerprint::Binary);
        let fp = Fingerprint::from("0123456789abcdef".to_string());
        assert_eq!(String::from(fp), "0123456789abcdef");
    }
}
