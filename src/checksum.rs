//! Fingerprints
//!
//! SHA-256 digests of loaded descriptor sets and of every generated unit.
//! Generated modules print the short form in their comments.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    pub fn from_str(content: &str) -> Self {
        Self(format!("{:x}", Sha256::digest(content.as_bytes())))
    }

    /// Digest of an ordered sequence of parts. Each part is terminated by a
    /// NUL byte, so moving text between neighbouring parts changes the result.
    pub fn of_parts<I, P>(parts: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.as_ref());
            hasher.update([0u8]);
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_checksum() {
        let code = "pub struct Person {}";
        assert_eq!(Checksum::from_str(code), Checksum::from_str(code));
        assert_ne!(Checksum::from_str(code), Checksum::from_str("pub struct Place {}"));
        assert_eq!(Checksum::from_str(code).as_str().len(), 64);
    }

    #[test]
    fn test_parts_are_delimited() {
        let split = Checksum::of_parts(["a.json", "{}"]);
        let shifted = Checksum::of_parts(["a.json{", "}"]);
        assert_ne!(split, shifted);
        assert_eq!(split, Checksum::of_parts(vec!["a.json".to_string(), "{}".to_string()]));
    }

    #[test]
    fn test_display_is_short_form() {
        let checksum = Checksum::from_str("x");
        assert_eq!(checksum.to_string().len(), 12);
        assert!(checksum.as_str().starts_with(checksum.short()));
    }
}
