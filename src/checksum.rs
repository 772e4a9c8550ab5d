//! Checksum utilities for detecting drift in generated files

use sha2::{Digest, Sha256};
use std::fmt;

/// SHA256 checksum of rendered proto source
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum(String);

impl Checksum {
    /// Compute checksum from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Compute checksum from text
    pub fn from_text(content: &str) -> Self {
        Self::from_bytes(content.as_bytes())
    }

    /// Verify that content matches this checksum
    pub fn verify(&self, content: &str) -> bool {
        *self == Self::from_text(content)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_consistency() {
        let content = "syntax = \"proto3\";\n";
        assert_eq!(Checksum::from_text(content), Checksum::from_text(content));
    }

    #[test]
    fn test_checksum_verification() {
        let content = "message A {\n}\n";
        let checksum = Checksum::from_text(content);
        assert!(checksum.verify(content));
        assert!(!checksum.verify("message B {\n}\n"));
    }
}
