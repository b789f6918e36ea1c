use std::fmt;

use sha2::{Digest, Sha256};

/// Address of one fragment: its owner plus its id.
///
/// Every storage call is keyed by both halves, so a lookup under the wrong
/// owner simply finds nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FragmentKey {
    owner_id: String,
    id: String,
}

impl FragmentKey {
    pub fn new(owner_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            id: id.into(),
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Directory name for an owner: hex SHA-256 of the owner id, so arbitrary
    /// owner strings map to a fixed-width, path-safe name.
    pub fn owner_shard(owner_id: &str) -> String {
        hex::encode(Sha256::digest(owner_id.as_bytes()))
    }

    /// Whether the id is safe to use as a file name.
    pub fn has_path_safe_id(&self) -> bool {
        !self.id.is_empty()
            && self.id.len() <= 128
            && self
                .id
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }
}

impl fmt::Display for FragmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner_id, self.id)
    }
}
