//! Content digests using BLAKE3.

use crate::error::{Error, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Digest length in bytes.
pub const HASH_SIZE: usize = 32;

/// BLAKE3 digest of a blob's content or of a whole subtree.
///
/// Displays and serialises as 64 lowercase hex characters and parses back
/// from the same form, so a digest printed by one run can be checked by
/// another.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    /// Digest of `data`.
    pub fn of(data: &[u8]) -> Self {
        Hash(*blake3::hash(data).as_bytes())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for Hash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut digest = [0u8; HASH_SIZE];
        hex::decode_to_slice(s.trim(), &mut digest).map_err(|e| {
            Error::invalid_argument(format!("not a {}-byte hex digest: {}", HASH_SIZE, e))
        })?;
        Ok(Hash(digest))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps tree dumps readable
        write!(f, "Hash({}..)", &self.to_hex()[..12])
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Kind of entry folded into a node digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum EntryKind {
    Blob = 1,
    Node = 2,
}

/// Incremental Merkle digest over the named entries of one tree level.
///
/// Entries are sorted by name (bytewise UTF-8) before hashing, so the
/// digest does not depend on insertion order. Each entry is encoded as:
/// - 1 byte: kind (1=blob, 2=node)
/// - 32 bytes: hash
/// - 4 bytes: name_len (u32 LE)
/// - N bytes: name (UTF-8)
#[derive(Debug, Default)]
pub(crate) struct DigestBuilder {
    entries: Vec<(String, EntryKind, Hash)>,
}

impl DigestBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, name: &str, kind: EntryKind, hash: Hash) {
        self.entries.push((name.to_string(), kind, hash));
    }

    pub(crate) fn finish(mut self) -> Hash {
        self.entries
            .sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()).then(a.1.cmp(&b.1)));

        let mut hasher = blake3::Hasher::new();
        for (name, kind, hash) in &self.entries {
            hasher.update(&[*kind as u8]);
            hasher.update(&hash.0);
            hasher.update(&(name.len() as u32).to_le_bytes());
            hasher.update(name.as_bytes());
        }
        Hash(*hasher.finalize().as_bytes())
    }
}
