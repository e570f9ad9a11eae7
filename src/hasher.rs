//! Mapping of caller keys onto store-safe internal keys.
//!
//! Keys are hashed with SHA-256 and rendered as 64 lowercase hex characters,
//! which is safe as a file name on every supported platform. Two distinct
//! keys hashing to the same digest would share an entry; at this digest width
//! that is accepted rather than detected.

use std::fmt;

use sha2::{Digest, Sha256};

/// Fixed-width identifier under which an entry is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InternalKey(String);

impl InternalKey {
    /// Hash a caller key.
    pub fn of(key: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Wrap a string that is already an internal key, e.g. a file stem found on disk.
    ///
    /// Returns `None` unless `raw` has the exact shape produced by [`InternalKey::of`].
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = raw.len() == Self::LEN
            && raw.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(raw.to_string()))
    }

    /// Length of every internal key in characters.
    pub const LEN: usize = 64;

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InternalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for InternalKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic_and_fixed_width() {
        let a = InternalKey::of("user:123");
        let b = InternalKey::of("user:123");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), InternalKey::LEN);
        assert_eq!(InternalKey::of("").as_str().len(), InternalKey::LEN);
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            InternalKey::of("abc").as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_distinct_keys_differ() {
        assert_ne!(InternalKey::of("a"), InternalKey::of("b"));
    }

    #[test]
    fn test_parse_accepts_only_digests() {
        let key = InternalKey::of("hello");
        assert_eq!(InternalKey::parse(key.as_str()), Some(key));
        assert!(InternalKey::parse("VERSION").is_none());
        assert!(InternalKey::parse(&"g".repeat(64)).is_none());
    }
}
