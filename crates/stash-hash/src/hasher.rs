use xxhash_rust::xxh3::Xxh3;

use crate::digest::Digest;

/// Domain-separated XXH3-128 content hasher.
///
/// The domain tag is fed to the hash state ahead of the data. XXH3 is
/// non-cryptographic: digests are for change detection, never for
/// tamper-proofing.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for serialized store caches.
    pub const CACHE: Self = Self {
        domain: "stash-cache-v1",
    };

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> Digest {
        let mut hasher = Xxh3::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        Digest::from_u128(hasher.digest128())
    }

    /// Hash a serializable value through its JSON encoding.
    pub fn hash_json<T>(&self, value: &T) -> Result<Digest, HasherError>
    where
        T: serde::Serialize + ?Sized,
    {
        let data =
            serde_json::to_vec(value).map_err(|e| HasherError::Serialization(e.to_string()))?;
        Ok(self.hash(&data))
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn hash_is_deterministic() {
        let a = ContentHasher::CACHE.hash(b"hello world");
        let b = ContentHasher::CACHE.hash(b"hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn different_content_differs() {
        assert_ne!(
            ContentHasher::CACHE.hash(b"one"),
            ContentHasher::CACHE.hash(b"two")
        );
    }

    #[test]
    fn domain_tag_is_part_of_the_input() {
        let plain = xxhash_rust::xxh3::xxh3_128(b"same");
        assert_ne!(ContentHasher::CACHE.hash(b"same"), Digest::from_u128(plain));
    }

    #[test]
    fn hash_json_ignores_map_insertion_order() {
        let mut first = BTreeMap::new();
        first.insert("b", 2);
        first.insert("a", 1);
        let mut second = BTreeMap::new();
        second.insert("a", 1);
        second.insert("b", 2);
        assert_eq!(
            ContentHasher::CACHE.hash_json(&first).unwrap(),
            ContentHasher::CACHE.hash_json(&second).unwrap()
        );
    }

    #[test]
    fn hash_json_equals_hash_of_encoding() {
        let value = serde_json::json!({"key": "value", "num": 42});
        let bytes = serde_json::to_vec(&value).unwrap();
        assert_eq!(
            ContentHasher::CACHE.hash_json(&value).unwrap(),
            ContentHasher::CACHE.hash(&bytes)
        );
    }

    #[test]
    fn hash_json_reports_unencodable_values() {
        let mut map = BTreeMap::new();
        map.insert((1, 2), 3);
        let err = ContentHasher::CACHE.hash_json(&map).unwrap_err();
        assert!(matches!(
            err,
            HasherError::Serialization(ref m) if m.contains("key must be a string")
        ));
    }
}
