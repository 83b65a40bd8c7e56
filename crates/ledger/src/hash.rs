//! Versioned content digest.

/// 32-byte content hash.
pub type Hash32 = [u8; 32];

/// Digest algorithm identifier recorded alongside every entry. Bump this if
/// the hashing scheme ever changes; old keys stay valid under the old tag.
pub const DIGEST_VERSION: &str = "blake3-v1";

/// Hash the full raw file content. Metadata never participates.
pub fn content_hash(bytes: &[u8]) -> Hash32 {
    blake3::hash(bytes).into()
}

pub fn hash_to_hex(hash: &Hash32) -> String {
    hex::encode(hash)
}

pub fn hash_from_hex(s: &str) -> Option<Hash32> {
    let raw = hex::decode(s.trim()).ok()?;
    raw.try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_bytes_same_hash() {
        let a = content_hash(b"payload");
        let b = content_hash(b"payload");
        assert_eq!(a, b);
    }

    #[test]
    fn different_bytes_different_hash() {
        assert_ne!(content_hash(b"payload"), content_hash(b"payloae"));
    }

    #[test]
    fn hex_roundtrip() {
        let h = content_hash(b"roundtrip");
        let hex = hash_to_hex(&h);
        assert_eq!(hex.len(), 64);
        assert_eq!(hash_from_hex(&hex), Some(h));
        assert_eq!(hash_from_hex("zz"), None);
    }
}
