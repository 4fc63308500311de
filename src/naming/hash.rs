//! Content hashing using blake3.

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash a byte buffer.
    #[inline]
    pub fn of(data: impl AsRef<[u8]>) -> Self {
        Self(*blake3::hash(data.as_ref()).as_bytes())
    }

    /// Convert to hex string.
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    /// First `len` hex characters (clamped to the full 64).
    pub fn short(self, len: usize) -> String {
        let mut hex = self.to_hex();
        hex.truncate(len.min(hex.len()));
        hex
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Display first 16 chars of hex for brevity
        write!(f, "{}", &self.to_hex()[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_display() {
        let hash = ContentHash::of(b"bundle");
        assert_eq!(format!("{}", hash), hash.short(16));
    }

    #[test]
    fn test_short_clamps() {
        let hash = ContentHash::of(b"x");
        assert_eq!(hash.short(10).len(), 10);
        assert_eq!(hash.short(200).len(), 64);
        assert!(hash.to_hex().starts_with(&hash.short(8)));
    }

    #[test]
    fn test_single_byte_change_changes_hash() {
        assert_eq!(ContentHash::of(b"abc"), ContentHash::of(b"abc"));
        assert_ne!(ContentHash::of(b"abc"), ContentHash::of(b"abd"));
    }
}
