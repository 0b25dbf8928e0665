use blockwatch_types::BlockHash;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g., `"blockwatch-block-v1"`) that is
/// prepended to every hash computation, so identical bytes hashed under two
/// domains never collide.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for ledger blocks.
    pub const BLOCK: Self = Self::new("blockwatch-block-v1");

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash the concatenation of `parts` with domain separation.
    pub fn digest(&self, parts: &[&[u8]]) -> BlockHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        for part in parts {
            hasher.update(part);
        }
        BlockHash::from_digest(*hasher.finalize().as_bytes())
    }
}
