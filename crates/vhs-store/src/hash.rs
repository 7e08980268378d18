use vhs_types::ObjectId;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g. `"vhs-tree-v1"`) that is prepended
/// to every hash computation. This prevents cross-kind hash collisions: a
/// tree and a commit with identical serialized bytes will produce different
/// identifiers.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for blob-reference records.
    pub const BLOB: Self = Self {
        domain: "vhs-blob-v1",
    };
    /// Hasher for tree records.
    pub const TREE: Self = Self {
        domain: "vhs-tree-v1",
    };
    /// Hasher for entry records.
    pub const ENTRY: Self = Self {
        domain: "vhs-entry-v1",
    };
    /// Hasher for commit records.
    pub const COMMIT: Self = Self {
        domain: "vhs-commit-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }

    /// Verify that data produces the expected object ID.
    pub fn verify(&self, data: &[u8], expected: &ObjectId) -> bool {
        self.hash(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}
