use xxhash_rust::xxh3::Xxh3;

use crate::foundation::error::{CompileError, CompileResult};

const XXH3_SEED: u64 = 0x4a6f_6246_6f72_6765;

/// Stable 128-bit fingerprint.
///
/// Used for job type etags and for comparing compiled graphs across recompilations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    /// High 64 bits.
    pub hi: u64,
    /// Low 64 bits.
    pub lo: u64,
}

impl Fingerprint {
    /// Lowercase hex rendering, 32 characters.
    pub fn to_hex(self) -> String {
        format!("{:016x}{:016x}", self.hi, self.lo)
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

pub(crate) struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    pub(crate) fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    pub(crate) fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    pub(crate) fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    /// Length-prefixed so that `("ab", "c")` and `("a", "bc")` hash differently.
    pub(crate) fn write_str(&mut self, s: &str) {
        self.write_u32(s.len() as u32);
        self.write_bytes(s.as_bytes());
    }

    pub(crate) fn write_json(&mut self, v: &serde_json::Value) {
        // serde_json maps are ordered (BTreeMap without `preserve_order`), so the rendering
        // is canonical.
        self.write_str(&v.to_string());
    }

    pub(crate) fn finish(self) -> Fingerprint {
        let v = self.inner.digest128();
        Fingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

/// Fingerprint the canonical JSON rendering of a serializable value.
pub fn fingerprint_json<T: serde::Serialize>(value: &T) -> CompileResult<Fingerprint> {
    let v = serde_json::to_value(value)
        .map_err(|e| CompileError::serde(format!("fingerprint: {e}")))?;
    let mut h = StableHasher::new();
    h.write_json(&v);
    Ok(h.finish())
}
