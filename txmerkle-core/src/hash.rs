use crate::error::MerkleError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Width of every digest handled by the tree.
pub const HASH_LEN: usize = 32;

/// A 32-byte digest: a leaf, an interior node or the root.
///
/// Bytes are kept in internal (hashing) order. Bitcoin shows txids and
/// Merkle roots byte-reversed; use [`LeafHash::to_display_hex`] and
/// [`LeafHash::from_display_hex`] for that form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct LeafHash([u8; HASH_LEN]);

impl LeafHash {
    pub const fn new(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    pub fn to_bytes(self) -> [u8; HASH_LEN] {
        self.0
    }

    /// Lowercase hex in internal byte order.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse hex in internal byte order. Anything other than exactly 64 hex
    /// digits is rejected.
    pub fn from_hex(s: &str) -> Result<Self, MerkleError> {
        let bytes = hex::decode(s.trim())
            .map_err(|e| MerkleError::MalformedHash(format!("{:?}: {}", s, e)))?;
        Self::try_from(bytes.as_slice())
    }

    /// Lowercase hex in reversed (Bitcoin display) byte order.
    pub fn to_display_hex(&self) -> String {
        let mut rev = self.0;
        rev.reverse();
        hex::encode(rev)
    }

    pub fn from_display_hex(s: &str) -> Result<Self, MerkleError> {
        let mut h = Self::from_hex(s)?;
        h.0.reverse();
        Ok(h)
    }
}

impl From<[u8; HASH_LEN]> for LeafHash {
    fn from(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for LeafHash {
    type Error = MerkleError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; HASH_LEN] = bytes.try_into().map_err(|_| {
            MerkleError::MalformedHash(format!(
                "expected {} bytes, got {}",
                HASH_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }
}

impl AsRef<[u8]> for LeafHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for LeafHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LeafHash({})", self.to_hex())
    }
}

impl fmt::Display for LeafHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for LeafHash {
    type Err = MerkleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for LeafHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for LeafHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A double-round 256-bit hash over arbitrary bytes.
///
/// Implementations must be deterministic and order-sensitive; the tree
/// calls [`Hash256::hash_pair`] with `left || right`.
pub trait Hash256: Send + Sync {
    fn hash256(&self, data: &[u8]) -> LeafHash;

    /// Hash the 64-byte concatenation `left || right`.
    fn hash_pair(&self, left: &LeafHash, right: &LeafHash) -> LeafHash {
        let mut cat = [0u8; HASH_LEN * 2];
        cat[..HASH_LEN].copy_from_slice(left.as_bytes());
        cat[HASH_LEN..].copy_from_slice(right.as_bytes());
        self.hash256(&cat)
    }
}

/// `SHA256(SHA256(data))`, as used for Bitcoin txids and Merkle nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleSha256;

impl Hash256 for DoubleSha256 {
    fn hash256(&self, data: &[u8]) -> LeafHash {
        let first = Sha256::digest(data);
        let second = Sha256::digest(first);
        let mut out = [0u8; HASH_LEN];
        out.copy_from_slice(&second);
        LeafHash(out)
    }
}

/// `BLAKE3(BLAKE3(data))`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleBlake3;

impl Hash256 for DoubleBlake3 {
    fn hash256(&self, data: &[u8]) -> LeafHash {
        let first = blake3::hash(data);
        LeafHash(*blake3::hash(first.as_bytes()).as_bytes())
    }
}

/// Double SHA-256 of `data`.
pub fn hash256(data: &[u8]) -> LeafHash {
    DoubleSha256.hash256(data)
}
