use crate::error::MerkleError;
use crate::hash::{DoubleSha256, Hash256, LeafHash};
use crate::input::{MerkleInput, MerkleSources, Transaction};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Root plus the CVE-2012-2459 flag, both produced by one pass.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct MerkleResult {
    pub root: LeafHash,
    pub tail_duplicates: bool,
}

impl MerkleResult {
    /// Historical block check: a root mismatch and a mutated leaf list are
    /// both rejected.
    pub fn check_against(&self, expected: &LeafHash) -> Result<(), MerkleError> {
        if self.root != *expected {
            return Err(MerkleError::RootMismatch { expected: *expected, actual: self.root });
        }
        if self.tail_duplicates {
            return Err(MerkleError::TailDuplicates);
        }
        Ok(())
    }
}

/// Bitcoin-style Merkle tree over a fixed, non-empty leaf sequence.
///
/// The root and the tail-duplicate flag are computed lazily on first access
/// and cached; concurrent first readers all observe the same result.
#[derive(Debug, Clone)]
pub struct MerkleTree<H: Hash256 = DoubleSha256> {
    hasher: H,
    leaves: Vec<LeafHash>,
    result: OnceCell<MerkleResult>,
}

impl MerkleTree<DoubleSha256> {
    pub fn new(input: MerkleInput<'_>) -> Result<Self, MerkleError> {
        Self::with_hasher(input, DoubleSha256)
    }

    /// Build from keyword-style sources; exactly one must be set.
    pub fn from_sources(sources: MerkleSources<'_>) -> Result<Self, MerkleError> {
        Self::new(MerkleInput::try_from(sources)?)
    }

    pub fn from_hashes(hashes: &[LeafHash]) -> Result<Self, MerkleError> {
        Self::new(MerkleInput::Hashes(hashes.to_vec()))
    }

    pub fn from_transactions<T: Transaction>(txs: &[T]) -> Result<Self, MerkleError> {
        Self::new(MerkleInput::Hashes(txs.iter().map(|tx| tx.transaction_hash()).collect()))
    }

    pub fn from_items<I: AsRef<[u8]>>(items: &[I]) -> Result<Self, MerkleError> {
        Self::from_items_with_hasher(items, DoubleSha256)
    }
}

impl<H: Hash256> MerkleTree<H> {
    pub fn with_hasher(input: MerkleInput<'_>, hasher: H) -> Result<Self, MerkleError> {
        let kind = input.kind();
        let leaves = input.into_leaves(&hasher)?;
        debug!(source = kind, leaves = leaves.len(), "resolved merkle leaves");
        Ok(Self { hasher, leaves, result: OnceCell::new() })
    }

    pub fn from_sources_with_hasher(
        sources: MerkleSources<'_>,
        hasher: H,
    ) -> Result<Self, MerkleError> {
        Self::with_hasher(MerkleInput::try_from(sources)?, hasher)
    }

    pub fn from_items_with_hasher<I: AsRef<[u8]>>(items: &[I], hasher: H) -> Result<Self, MerkleError> {
        let items: Vec<&[u8]> = items.iter().map(|i| i.as_ref()).collect();
        Self::with_hasher(MerkleInput::Items(items), hasher)
    }

    pub fn leaves(&self) -> &[LeafHash] {
        &self.leaves
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    pub fn merkle_root(&self) -> LeafHash {
        self.result().root
    }

    /// True when two identical hashes were combined as the final pair of
    /// some level. Computes the root if it has not been computed yet.
    pub fn has_tail_duplicates(&self) -> bool {
        self.result().tail_duplicates
    }

    pub fn result(&self) -> MerkleResult {
        *self.result.get_or_init(|| compute_merkle_root(&self.hasher, &self.leaves))
    }
}

/// Satoshi's pairing with odd-tail duplication, plus detection of the
/// CVE-2012-2459 mutation.
///
/// An odd level pairs its last hash with itself, so `[1,2,3,4,5,6]` and
/// `[1,2,3,4,5,6,5,6]` share a root. The second list is caught because at
/// some level its real final pair holds two equal hashes. A lone tail hashed
/// with itself is not flagged.
///
/// All levels are appended to one flat buffer; `start` is the offset of the
/// current level. `leaves` must be non-empty.
fn compute_merkle_root<H: Hash256>(hasher: &H, leaves: &[LeafHash]) -> MerkleResult {
    let mut tree: Vec<LeafHash> = Vec::with_capacity(leaves.len() * 2);
    tree.extend_from_slice(leaves);
    let mut tail_duplicates = false;
    let mut start = 0usize;
    let mut size = leaves.len();
    let mut depth = 0usize;
    while size > 1 {
        let mut i = 0;
        while i < size {
            let i2 = (i + 1).min(size - 1);
            let (left, right) = (tree[start + i], tree[start + i2]);
            if i2 == i + 1 && i2 + 1 == size && left == right {
                warn!(depth, index = i, hash = %left, "identical hashes at level tail");
                tail_duplicates = true;
            }
            let parent = hasher.hash_pair(&left, &right);
            tree.push(parent);
            i += 2;
        }
        start += size;
        size = size.div_ceil(2);
        depth += 1;
    }
    let root = tree[start];
    debug!(leaves = leaves.len(), levels = depth, tail_duplicates, %root, "computed merkle root");
    MerkleResult { root, tail_duplicates }
}
