use crate::error::MerkleError;
use crate::hash::{Hash256, LeafHash};
use rayon::prelude::*;

/// Anything that carries its own 32-byte identity hash (a txid).
pub trait Transaction {
    fn transaction_hash(&self) -> LeafHash;
}

impl<T: Transaction + ?Sized> Transaction for &T {
    fn transaction_hash(&self) -> LeafHash {
        (**self).transaction_hash()
    }
}

/// The leaf source for a tree. Exactly one kind per tree.
pub enum MerkleInput<'a> {
    /// Precomputed leaf hashes, used as-is.
    Hashes(Vec<LeafHash>),
    /// Transactions; each leaf is the transaction's own hash.
    Transactions(Vec<&'a dyn Transaction>),
    /// Raw payloads; each leaf is `hash256(item)`.
    Items(Vec<&'a [u8]>),
}

impl<'a> MerkleInput<'a> {
    pub fn kind(&self) -> &'static str {
        match self {
            MerkleInput::Hashes(_) => "hashes",
            MerkleInput::Transactions(_) => "transactions",
            MerkleInput::Items(_) => "items",
        }
    }

    /// Resolve to the canonical leaf sequence, order preserved.
    pub(crate) fn into_leaves<H: Hash256>(self, hasher: &H) -> Result<Vec<LeafHash>, MerkleError> {
        let leaves = match self {
            MerkleInput::Hashes(hashes) => hashes,
            MerkleInput::Transactions(txs) => txs.iter().map(|tx| tx.transaction_hash()).collect(),
            MerkleInput::Items(items) => items.par_iter().map(|item| hasher.hash256(item)).collect(),
        };
        if leaves.is_empty() {
            return Err(MerkleError::EmptyInput);
        }
        Ok(leaves)
    }
}

/// Keyword-style input: any subset of the three sources may be set, but
/// only a single one resolves to a [`MerkleInput`].
#[derive(Default)]
pub struct MerkleSources<'a> {
    pub hashes: Option<Vec<LeafHash>>,
    pub transactions: Option<Vec<&'a dyn Transaction>>,
    pub items: Option<Vec<&'a [u8]>>,
}

impl<'a> MerkleSources<'a> {
    pub fn hashes(mut self, hashes: Vec<LeafHash>) -> Self {
        self.hashes = Some(hashes);
        self
    }

    pub fn transactions(mut self, txs: Vec<&'a dyn Transaction>) -> Self {
        self.transactions = Some(txs);
        self
    }

    pub fn items(mut self, items: Vec<&'a [u8]>) -> Self {
        self.items = Some(items);
        self
    }
}

impl<'a> TryFrom<MerkleSources<'a>> for MerkleInput<'a> {
    type Error = MerkleError;

    fn try_from(src: MerkleSources<'a>) -> Result<Self, Self::Error> {
        let mut present = Vec::with_capacity(3);
        if src.hashes.is_some() {
            present.push("hashes");
        }
        if src.transactions.is_some() {
            present.push("transactions");
        }
        if src.items.is_some() {
            present.push("items");
        }
        if present.len() > 1 {
            return Err(MerkleError::AmbiguousInput(present.join(", ")));
        }
        match (src.hashes, src.transactions, src.items) {
            (Some(h), None, None) => Ok(MerkleInput::Hashes(h)),
            (None, Some(t), None) => Ok(MerkleInput::Transactions(t)),
            (None, None, Some(i)) => Ok(MerkleInput::Items(i)),
            _ => Err(MerkleError::NoInput),
        }
    }
}
