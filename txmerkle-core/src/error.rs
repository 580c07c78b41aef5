use crate::hash::LeafHash;
use thiserror::Error;

/// Errors from Merkle tree construction and root checks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MerkleError {
    #[error("none of the input sources (hashes, transactions, items) was supplied")]
    NoInput,
    #[error("more than one input source supplied ({0})")]
    AmbiguousInput(String),
    #[error("empty leaf list is not allowed")]
    EmptyInput,
    #[error("malformed hash: {0}")]
    MalformedHash(String),
    #[error("merkle root mismatch (expected {expected}, computed {actual})")]
    RootMismatch { expected: LeafHash, actual: LeafHash },
    #[error("leaf list hashes identical nodes at the tail of a level (CVE-2012-2459)")]
    TailDuplicates,
}
