//! Bitcoin-style Merkle root computation with CVE-2012-2459 detection.
//!
//! [`MerkleTree`] reproduces the original pairing rule bit for bit (odd
//! levels duplicate their last hash) and reports, next to the root, whether
//! the leaf list hashed two identical nodes at the tail of a level. Deciding
//! what to do with that flag is left to the caller.

pub mod error;
pub mod hash;
pub mod input;
pub mod merkle;

pub use error::MerkleError;
pub use hash::{hash256, DoubleBlake3, DoubleSha256, Hash256, LeafHash, HASH_LEN};
pub use input::{MerkleInput, MerkleSources, Transaction};
pub use merkle::{MerkleResult, MerkleTree};
