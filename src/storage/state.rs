//! Chain snapshot persistence.
//!
//! A [`LocalChain`] is stored as one bincode blob next to the SHA-256 digest
//! of those exact bytes and the layout version that wrote them. Loading checks
//! the version, the digest, and finally the contract invariants before handing
//! the chain back.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::protocol::bank::InMemoryBank;
use crate::protocol::chain::{ChainSnapshot, LocalChain};
use crate::storage::backend::{make_key, prefixes, StorageBackend, TypedStore};
use crate::utils::constants::STATE_VERSION;
use crate::utils::crypto::Hash;

const SLOT: &[u8] = b"current";

/// Saves and restores the local chain through a storage backend
#[derive(Debug)]
pub struct StateManager<B: StorageBackend> {
    store: TypedStore<B>,
}

impl<B: StorageBackend> StateManager<B> {
    /// Create a manager over `backend`
    pub fn new(backend: B) -> Self {
        Self {
            store: TypedStore::new(backend),
        }
    }

    fn chain_key() -> Vec<u8> {
        make_key(prefixes::CHAIN, SLOT)
    }

    fn digest_key() -> Vec<u8> {
        make_key(prefixes::DIGEST, SLOT)
    }

    fn version_key() -> Vec<u8> {
        make_key(prefixes::META, b"version")
    }

    /// Whether a chain has been saved
    pub fn has_chain(&self) -> Result<bool> {
        self.store.exists(&Self::chain_key())
    }

    /// Persist a snapshot and return its digest
    pub fn save_snapshot(&self, snapshot: &ChainSnapshot) -> Result<Hash> {
        let bytes =
            bincode::serialize(snapshot).map_err(|e| Error::Serialization(e.to_string()))?;
        let digest = Hash::sha256(&bytes);

        self.store.backend().set(&Self::chain_key(), &bytes)?;
        self.store.set(&Self::digest_key(), &digest)?;
        self.store.set(&Self::version_key(), &STATE_VERSION)?;
        self.store.flush()?;

        debug!(digest = %digest, size = bytes.len(), "chain snapshot stored");
        Ok(digest)
    }

    /// Load the stored snapshot, if any
    pub fn load_snapshot(&self) -> Result<Option<ChainSnapshot>> {
        let Some(bytes) = self.store.backend().get(&Self::chain_key())? else {
            return Ok(None);
        };

        let version: u32 = self.store.get(&Self::version_key())?.unwrap_or_default();
        if version != STATE_VERSION {
            return Err(Error::Storage(format!(
                "unsupported state version {} (expected {})",
                version, STATE_VERSION
            )));
        }

        let expected: Hash = self
            .store
            .get(&Self::digest_key())?
            .ok_or_else(|| Error::InvariantViolation("stored chain has no digest".into()))?;
        let actual = Hash::sha256(&bytes);
        if actual != expected {
            return Err(Error::InvariantViolation(format!(
                "chain digest mismatch: stored {}, computed {}",
                expected, actual
            )));
        }

        let snapshot =
            bincode::deserialize(&bytes).map_err(|e| Error::Deserialization(e.to_string()))?;
        Ok(Some(snapshot))
    }

    /// Persist a chain
    pub fn save_chain(&self, chain: &LocalChain<InMemoryBank>) -> Result<Hash> {
        self.save_snapshot(&chain.snapshot()?)
    }

    /// Load and verify the stored chain, if any
    pub fn load_chain(&self) -> Result<Option<LocalChain<InMemoryBank>>> {
        match self.load_snapshot()? {
            Some(snapshot) => {
                let chain = LocalChain::<InMemoryBank>::restore(snapshot)?;
                info!(contract = %chain.contract().address(), "chain restored");
                Ok(Some(chain))
            }
            None => Ok(None),
        }
    }

    /// Remove the stored chain
    pub fn clear(&self) -> Result<()> {
        for key in [Self::chain_key(), Self::digest_key(), Self::version_key()] {
            self.store.delete(&key)?;
        }
        self.store.flush()
    }

    /// The underlying backend
    pub fn backend(&self) -> &B {
        self.store.backend()
    }
}
