//! Key-value backends for persisted chain state.
//!
//! - `InMemoryStore`: ephemeral, used by tests
//! - `FileStore`: a single JSON document on disk, written atomically on flush

use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// STORAGE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Key type for storage operations
pub type StorageKey = Vec<u8>;

/// Value type for storage operations
pub type StorageValue = Vec<u8>;

type Entries = HashMap<StorageKey, StorageValue>;

/// Byte-oriented key-value store
pub trait StorageBackend: Send + Sync {
    /// Get a value by key
    fn get(&self, key: &[u8]) -> Result<Option<StorageValue>>;

    /// Set a value for a key
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Delete a key, returning whether it existed
    fn delete(&self, key: &[u8]) -> Result<bool>;

    /// Check if a key exists
    fn exists(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// List all keys with a given prefix
    fn list_prefix(&self, prefix: &[u8]) -> Result<Vec<StorageKey>>;

    /// Make pending writes durable
    fn flush(&self) -> Result<()>;
}

fn read_guard(lock: &RwLock<Entries>) -> Result<RwLockReadGuard<'_, Entries>> {
    lock.read().map_err(|_| Error::Lock)
}

fn write_guard(lock: &RwLock<Entries>) -> Result<RwLockWriteGuard<'_, Entries>> {
    lock.write().map_err(|_| Error::Lock)
}

fn keys_with_prefix(entries: &Entries, prefix: &[u8]) -> Vec<StorageKey> {
    let mut keys: Vec<StorageKey> = entries
        .keys()
        .filter(|k| k.starts_with(prefix))
        .cloned()
        .collect();
    keys.sort();
    keys
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-MEMORY STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// In-memory storage backend
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<Entries>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        read_guard(&self.entries).map(|e| e.len()).unwrap_or(0)
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StorageBackend for InMemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<StorageValue>> {
        Ok(read_guard(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        write_guard(&self.entries)?.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<bool> {
        Ok(write_guard(&self.entries)?.remove(key).is_some())
    }

    fn list_prefix(&self, prefix: &[u8]) -> Result<Vec<StorageKey>> {
        Ok(keys_with_prefix(&*read_guard(&self.entries)?, prefix))
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FILE-BASED STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// JSON file store. Keys and values are hex encoded in `state.json`.
#[derive(Debug)]
pub struct FileStore {
    base_path: PathBuf,
    entries: RwLock<Entries>,
    dirty: RwLock<bool>,
}

impl FileStore {
    /// File name inside the data directory
    pub const FILE_NAME: &'static str = "state.json";

    /// Open (or create) a store rooted at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).map_err(|e| {
            Error::Storage(format!("cannot create {}: {}", base_path.display(), e))
        })?;

        let entries = Self::read_file(&base_path.join(Self::FILE_NAME))?;
        Ok(Self {
            base_path,
            entries: RwLock::new(entries),
            dirty: RwLock::new(false),
        })
    }

    /// Directory the store lives in
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    fn data_file(&self) -> PathBuf {
        self.base_path.join(Self::FILE_NAME)
    }

    fn read_file(path: &Path) -> Result<Entries> {
        if !path.exists() {
            return Ok(Entries::new());
        }

        let file = File::open(path)
            .map_err(|e| Error::Storage(format!("cannot open {}: {}", path.display(), e)))?;
        let encoded: HashMap<String, String> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::Deserialization(format!("malformed {}: {}", path.display(), e)))?;

        encoded
            .into_iter()
            .map(|(k, v)| {
                let key = hex::decode(&k)
                    .map_err(|e| Error::Deserialization(format!("bad key {}: {}", k, e)))?;
                let value = hex::decode(&v)
                    .map_err(|e| Error::Deserialization(format!("bad value for {}: {}", k, e)))?;
                Ok((key, value))
            })
            .collect()
    }

    fn write_file(&self) -> Result<()> {
        let encoded: HashMap<String, String> = read_guard(&self.entries)?
            .iter()
            .map(|(k, v)| (hex::encode(k), hex::encode(v)))
            .collect();

        let target = self.data_file();
        let staging = target.with_extension("json.tmp");
        let file = File::create(&staging)
            .map_err(|e| Error::Storage(format!("cannot write {}: {}", staging.display(), e)))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &encoded)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        fs::rename(&staging, &target)
            .map_err(|e| Error::Storage(format!("cannot replace {}: {}", target.display(), e)))?;
        Ok(())
    }

    fn mark_dirty(&self) -> Result<()> {
        *self.dirty.write().map_err(|_| Error::Lock)? = true;
        Ok(())
    }
}

impl StorageBackend for FileStore {
    fn get(&self, key: &[u8]) -> Result<Option<StorageValue>> {
        Ok(read_guard(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        write_guard(&self.entries)?.insert(key.to_vec(), value.to_vec());
        self.mark_dirty()
    }

    fn delete(&self, key: &[u8]) -> Result<bool> {
        let existed = write_guard(&self.entries)?.remove(key).is_some();
        if existed {
            self.mark_dirty()?;
        }
        Ok(existed)
    }

    fn list_prefix(&self, prefix: &[u8]) -> Result<Vec<StorageKey>> {
        Ok(keys_with_prefix(&*read_guard(&self.entries)?, prefix))
    }

    fn flush(&self) -> Result<()> {
        let mut dirty = self.dirty.write().map_err(|_| Error::Lock)?;
        if *dirty {
            self.write_file()?;
            *dirty = false;
        }
        Ok(())
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TYPED STORE WRAPPER
// ═══════════════════════════════════════════════════════════════════════════════

/// Bincode-encoding wrapper around a backend
#[derive(Debug)]
pub struct TypedStore<B: StorageBackend> {
    backend: B,
}

impl<B: StorageBackend> TypedStore<B> {
    /// Wrap a backend
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Get a typed value
    pub fn get<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>> {
        self.backend
            .get(key)?
            .map(|bytes| {
                bincode::deserialize(&bytes).map_err(|e| Error::Deserialization(e.to_string()))
            })
            .transpose()
    }

    /// Set a typed value
    pub fn set<T: Serialize>(&self, key: &[u8], value: &T) -> Result<()> {
        let bytes = bincode::serialize(value).map_err(|e| Error::Serialization(e.to_string()))?;
        self.backend.set(key, &bytes)
    }

    /// Delete a value
    pub fn delete(&self, key: &[u8]) -> Result<bool> {
        self.backend.delete(key)
    }

    /// Check if a key exists
    pub fn exists(&self, key: &[u8]) -> Result<bool> {
        self.backend.exists(key)
    }

    /// List keys with prefix
    pub fn list_prefix(&self, prefix: &[u8]) -> Result<Vec<StorageKey>> {
        self.backend.list_prefix(prefix)
    }

    /// Flush pending writes
    pub fn flush(&self) -> Result<()> {
        self.backend.flush()
    }

    /// The underlying backend
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// KEY PREFIXES
// ═══════════════════════════════════════════════════════════════════════════════

/// Key prefixes for persisted records
pub mod prefixes {
    /// Chain snapshot
    pub const CHAIN: &[u8] = b"chain:";
    /// Snapshot digests
    pub const DIGEST: &[u8] = b"digest:";
    /// Store metadata
    pub const META: &[u8] = b"meta:";
}

/// Create a key with a prefix
pub fn make_key(prefix: &[u8], key: &[u8]) -> Vec<u8> {
    [prefix, key].concat()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_store() {
        let store = InMemoryStore::new();

        store.set(b"key1", b"value1").unwrap();
        assert_eq!(store.get(b"key1").unwrap(), Some(b"value1".to_vec()));
        assert_eq!(store.get(b"missing").unwrap(), None);
        assert!(store.exists(b"key1").unwrap());

        assert!(store.delete(b"key1").unwrap());
        assert!(!store.delete(b"key1").unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_list_prefix_is_sorted() {
        let store = InMemoryStore::new();
        store.set(&make_key(prefixes::CHAIN, b"b"), b"2").unwrap();
        store.set(&make_key(prefixes::CHAIN, b"a"), b"1").unwrap();
        store.set(&make_key(prefixes::META, b"version"), b"1").unwrap();

        let keys = store.list_prefix(prefixes::CHAIN).unwrap();
        assert_eq!(keys, vec![b"chain:a".to_vec(), b"chain:b".to_vec()]);
    }

    #[test]
    fn test_typed_store() {
        let store = TypedStore::new(InMemoryStore::new());

        store.set(b"supply", &1_000_000u128).unwrap();
        let value: u128 = store.get(b"supply").unwrap().unwrap();
        assert_eq!(value, 1_000_000);

        let missing: Option<String> = store.get(b"nothing").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_file_store_flush_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        store.set(b"key1", b"value1").unwrap();
        assert!(!dir.path().join(FileStore::FILE_NAME).exists());

        store.flush().unwrap();
        assert!(dir.path().join(FileStore::FILE_NAME).exists());
    }

    #[test]
    fn test_file_store_persistence() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = FileStore::new(dir.path()).unwrap();
            store.set(b"persistent", b"data").unwrap();
        }

        let store = FileStore::new(dir.path()).unwrap();
        assert_eq!(store.get(b"persistent").unwrap(), Some(b"data".to_vec()));
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(FileStore::FILE_NAME), "not json").unwrap();

        assert!(matches!(
            FileStore::new(dir.path()),
            Err(Error::Deserialization(_))
        ));
    }
}
