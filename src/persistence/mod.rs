mod file_store;
#[cfg(test)]
pub mod memory;

pub use file_store::FileStore;

use async_trait::async_trait;
use std::fmt::Debug;
use std::io;
use thiserror::Error;

/// Minimal key-value persistence boundary, backed by any embedded store.
/// Each individual write must be atomic: a crash mid-write may lose that
/// write, but it never leaves a torn value behind for the next start to
/// read. No transactional guarantee is required across keys.
#[async_trait]
pub trait KeyValueStore: Debug + Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage is unavailable: {0}")]
    Io(#[from] io::Error),
    #[error("stored value could not be decoded: {0}")]
    Codec(#[from] serde_json::Error),
}
