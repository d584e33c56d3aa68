use crate::domain::Sample;
use crate::persistence::{KeyValueStore, StorageError};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

const SAMPLES_KEY: &str = "samples";

/// Bounded FIFO buffer of pending samples, mirrored to persistent storage
/// on every mutation. Once the capacity is exceeded the oldest entries are
/// evicted, so unsent data under pressure is bounded rather than unbounded.
#[derive(Debug)]
pub struct SampleStore {
    samples: VecDeque<Sample>,
    capacity: usize,
    kv: Arc<dyn KeyValueStore>,
}

impl SampleStore {
    /// Loads the persisted buffer. A missing key yields an empty buffer; an
    /// unreadable or undecodable one degrades to empty and hands the error
    /// back so the caller can warn about the dropped data instead of
    /// bringing the process down.
    pub async fn restore(kv: Arc<dyn KeyValueStore>, capacity: usize) -> (Self, Option<StorageError>) {
        let (samples, warning) = match Self::load(kv.as_ref()).await {
            Ok(samples) => (samples, None),
            Err(e) => (VecDeque::new(), Some(e)),
        };

        let mut store = SampleStore { samples, capacity, kv };
        store.evict_over_capacity();
        (store, warning)
    }

    async fn load(kv: &dyn KeyValueStore) -> Result<VecDeque<Sample>, StorageError> {
        match kv.get(SAMPLES_KEY).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(VecDeque::new()),
        }
    }

    /// Appends a sample, evicting the oldest entries when over capacity.
    /// The append stays in memory even when persisting fails, trading
    /// durability for availability.
    pub async fn add(&mut self, sample: Sample) -> Result<(), StorageError> {
        self.samples.push_back(sample);
        self.evict_over_capacity();
        debug!("💾 Buffered sample, {} pending", self.samples.len());
        self.persist().await
    }

    /// Point-in-time copy of the buffer, oldest first.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub async fn clear(&mut self) -> Result<(), StorageError> {
        self.samples.clear();
        self.kv.delete(SAMPLES_KEY).await
    }

    /// Drops the `count` oldest entries after a confirmed upload. Samples
    /// that arrived while the upload was in flight stay buffered for the
    /// next flush.
    pub async fn discard_front(&mut self, count: usize) -> Result<(), StorageError> {
        self.samples.drain(..count.min(self.samples.len()));
        if self.samples.is_empty() {
            self.kv.delete(SAMPLES_KEY).await
        } else {
            self.persist().await
        }
    }

    fn evict_over_capacity(&mut self) {
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    async fn persist(&self) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(&self.samples)?;
        self.kv.set(SAMPLES_KEY, bytes).await
    }
}
