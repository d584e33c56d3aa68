use crate::domain::events::Event;
use crate::persistence::{KeyValueStore, StorageError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{info, instrument, warn};

const RETRY_STATE_KEY: &str = "retry_state";

/// Arms at most one deferred retry and keeps its deadline on disk, so a
/// process that was down when the deadline passed still retries on the
/// next start. Firing means sending `Event::RetryElapsed` into the
/// controller channel; the controller decides what a retry does.
#[derive(Debug)]
pub struct RetryScheduler {
    kv: Arc<dyn KeyValueStore>,
    tx: Sender<Event>,
    timer: Option<JoinHandle<()>>,
}

impl RetryScheduler {
    pub fn new(kv: Arc<dyn KeyValueStore>, tx: Sender<Event>) -> Self {
        RetryScheduler { kv, tx, timer: None }
    }

    /// Persists `now + interval` and (re)arms the timer, replacing any
    /// previously armed retry. When persisting fails the timer still arms;
    /// the retry then just does not survive a restart.
    #[instrument(skip(self))]
    pub async fn schedule_after(&mut self, interval: Duration) {
        let deadline = Utc::now() + interval;
        if let Err(e) = self.persist(deadline).await {
            warn!("⚠️ Could not persist the retry deadline: {}", e);
        }

        self.arm(interval);
        info!("⏲️ Retry scheduled for {}", deadline);
    }

    /// Disarms the timer and forgets the persisted deadline. Safe to call
    /// with nothing scheduled.
    pub async fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }

        if let Err(e) = self.kv.delete(RETRY_STATE_KEY).await {
            warn!("⚠️ Could not clear the retry deadline: {}", e);
        }
    }

    /// Picks up a deadline left behind by a previous process. A deadline in
    /// the past fires right away instead of waiting out the full interval
    /// again; an unreadable one is treated as past, favoring a duplicate
    /// attempt over dropped data.
    #[instrument(skip(self))]
    pub async fn resume_from_persisted_state(&mut self) {
        match self.load().await {
            Ok(None) => {}
            Ok(Some(deadline)) => match (deadline - Utc::now()).to_std() {
                Ok(remaining) => {
                    info!("⏲️ Resuming retry, {}s left until {}", remaining.as_secs(), deadline);
                    self.arm(remaining);
                }
                Err(_) => {
                    info!("⏲️ Retry deadline {} passed while the process was down, retrying now", deadline);
                    self.fire_now();
                }
            },
            Err(e) => {
                warn!("⚠️ Could not read the persisted retry deadline, retrying now: {}", e);
                self.fire_now();
            }
        }
    }

    fn arm(&mut self, delay: Duration) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }

        let tx = self.tx.clone();
        let deadline = Instant::now() + delay;
        self.timer = Some(tokio::spawn(async move {
            sleep_until(deadline).await;
            if tx.send(Event::RetryElapsed).await.is_err() {
                warn!("⚠️ Retry fired but the controller is gone");
            }
        }));
    }

    // Resume runs on the controller's own task before its loop drains the
    // channel, so an awaited send could deadlock on a full queue. On a full
    // or closed queue the deadline stays persisted and fires after the next
    // restart instead.
    fn fire_now(&self) {
        if self.tx.try_send(Event::RetryElapsed).is_err() {
            warn!("⚠️ Could not deliver the elapsed retry, the controller queue is full or gone");
        }
    }

    async fn persist(&self, deadline: DateTime<Utc>) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(&deadline)?;
        self.kv.set(RETRY_STATE_KEY, bytes).await
    }

    async fn load(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        match self.kv.get(RETRY_STATE_KEY).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

impl Drop for RetryScheduler {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
