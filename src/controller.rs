use crate::api::UploadClient;
use crate::app_config::AppConfig;
use crate::domain::events::Event;
use crate::domain::{AuthorizationStatus, LocationSource, Sample, TrackerFault, TrackerStatus};
use crate::persistence::KeyValueStore;
use crate::scheduler::RetryScheduler;
use crate::store::SampleStore;
use std::sync::Arc;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::sync::watch;
use tokio::task;
use tracing::{debug, info, instrument, warn};

const TRACKING_STATE_KEY: &str = "tracking_state";

/// Owns every piece of mutable tracking state and serializes all
/// transitions through one event loop. Uploads run as background tasks
/// that report back through the same channel, so new fixes keep landing in
/// the store while an upload is in flight, and no two uploads ever run at
/// the same time.
#[derive(Debug)]
pub struct TrackingController {
    rx: Receiver<Event>,
    tx: Sender<Event>,
    store: SampleStore,
    uploader: Arc<UploadClient>,
    retry: RetryScheduler,
    location: Arc<dyn LocationSource>,
    kv: Arc<dyn KeyValueStore>,
    config: Arc<AppConfig>,
    is_tracking: bool,
    fault: Option<TrackerFault>,
    flush_in_flight: bool,
    flush_pending: bool,
    status_tx: watch::Sender<TrackerStatus>,
    status_rx: watch::Receiver<TrackerStatus>,
}

impl TrackingController {
    pub async fn new(
        config: Arc<AppConfig>,
        kv: Arc<dyn KeyValueStore>,
        location: Arc<dyn LocationSource>,
        uploader: UploadClient,
        tx: Sender<Event>,
        rx: Receiver<Event>,
    ) -> Self {
        let (store, warning) = SampleStore::restore(kv.clone(), config.tracker().max_stored_samples()).await;
        if let Some(e) = warning {
            warn!("⚠️ Could not restore the sample buffer, starting empty: {}", e);
        }

        let (status_tx, status_rx) = watch::channel(TrackerStatus::default());
        let retry = RetryScheduler::new(kv.clone(), tx.clone());

        TrackingController {
            rx,
            tx,
            store,
            uploader: Arc::new(uploader),
            retry,
            location,
            kv,
            config,
            is_tracking: false,
            fault: None,
            flush_in_flight: false,
            flush_pending: false,
            status_tx,
            status_rx,
        }
    }

    /// Channel the boundary layer watches for status updates.
    pub fn status(&self) -> watch::Receiver<TrackerStatus> {
        self.status_rx.clone()
    }

    /// Restores the persisted tracking state, resumes a pending retry and
    /// then processes events until every sender is gone.
    #[instrument(skip(self))]
    pub async fn listen(&mut self) {
        self.resume().await;

        while let Some(event) = self.rx.recv().await {
            debug!("🔵 Received event: {:?}", event);
            match event {
                Event::StartRequested => self.start().await,
                Event::StopRequested => self.stop().await,
                Event::PositionFix(sample) => self.on_position_fix(sample).await,
                Event::AuthorizationChanged(status) => self.on_authorization_changed(status).await,
                Event::LocationError(message) => self.on_location_error(message).await,
                Event::RetryElapsed => self.flush().await,
                Event::FlushFinished { uploaded, success } => self.on_flush_finished(uploaded, success).await,
            }
        }
    }

    async fn resume(&mut self) {
        if self.load_tracking_state().await {
            info!("▶️ Tracking was on before the last shutdown, resuming");
            self.start().await;
        }

        self.retry.resume_from_persisted_state().await;
    }

    async fn start(&mut self) {
        self.set_fault(None);

        self.location.start_updates(self.tx.clone()).await;

        if self.location.authorization().allows_tracking() {
            self.set_tracking(true).await;
            info!("▶️ Tracking started");
        } else {
            self.stop().await;
            self.set_fault(Some(TrackerFault::NotAuthorized));
        }

        self.location.request_authorization().await;
    }

    async fn stop(&mut self) {
        self.location.stop_updates().await;
        self.set_tracking(false).await;
        info!("⏹️ Tracking stopped");

        self.retry.cancel().await;
        self.flush().await;
    }

    async fn on_position_fix(&mut self, sample: Sample) {
        if !self.is_tracking {
            debug!("📍 Ignoring a position fix while stopped");
            return;
        }

        if let Err(e) = self.store.add(sample).await {
            warn!("⚠️ Could not persist the sample buffer: {}", e);
        }
    }

    async fn on_authorization_changed(&mut self, status: AuthorizationStatus) {
        self.set_fault(None);

        if status.allows_tracking() && self.is_tracking {
            // Authorization can come through after tracking was requested but
            // before updates started; subscribe again so fixes begin to flow.
            self.location.start_updates(self.tx.clone()).await;
        } else if status.is_blocked() {
            self.stop().await;
            self.set_fault(Some(TrackerFault::AuthorizationDenied));
        }
    }

    async fn on_location_error(&mut self, message: String) {
        warn!("⚠️ Location updates failed: {}", message);
        self.stop().await;
        self.set_fault(Some(TrackerFault::LocationUnavailable));
    }

    /// Drains a point-in-time snapshot into one upload task. Triggers that
    /// arrive while an upload is in flight are coalesced into a single
    /// follow-up flush.
    async fn flush(&mut self) {
        if self.flush_in_flight {
            debug!("📤 Flush already in flight, queueing a follow-up");
            self.flush_pending = true;
            return;
        }

        let batch = self.store.snapshot();
        if batch.is_empty() {
            self.retry.cancel().await;
            return;
        }

        self.flush_in_flight = true;
        let uploader = self.uploader.clone();
        let tx = self.tx.clone();
        task::spawn(async move {
            let success = match uploader.upload(&batch).await {
                Ok(response) if response.is_success => true,
                Ok(response) => {
                    #[rustfmt::skip]
                    warn!(status = %response.status, "📤 Upload rejected: {}", response.message.as_deref().unwrap_or("no message"));
                    false
                }
                Err(e) => {
                    warn!("📤 Upload failed: {}", e);
                    false
                }
            };

            let finished = Event::FlushFinished { uploaded: batch.len(), success };
            if tx.send(finished).await.is_err() {
                warn!("⚠️ Upload finished but the controller is gone");
            }
        });
    }

    async fn on_flush_finished(&mut self, uploaded: usize, success: bool) {
        self.flush_in_flight = false;

        if success {
            info!("📤 Upload confirmed, discarding {} sample(s)", uploaded);
            if let Err(e) = self.store.discard_front(uploaded).await {
                warn!("⚠️ Could not persist the drained buffer: {}", e);
            }
            self.retry.cancel().await;
        } else {
            let interval = self.config.tracker().retry_interval();
            info!("📤 Upload failed, retrying in {:?}; {} sample(s) stay buffered", interval, self.store.len());
            self.retry.schedule_after(interval).await;
        }

        if self.flush_pending {
            self.flush_pending = false;
            self.flush().await;
        }
    }

    async fn load_tracking_state(&self) -> bool {
        match self.kv.get(TRACKING_STATE_KEY).await {
            Ok(Some(bytes)) => serde_json::from_slice(&bytes).unwrap_or(false),
            Ok(None) => false,
            Err(e) => {
                warn!("⚠️ Could not read the tracking state: {}", e);
                false
            }
        }
    }

    async fn set_tracking(&mut self, is_tracking: bool) {
        self.is_tracking = is_tracking;

        let bytes = if is_tracking { b"true".to_vec() } else { b"false".to_vec() };
        if let Err(e) = self.kv.set(TRACKING_STATE_KEY, bytes).await {
            warn!("⚠️ Could not persist the tracking state: {}", e);
        }

        self.publish_status();
    }

    fn set_fault(&mut self, fault: Option<TrackerFault>) {
        self.fault = fault;
        self.publish_status();
    }

    fn publish_status(&self) {
        let status = TrackerStatus {
            is_tracking: self.is_tracking,
            fault: self.fault,
        };
        self.status_tx.send(status).unwrap_or_default();
    }
}
