use crate::domain::events::Event;
use async_trait::async_trait;
use std::fmt::Debug;
use tokio::sync::mpsc::Sender;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthorizationStatus {
    Undetermined,
    Denied,
    Restricted,
    AuthorizedLimited,
    AuthorizedFull,
}

impl AuthorizationStatus {
    /// Background tracking needs the full grant; limited access is not enough.
    pub fn allows_tracking(&self) -> bool {
        matches!(self, AuthorizationStatus::AuthorizedFull)
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, AuthorizationStatus::Denied | AuthorizationStatus::Restricted)
    }
}

/// Boundary to the platform positioning stack. Implementations push
/// position fixes, authorization changes and hardware errors into the
/// given channel, one at a time in arrival order.
#[async_trait]
pub trait LocationSource: Debug + Send + Sync {
    fn authorization(&self) -> AuthorizationStatus;

    async fn request_authorization(&self);

    async fn start_updates(&self, events: Sender<Event>);

    async fn stop_updates(&self);
}
