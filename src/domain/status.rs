use thiserror::Error;

/// Point-in-time controller status for the boundary layer to render.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackerStatus {
    pub is_tracking: bool,
    pub fault: Option<TrackerFault>,
}

/// User-facing conditions. Upload failures never show up here; they only
/// drive the retry schedule.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackerFault {
    #[error("we are unable to update your location at the moment, check that the app is authorized to receive location updates")]
    NotAuthorized,
    #[error("location access denied, enable it in the system settings")]
    AuthorizationDenied,
    #[error("location updates are unavailable at the moment")]
    LocationUnavailable,
}
