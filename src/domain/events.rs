use crate::domain::location::AuthorizationStatus;
use crate::domain::sample::Sample;

/// Everything that can reach the tracking controller. All of it flows
/// through a single channel so the controller serializes every state
/// transition, including completions of its own background uploads.
#[derive(Debug)]
pub enum Event {
    StartRequested,
    StopRequested,
    PositionFix(Sample),
    AuthorizationChanged(AuthorizationStatus),
    LocationError(String),
    RetryElapsed,
    FlushFinished { uploaded: usize, success: bool },
}
