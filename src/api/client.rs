use crate::api::ApiError;
use reqwest::Client;
use std::time::Duration;

// Upload attempts that outlive this window are reported as failures and
// rescheduled, so a hung connection cannot wedge the flush pipeline.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared HTTP client for the token and ingestion endpoints. Both calls
/// ride on the same connection pool and timeout.
pub fn new_client() -> Result<Client, ApiError> {
    let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
    Ok(client)
}
