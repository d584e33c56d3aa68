mod client;
mod token;
mod upload;

pub use client::new_client;
pub use token::{Token, TokenCache};
pub use upload::{UploadClient, UploadResponse};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("token endpoint rejected the credential grant with status {0}")]
    TokenRejected(reqwest::StatusCode),
    #[error("token endpoint returned an undecodable body: {0}")]
    MalformedTokenResponse(#[source] reqwest::Error),
}
