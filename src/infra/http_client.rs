use crate::error::{CollectorError, ProviderError, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

const USER_AGENT: &str = concat!("schedule_feed/", env!("CARGO_PKG_VERSION"));
const MAX_ERROR_BODY: usize = 512;

/// Shared reqwest client with a per-request timeout.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(CollectorError::Http)
}

/// Non-success statuses become `ProviderError`s carrying a trimmed body.
pub async fn check_status(response: Response) -> std::result::Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    Err(ProviderError::from_status(status.as_u16(), body))
}

pub async fn read_json<T: DeserializeOwned>(response: Response) -> std::result::Result<T, ProviderError> {
    let response = check_status(response).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
}
