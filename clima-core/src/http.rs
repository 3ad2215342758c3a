//! Shared JSON-over-HTTP plumbing for every upstream service.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::error::HttpFailure;

/// Build the HTTP client shared by providers and geocoders.
///
/// The user agent is sent on every request; the tertiary geocoder refuses
/// anonymous clients.
pub fn build_client(user_agent: &str, timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(user_agent.to_owned())
        .timeout(timeout)
        .build()
}

/// Send `request`, require a success status and decode the body as `T`.
pub(crate) async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, HttpFailure> {
    let res = request.send().await.map_err(HttpFailure::Transport)?;

    let status = res.status();
    let body = res.text().await.map_err(HttpFailure::Transport)?;

    if !status.is_success() {
        return Err(HttpFailure::Status { status, body: truncate_body(&body) });
    }

    serde_json::from_str(&body).map_err(HttpFailure::Malformed)
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
