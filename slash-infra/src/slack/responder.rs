//! Delivery of delayed responses to a command's response URL.

use reqwest::{header::CONTENT_TYPE, Client};
use tracing::info;
use url::Url;

use super::response::{Response, ResponseType};
use crate::error::SlackError;

/// Posts messages to the one-time response URL of a single slash command.
///
/// Each call is a single best-effort attempt; nothing is retried.
#[derive(Debug, Clone)]
pub struct MessageResponder {
    client: Client,
    response_url: String,
}

impl MessageResponder {
    /// `client` is the process-wide HTTP client, cloned by reference.
    pub fn new(client: Client, response_url: impl Into<String>) -> Self {
        Self {
            client,
            response_url: response_url.into(),
        }
    }

    pub fn response_url(&self) -> &str {
        &self.response_url
    }

    /// Send a message only the invoking user can see.
    pub async fn ephemeral_response(&self, resp: Response) -> Result<(), SlackError> {
        self.send(ResponseType::Ephemeral, resp).await
    }

    /// Send a message everyone in the channel can see.
    pub async fn public_response(&self, resp: Response) -> Result<(), SlackError> {
        self.send(ResponseType::InChannel, resp).await
    }

    async fn send(&self, response_type: ResponseType, mut resp: Response) -> Result<(), SlackError> {
        resp.response_type = Some(response_type);

        // A Response is plain strings and numbers, so failing to encode it is a bug.
        let body = serde_json::to_vec(&resp)
            .unwrap_or_else(|e| panic!("slack response failed to serialize: {e}"));

        let url = Url::parse(&self.response_url).map_err(|source| SlackError::InvalidResponseUrl {
            url: self.response_url.clone(),
            source,
        })?;

        let api_resp = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = api_resp.status();
        if !status.is_success() {
            let body = api_resp.text().await.unwrap_or_default();
            return Err(SlackError::Rejected { status, body });
        }

        info!(
            response_type = ?response_type,
            status = status.as_u16(),
            "slack_response_delivered"
        );

        Ok(())
    }
}
