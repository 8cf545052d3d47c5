//! The webhook notifier.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::{Notifier, NotifyError, OutboundMessage};

/// Bound on one webhook delivery attempt.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// POSTs messages to `{base_url}{endpoint}` as JSON.
///
/// Stateless per call; safe to share across concurrent check invocations.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(base_url: &str, endpoint: &str) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()
            .map_err(NotifyError::Transport)?;
        Ok(Self {
            client,
            url: format!("{base_url}{endpoint}"),
        })
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, message: &OutboundMessage) -> Result<(), NotifyError> {
        // Fire-and-forget: whatever the webhook answers counts as
        // accepted, only failing to reach it at all is an error.
        let response = self.client.post(&self.url).json(message).send().await?;
        debug!(status = response.status().as_u16(), "webhook accepted message");
        Ok(())
    }
}
