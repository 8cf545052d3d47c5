//! The endpoint prober.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use errwatch_core::{HeaderSet, HttpConfig, HttpMethod};

/// How long a connection attempt may take, independent of the
/// per-request timeout supplied by the caller.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to build http client: {0}")]
    Client(reqwest::Error),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ProbeError {
    /// Whether this failure was caused by the request timing out.
    pub fn is_timeout(&self) -> bool {
        match self {
            ProbeError::Transport(e) => e.is_timeout(),
            ProbeError::Client(_) => false,
        }
    }
}

/// Result of one HTTP attempt against one address.
///
/// Created per attempt, consumed by classification, then discarded.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub status: u16,
    /// Response body, truncated at the configured cap.
    pub body: String,
    /// When the request was issued.
    pub at: DateTime<Utc>,
}

/// Issues single HTTP check requests.
///
/// Cheap to share: the inner reqwest client is an `Arc` internally and
/// safe for concurrent callers.
pub struct Prober {
    client: Client,
    body_cap: usize,
}

impl Prober {
    /// Build a prober from the HTTP config section.
    pub fn new(http: &HttpConfig) -> Result<Self, ProbeError> {
        if http.insecure_skip_verify {
            warn!("TLS certificate verification is DISABLED (http.insecure_skip_verify) — probe responses can be spoofed");
        }
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .danger_accept_invalid_certs(http.insecure_skip_verify)
            .build()
            .map_err(ProbeError::Client)?;
        Ok(Self {
            client,
            body_cap: http.body_cap_bytes,
        })
    }

    /// Issue exactly one request and capture the outcome.
    ///
    /// `timeout` bounds the whole request including the body read. All
    /// headers from the shared set are attached, always.
    pub async fn probe(
        &self,
        method: HttpMethod,
        url: &str,
        headers: &HeaderSet,
        body: &'static str,
        timeout: Duration,
    ) -> Result<ProbeOutcome, ProbeError> {
        let at = Utc::now();

        let mut request = match method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
        };
        for (name, value) in headers.iter() {
            request = request.header(name, value);
        }

        let mut response = request.timeout(timeout).body(body).send().await?;
        let status = response.status().as_u16();
        let body = self.read_capped(&mut response).await?;

        debug!(%url, status, body_len = body.len(), "probe completed");
        Ok(ProbeOutcome { status, body, at })
    }

    /// Read the response body up to `body_cap` bytes, dropping the rest.
    async fn read_capped(&self, response: &mut reqwest::Response) -> Result<String, ProbeError> {
        let mut buf: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            let remaining = self.body_cap - buf.len();
            let take = remaining.min(chunk.len());
            buf.extend_from_slice(&chunk[..take]);
            if take < chunk.len() || buf.len() == self.body_cap {
                break;
            }
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
