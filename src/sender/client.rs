use super::serialization::{BatchSerializer, SerializationError, SerializedBody};
use crate::buffer::Batch;
use crate::config::{Config, ConfigError};
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};
use url::Url;

use super::SendError;

const BATCH_PATH: &str = "/v1/batch";

/// One network submission per call. The seam the dispatcher is generic
/// over, so tests can substitute scripted senders for the HTTP transport.
pub trait BatchSender: Send + Sync {
    /// Submit one batch. Classifies the outcome; never retries, never
    /// mutates the batch.
    fn send(&self, batch: &Batch) -> impl Future<Output = Result<(), SendError>> + Send;
}

/// HTTP implementation of [`BatchSender`]: one JSON POST per batch against
/// the configured ingestion endpoint, with a hard per-send deadline.
#[derive(Debug, Clone)]
pub struct HttpSender {
    client: Client,
    batch_url: Url,
    send_timeout: Duration,
    user_agent: String,
    serializer: BatchSerializer,
}

impl HttpSender {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let endpoint: Url = config.endpoint.parse().map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid endpoint URL '{}': {}", config.endpoint, e))
        })?;

        let batch_url = if endpoint.path().ends_with(BATCH_PATH) {
            endpoint
        } else {
            let mut url = endpoint;
            let path = url.path().trim_end_matches('/').to_string();
            url.set_path(&format!("{path}{BATCH_PATH}"));
            url
        };

        let client = ClientBuilder::new()
            .timeout(config.send_timeout)
            .connect_timeout(config.send_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ConfigError::InvalidConfig(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            batch_url,
            send_timeout: config.send_timeout,
            user_agent: config.user_agent.clone(),
            serializer: BatchSerializer::new(config.gzip),
        })
    }

    pub fn batch_url(&self) -> &Url {
        &self.batch_url
    }

    fn classify(&self, error: reqwest::Error) -> SendError {
        if error.is_timeout() {
            SendError::Timeout(self.send_timeout)
        } else {
            SendError::ConnectionFailed(error.to_string())
        }
    }
}

impl BatchSender for HttpSender {
    async fn send(&self, batch: &Batch) -> Result<(), SendError> {
        let SerializedBody { bytes, compressed } = self.serializer.serialize(batch)?;
        let bytes_sent = bytes.len();

        debug!(
            batch_id = batch.id(),
            actions = batch.len(),
            bytes = bytes_sent,
            compressed,
            "sending batch"
        );

        let mut request = self
            .client
            .post(self.batch_url.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(USER_AGENT, &self.user_agent)
            .header(
                HeaderName::from_static("x-batch-id"),
                batch.id().to_string(),
            )
            .header(
                HeaderName::from_static("x-batch-size"),
                batch.len().to_string(),
            )
            .body(bytes);

        if compressed {
            request = request.header(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        }

        // Hard deadline: an exceeded timeout fails the send, it never waits on
        let response = timeout(self.send_timeout, request.send())
            .await
            .map_err(|_| SendError::Timeout(self.send_timeout))?
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if status.is_success() {
            debug!(batch_id = batch.id(), status = status.as_u16(), "batch accepted");
            Ok(())
        } else {
            warn!(batch_id = batch.id(), status = status.as_u16(), "batch rejected");
            Err(SendError::HttpStatus {
                status: status.as_u16(),
            })
        }
    }
}

impl From<SerializationError> for SendError {
    fn from(error: SerializationError) -> Self {
        SendError::Serialization(error.to_string())
    }
}
