//! HTTP delivery of change envelopes to the desk device.

use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, Url};
use serde::Serialize;
use thinq_types::{DeliveryAction, DeliveryEnvelope, RelayError};

use crate::http::create_client;

const MAX_ERROR_BODY: usize = 512;

/// Device reply to a connectivity ping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PingOutcome {
    pub status: u16,
    pub body: String,
}

#[derive(Serialize)]
struct PingEnvelope<'a> {
    action: DeliveryAction,
    message: &'a str,
    timestamp: f64,
}

/// POSTs JSON envelopes to one device endpoint.
#[derive(Debug, Clone)]
pub struct DeviceForwarder {
    client: Client,
    endpoint: Url,
}

impl DeviceForwarder {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, RelayError> {
        let url = Url::parse(endpoint).map_err(|e| RelayError::InvalidEndpoint {
            url: endpoint.to_string(),
            message: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(RelayError::InvalidEndpoint {
                url: endpoint.to_string(),
                message: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        let client = create_client(timeout).map_err(|e| RelayError::InvalidEndpoint {
            url: endpoint.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { client, endpoint: url })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Deliver one envelope; any 2xx counts as acknowledged.
    pub async fn send(&self, envelope: &DeliveryEnvelope) -> Result<(), RelayError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(envelope)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(RelayError::DownstreamStatus { status: status.as_u16(), body: truncate(body) })
    }

    /// Send a `test` action and report whatever the device answers.
    pub async fn ping(&self, message: &str) -> Result<PingOutcome, RelayError> {
        let envelope = PingEnvelope {
            action: DeliveryAction::Test,
            message,
            timestamp: Utc::now().timestamp_micros() as f64 / 1_000_000.0,
        };
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&envelope)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;
        Ok(PingOutcome { status, body: truncate(body) })
    }
}

fn transport_error(err: reqwest::Error) -> RelayError {
    let message = if err.is_timeout() {
        format!("request timed out: {}", err)
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    };
    RelayError::DownstreamTransport { message }
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push('…');
    }
    body
}
