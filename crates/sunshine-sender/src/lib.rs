//! Phone-side weather sender.
//!
//! Formats a forecast and publishes it to the wearable over the sync
//! channel. Delivery is best effort: every failure is logged and dropped.

use std::sync::Arc;

use serde::Deserialize;
use sunshine_core::{SenderConfig, SyncError, TemperatureUnit};
use sunshine_sync::{encode_weather, ConnectionManager, ConnectionState, SyncTransport};
use sunshine_weather::{format_temperature, WeatherSummary};
use tokio::task::JoinHandle;

/// Trigger payload, as delivered by the forecast sync job
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SendRequest {
    pub high: f64,
    pub low: f64,
    #[serde(rename = "weatherId")]
    pub weather_id: i32,
}

/// What happened to one send. Informational only; nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Published,
    ConnectFailed(SyncError),
    /// The link dropped before the record could be published
    Suspended,
    PublishFailed(SyncError),
}

impl SendOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, SendOutcome::Published)
    }

    /// The sync failure behind this outcome, if any
    pub fn error(&self) -> Option<&SyncError> {
        match self {
            SendOutcome::ConnectFailed(e) | SendOutcome::PublishFailed(e) => Some(e),
            SendOutcome::Published | SendOutcome::Suspended => None,
        }
    }
}

pub struct WeatherSender {
    connection: ConnectionManager,
    unit: TemperatureUnit,
}

impl WeatherSender {
    /// Must be called inside a tokio runtime.
    pub fn new(transport: Arc<dyn SyncTransport>, config: &SenderConfig) -> Self {
        Self {
            connection: ConnectionManager::new(transport),
            unit: config.temperature_unit,
        }
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Build the summary that `send` would publish
    pub fn summarize(&self, high: f64, low: f64, condition_code: i32) -> WeatherSummary {
        WeatherSummary::new(
            format_temperature(high, self.unit),
            format_temperature(low, self.unit),
            condition_code,
        )
    }

    /// Format, connect if needed, and publish one weather record.
    ///
    /// Reuses the live connection when there is one. Never times out: if the
    /// transport stops answering the future stays pending.
    pub async fn send(&self, high: f64, low: f64, condition_code: i32) -> SendOutcome {
        let summary = self.summarize(high, low, condition_code);
        tracing::debug!(
            high = %summary.high,
            low = %summary.low,
            weather_id = summary.condition_code,
            "Sending weather"
        );

        match self.connection.ensure_connected().await {
            ConnectionState::Connected => {}
            ConnectionState::Failed(e) => {
                tracing::warn!("Fail to connect: {}", e);
                return SendOutcome::ConnectFailed(e);
            }
            state => {
                tracing::warn!(?state, "Connection lost before publishing");
                return SendOutcome::Suspended;
            }
        }

        match self
            .connection
            .transport()
            .put_data_item(encode_weather(&summary))
            .await
        {
            Ok(item) => {
                tracing::info!(path = %item.path, "Weather published");
                SendOutcome::Published
            }
            Err(e) => {
                tracing::error!("Failed to publish weather: {}", e);
                SendOutcome::PublishFailed(e)
            }
        }
    }

    pub async fn handle_request(&self, request: SendRequest) -> SendOutcome {
        self.send(request.high, request.low, request.weather_id).await
    }

    /// Fire-and-forget variant of [`send`](Self::send).
    pub fn dispatch(
        self: &Arc<Self>,
        high: f64,
        low: f64,
        condition_code: i32,
    ) -> JoinHandle<SendOutcome> {
        let sender = Arc::clone(self);
        tokio::spawn(async move { sender.send(high, low, condition_code).await })
    }

    /// Release the connection. The next send reconnects.
    pub async fn release(&self) {
        self.connection.release().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_uses_wire_names() {
        let request: SendRequest =
            serde_json::from_str(r#"{"high": 25.0, "low": 14.0, "weatherId": 200}"#).unwrap();
        assert_eq!(
            request,
            SendRequest {
                high: 25.0,
                low: 14.0,
                weather_id: 200
            }
        );
    }

    #[test]
    fn test_outcome_exposes_sync_error() {
        let failed = SendOutcome::PublishFailed(SyncError::PublishFailed("quota".into()));
        assert_eq!(
            failed.error().map(SyncError::user_message),
            Some("Weather update could not be sent.")
        );
        assert!(!failed.is_published());
        assert_eq!(SendOutcome::Suspended.error(), None);
        assert!(SendOutcome::Published.is_published());
    }
}
