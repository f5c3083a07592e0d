//! Diagnostics sink.
//!
//! Values are collected during a control cycle and flushed once at its end.
//! Writing the same key twice in one cycle keeps the last value.

use chrono::prelude::{DateTime, Utc};
use serde::Serialize;
use std::{collections::BTreeMap, sync::Arc};
use tracing::*;
use zenoh::{prelude::r#async::*, Session};

use crate::error::ErrorWrapper;

pub const TELEMETRY_TOPIC: &str = "mecanum-teleop/telemetry";

#[derive(Debug, Default)]
pub struct Telemetry {
    pending: BTreeMap<String, String>,
}

impl Telemetry {
    pub fn add_data(&mut self, key: &str, value: impl Into<String>) {
        self.pending.insert(key.to_owned(), value.into());
    }

    /// Take everything written since the last update.
    pub fn update(&mut self) -> TelemetryFrame {
        TelemetryFrame {
            time: Utc::now(),
            entries: std::mem::take(&mut self.pending),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TelemetryFrame {
    pub time: DateTime<Utc>,
    pub entries: BTreeMap<String, String>,
}

impl TelemetryFrame {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

/// Sends telemetry frames to the log and, when connected, over zenoh.
#[derive(Clone, Default)]
pub struct TelemetryPublisher {
    zenoh_session: Option<Arc<Session>>,
}

impl TelemetryPublisher {
    pub fn new(zenoh_session: Arc<Session>) -> Self {
        Self {
            zenoh_session: Some(zenoh_session),
        }
    }

    pub fn log_only() -> Self {
        Self::default()
    }

    /// Best effort. Failures are logged and dropped.
    pub async fn publish(&self, frame: &TelemetryFrame) {
        debug!(entries = ?frame.entries, "Telemetry");
        if let Some(zenoh_session) = &self.zenoh_session {
            if let Err(err) = Self::put(zenoh_session, frame).await {
                warn!("Failed to publish telemetry {:?}", err);
            }
        }
    }

    async fn put(zenoh_session: &Session, frame: &TelemetryFrame) -> anyhow::Result<()> {
        let json = serde_json::to_string(frame)?;
        zenoh_session
            .put(TELEMETRY_TOPIC, json)
            .res_async()
            .await
            .map_err(ErrorWrapper::ZenohError)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins() {
        let mut telemetry = Telemetry::default();
        telemetry.add_data("Arm Power", "0.00");
        telemetry.add_data("Arm Power", "0.50");
        let frame = telemetry.update();
        assert_eq!(frame.get("Arm Power"), Some("0.50"));
        assert_eq!(frame.entries.len(), 1);
    }

    #[test]
    fn update_clears_pending() {
        let mut telemetry = Telemetry::default();
        telemetry.add_data("Status", "ready");
        assert_eq!(telemetry.update().entries.len(), 1);
        assert!(telemetry.update().entries.is_empty());
    }

    #[test]
    fn frame_serializes_entries() {
        let mut telemetry = Telemetry::default();
        telemetry.add_data("Drive Power", "0.80");
        let json = serde_json::to_value(telemetry.update()).unwrap();
        assert_eq!(json["entries"]["Drive Power"], "0.80");
    }

    #[tokio::test]
    async fn log_only_publish_does_not_fail() {
        let mut telemetry = Telemetry::default();
        telemetry.add_data("Status", "ready");
        TelemetryPublisher::log_only()
            .publish(&telemetry.update())
            .await;
    }
}
