//! Alert delivery loop.
//!
//! Drains fired alarms from the registry's delivery channel and renders
//! each one as a notification. Rendering is a structured log line here;
//! everything needed to display it travels in the payload, so no store
//! lookup happens at fire time.

use log::{debug, info};
use tokio::sync::mpsc;

use super::registry::FiredAlert;

/// Consumes fired alarms until the delivery channel closes.
pub struct AlertReceiver {
    receiver: mpsc::UnboundedReceiver<FiredAlert>,
}

impl AlertReceiver {
    pub fn new(receiver: mpsc::UnboundedReceiver<FiredAlert>) -> Self {
        AlertReceiver { receiver }
    }

    /// Run the delivery loop. Returns when every registry clone is gone.
    pub async fn run(mut self) {
        while let Some(alert) = self.receiver.recv().await {
            Self::render(&alert);
        }
        debug!("Alert delivery channel closed");
    }

    fn render(alert: &FiredAlert) {
        info!(
            "[{}] Course Scheduler Alert #{}: {}",
            alert.payload.channel.display_name(),
            alert.payload.notification_id,
            alert.payload.message
        );
        if let Ok(json) = serde_json::to_string(&alert.payload) {
            debug!("alert payload: {json}");
        }
    }
}
