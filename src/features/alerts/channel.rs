//! Notification channels for fired alerts.
//!
//! One channel per alerting entity kind, so downstream display can group
//! and prioritize course and assessment notifications separately.

use serde::{Deserialize, Serialize};

/// Channel a fired alert is delivered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertChannel {
    Course,
    Assessment,
}

impl AlertChannel {
    /// Stable tag used in payloads and log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertChannel::Course => "course",
            AlertChannel::Assessment => "assessment",
        }
    }

    /// Human-readable channel name.
    pub fn display_name(&self) -> &'static str {
        match self {
            AlertChannel::Course => "Course Alerts",
            AlertChannel::Assessment => "Assessment Alerts",
        }
    }

    /// What the channel carries.
    pub fn description(&self) -> &'static str {
        match self {
            AlertChannel::Course => "Reminders about course start and end dates",
            AlertChannel::Assessment => "Reminders about assessment start and end dates",
        }
    }
}
