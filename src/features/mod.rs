//! # Features Module
//!
//! Feature modules for the course scheduler. Each feature lives in its own
//! submodule with a focused public surface.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

pub mod alerts;
pub mod integrity;

// Re-export the primary types of each feature
pub use alerts::{
    trigger_key, AlarmRegistry, AlertChannel, AlertReceiver, Boundary, FiredAlert,
    ReminderScheduler, SchedulerError, TriggerKind,
};
pub use integrity::{DeletionGuard, DeletionOutcome, DeletionPlan};
