// Core layer - shared types, configuration, and calendar plumbing
pub mod core;

// Features layer - all feature modules
pub mod features;

// Infrastructure - sqlite-backed store
pub mod database;

// Re-export core config for convenience
pub use crate::core::Config;

// Re-export feature items for convenience
pub use features::{
    // Alerts
    trigger_key, AlarmRegistry, AlertChannel, AlertReceiver, Boundary, FiredAlert,
    ReminderScheduler, SchedulerError, TriggerKind,
    // Deletion integrity
    DeletionGuard, DeletionOutcome, DeletionPlan,
};

// Re-export store items
pub use database::{Database, StoreError, StoreEvent};
