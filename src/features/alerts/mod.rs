//! # Alerts Feature
//!
//! Calendar-bound reminders for course and assessment start/end dates.
//! The scheduler keys every trigger off a deterministic integer derived
//! from entity identity, arms one-shot wake-ups in the process-wide alarm
//! registry, and the receiver renders whatever fires. The registry is the
//! only trigger state — nothing is persisted here.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//! - **Toggleable**: true
//!
//! ## Changelog
//! - 1.1.0: Entity-wide disarm sweep for deletion flows
//! - 1.0.0: Initial arm/disarm/probe over the alarm registry

pub mod channel;
pub mod receiver;
pub mod registry;
pub mod scheduler;
pub mod trigger;

pub use channel::AlertChannel;
pub use receiver::AlertReceiver;
pub use registry::{AlarmPayload, AlarmRegistry, FiredAlert, RegistryError};
pub use scheduler::{ReminderScheduler, SchedulerError};
pub use trigger::{trigger_key, Boundary, TriggerKind};
