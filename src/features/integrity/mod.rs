//! # Deletion Integrity Feature
//!
//! Guards the ownership hierarchy when rows go away: a term with dependent
//! courses is never deleted (the user is redirected into the blocking
//! courses instead), and course/assessment deletion sweeps the entity's
//! reminder triggers so none outlive their row.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.3.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Trigger sweep on course/assessment deletion
//! - 1.0.0: Initial dependency scan and deletion plan

pub mod guard;

pub use guard::{blocked_message, confirm_message, DeletionGuard, DeletionOutcome, DeletionPlan};
