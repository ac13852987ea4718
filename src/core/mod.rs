//! # Core Module
//!
//! Core domain types, configuration, and calendar-date plumbing for the
//! course scheduler.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add dates module with epoch-day storage encoding
//! - 1.0.0: Initial creation with config and model modules

pub mod config;
pub mod dates;
pub mod model;

// Re-export commonly used items
pub use config::Config;
pub use model::{Assessment, AssessmentType, Course, CourseInstructor, CourseStatus, Term};
