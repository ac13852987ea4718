//! # Feature: Reminder Scheduler
//!
//! Arms, disarms, and probes calendar-day reminders for courses and
//! assessments. The scheduler owns no trigger state of its own: every
//! operation resolves the trigger key and talks to the alarm registry, so
//! a freshly created screen can ask "is this armed?" and get the truth.
//!
//! Toggle serialization is the caller's job: concurrent arm/disarm on the
//! same key has an undefined final state. Probes are freely concurrent.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//! - **Toggleable**: true
//!
//! ## Changelog
//! - 1.1.0: Entity lookup helpers that compose the notification text
//! - 1.0.0: Initial arm/disarm/probe keyed by trigger identity

use chrono::NaiveDate;
use log::debug;
use thiserror::Error;

use crate::core::dates;
use crate::database::{Database, StoreError};

use super::registry::{AlarmPayload, AlarmRegistry, RegistryError};
use super::trigger::{trigger_key, Boundary, TriggerKind};

/// Errors surfaced when arming a reminder.
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// The boundary has no date; the caller reverts the toggle.
    #[error("a date is required to set an alert")]
    MissingDate,

    /// The alarm registry rejected the registration.
    #[error("alarm registration failed: {0}")]
    Host(#[from] RegistryError),

    /// An entity lookup for message composition failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The entity to remind about does not exist.
    #[error("{entity} {id} not found")]
    UnknownEntity { entity: &'static str, id: i64 },
}

/// Reminder scheduler over the process-wide alarm registry.
#[derive(Clone)]
pub struct ReminderScheduler {
    database: Database,
    registry: AlarmRegistry,
}

impl ReminderScheduler {
    pub fn new(database: Database, registry: AlarmRegistry) -> Self {
        ReminderScheduler { database, registry }
    }

    /// Read-only probe for a pending reminder. Never creates one.
    pub fn is_armed(&self, kind: TriggerKind, boundary: Boundary, id: i64) -> bool {
        self.registry.lookup(trigger_key(kind, boundary, id))
    }

    /// Arm a reminder for local midnight of `fire_date`.
    ///
    /// Re-validates the date even though callers gate the toggle on one
    /// being present. Arming an armed key replaces the registration; a
    /// date that already passed fires immediately.
    pub fn arm(
        &self,
        kind: TriggerKind,
        boundary: Boundary,
        id: i64,
        fire_date: Option<NaiveDate>,
        message: &str,
    ) -> Result<(), SchedulerError> {
        let date = fire_date.ok_or(SchedulerError::MissingDate)?;
        let key = trigger_key(kind, boundary, id);

        self.registry.register(
            key,
            dates::local_midnight(date),
            AlarmPayload {
                channel: kind.into(),
                notification_id: key,
                message: message.to_string(),
            },
        )?;

        debug!("Armed {} {} reminder for {} {id}", kind.as_str(), boundary.as_str(), date);
        Ok(())
    }

    /// Disarm a reminder. A never-armed key is a silent no-op.
    pub fn disarm(&self, kind: TriggerKind, boundary: Boundary, id: i64) {
        self.registry.cancel(trigger_key(kind, boundary, id));
    }

    /// Disarm both boundaries of one entity. Deletion flows call this
    /// before removing the row so no trigger outlives its entity.
    pub fn disarm_entity(&self, kind: TriggerKind, id: i64) {
        self.disarm(kind, Boundary::Start, id);
        self.disarm(kind, Boundary::End, id);
    }

    /// Arm a course reminder, composing the notification text from the row.
    pub async fn arm_course(
        &self,
        boundary: Boundary,
        course_id: i64,
    ) -> Result<(), SchedulerError> {
        let course = self
            .database
            .course_by_id(course_id)
            .await?
            .ok_or(SchedulerError::UnknownEntity { entity: "course", id: course_id })?;

        let (date, message) = match boundary {
            Boundary::Start => (
                course.start_date,
                format!("Course {} is starting today", course.title),
            ),
            Boundary::End => (
                course.end_date,
                format!("Course {} is ending today", course.title),
            ),
        };

        self.arm(TriggerKind::Course, boundary, course.id, date, &message)
    }

    /// Arm an assessment reminder, composing the notification text from
    /// the row.
    pub async fn arm_assessment(
        &self,
        boundary: Boundary,
        assessment_id: i64,
    ) -> Result<(), SchedulerError> {
        let assessment = self
            .database
            .assessment_by_id(assessment_id)
            .await?
            .ok_or(SchedulerError::UnknownEntity { entity: "assessment", id: assessment_id })?;

        let (date, message) = match boundary {
            Boundary::Start => (
                assessment.start_date,
                format!("Assessment {} is starting today", assessment.title),
            ),
            Boundary::End => (
                assessment.end_date,
                format!("Assessment {} is ending today", assessment.title),
            ),
        };

        self.arm(TriggerKind::Assessment, boundary, assessment.id, date, &message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Assessment, AssessmentType, Course, CourseStatus};
    use crate::features::alerts::registry::FiredAlert;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::time::timeout;

    async fn scheduler() -> (ReminderScheduler, UnboundedReceiver<FiredAlert>) {
        let database = Database::new(":memory:").await.unwrap();
        let (registry, rx) = AlarmRegistry::new();
        (ReminderScheduler::new(database, registry), rx)
    }

    fn future_date() -> NaiveDate {
        chrono::Local::now().date_naive() + chrono::Duration::days(30)
    }

    #[tokio::test]
    async fn test_arm_probe_disarm_cycle() {
        let (scheduler, _rx) = scheduler().await;

        assert!(!scheduler.is_armed(TriggerKind::Course, Boundary::Start, 7));

        scheduler
            .arm(TriggerKind::Course, Boundary::Start, 7, Some(future_date()), "Course Dancing is starting today")
            .unwrap();
        assert!(scheduler.is_armed(TriggerKind::Course, Boundary::Start, 7));

        scheduler.disarm(TriggerKind::Course, Boundary::Start, 7);
        assert!(!scheduler.is_armed(TriggerKind::Course, Boundary::Start, 7));
    }

    #[tokio::test]
    async fn test_disarm_never_armed_is_noop() {
        let (scheduler, _rx) = scheduler().await;

        // Must not panic or error.
        scheduler.disarm(TriggerKind::Assessment, Boundary::End, 123);
        assert!(!scheduler.is_armed(TriggerKind::Assessment, Boundary::End, 123));
    }

    #[tokio::test]
    async fn test_arm_without_date_fails_and_registers_nothing() {
        let (scheduler, _rx) = scheduler().await;

        let result = scheduler.arm(TriggerKind::Course, Boundary::Start, 7, None, "nope");
        assert!(matches!(result, Err(SchedulerError::MissingDate)));
        assert!(!scheduler.is_armed(TriggerKind::Course, Boundary::Start, 7));
    }

    #[tokio::test]
    async fn test_boundaries_are_independent() {
        let (scheduler, _rx) = scheduler().await;

        scheduler
            .arm(TriggerKind::Course, Boundary::Start, 7, Some(future_date()), "start")
            .unwrap();
        scheduler
            .arm(TriggerKind::Course, Boundary::End, 7, Some(future_date()), "end")
            .unwrap();

        scheduler.disarm(TriggerKind::Course, Boundary::Start, 7);
        assert!(!scheduler.is_armed(TriggerKind::Course, Boundary::Start, 7));
        assert!(scheduler.is_armed(TriggerKind::Course, Boundary::End, 7));
    }

    #[tokio::test]
    async fn test_rearm_replaces() {
        let (scheduler, _rx) = scheduler().await;

        scheduler
            .arm(TriggerKind::Course, Boundary::Start, 7, Some(future_date()), "first")
            .unwrap();
        scheduler
            .arm(TriggerKind::Course, Boundary::Start, 7, Some(future_date()), "second")
            .unwrap();

        assert!(scheduler.is_armed(TriggerKind::Course, Boundary::Start, 7));
        // One disarm fully clears the replaced registration.
        scheduler.disarm(TriggerKind::Course, Boundary::Start, 7);
        assert!(!scheduler.is_armed(TriggerKind::Course, Boundary::Start, 7));
    }

    #[tokio::test]
    async fn test_arm_course_composes_message() {
        let (scheduler, mut rx) = scheduler().await;
        let db = scheduler.database.clone();

        let mut course = Course::new("Dancing", CourseStatus::InProgress, 1, 1);
        // A past date makes the reminder fire immediately, which hands us
        // the composed payload to inspect.
        course.start_date = Some(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        let course_id = db.insert_course(&course).await.unwrap();

        scheduler.arm_course(Boundary::Start, course_id).await.unwrap();

        let fired = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("past-dated reminder should fire")
            .expect("delivery channel open");
        assert_eq!(fired.payload.message, "Course Dancing is starting today");
        assert_eq!(
            fired.payload.notification_id,
            trigger_key(TriggerKind::Course, Boundary::Start, course_id)
        );
    }

    #[tokio::test]
    async fn test_arm_course_without_end_date_fails() {
        let (scheduler, _rx) = scheduler().await;
        let db = scheduler.database.clone();

        let course_id = db
            .insert_course(&Course::new("Rap", CourseStatus::PlanToTake, 1, 1))
            .await
            .unwrap();

        let result = scheduler.arm_course(Boundary::End, course_id).await;
        assert!(matches!(result, Err(SchedulerError::MissingDate)));
        assert!(!scheduler.is_armed(TriggerKind::Course, Boundary::End, course_id));
    }

    #[tokio::test]
    async fn test_arm_unknown_course() {
        let (scheduler, _rx) = scheduler().await;

        let result = scheduler.arm_course(Boundary::Start, 999).await;
        assert!(matches!(
            result,
            Err(SchedulerError::UnknownEntity { entity: "course", id: 999 })
        ));
    }

    #[tokio::test]
    async fn test_arm_assessment_composes_message() {
        let (scheduler, mut rx) = scheduler().await;
        let db = scheduler.database.clone();

        let assessment = Assessment::new(
            "Final",
            AssessmentType::Objective,
            None,
            Some(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()),
            1,
        );
        let assessment_id = db.insert_assessment(&assessment).await.unwrap();

        scheduler
            .arm_assessment(Boundary::End, assessment_id)
            .await
            .unwrap();

        let fired = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("past-dated reminder should fire")
            .expect("delivery channel open");
        assert_eq!(fired.payload.message, "Assessment Final is ending today");
    }

    #[tokio::test]
    async fn test_disarm_entity_sweeps_both_boundaries() {
        let (scheduler, _rx) = scheduler().await;

        scheduler
            .arm(TriggerKind::Assessment, Boundary::Start, 3, Some(future_date()), "start")
            .unwrap();
        scheduler
            .arm(TriggerKind::Assessment, Boundary::End, 3, Some(future_date()), "end")
            .unwrap();

        scheduler.disarm_entity(TriggerKind::Assessment, 3);
        assert!(!scheduler.is_armed(TriggerKind::Assessment, Boundary::Start, 3));
        assert!(!scheduler.is_armed(TriggerKind::Assessment, Boundary::End, 3));
    }
}
