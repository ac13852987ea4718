//! # Feature: Deletion Integrity Guard
//!
//! Decides whether a batch of terms may be deleted. Each candidate is
//! scanned for dependent courses; one blocked candidate blocks the whole
//! batch (nothing is deleted, clear candidates included) and the plan
//! redirects to the first blocked term's course list. The decision is
//! per-candidate, the offered action is all-or-nothing.
//!
//! A store failure during the scan propagates as an error — the guard
//! never answers "proceed" it cannot back.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.3.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Course/assessment deletion flows with reminder trigger sweep
//! - 1.0.0: Initial dependency scan and deletion plan

use log::{debug, info};

use crate::core::model::{Assessment, Course, Term};
use crate::database::{Database, StoreError};
use crate::features::alerts::{ReminderScheduler, TriggerKind};

/// Outcome of the pre-delete dependency scan.
#[derive(Debug, Clone, PartialEq)]
pub enum DeletionPlan {
    /// Every candidate is dependency-free; all may be deleted outright.
    Proceed { terms: Vec<Term> },
    /// At least one candidate has dependent courses. Nothing may be
    /// deleted; the user resolves the first blocked term's courses first.
    Blocked {
        blocked_terms: Vec<Term>,
        dependent_courses: Vec<Course>,
        redirect_term_id: i64,
    },
}

/// What applying a [`DeletionPlan`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionOutcome {
    /// Number of terms deleted.
    Deleted(usize),
    /// Term whose course list the user should be taken to.
    RedirectedToTerm(i64),
}

/// Pre-delete dependency guard over the store, plus the deletion flows
/// that keep reminder triggers consistent with rows.
#[derive(Clone)]
pub struct DeletionGuard {
    database: Database,
    scheduler: ReminderScheduler,
}

impl DeletionGuard {
    pub fn new(database: Database, scheduler: ReminderScheduler) -> Self {
        DeletionGuard { database, scheduler }
    }

    /// Scan `candidates` for dependent courses and return the plan.
    ///
    /// Callers check for a non-empty selection before invoking; an empty
    /// candidate set is a caller bug.
    pub async fn check_deletable(&self, candidates: &[Term]) -> Result<DeletionPlan, StoreError> {
        debug_assert!(!candidates.is_empty(), "empty candidate set");

        let mut blocked_terms = Vec::new();
        let mut dependent_courses = Vec::new();

        for term in candidates {
            let courses = self.database.courses_for_term(term.id).await?;
            if !courses.is_empty() {
                debug!("Term {} blocked by {} course(s)", term.id, courses.len());
                dependent_courses.extend(courses);
                blocked_terms.push(term.clone());
            }
        }

        if blocked_terms.is_empty() {
            return Ok(DeletionPlan::Proceed {
                terms: candidates.to_vec(),
            });
        }

        // Always resolve the first blocked term in input order.
        let redirect_term_id = blocked_terms[0].id;
        Ok(DeletionPlan::Blocked {
            blocked_terms,
            dependent_courses,
            redirect_term_id,
        })
    }

    /// Execute a confirmed plan: delete every term of a `Proceed`, or hand
    /// back the redirect target of a `Blocked` without touching anything.
    pub async fn apply(&self, plan: &DeletionPlan) -> Result<DeletionOutcome, StoreError> {
        match plan {
            DeletionPlan::Proceed { terms } => {
                for term in terms {
                    self.database.delete_term(term.id).await?;
                }
                info!("Deleted {} term(s)", terms.len());
                Ok(DeletionOutcome::Deleted(terms.len()))
            }
            DeletionPlan::Blocked { redirect_term_id, .. } => {
                Ok(DeletionOutcome::RedirectedToTerm(*redirect_term_id))
            }
        }
    }

    /// Delete a course, disarming both of its reminder boundaries first so
    /// no trigger fires for a row that is gone.
    pub async fn delete_course(&self, course: &Course) -> Result<(), StoreError> {
        self.scheduler.disarm_entity(TriggerKind::Course, course.id);
        self.database.delete_course(course.id).await
    }

    /// Delete an assessment, disarming both of its reminder boundaries
    /// first.
    pub async fn delete_assessment(&self, assessment: &Assessment) -> Result<(), StoreError> {
        self.scheduler.disarm_entity(TriggerKind::Assessment, assessment.id);
        self.database.delete_assessment(assessment.id).await
    }
}

/// Confirmation prompt for a dependency-free deletion.
pub fn confirm_message(terms: &[Term]) -> String {
    if terms.len() == 1 {
        return format!("Are you sure you want to delete term {}?", terms[0].title);
    }

    let mut message = String::from("Are you sure you want to delete the following terms: ");
    for (i, term) in terms.iter().enumerate() {
        message.push_str(&term.title);
        if i == terms.len() - 1 {
            message.push('?');
        } else {
            message.push_str(", ");
        }
    }
    message
}

/// Message shown when deletion is blocked: names the blocked term(s) and
/// every course that must go first. Confirming it redirects rather than
/// deletes.
pub fn blocked_message(blocked_terms: &[Term], dependent_courses: &[Course]) -> String {
    let mut message = String::from("There are courses associated with term");

    if blocked_terms.len() == 1 {
        message.push_str(": ");
        message.push_str(&blocked_terms[0].title);
    } else {
        message.push_str("s: ");
        for (i, term) in blocked_terms.iter().enumerate() {
            message.push_str(&term.title);
            if i < blocked_terms.len() - 1 {
                message.push_str(", ");
            }
        }
    }

    message.push_str(". These courses must be deleted first: ");
    for (i, course) in dependent_courses.iter().enumerate() {
        message.push_str(&course.title);
        if i == dependent_courses.len() - 1 {
            message.push('.');
        } else {
            message.push_str(", ");
        }
    }
    message
}
