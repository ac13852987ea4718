//! Entity model for the two-level schedule hierarchy.
//!
//! A `Term` owns zero or more `Course`s (by `term_id`); a `Course` owns zero
//! or more `Assessment`s (by `course_id`) and references exactly one
//! `CourseInstructor`. The store assigns ids on insert; an entity built for
//! a "new" form carries id 0 until then.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Display labels on status/type enums for list rendering
//! - 1.0.0: Initial entity set

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An academic term. Owns courses by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: i64,
    pub title: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Term {
    pub fn new(title: impl Into<String>, start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Self {
        Term {
            id: 0,
            title: title.into(),
            start_date,
            end_date,
        }
    }
}

/// Progress status of a course.
///
/// `NeedsAttention` is a display-only state surfaced in lists; it is stored
/// like any other variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CourseStatus {
    PlanToTake,
    InProgress,
    NeedsAttention,
    Completed,
}

impl CourseStatus {
    /// Storage tag written to the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStatus::PlanToTake => "PLAN_TO_TAKE",
            CourseStatus::InProgress => "IN_PROGRESS",
            CourseStatus::NeedsAttention => "NEEDS_ATTENTION",
            CourseStatus::Completed => "COMPLETED",
        }
    }

    /// Parse a storage tag back into a status.
    pub fn from_str_tag(tag: &str) -> Option<Self> {
        match tag {
            "PLAN_TO_TAKE" => Some(CourseStatus::PlanToTake),
            "IN_PROGRESS" => Some(CourseStatus::InProgress),
            "NEEDS_ATTENTION" => Some(CourseStatus::NeedsAttention),
            "COMPLETED" => Some(CourseStatus::Completed),
            _ => None,
        }
    }

    /// Human-readable label for list rendering.
    pub fn label(&self) -> &'static str {
        match self {
            CourseStatus::PlanToTake => "Plan to Take",
            CourseStatus::InProgress => "In Progress",
            CourseStatus::NeedsAttention => "Needs Attention",
            CourseStatus::Completed => "Completed",
        }
    }
}

/// A course within a term. References its term and instructor by id and
/// owns assessments by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub status: CourseStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub note: String,
    pub term_id: i64,
    pub instructor_id: i64,
}

impl Course {
    pub fn new(title: impl Into<String>, status: CourseStatus, term_id: i64, instructor_id: i64) -> Self {
        Course {
            id: 0,
            title: title.into(),
            status,
            start_date: None,
            end_date: None,
            note: String::new(),
            term_id,
            instructor_id,
        }
    }
}

/// Contact record for a course instructor. Only the name is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseInstructor {
    pub id: i64,
    pub name: String,
    pub phone_number: String,
    pub email: String,
}

impl CourseInstructor {
    pub fn new(name: impl Into<String>, phone_number: impl Into<String>, email: impl Into<String>) -> Self {
        CourseInstructor {
            id: 0,
            name: name.into(),
            phone_number: phone_number.into(),
            email: email.into(),
        }
    }
}

/// Kind of assessment attached to a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssessmentType {
    Objective,
    Performance,
}

impl AssessmentType {
    /// Storage tag written to the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentType::Objective => "OBJECTIVE",
            AssessmentType::Performance => "PERFORMANCE",
        }
    }

    /// Parse a storage tag back into a type.
    pub fn from_str_tag(tag: &str) -> Option<Self> {
        match tag {
            "OBJECTIVE" => Some(AssessmentType::Objective),
            "PERFORMANCE" => Some(AssessmentType::Performance),
            _ => None,
        }
    }

    /// Human-readable label for list rendering.
    pub fn label(&self) -> &'static str {
        match self {
            AssessmentType::Objective => "Objective",
            AssessmentType::Performance => "Performance",
        }
    }
}

/// An assessment belonging to a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: i64,
    pub title: String,
    pub kind: AssessmentType,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub course_id: i64,
}

impl Assessment {
    pub fn new(
        title: impl Into<String>,
        kind: AssessmentType,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        course_id: i64,
    ) -> Self {
        Assessment {
            id: 0,
            title: title.into(),
            kind,
            start_date,
            end_date,
            course_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_tags_round_trip() {
        for status in [
            CourseStatus::PlanToTake,
            CourseStatus::InProgress,
            CourseStatus::NeedsAttention,
            CourseStatus::Completed,
        ] {
            assert_eq!(CourseStatus::from_str_tag(status.as_str()), Some(status));
        }
        assert_eq!(CourseStatus::from_str_tag("DROPPED"), None);
    }

    #[test]
    fn test_assessment_type_tags() {
        assert_eq!(AssessmentType::Objective.as_str(), "OBJECTIVE");
        assert_eq!(
            AssessmentType::from_str_tag("PERFORMANCE"),
            Some(AssessmentType::Performance)
        );
        assert_eq!(AssessmentType::from_str_tag("ESSAY"), None);
    }

    #[test]
    fn test_new_entities_have_no_id() {
        let term = Term::new("Term 1", None, None);
        assert_eq!(term.id, 0);

        let course = Course::new("Dancing", CourseStatus::InProgress, 1, 1);
        assert_eq!(course.id, 0);
        assert!(course.note.is_empty());
    }

    #[test]
    fn test_labels() {
        assert_eq!(CourseStatus::NeedsAttention.label(), "Needs Attention");
        assert_eq!(AssessmentType::Performance.label(), "Performance");
    }
}
