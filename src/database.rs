//! # Database Module
//!
//! Sqlite-backed store for terms, courses, instructors, and assessments.
//! `Database` is a cheap-to-clone handle over a single connection behind an
//! async mutex; every accessor is async so callers stay off the interaction
//! thread.
//!
//! Two read facets, one type: every list query here is the one-shot facet,
//! and [`Database::subscribe`] is the subscription facet — each committed
//! mutation broadcasts which table changed so list screens can re-query.
//!
//! Dates persist as epoch-day integers (see [`crate::core::dates`]). The
//! store does not enforce referential integrity between tables; the
//! deletion-integrity guard owns that invariant.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Broadcast change feed for the subscription read facet
//! - 1.1.0: Demo seed gated on an empty term table
//! - 1.0.0: Initial CRUD surface for the four entity tables

use std::sync::Arc;

use log::{debug, info};
use sqlite::{Connection, ConnectionThreadSafe, State, Statement};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};

use crate::core::dates;
use crate::core::model::{
    Assessment, AssessmentType, Course, CourseInstructor, CourseStatus, Term,
};

/// Capacity of the change-feed broadcast channel. A lagged subscriber only
/// loses coalesced "table changed" hints, never data.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Which table a committed mutation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    TermsChanged,
    CoursesChanged,
    InstructorsChanged,
    AssessmentsChanged,
}

/// Errors surfaced by store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] sqlite::Error),

    #[error("{entity} requires a non-empty {field}")]
    MissingRequired {
        entity: &'static str,
        field: &'static str,
    },

    #[error("unrecognized {column} tag {value:?}")]
    UnknownTag { column: &'static str, value: String },
}

/// Handle to the schedule store. Clone freely; all clones share one
/// connection and one change feed.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<ConnectionThreadSafe>>,
    events: broadcast::Sender<StoreEvent>,
}

impl Database {
    /// Open (or create) the database at `path` and ensure the schema.
    ///
    /// `":memory:"` gives a private in-memory store, which the tests use.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open_thread_safe(path)?;
        conn.execute(SCHEMA)?;

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        info!("Database ready at {path}");
        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
            events,
        })
    }

    /// Subscription read facet: receive a [`StoreEvent`] for every committed
    /// mutation. Re-query the matching one-shot accessor on receipt.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn notify(&self, event: StoreEvent) {
        // No subscribers is fine; the send result only reports that.
        let _ = self.events.send(event);
    }

    // ----- terms -----

    /// Insert a term and return its store-assigned id.
    pub async fn insert_term(&self, term: &Term) -> Result<i64, StoreError> {
        if term.title.trim().is_empty() {
            return Err(StoreError::MissingRequired { entity: "term", field: "title" });
        }

        let id = {
            let conn = self.conn.lock().await;
            let mut stmt = conn
                .prepare("INSERT INTO term_table (title, start_date, end_date) VALUES (?, ?, ?)")?;
            stmt.bind((1, term.title.as_str()))?;
            stmt.bind((2, term.start_date.map(dates::to_epoch_day)))?;
            stmt.bind((3, term.end_date.map(dates::to_epoch_day)))?;
            stmt.next()?;
            last_insert_id(&conn)?
        };

        debug!("Inserted term {id} ({})", term.title);
        self.notify(StoreEvent::TermsChanged);
        Ok(id)
    }

    /// Update a term by id. Updating a missing row is a no-op.
    pub async fn update_term(&self, term: &Term) -> Result<(), StoreError> {
        if term.title.trim().is_empty() {
            return Err(StoreError::MissingRequired { entity: "term", field: "title" });
        }

        {
            let conn = self.conn.lock().await;
            let mut stmt = conn.prepare(
                "UPDATE term_table SET title = ?, start_date = ?, end_date = ? WHERE id = ?",
            )?;
            stmt.bind((1, term.title.as_str()))?;
            stmt.bind((2, term.start_date.map(dates::to_epoch_day)))?;
            stmt.bind((3, term.end_date.map(dates::to_epoch_day)))?;
            stmt.bind((4, term.id))?;
            stmt.next()?;
        }

        self.notify(StoreEvent::TermsChanged);
        Ok(())
    }

    /// Delete a term by id. Deleting a missing row is a no-op.
    ///
    /// This does not check for dependent courses — that invariant belongs to
    /// the deletion-integrity guard, which callers must consult first.
    pub async fn delete_term(&self, id: i64) -> Result<(), StoreError> {
        {
            let conn = self.conn.lock().await;
            let mut stmt = conn.prepare("DELETE FROM term_table WHERE id = ?")?;
            stmt.bind((1, id))?;
            stmt.next()?;
        }

        debug!("Deleted term {id}");
        self.notify(StoreEvent::TermsChanged);
        Ok(())
    }

    pub async fn term_by_id(&self, id: i64) -> Result<Option<Term>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT * FROM term_table WHERE id = ?")?;
        stmt.bind((1, id))?;

        match stmt.next()? {
            State::Row => Ok(Some(read_term(&stmt)?)),
            State::Done => Ok(None),
        }
    }

    pub async fn all_terms(&self) -> Result<Vec<Term>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT * FROM term_table ORDER BY id")?;

        let mut terms = Vec::new();
        while let State::Row = stmt.next()? {
            terms.push(read_term(&stmt)?);
        }
        Ok(terms)
    }

    pub async fn term_count(&self) -> Result<i64, StoreError> {
        self.count("term_table").await
    }

    // ----- courses -----

    /// Insert a course and return its store-assigned id.
    ///
    /// The caller is responsible for `term_id` and `instructor_id` naming
    /// existing rows; the store does not verify them.
    pub async fn insert_course(&self, course: &Course) -> Result<i64, StoreError> {
        if course.title.trim().is_empty() {
            return Err(StoreError::MissingRequired { entity: "course", field: "title" });
        }

        let id = {
            let conn = self.conn.lock().await;
            let mut stmt = conn.prepare(
                "INSERT INTO course_table \
                 (title, status, start_date, end_date, note, term_id, instructor_id) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )?;
            stmt.bind((1, course.title.as_str()))?;
            stmt.bind((2, course.status.as_str()))?;
            stmt.bind((3, course.start_date.map(dates::to_epoch_day)))?;
            stmt.bind((4, course.end_date.map(dates::to_epoch_day)))?;
            stmt.bind((5, course.note.as_str()))?;
            stmt.bind((6, course.term_id))?;
            stmt.bind((7, course.instructor_id))?;
            stmt.next()?;
            last_insert_id(&conn)?
        };

        debug!("Inserted course {id} ({})", course.title);
        self.notify(StoreEvent::CoursesChanged);
        Ok(id)
    }

    pub async fn update_course(&self, course: &Course) -> Result<(), StoreError> {
        if course.title.trim().is_empty() {
            return Err(StoreError::MissingRequired { entity: "course", field: "title" });
        }

        {
            let conn = self.conn.lock().await;
            let mut stmt = conn.prepare(
                "UPDATE course_table SET title = ?, status = ?, start_date = ?, end_date = ?, \
                 note = ?, term_id = ?, instructor_id = ? WHERE id = ?",
            )?;
            stmt.bind((1, course.title.as_str()))?;
            stmt.bind((2, course.status.as_str()))?;
            stmt.bind((3, course.start_date.map(dates::to_epoch_day)))?;
            stmt.bind((4, course.end_date.map(dates::to_epoch_day)))?;
            stmt.bind((5, course.note.as_str()))?;
            stmt.bind((6, course.term_id))?;
            stmt.bind((7, course.instructor_id))?;
            stmt.bind((8, course.id))?;
            stmt.next()?;
        }

        self.notify(StoreEvent::CoursesChanged);
        Ok(())
    }

    pub async fn delete_course(&self, id: i64) -> Result<(), StoreError> {
        {
            let conn = self.conn.lock().await;
            let mut stmt = conn.prepare("DELETE FROM course_table WHERE id = ?")?;
            stmt.bind((1, id))?;
            stmt.next()?;
        }

        debug!("Deleted course {id}");
        self.notify(StoreEvent::CoursesChanged);
        Ok(())
    }

    pub async fn course_by_id(&self, id: i64) -> Result<Option<Course>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT * FROM course_table WHERE id = ?")?;
        stmt.bind((1, id))?;

        match stmt.next()? {
            State::Row => Ok(Some(read_course(&stmt)?)),
            State::Done => Ok(None),
        }
    }

    pub async fn all_courses(&self) -> Result<Vec<Course>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT * FROM course_table ORDER BY id")?;

        let mut courses = Vec::new();
        while let State::Row = stmt.next()? {
            courses.push(read_course(&stmt)?);
        }
        Ok(courses)
    }

    /// Courses owned by a term. The dependency scan the deletion-integrity
    /// guard runs before any term deletion.
    pub async fn courses_for_term(&self, term_id: i64) -> Result<Vec<Course>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT * FROM course_table WHERE term_id = ? ORDER BY id")?;
        stmt.bind((1, term_id))?;

        let mut courses = Vec::new();
        while let State::Row = stmt.next()? {
            courses.push(read_course(&stmt)?);
        }
        Ok(courses)
    }

    pub async fn courses_for_instructor(
        &self,
        instructor_id: i64,
    ) -> Result<Vec<Course>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt =
            conn.prepare("SELECT * FROM course_table WHERE instructor_id = ? ORDER BY id")?;
        stmt.bind((1, instructor_id))?;

        let mut courses = Vec::new();
        while let State::Row = stmt.next()? {
            courses.push(read_course(&stmt)?);
        }
        Ok(courses)
    }

    pub async fn course_count(&self) -> Result<i64, StoreError> {
        self.count("course_table").await
    }

    // ----- instructors -----

    pub async fn insert_instructor(
        &self,
        instructor: &CourseInstructor,
    ) -> Result<i64, StoreError> {
        if instructor.name.trim().is_empty() {
            return Err(StoreError::MissingRequired { entity: "instructor", field: "name" });
        }

        let id = {
            let conn = self.conn.lock().await;
            let mut stmt = conn.prepare(
                "INSERT INTO course_instructor_table (name, phone_number, email) VALUES (?, ?, ?)",
            )?;
            stmt.bind((1, instructor.name.as_str()))?;
            stmt.bind((2, instructor.phone_number.as_str()))?;
            stmt.bind((3, instructor.email.as_str()))?;
            stmt.next()?;
            last_insert_id(&conn)?
        };

        debug!("Inserted instructor {id} ({})", instructor.name);
        self.notify(StoreEvent::InstructorsChanged);
        Ok(id)
    }

    pub async fn update_instructor(
        &self,
        instructor: &CourseInstructor,
    ) -> Result<(), StoreError> {
        if instructor.name.trim().is_empty() {
            return Err(StoreError::MissingRequired { entity: "instructor", field: "name" });
        }

        {
            let conn = self.conn.lock().await;
            let mut stmt = conn.prepare(
                "UPDATE course_instructor_table SET name = ?, phone_number = ?, email = ? \
                 WHERE id = ?",
            )?;
            stmt.bind((1, instructor.name.as_str()))?;
            stmt.bind((2, instructor.phone_number.as_str()))?;
            stmt.bind((3, instructor.email.as_str()))?;
            stmt.bind((4, instructor.id))?;
            stmt.next()?;
        }

        self.notify(StoreEvent::InstructorsChanged);
        Ok(())
    }

    pub async fn delete_instructor(&self, id: i64) -> Result<(), StoreError> {
        {
            let conn = self.conn.lock().await;
            let mut stmt = conn.prepare("DELETE FROM course_instructor_table WHERE id = ?")?;
            stmt.bind((1, id))?;
            stmt.next()?;
        }

        self.notify(StoreEvent::InstructorsChanged);
        Ok(())
    }

    pub async fn instructor_by_id(
        &self,
        id: i64,
    ) -> Result<Option<CourseInstructor>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT * FROM course_instructor_table WHERE id = ?")?;
        stmt.bind((1, id))?;

        match stmt.next()? {
            State::Row => Ok(Some(read_instructor(&stmt)?)),
            State::Done => Ok(None),
        }
    }

    pub async fn all_instructors(&self) -> Result<Vec<CourseInstructor>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT * FROM course_instructor_table ORDER BY id")?;

        let mut instructors = Vec::new();
        while let State::Row = stmt.next()? {
            instructors.push(read_instructor(&stmt)?);
        }
        Ok(instructors)
    }

    pub async fn instructor_count(&self) -> Result<i64, StoreError> {
        self.count("course_instructor_table").await
    }

    // ----- assessments -----

    pub async fn insert_assessment(&self, assessment: &Assessment) -> Result<i64, StoreError> {
        if assessment.title.trim().is_empty() {
            return Err(StoreError::MissingRequired { entity: "assessment", field: "title" });
        }

        let id = {
            let conn = self.conn.lock().await;
            let mut stmt = conn.prepare(
                "INSERT INTO assessment_table (title, type, start_date, end_date, course_id) \
                 VALUES (?, ?, ?, ?, ?)",
            )?;
            stmt.bind((1, assessment.title.as_str()))?;
            stmt.bind((2, assessment.kind.as_str()))?;
            stmt.bind((3, assessment.start_date.map(dates::to_epoch_day)))?;
            stmt.bind((4, assessment.end_date.map(dates::to_epoch_day)))?;
            stmt.bind((5, assessment.course_id))?;
            stmt.next()?;
            last_insert_id(&conn)?
        };

        debug!("Inserted assessment {id} ({})", assessment.title);
        self.notify(StoreEvent::AssessmentsChanged);
        Ok(id)
    }

    pub async fn update_assessment(&self, assessment: &Assessment) -> Result<(), StoreError> {
        if assessment.title.trim().is_empty() {
            return Err(StoreError::MissingRequired { entity: "assessment", field: "title" });
        }

        {
            let conn = self.conn.lock().await;
            let mut stmt = conn.prepare(
                "UPDATE assessment_table SET title = ?, type = ?, start_date = ?, end_date = ?, \
                 course_id = ? WHERE id = ?",
            )?;
            stmt.bind((1, assessment.title.as_str()))?;
            stmt.bind((2, assessment.kind.as_str()))?;
            stmt.bind((3, assessment.start_date.map(dates::to_epoch_day)))?;
            stmt.bind((4, assessment.end_date.map(dates::to_epoch_day)))?;
            stmt.bind((5, assessment.course_id))?;
            stmt.bind((6, assessment.id))?;
            stmt.next()?;
        }

        self.notify(StoreEvent::AssessmentsChanged);
        Ok(())
    }

    pub async fn delete_assessment(&self, id: i64) -> Result<(), StoreError> {
        {
            let conn = self.conn.lock().await;
            let mut stmt = conn.prepare("DELETE FROM assessment_table WHERE id = ?")?;
            stmt.bind((1, id))?;
            stmt.next()?;
        }

        debug!("Deleted assessment {id}");
        self.notify(StoreEvent::AssessmentsChanged);
        Ok(())
    }

    pub async fn assessment_by_id(&self, id: i64) -> Result<Option<Assessment>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT * FROM assessment_table WHERE id = ?")?;
        stmt.bind((1, id))?;

        match stmt.next()? {
            State::Row => Ok(Some(read_assessment(&stmt)?)),
            State::Done => Ok(None),
        }
    }

    pub async fn all_assessments(&self) -> Result<Vec<Assessment>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT * FROM assessment_table ORDER BY id")?;

        let mut assessments = Vec::new();
        while let State::Row = stmt.next()? {
            assessments.push(read_assessment(&stmt)?);
        }
        Ok(assessments)
    }

    /// Assessments owned by a course. Used by the course deletion flow to
    /// find dependents and by detail screens to list children.
    pub async fn assessments_for_course(
        &self,
        course_id: i64,
    ) -> Result<Vec<Assessment>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt =
            conn.prepare("SELECT * FROM assessment_table WHERE course_id = ? ORDER BY id")?;
        stmt.bind((1, course_id))?;

        let mut assessments = Vec::new();
        while let State::Row = stmt.next()? {
            assessments.push(read_assessment(&stmt)?);
        }
        Ok(assessments)
    }

    pub async fn assessment_count(&self) -> Result<i64, StoreError> {
        self.count("assessment_table").await
    }

    // ----- shared -----

    async fn count(&self, table: &str) -> Result<i64, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!("SELECT COUNT(*) FROM {table}"))?;
        stmt.next()?;
        Ok(stmt.read::<i64, _>(0)?)
    }

    /// Populate the demo data set, but only when the term table is empty.
    /// Returns whether anything was inserted.
    pub async fn seed_demo_data(&self) -> Result<bool, StoreError> {
        if self.term_count().await? > 0 {
            return Ok(false);
        }

        let today = chrono::Local::now().date_naive();

        self.insert_term(&Term::new(
            "Term 1",
            Some(today + chrono::Duration::days(1)),
            Some(today + chrono::Duration::days(2)),
        ))
        .await?;
        for n in 2..=5 {
            self.insert_term(&Term::new(format!("Term {n}"), Some(today), Some(today)))
                .await?;
        }
        self.insert_term(&Term::new("Test6", None, None)).await?;

        for (name, phone, email) in [
            ("Wooyoung", "111-1111", "wy@ateez"),
            ("San", "222-1111", "san@ateez"),
            ("Hongjoong", "333-1111", "leader@ateez"),
            ("Seonghwa", "444-1111", "sh@ateez"),
        ] {
            self.insert_instructor(&CourseInstructor::new(name, phone, email))
                .await?;
        }

        let mut dancing = Course::new("Dancing", CourseStatus::InProgress, 1, 1);
        dancing.start_date = Some(today);
        dancing.end_date = Some(today + chrono::Duration::days(3));
        dancing.note = "A note".to_string();
        self.insert_course(&dancing).await?;

        let mut singing = Course::new("Singing", CourseStatus::InProgress, 1, 2);
        singing.start_date = Some(today);
        singing.end_date = Some(today + chrono::Duration::days(5));
        singing.note = "This is just a short note.".to_string();
        self.insert_course(&singing).await?;

        self.insert_course(&Course::new("Rap", CourseStatus::PlanToTake, 1, 3))
            .await?;
        self.insert_course(&Course::new("Cleaning", CourseStatus::Completed, 1, 4))
            .await?;

        for (n, course_id) in
            [(1, 1), (2, 1), (3, 2), (4, 2), (5, 3), (6, 3), (7, 1), (8, 1), (9, 1)]
        {
            let kind = if n % 2 == 1 {
                AssessmentType::Objective
            } else {
                AssessmentType::Performance
            };
            self.insert_assessment(&Assessment::new(
                format!("Test{n}"),
                kind,
                Some(today),
                Some(today),
                course_id,
            ))
            .await?;
        }

        info!("Seeded demo data");
        Ok(true)
    }
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS term_table (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    start_date INTEGER,
    end_date INTEGER
);
CREATE TABLE IF NOT EXISTS course_instructor_table (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    phone_number TEXT NOT NULL,
    email TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS course_table (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    status TEXT NOT NULL,
    start_date INTEGER,
    end_date INTEGER,
    note TEXT NOT NULL,
    term_id INTEGER NOT NULL,
    instructor_id INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS assessment_table (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    type TEXT NOT NULL,
    start_date INTEGER,
    end_date INTEGER,
    course_id INTEGER NOT NULL
);
";

fn last_insert_id(conn: &ConnectionThreadSafe) -> Result<i64, sqlite::Error> {
    let mut stmt = conn.prepare("SELECT last_insert_rowid()")?;
    stmt.next()?;
    stmt.read::<i64, _>(0)
}

fn read_date(stmt: &Statement<'_>, column: &str) -> Result<Option<chrono::NaiveDate>, StoreError> {
    let raw = stmt.read::<Option<i64>, _>(column)?;
    Ok(raw.and_then(dates::from_epoch_day))
}

fn read_term(stmt: &Statement<'_>) -> Result<Term, StoreError> {
    Ok(Term {
        id: stmt.read::<i64, _>("id")?,
        title: stmt.read::<String, _>("title")?,
        start_date: read_date(stmt, "start_date")?,
        end_date: read_date(stmt, "end_date")?,
    })
}

fn read_course(stmt: &Statement<'_>) -> Result<Course, StoreError> {
    let tag = stmt.read::<String, _>("status")?;
    let status = CourseStatus::from_str_tag(&tag).ok_or(StoreError::UnknownTag {
        column: "status",
        value: tag,
    })?;

    Ok(Course {
        id: stmt.read::<i64, _>("id")?,
        title: stmt.read::<String, _>("title")?,
        status,
        start_date: read_date(stmt, "start_date")?,
        end_date: read_date(stmt, "end_date")?,
        note: stmt.read::<String, _>("note")?,
        term_id: stmt.read::<i64, _>("term_id")?,
        instructor_id: stmt.read::<i64, _>("instructor_id")?,
    })
}

fn read_instructor(stmt: &Statement<'_>) -> Result<CourseInstructor, StoreError> {
    Ok(CourseInstructor {
        id: stmt.read::<i64, _>("id")?,
        name: stmt.read::<String, _>("name")?,
        phone_number: stmt.read::<String, _>("phone_number")?,
        email: stmt.read::<String, _>("email")?,
    })
}

fn read_assessment(stmt: &Statement<'_>) -> Result<Assessment, StoreError> {
    let tag = stmt.read::<String, _>("type")?;
    let kind = AssessmentType::from_str_tag(&tag).ok_or(StoreError::UnknownTag {
        column: "type",
        value: tag,
    })?;

    Ok(Assessment {
        id: stmt.read::<i64, _>("id")?,
        title: stmt.read::<String, _>("title")?,
        kind,
        start_date: read_date(stmt, "start_date")?,
        end_date: read_date(stmt, "end_date")?,
        course_id: stmt.read::<i64, _>("course_id")?,
    })
}
