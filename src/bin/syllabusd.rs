use anyhow::Result;
use dotenvy::dotenv;
use log::{debug, info, warn};
use tokio::sync::broadcast;

use syllabus::core::Config;
use syllabus::database::Database;
use syllabus::features::alerts::{
    AlarmRegistry, AlertReceiver, Boundary, ReminderScheduler, SchedulerError,
};
use syllabus::features::integrity::{blocked_message, DeletionGuard, DeletionPlan};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting course scheduler daemon...");

    let database = Database::new(&config.database_path).await?;

    let freshly_seeded = if config.seed_demo_data {
        database.seed_demo_data().await?
    } else {
        false
    };

    info!(
        "Store: {} term(s), {} course(s), {} instructor(s), {} assessment(s)",
        database.term_count().await?,
        database.course_count().await?,
        database.instructor_count().await?,
        database.assessment_count().await?,
    );

    // Alarm registry and the delivery loop that renders fired reminders
    let (registry, alerts) = AlarmRegistry::new();
    let receiver = AlertReceiver::new(alerts);
    tokio::spawn(async move {
        receiver.run().await;
    });

    let scheduler = ReminderScheduler::new(database.clone(), registry.clone());
    let guard = DeletionGuard::new(database.clone(), scheduler.clone());

    // Log store changes so an attached operator can follow mutations
    let mut events = database.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => debug!("store change: {event:?}"),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("store change feed lagged by {n} event(s)")
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    if freshly_seeded {
        demo_walkthrough(&database, &scheduler, &guard).await?;
    }

    info!(
        "⏰ Scheduler ready with {} pending alarm(s). Press Ctrl-C to stop.",
        registry.pending_count()
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    Ok(())
}

/// Exercise the core once over the freshly seeded data so a first run has
/// something visible: arm the dated course reminders (the ones dated today
/// fire right away) and report which terms the deletion guard would block.
async fn demo_walkthrough(
    database: &Database,
    scheduler: &ReminderScheduler,
    guard: &DeletionGuard,
) -> Result<()> {
    for course in database.all_courses().await? {
        for boundary in [Boundary::Start, Boundary::End] {
            match scheduler.arm_course(boundary, course.id).await {
                Ok(()) => {}
                // Courses without dates simply get no reminder.
                Err(SchedulerError::MissingDate) => {
                    debug!("course {} has no {boundary:?} date, skipping", course.title)
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    let terms = database.all_terms().await?;
    if !terms.is_empty() {
        match guard.check_deletable(&terms).await? {
            DeletionPlan::Proceed { terms } => {
                info!("All {} term(s) are dependency-free", terms.len())
            }
            DeletionPlan::Blocked { blocked_terms, dependent_courses, .. } => {
                info!("{}", blocked_message(&blocked_terms, &dependent_courses))
            }
        }
    }

    Ok(())
}
