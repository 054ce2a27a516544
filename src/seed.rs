//! Demo account for local runs: `test` / `test`, with a spread of tasks around today.

use time::{Date, Duration};

use crate::error::ServiceError;
use crate::middleware::{AccountStore, PasswordHasher, TaskStore};
use crate::task::{NewTask, Priority, TaskStatus};
use crate::types::NewAccount;

pub const DEMO_USERNAME: &str = "test";
const DEMO_EMAIL: &str = "test@test.com";
const DEMO_PASSWORD: &str = "test";

/// `(title, description, status, priority, due in days from today)`
const DEMO_TASKS: &[(&str, &str, TaskStatus, Priority, i64)] = &[
    ("Set up project repository", "Initialise Git repo, add .gitignore, push initial commit to remote.", TaskStatus::Done, Priority::High, -10),
    ("Write project README", "Document setup steps, tech stack, and environment variables.", TaskStatus::Done, Priority::Medium, -7),
    ("Design database schema", "Create ERD for users, tasks, comments, and labels tables.", TaskStatus::Done, Priority::High, -5),
    ("Implement token authentication", "Add login and register endpoints secured with bearer tokens.", TaskStatus::Done, Priority::High, -3),
    ("Create schema migrations", "Write the SQL migration scripts for the initial schema.", TaskStatus::Done, Priority::Medium, -2),
    ("Build task CRUD API", "REST endpoints for creating, reading, updating, and deleting tasks.", TaskStatus::InProgress, Priority::High, 1),
    ("Add task filtering and sorting", "Allow filtering tasks by status and priority; support sort by due date.", TaskStatus::InProgress, Priority::Medium, 3),
    ("Write unit tests for services", "Cover the auth and task services with unit tests.", TaskStatus::InProgress, Priority::High, 2),
    ("Publish API docs", "Expose OpenAPI docs with request/response examples.", TaskStatus::InProgress, Priority::Low, 4),
    ("Implement pagination on task list", "Add page and size query params to GET /api/tasks.", TaskStatus::Todo, Priority::Medium, 5),
    ("Add task labels / tags", "Allow users to attach colour-coded labels to tasks for grouping.", TaskStatus::Todo, Priority::Low, 7),
    ("Send email notifications", "Notify users via email when a task is approaching its due date.", TaskStatus::Todo, Priority::Medium, 9),
    ("Set up CI/CD pipeline", "Build, test, and deploy on every push to main.", TaskStatus::Todo, Priority::High, 6),
    ("Add user profile endpoint", "GET /api/users/me returns current user details; PATCH allows updates.", TaskStatus::Todo, Priority::Low, 10),
    ("Implement task comments", "Allow users to leave timestamped comments on any task they own.", TaskStatus::Todo, Priority::Low, 14),
    ("Performance profiling", "Run load tests and identify slow queries to optimise.", TaskStatus::Todo, Priority::Medium, 20),
    ("Overdue: security audit", "Review OWASP Top-10 checklist and fix any identified vulnerabilities.", TaskStatus::Todo, Priority::High, -1),
    ("Overdue: update dependencies", "Bump dependencies to their latest stable versions.", TaskStatus::Todo, Priority::Medium, -4),
];

/// Creates the demo account and its tasks. Returns `false` without touching anything if
/// the account already exists.
///
/// # Errors
///
/// [`ServiceError::Store`] if a store operation fails.
pub async fn seed_demo_account<A: AccountStore, T: TaskStore>(
    accounts: &A,
    tasks: &T,
    hasher: &dyn PasswordHasher,
    today: Date,
) -> Result<bool, ServiceError> {
    if accounts
        .exists_by_username(DEMO_USERNAME)
        .await
        .map_err(ServiceError::store)?
    {
        tracing::info!("Demo account already exists, skipping seed");
        return Ok(false);
    }

    let password_hash = hasher.hash(DEMO_PASSWORD).map_err(ServiceError::store)?;
    let account = accounts
        .save(NewAccount {
            username: DEMO_USERNAME.into(),
            email: DEMO_EMAIL.into(),
            password_hash,
        })
        .await
        .map_err(ServiceError::store)?;

    for &(title, description, status, priority, due_in) in DEMO_TASKS {
        tasks
            .create(
                account.id,
                NewTask {
                    title: title.into(),
                    description: Some(description.into()),
                    status,
                    priority,
                    due_date: Some(today.saturating_add(Duration::days(due_in))),
                },
            )
            .await
            .map_err(ServiceError::store)?;
    }

    tracing::info!(
        username = DEMO_USERNAME,
        email = DEMO_EMAIL,
        tasks = DEMO_TASKS.len(),
        "Demo account seeded"
    );
    Ok(true)
}
