//! Server-rendered HTML. Pages load htmx and swap the task list fragment in place.

use std::fmt::Write;

use crate::scoring::ScoreSnapshot;
use crate::task::{Priority, Task, TaskStatus};

/// Escapes text for HTML element and attribute content.
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, user: Option<&str>, body: &str) -> String {
    let nav = match user {
        Some(name) => format!(
            r#"<nav><a href="/dashboard">Tasks</a> <a href="/stats">Stats</a>
<span class="user">{}</span> <a href="/ui/logout">Log out</a></nav>"#,
            escape(name)
        ),
        None => r#"<nav><a href="/login">Log in</a> <a href="/register">Register</a></nav>"#.into(),
    };
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} · taskdeck</title>
<script src="https://unpkg.com/htmx.org@2.0.4"></script>
</head>
<body>
{nav}
<main>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
    )
}

fn error_banner(error: Option<&str>) -> String {
    error
        .map(|e| format!(r#"<p class="error" role="alert">{}</p>"#, escape(e)))
        .unwrap_or_default()
}

fn options<V: Copy + PartialEq>(all: &[V], selected: Option<V>, label: impl Fn(V) -> &'static str) -> String {
    all.iter().fold(String::new(), |mut out, &value| {
        let sel = if Some(value) == selected { " selected" } else { "" };
        let _ = write!(out, r#"<option value="{0}"{sel}>{0}</option>"#, label(value));
        out
    })
}

pub(crate) fn index() -> String {
    layout(
        "Welcome",
        None,
        r#"<h1>taskdeck</h1>
<p>Track your tasks and see how you are doing.</p>
<p><a href="/login">Log in</a> or <a href="/register">create an account</a>.</p>"#,
    )
}

pub(crate) fn login(error: Option<&str>) -> String {
    let body = format!(
        r#"<h1>Log in</h1>
{}
<form method="post" action="/ui/login">
<label>Username <input name="username" required></label>
<label>Password <input name="password" type="password" required></label>
<button type="submit">Log in</button>
</form>
<p>No account? <a href="/register">Register</a></p>"#,
        error_banner(error)
    );
    layout("Log in", None, &body)
}

pub(crate) fn register(error: Option<&str>) -> String {
    let body = format!(
        r#"<h1>Register</h1>
{}
<form method="post" action="/ui/register">
<label>Username <input name="username" required></label>
<label>Email <input name="email" type="email" required></label>
<label>Password <input name="password" type="password" required></label>
<button type="submit">Create account</button>
</form>
<p>Already registered? <a href="/login">Log in</a></p>"#,
        error_banner(error)
    );
    layout("Register", None, &body)
}

pub(crate) fn dashboard(display_name: &str, tasks: &[Task], error: Option<&str>) -> String {
    let body = format!(
        r##"<h1>Tasks</h1>
{banner}
<form hx-post="/ui/tasks/create" hx-target="#task-list" hx-swap="outerHTML">
<input name="title" placeholder="Title" required>
<input name="description" placeholder="Description">
<select name="priority">{priorities}</select>
<select name="status">{statuses}</select>
<input name="dueDate" type="date">
<button type="submit">Add</button>
</form>
{list}"##,
        banner = error_banner(error),
        priorities = options(&Priority::ALL, Some(Priority::default()), Priority::as_str),
        statuses = options(&TaskStatus::ALL, Some(TaskStatus::default()), TaskStatus::as_str),
        list = task_list(tasks),
    );
    layout("Tasks", Some(display_name), &body)
}

/// The swappable `#task-list` fragment.
pub(crate) fn task_list(tasks: &[Task]) -> String {
    let mut rows = String::new();
    for task in tasks {
        let id = task.id;
        let due = task
            .due_date
            .map(|d| d.to_string())
            .unwrap_or_default();
        let done_button = if task.status == TaskStatus::Done {
            String::new()
        } else {
            format!(
                r##"<button hx-post="/ui/tasks/{id}/done" hx-target="#task-list" hx-swap="outerHTML">Done</button>"##
            )
        };
        let _ = write!(
            rows,
            r##"<li class="task {status_class}" id="task-{id}">
<form hx-post="/ui/tasks/update" hx-target="#task-list" hx-swap="outerHTML">
<input type="hidden" name="taskId" value="{id}">
<input name="title" value="{title}">
<input name="description" value="{description}">
<select name="status">{statuses}</select>
<select name="priority">{priorities}</select>
<input name="dueDate" type="date" value="{due}">
<button type="submit">Save</button>
</form>
{done_button}
<button hx-delete="/ui/tasks/{id}" hx-target="#task-list" hx-swap="outerHTML" hx-confirm="Delete this task?">Delete</button>
</li>
"##,
            status_class = task.status.as_str().to_ascii_lowercase(),
            title = escape(&task.title),
            description = escape(task.description.as_deref().unwrap_or_default()),
            statuses = options(&TaskStatus::ALL, Some(task.status), TaskStatus::as_str),
            priorities = options(&Priority::ALL, Some(task.priority), Priority::as_str),
        );
    }
    if tasks.is_empty() {
        rows.push_str(r#"<li class="empty">No tasks yet.</li>"#);
    }
    format!("<ul id=\"task-list\">\n{rows}</ul>\n")
}

pub(crate) fn stats(display_name: &str, snapshot: &ScoreSnapshot) -> String {
    let body = format!(
        r#"<h1>Stats</h1>
<section class="score" style="color: {color}">
<p class="grade {grade_class}">{grade}</p>
<p class="points">{score} / 100</p>
<p class="message">{message}</p>
</section>
<table>
<tr><th>Total</th><td>{total}</td></tr>
<tr><th>To do</th><td>{todo}</td></tr>
<tr><th>In progress</th><td>{in_progress}</td></tr>
<tr><th>Done</th><td>{done}</td></tr>
<tr><th>Completion</th><td>{completion}%</td></tr>
<tr><th>Overdue</th><td>{overdue}</td></tr>
<tr><th>Due today</th><td>{due_today}</td></tr>
<tr><th>Due soon</th><td>{due_soon}</td></tr>
<tr><th>On track</th><td>{on_track}</td></tr>
<tr><th>No due date</th><td>{no_due_date}</td></tr>
<tr><th>High priority done</th><td>{high_done} / {high_total}</td></tr>
</table>"#,
        color = snapshot.color,
        grade_class = snapshot.grade_class,
        grade = snapshot.grade,
        score = snapshot.score,
        message = escape(snapshot.message),
        total = snapshot.total,
        todo = snapshot.by_status.todo,
        in_progress = snapshot.by_status.in_progress,
        done = snapshot.by_status.done,
        completion = snapshot.completion_rate,
        overdue = snapshot.urgency.overdue,
        due_today = snapshot.urgency.due_today,
        due_soon = snapshot.urgency.due_soon,
        on_track = snapshot.urgency.on_track,
        no_due_date = snapshot.urgency.no_date,
        high_done = snapshot.by_priority.high.done,
        high_total = snapshot.by_priority.high.total(),
    );
    layout("Stats", Some(display_name), &body)
}
