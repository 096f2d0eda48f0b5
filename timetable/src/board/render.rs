//! Pure snapshot-to-view pipeline.

use timetable_proto::{RecordId, Snapshot, Task, Weekday};

/// Shown when the selected day has no tasks.
pub const EMPTY_DAY_PLACEHOLDER: &str = "No tasks for this day. Add one above!";

/// Shown when the live subscription fails.
pub const LOAD_ERROR_MESSAGE: &str = "Error loading tasks. Please refresh.";

/// One rendered task. Edit and delete controls are implied by the row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    /// Record the row's controls act on.
    pub id: RecordId,
    /// Subject line.
    pub subject: String,
    /// Time label.
    pub time: String,
    /// Goal text.
    pub goal: String,
    /// Checkbox state; also drives the completed styling.
    pub completed: bool,
}

impl From<Task> for TaskRow {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            subject: task.subject,
            time: task.time,
            goal: task.goal,
            completed: task.completed,
        }
    }
}

/// What the task list area shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BoardView {
    /// Nothing rendered (signed out, or no snapshot yet).
    #[default]
    Empty,
    /// The selected day has no tasks.
    Placeholder,
    /// Tasks for the selected day, oldest first.
    Rows(Vec<TaskRow>),
    /// The subscription failed.
    LoadError,
}

impl BoardView {
    /// Fixed message for the placeholder and error views.
    #[must_use]
    pub const fn message(&self) -> Option<&'static str> {
        match self {
            Self::Placeholder => Some(EMPTY_DAY_PLACEHOLDER),
            Self::LoadError => Some(LOAD_ERROR_MESSAGE),
            Self::Empty | Self::Rows(_) => None,
        }
    }

    /// Rendered rows, empty for the non-list views.
    #[must_use]
    pub fn rows(&self) -> &[TaskRow] {
        match self {
            Self::Rows(rows) => rows,
            _ => &[],
        }
    }
}

/// Tasks on `day`, by `created_at` ascending with ties in store order.
#[must_use]
pub fn tasks_for_day(snapshot: &Snapshot, day: Weekday) -> Vec<Task> {
    let mut tasks: Vec<Task> = snapshot
        .tasks()
        .into_iter()
        .filter(|t| t.day == day)
        .collect();
    tasks.sort_by_key(|t| t.created_at);
    tasks
}

/// Render the list for `day`.
#[must_use]
pub fn render_day(snapshot: &Snapshot, day: Weekday) -> BoardView {
    let tasks = tasks_for_day(snapshot, day);
    if tasks.is_empty() {
        BoardView::Placeholder
    } else {
        BoardView::Rows(tasks.into_iter().map(TaskRow::from).collect())
    }
}
