//! Board-local view state: selected day, edit target and the task form.

use timetable_proto::{RecordId, TaskDraft, Weekday};

use super::render::TaskRow;

/// Submit button text while adding.
pub const ADD_LABEL: &str = "Add to Timetable";

/// Submit button text while editing.
pub const UPDATE_LABEL: &str = "Update Task";

/// Which form field has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    /// Subject line.
    #[default]
    Subject,
    /// Free-text time slot.
    Time,
    /// Goal text.
    Goal,
    /// Slot generator start (`HH:MM`).
    SlotStart,
    /// Slot generator duration in minutes.
    SlotMinutes,
}

impl FormField {
    /// Fields in tab order.
    pub const ALL: [Self; 5] = [
        Self::Subject,
        Self::Time,
        Self::Goal,
        Self::SlotStart,
        Self::SlotMinutes,
    ];

    /// Field label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Subject => "Subject",
            Self::Time => "Time",
            Self::Goal => "Goal",
            Self::SlotStart => "Start",
            Self::SlotMinutes => "Minutes",
        }
    }

    /// Next field in tab order, wrapping.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Subject => Self::Time,
            Self::Time => Self::Goal,
            Self::Goal => Self::SlotStart,
            Self::SlotStart => Self::SlotMinutes,
            Self::SlotMinutes => Self::Subject,
        }
    }
}

/// Raw text of the task form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskForm {
    /// Subject input.
    pub subject: String,
    /// Time input.
    pub time: String,
    /// Goal input.
    pub goal: String,
    /// Slot generator start input.
    pub slot_start: String,
    /// Slot generator duration input.
    pub slot_minutes: String,
}

impl TaskForm {
    /// Trimmed draft built from the three task fields.
    #[must_use]
    pub fn draft(&self) -> TaskDraft {
        TaskDraft::new(&self.subject, &self.time, &self.goal)
    }

    /// Mutable access to one field's text.
    pub const fn field_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Subject => &mut self.subject,
            FormField::Time => &mut self.time,
            FormField::Goal => &mut self.goal,
            FormField::SlotStart => &mut self.slot_start,
            FormField::SlotMinutes => &mut self.slot_minutes,
        }
    }

    /// One field's text.
    #[must_use]
    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::Subject => &self.subject,
            FormField::Time => &self.time,
            FormField::Goal => &self.goal,
            FormField::SlotStart => &self.slot_start,
            FormField::SlotMinutes => &self.slot_minutes,
        }
    }

    /// Empty the task fields and the slot start. The duration is kept.
    pub fn clear(&mut self) {
        self.subject.clear();
        self.time.clear();
        self.goal.clear();
        self.slot_start.clear();
    }

    /// Replace the task fields with a rendered row's values.
    pub fn load(&mut self, row: &TaskRow) {
        self.subject.clone_from(&row.subject);
        self.time.clone_from(&row.time);
        self.goal.clone_from(&row.goal);
    }
}

/// Everything the board shows that is not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    /// Day whose tasks are listed and that new tasks are filed under.
    pub selected_day: Weekday,
    /// Record being edited, if any.
    pub edit_target: Option<RecordId>,
    /// Form contents.
    pub form: TaskForm,
    /// Submit button text.
    pub submit_label: &'static str,
}

impl ViewState {
    /// Fresh state with `day` selected.
    #[must_use]
    pub fn new(day: Weekday) -> Self {
        Self {
            selected_day: day,
            edit_target: None,
            form: TaskForm::default(),
            submit_label: ADD_LABEL,
        }
    }

    /// Whether the form is editing an existing record.
    #[must_use]
    pub const fn is_editing(&self) -> bool {
        self.edit_target.is_some()
    }

    /// Enter edit mode for `row`.
    pub fn begin_edit(&mut self, row: &TaskRow) {
        self.form.load(row);
        self.edit_target = Some(row.id.clone());
        self.submit_label = UPDATE_LABEL;
    }

    /// Leave edit mode and clear the form.
    pub fn end_edit(&mut self) {
        self.edit_target = None;
        self.form.clear();
        self.submit_label = ADD_LABEL;
    }
}
