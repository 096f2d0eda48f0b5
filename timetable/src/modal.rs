//! Reusable yes/no confirmation dialog.
//!
//! [`ConfirmModal::open`] hands back a [`ConfirmTicket`] that resolves once,
//! to `true` only when the user picks the confirm action. The modal then
//! stays in [`ModalState::Resolving`] until the caller [`settle`]s it, so a
//! second dialog cannot open while confirmed work is still running.
//!
//! [`settle`]: ConfirmModal::settle

use tokio::sync::oneshot;

/// Default confirm button text.
pub const DEFAULT_CONFIRM_LABEL: &str = "Confirm";

/// Default cancel button text.
pub const DEFAULT_CANCEL_LABEL: &str = "Cancel";

/// What the dialog is about. Only affects the icon and accent colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmKind {
    /// Removing a task.
    Delete,
    /// Loading or saving an edit.
    Edit,
    /// Ending the session.
    Logout,
}

impl ConfirmKind {
    /// Glyph shown next to the title.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Delete => "✖",
            Self::Edit => "✎",
            Self::Logout => "⏻",
        }
    }
}

/// Content of one dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmRequest {
    /// Icon and accent.
    pub kind: ConfirmKind,
    /// Heading.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Confirm button text.
    pub confirm_label: String,
    /// Cancel button text.
    pub cancel_label: String,
}

impl ConfirmRequest {
    /// Builds a request with the default button labels.
    #[must_use]
    pub fn new(kind: ConfirmKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            confirm_label: DEFAULT_CONFIRM_LABEL.into(),
            cancel_label: DEFAULT_CANCEL_LABEL.into(),
        }
    }

    /// Override the confirm button text.
    #[must_use]
    pub fn confirm_label(mut self, label: impl Into<String>) -> Self {
        self.confirm_label = label.into();
        self
    }

    /// Override the cancel button text.
    #[must_use]
    pub fn cancel_label(mut self, label: impl Into<String>) -> Self {
        self.cancel_label = label.into();
        self
    }

    /// "Edit Task" prompt shown before loading a task into the form.
    #[must_use]
    pub fn load_edit(subject: &str) -> Self {
        Self::new(
            ConfirmKind::Edit,
            "Edit Task",
            format!("Do you want to edit \"{subject}\"? The current form values will be replaced."),
        )
        .confirm_label("Edit")
    }

    /// "Update Task" prompt shown before saving an edit.
    #[must_use]
    pub fn save_edit(subject: &str) -> Self {
        Self::new(
            ConfirmKind::Edit,
            "Update Task",
            format!("Save changes to \"{subject}\"?"),
        )
        .confirm_label("Save")
    }

    /// "Delete Task" prompt.
    #[must_use]
    pub fn delete(subject: &str) -> Self {
        Self::new(
            ConfirmKind::Delete,
            "Delete Task",
            format!("Are you sure you want to delete \"{subject}\"? This action cannot be undone."),
        )
        .confirm_label("Delete")
    }

    /// "Logout" prompt.
    #[must_use]
    pub fn logout() -> Self {
        Self::new(ConfirmKind::Logout, "Logout", "Are you sure you want to logout?")
            .confirm_label("Yes")
    }
}

/// How the dialog was dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dismissal {
    /// Confirm button.
    Confirm,
    /// Cancel button.
    Cancel,
    /// Click on the backdrop.
    OutsideClick,
    /// Escape key.
    Escape,
}

impl Dismissal {
    /// Whether this dismissal counts as a "yes".
    #[must_use]
    pub const fn confirmed(self) -> bool {
        matches!(self, Self::Confirm)
    }
}

/// Errors from modal lifecycle misuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ModalError {
    /// A dialog is open or its confirmed work has not settled.
    #[error("a confirmation is already open")]
    AlreadyOpen,
    /// Nothing to dismiss.
    #[error("no confirmation is open")]
    NotOpen,
}

/// Lifecycle position, without the ticket sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalState {
    /// Nothing shown.
    Closed,
    /// Waiting for the user.
    Open,
    /// Dismissed; the consumer has not settled yet.
    Resolving,
}

enum Lifecycle {
    Closed,
    Open {
        request: ConfirmRequest,
        tx: oneshot::Sender<bool>,
    },
    Resolving,
}

/// Receiving half of one dialog's outcome.
#[derive(Debug)]
pub struct ConfirmTicket {
    rx: oneshot::Receiver<bool>,
}

impl ConfirmTicket {
    /// Wait for the answer. A modal dropped without an answer reads as `false`.
    pub async fn outcome(self) -> bool {
        self.rx.await.unwrap_or(false)
    }
}

/// The single dialog instance.
pub struct ConfirmModal {
    state: Lifecycle,
}

impl Default for ConfirmModal {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfirmModal {
    /// A closed modal.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: Lifecycle::Closed,
        }
    }

    /// Current lifecycle position.
    #[must_use]
    pub const fn state(&self) -> ModalState {
        match self.state {
            Lifecycle::Closed => ModalState::Closed,
            Lifecycle::Open { .. } => ModalState::Open,
            Lifecycle::Resolving => ModalState::Resolving,
        }
    }

    /// Whether the dialog is on screen.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.state, Lifecycle::Open { .. })
    }

    /// Content of the open dialog.
    #[must_use]
    pub const fn request(&self) -> Option<&ConfirmRequest> {
        match &self.state {
            Lifecycle::Open { request, .. } => Some(request),
            _ => None,
        }
    }

    /// Show `request`.
    ///
    /// # Errors
    ///
    /// [`ModalError::AlreadyOpen`] unless the modal is closed.
    pub fn open(&mut self, request: ConfirmRequest) -> Result<ConfirmTicket, ModalError> {
        if !matches!(self.state, Lifecycle::Closed) {
            return Err(ModalError::AlreadyOpen);
        }
        tracing::debug!(title = %request.title, "confirmation opened");
        let (tx, rx) = oneshot::channel();
        self.state = Lifecycle::Open { request, tx };
        Ok(ConfirmTicket { rx })
    }

    /// Resolve the open dialog and hide it. Returns the resolved value.
    ///
    /// # Errors
    ///
    /// [`ModalError::NotOpen`] if no dialog is showing.
    pub fn dismiss(&mut self, dismissal: Dismissal) -> Result<bool, ModalError> {
        if !self.is_open() {
            return Err(ModalError::NotOpen);
        }
        let Lifecycle::Open { tx, .. } = std::mem::replace(&mut self.state, Lifecycle::Resolving)
        else {
            return Err(ModalError::NotOpen);
        };
        let confirmed = dismissal.confirmed();
        tracing::debug!(?dismissal, confirmed, "confirmation dismissed");
        // The ticket holder may have gone away; the answer is then moot.
        let _ = tx.send(confirmed);
        Ok(confirmed)
    }

    /// Return to `Closed` once confirmed work has finished.
    pub fn settle(&mut self) {
        if matches!(self.state, Lifecycle::Resolving) {
            self.state = Lifecycle::Closed;
        }
    }

    /// Close without an answer. The ticket reads `false`.
    pub fn reset(&mut self) {
        self.state = Lifecycle::Closed;
    }
}
