//! Application state and event handling.
//!
//! [`App`] owns the session and the board. Key presses are mapped to an
//! [`Action`] synchronously; the event loop then awaits
//! [`App::perform`], which runs the matching session or board flow and
//! turns its result into a status bar notice.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::watch;

use timetable_proto::{Identity, RecordId, Weekday};

use crate::auth::AuthProvider;
use crate::board::{FlowOutcome, FormField, TaskBoard};
use crate::export::DocumentRenderer;
use crate::modal::Dismissal;
use crate::session::{SessionManager, View};
use crate::store::DocumentStore;

/// Which field of the login/signup form has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthField {
    /// Email input.
    #[default]
    Email,
    /// Password input.
    Password,
}

/// Text of the login/signup form.
#[derive(Debug, Clone, Default)]
pub struct AuthForm {
    /// Email input.
    pub email: String,
    /// Password input.
    pub password: String,
    /// Focused field.
    pub focus: AuthField,
}

impl AuthForm {
    const fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            AuthField::Email => &mut self.email,
            AuthField::Password => &mut self.password,
        }
    }

    const fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            AuthField::Email => AuthField::Password,
            AuthField::Password => AuthField::Email,
        };
    }
}

/// Which board area has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardFocus {
    /// Day tabs.
    Days,
    /// One form field.
    Form(FormField),
    /// Task list.
    List,
}

impl BoardFocus {
    const fn next(self) -> Self {
        match self {
            Self::Days => Self::Form(FormField::Subject),
            Self::Form(FormField::SlotMinutes) => Self::List,
            Self::Form(field) => Self::Form(field.next()),
            Self::List => Self::Days,
        }
    }
}

/// Status bar message.
#[derive(Debug, Clone)]
pub struct Notice {
    /// Text.
    pub text: String,
    /// Styled as an error.
    pub is_error: bool,
    shown_at: Instant,
}

/// Work requested by a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Submit the login form.
    SignIn,
    /// Submit the signup form.
    SignUp,
    /// Follow the "create an account" link.
    ShowSignup,
    /// Follow the "sign in instead" link.
    ShowLogin,
    /// Switch the board to a day.
    SelectDay(Weekday),
    /// Add the form as a task, or save the edit.
    Submit,
    /// Fill the time field from start and duration.
    GenerateSlot,
    /// Ask to edit a task.
    RequestEdit(RecordId),
    /// Ask to delete a task.
    RequestDelete(RecordId),
    /// Flip a task's checkbox.
    ToggleCompleted(RecordId),
    /// Answer the open confirmation.
    Dismiss(Dismissal),
    /// Escape on the board.
    Escape,
    /// Export the week.
    Export,
    /// Ask to log out.
    RequestLogout,
}

/// Main application state.
pub struct App<A: AuthProvider, S: DocumentStore, R: DocumentRenderer> {
    session: SessionManager<A>,
    board: TaskBoard<S, R>,
    identity: watch::Receiver<Option<Identity>>,
    identity_seen: bool,
    /// Login/signup inputs.
    pub auth_form: AuthForm,
    /// Focused board area.
    pub board_focus: BoardFocus,
    /// Highlighted row in the task list.
    pub selected_row: usize,
    notice: Option<Notice>,
    notice_timeout: Duration,
    /// Whether the app should quit.
    pub should_quit: bool,
}

impl<A: AuthProvider, S: DocumentStore, R: DocumentRenderer> App<A, S, R> {
    /// Wire a session and board together. The identity receiver must come
    /// from the same auth provider the session uses.
    #[must_use]
    pub fn new(
        session: SessionManager<A>,
        board: TaskBoard<S, R>,
        identity: watch::Receiver<Option<Identity>>,
        notice_timeout: Duration,
    ) -> Self {
        Self {
            session,
            board,
            identity,
            identity_seen: false,
            auth_form: AuthForm {
                email: String::new(),
                password: String::new(),
                focus: AuthField::Email,
            },
            board_focus: BoardFocus::Form(FormField::Subject),
            selected_row: 0,
            notice: None,
            notice_timeout,
            should_quit: false,
        }
    }

    /// The session manager.
    #[must_use]
    pub const fn session(&self) -> &SessionManager<A> {
        &self.session
    }

    /// The task board.
    #[must_use]
    pub const fn board(&self) -> &TaskBoard<S, R> {
        &self.board
    }

    /// Mutable task board, for tests and direct form input.
    pub const fn board_mut(&mut self) -> &mut TaskBoard<S, R> {
        &mut self.board
    }

    /// Current status bar message, if any.
    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    fn info(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            is_error: false,
            shown_at: Instant::now(),
        });
    }

    fn error(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            is_error: true,
            shown_at: Instant::now(),
        });
    }

    /// Expire an old notice.
    pub fn tick(&mut self) {
        if self
            .notice
            .as_ref()
            .is_some_and(|n| n.shown_at.elapsed() >= self.notice_timeout)
        {
            self.notice = None;
        }
    }

    /// Feed a pending identity notification to the session and board.
    /// The first call always delivers the current identity. Returns whether
    /// anything was delivered.
    pub fn sync_identity(&mut self) -> bool {
        let changed = self.identity.has_changed().unwrap_or(false);
        if self.identity_seen && !changed {
            return false;
        }
        self.identity_seen = true;
        let identity = self.identity.borrow_and_update().clone();
        let transition = self.session.handle_identity_change(identity.clone());
        tracing::debug!(?transition, "identity notification");
        if let Err(e) = self.board.on_identity_change(identity.as_ref()) {
            self.error(e.notice());
        }
        if identity.is_none() {
            self.auth_form.password.clear();
        }
        self.selected_row = 0;
        true
    }

    /// Apply queued store events to the board.
    pub fn drain_events(&mut self) -> usize {
        let applied = self.board.drain_events();
        let rows = self.board.view().rows().len();
        if self.selected_row >= rows {
            self.selected_row = rows.saturating_sub(1);
        }
        applied
    }

    /// Whether the board is what the user sees.
    #[must_use]
    pub const fn board_visible(&self) -> bool {
        matches!(self.session.view(), View::Board) && !self.session.loading_visible()
    }

    fn selected_id(&self) -> Option<RecordId> {
        self.board
            .view()
            .rows()
            .get(self.selected_row)
            .map(|r| r.id.clone())
    }

    /// Map a key press to an action. Text input is applied directly.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<Action> {
        if let (KeyCode::Char('c' | 'q'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
            self.should_quit = true;
            return None;
        }
        if self.session.loading_visible() {
            return None;
        }
        match self.session.view() {
            View::Login | View::Signup => self.handle_auth_key(key),
            View::Board => self.handle_board_key(key),
        }
    }

    fn handle_auth_key(&mut self, key: KeyEvent) -> Option<Action> {
        let on_login = self.session.view() == View::Login;
        match (key.code, key.modifiers) {
            (KeyCode::Char('n'), KeyModifiers::CONTROL) => {
                Some(if on_login { Action::ShowSignup } else { Action::ShowLogin })
            }
            (KeyCode::Enter, _) => {
                if self.session.submit_control().disabled {
                    return None;
                }
                Some(if on_login { Action::SignIn } else { Action::SignUp })
            }
            (KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down, _) => {
                self.auth_form.toggle_focus();
                None
            }
            (KeyCode::Backspace, _) => {
                self.auth_form.focused_mut().pop();
                None
            }
            (KeyCode::Esc, _) => {
                self.should_quit = true;
                None
            }
            (KeyCode::Char(c), m) if !m.contains(KeyModifiers::CONTROL) => {
                self.auth_form.focused_mut().push(c);
                None
            }
            _ => None,
        }
    }

    fn handle_board_key(&mut self, key: KeyEvent) -> Option<Action> {
        if self.board.modal().is_open() {
            return match key.code {
                KeyCode::Enter | KeyCode::Char('y') => Some(Action::Dismiss(Dismissal::Confirm)),
                KeyCode::Char('n') => Some(Action::Dismiss(Dismissal::Cancel)),
                KeyCode::Esc => Some(Action::Escape),
                _ => None,
            };
        }
        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) => return Some(Action::Escape),
            (KeyCode::Char('p'), KeyModifiers::CONTROL) => return Some(Action::Export),
            (KeyCode::Char('l'), KeyModifiers::CONTROL) => return Some(Action::RequestLogout),
            (KeyCode::Char('g'), KeyModifiers::CONTROL) => return Some(Action::GenerateSlot),
            (KeyCode::Tab, _) => {
                self.board_focus = self.board_focus.next();
                return None;
            }
            _ => {}
        }
        match self.board_focus {
            BoardFocus::Days => self.handle_days_key(key),
            BoardFocus::Form(field) => self.handle_form_key(field, key),
            BoardFocus::List => self.handle_list_key(key),
        }
    }

    fn handle_days_key(&self, key: KeyEvent) -> Option<Action> {
        let day = self.board.state().selected_day;
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => Some(Action::SelectDay(day.prev())),
            KeyCode::Right | KeyCode::Char('l') => Some(Action::SelectDay(day.next())),
            KeyCode::Char(c @ '1'..='7') => {
                let idx = usize::from(c as u8 - b'1');
                Weekday::ALL.get(idx).copied().map(Action::SelectDay)
            }
            _ => None,
        }
    }

    fn handle_form_key(&mut self, field: FormField, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Enter => Some(Action::Submit),
            KeyCode::Backspace => {
                self.board.form_mut().field_mut(field).pop();
                None
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.board.form_mut().field_mut(field).push(c);
                None
            }
            _ => None,
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> Option<Action> {
        let rows = self.board.view().rows().len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_row = self.selected_row.saturating_sub(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected_row + 1 < rows {
                    self.selected_row += 1;
                }
                None
            }
            KeyCode::Char(' ') => self.selected_id().map(Action::ToggleCompleted),
            KeyCode::Char('e') => self.selected_id().map(Action::RequestEdit),
            KeyCode::Char('d') | KeyCode::Delete => self.selected_id().map(Action::RequestDelete),
            _ => None,
        }
    }

    /// Run `action` against the session or board.
    pub async fn perform(&mut self, action: Action) {
        match action {
            Action::SignIn => {
                let (email, password) = (self.auth_form.email.clone(), self.auth_form.password.clone());
                if let Err(e) = self.session.sign_in(&email, &password).await {
                    self.error(e.user_message());
                }
            }
            Action::SignUp => {
                let (email, password) = (self.auth_form.email.clone(), self.auth_form.password.clone());
                if let Err(e) = self.session.sign_up(&email, &password).await {
                    self.error(e.user_message());
                }
            }
            Action::ShowSignup => self.session.show_signup(),
            Action::ShowLogin => self.session.show_login(),
            Action::SelectDay(day) => {
                self.selected_row = 0;
                let result = self.board.select_day(day).await;
                self.report(result).await;
            }
            Action::Submit => {
                let result = self.board.submit().await;
                self.report(result).await;
            }
            Action::GenerateSlot => {
                let result = self.board.generate_slot();
                self.report(result).await;
            }
            Action::RequestEdit(id) => {
                let result = self.board.request_edit(&id);
                self.report(result).await;
            }
            Action::RequestDelete(id) => {
                let result = self.board.request_delete(&id);
                self.report(result).await;
            }
            Action::ToggleCompleted(id) => {
                let result = self.board.toggle_completed(&id).await;
                self.report(result).await;
            }
            Action::Dismiss(dismissal) => {
                let result = self.board.dismiss_modal(dismissal).await;
                self.report(result).await;
            }
            Action::Escape => {
                let result = self.board.handle_escape().await;
                self.report(result).await;
            }
            Action::Export => {
                let result = self.board.export().await;
                self.report(result).await;
            }
            Action::RequestLogout => {
                let result = self.board.request_logout();
                self.report(result).await;
            }
        }
    }

    async fn report(&mut self, result: Result<FlowOutcome, crate::board::BoardError>) {
        match result {
            Ok(FlowOutcome::Added(_)) => self.info("Task added"),
            Ok(FlowOutcome::Updated(_)) => self.info("Task updated"),
            Ok(FlowOutcome::Deleted(_)) => self.info("Task deleted"),
            Ok(FlowOutcome::EditLoaded(_)) => {
                self.board_focus = BoardFocus::Form(FormField::Subject);
            }
            Ok(FlowOutcome::Exported(path)) => {
                self.info(format!("Saved {}", path.display()));
            }
            Ok(FlowOutcome::SignOutRequested) => {
                self.session.sign_out().await;
            }
            Ok(_) => {}
            Err(e) => self.error(e.notice()),
        }
    }
}
