//! Task board controller.
//!
//! Owns the single live subscription on the signed-in user's collection,
//! the board-local [`ViewState`], the confirmation modal, and every
//! mutation flow. Snapshots go through the pure [`render::render_day`]
//! pipeline; mutations write to the store and leave rendering to the
//! snapshot that follows.
//!
//! Every awaited store call is tagged with the identity it was issued
//! under. If the identity channel reports someone else once the call
//! returns, the result is dropped and the flow reports
//! [`FlowOutcome::Discarded`].

pub mod form;
pub mod render;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;

use timetable_proto::{Identity, RecordId, StorePath, TaskDraft, TaskPatch, Uid, Weekday};

use crate::export::{DocumentRenderer, ExportError, ExportOptions, TimetableDocument};
use crate::modal::{ConfirmModal, ConfirmRequest, ConfirmTicket, Dismissal, ModalError};
use crate::store::{DocumentStore, StoreError, StoreEvent, Subscription};
use crate::timeslot::{SlotError, format_slot};

pub use form::{ADD_LABEL, FormField, TaskForm, UPDATE_LABEL, ViewState};
pub use render::{BoardView, TaskRow};

/// Default collection holding every user's tasks.
pub const DEFAULT_COLLECTION: &str = "timetables";

/// Board tunables.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Top-level collection name.
    pub collection: String,
    /// Day selected on sign-in.
    pub default_day: Weekday,
    /// Settings passed to the renderer on export.
    pub export: ExportOptions,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.into(),
            default_day: Weekday::Monday,
            export: ExportOptions::default(),
        }
    }
}

/// Errors surfaced by board flows. [`BoardError::notice`] gives the text
/// shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// The flow needs a signed-in identity.
    #[error("not signed in")]
    NotSignedIn,
    /// Subject, time or goal was empty after trimming.
    #[error("subject, time and goal are required")]
    EmptyFields,
    /// The id is not among the rendered rows.
    #[error("task {0} is not on the board")]
    TaskNotFound(RecordId),
    /// The confirmation modal is busy or closed.
    #[error(transparent)]
    Modal(#[from] ModalError),
    /// Writing a new or edited task failed.
    #[error("saving task failed: {0}")]
    Save(StoreError),
    /// Toggling completion failed.
    #[error("updating task failed: {0}")]
    Update(StoreError),
    /// Removing a task failed.
    #[error("deleting task failed: {0}")]
    Delete(StoreError),
    /// Re-reading the collection for a day switch failed.
    #[error("loading tasks failed: {0}")]
    Load(StoreError),
    /// The live subscription could not be opened.
    #[error("subscribing failed: {0}")]
    Subscribe(StoreError),
    /// No renderer is installed.
    #[error("no document renderer available")]
    RendererMissing,
    /// Reading the collection for export failed.
    #[error("reading tasks for export failed: {0}")]
    ExportRead(StoreError),
    /// The renderer failed.
    #[error(transparent)]
    Export(#[from] ExportError),
    /// The slot generator inputs are incomplete.
    #[error(transparent)]
    Slot(#[from] SlotError),
}

impl BoardError {
    /// Text shown to the user.
    #[must_use]
    pub fn notice(&self) -> &'static str {
        match self {
            Self::NotSignedIn => "Please login first",
            Self::EmptyFields => "Fill all fields",
            Self::TaskNotFound(_) => "That task is no longer on the board.",
            Self::Modal(_) => "Finish the open confirmation first.",
            Self::Save(_) => "Failed to save task. Please try again.",
            Self::Update(_) => "Failed to update task.",
            Self::Delete(_) => "Failed to delete task.",
            Self::Load(_) | Self::Subscribe(_) => render::LOAD_ERROR_MESSAGE,
            Self::RendererMissing => "PDF library not loaded. Please refresh and try again.",
            Self::ExportRead(_) | Self::Export(_) => "Failed to generate PDF. Please try again.",
            Self::Slot(e) => e.notice(),
        }
    }
}

/// How a board flow ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// A new task was written.
    Added(RecordId),
    /// A confirmation is showing; answer it with [`TaskBoard::dismiss_modal`].
    AwaitingConfirmation,
    /// The user declined the confirmation.
    Cancelled,
    /// The form now holds the task and the board is in edit mode.
    EditLoaded(RecordId),
    /// An edit was saved.
    Updated(RecordId),
    /// Edit mode was left without saving.
    EditCancelled,
    /// Completion was set.
    Toggled {
        /// The task.
        id: RecordId,
        /// New state.
        completed: bool,
    },
    /// A task was removed (or was already gone).
    Deleted(RecordId),
    /// The user confirmed logout; the caller signs out.
    SignOutRequested,
    /// The document was written.
    Exported(PathBuf),
    /// The form's time field was filled from the slot generator.
    SlotGenerated(String),
    /// The list was re-rendered for the selected day.
    Rendered,
    /// The identity changed while the flow was in flight; nothing applied.
    Discarded,
    /// Nothing to do.
    Ignored,
}

/// A store event stamped with the subscription it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedEvent {
    /// Tag of the subscription that produced the event.
    pub tag: u64,
    /// The event.
    pub event: StoreEvent,
}

enum ConfirmedAction {
    LoadEdit(TaskRow),
    SaveEdit { id: RecordId, draft: TaskDraft },
    Delete(RecordId),
    Logout,
}

struct PendingConfirmation {
    ticket: ConfirmTicket,
    action: ConfirmedAction,
    issued_by: Option<Uid>,
}

struct ActiveSubscription {
    tag: u64,
    uid: Uid,
    subscription: Subscription,
}

/// The signed-in board.
pub struct TaskBoard<S: DocumentStore, R: DocumentRenderer> {
    store: Arc<S>,
    renderer: Option<R>,
    identity: watch::Receiver<Option<Identity>>,
    config: BoardConfig,
    state: ViewState,
    modal: ConfirmModal,
    pending: Option<PendingConfirmation>,
    active: Option<ActiveSubscription>,
    next_tag: u64,
    view: BoardView,
}

impl<S: DocumentStore, R: DocumentRenderer> TaskBoard<S, R> {
    /// Creates a board with no subscription. Call
    /// [`on_identity_change`](Self::on_identity_change) to start it.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        renderer: Option<R>,
        identity: watch::Receiver<Option<Identity>>,
        config: BoardConfig,
    ) -> Self {
        let state = ViewState::new(config.default_day);
        Self {
            store,
            renderer,
            identity,
            config,
            state,
            modal: ConfirmModal::new(),
            pending: None,
            active: None,
            next_tag: 0,
            view: BoardView::Empty,
        }
    }

    /// Rendered task list.
    #[must_use]
    pub const fn view(&self) -> &BoardView {
        &self.view
    }

    /// View state.
    #[must_use]
    pub const fn state(&self) -> &ViewState {
        &self.state
    }

    /// The confirmation modal.
    #[must_use]
    pub const fn modal(&self) -> &ConfirmModal {
        &self.modal
    }

    /// Form contents, for text input.
    pub const fn form_mut(&mut self) -> &mut TaskForm {
        &mut self.state.form
    }

    /// Tag of the live subscription.
    #[must_use]
    pub fn subscription_tag(&self) -> Option<u64> {
        self.active.as_ref().map(|a| a.tag)
    }

    /// Whether a live subscription is open.
    #[must_use]
    pub const fn is_subscribed(&self) -> bool {
        self.active.is_some()
    }

    /// Whether export has a renderer to hand off to.
    #[must_use]
    pub const fn can_export(&self) -> bool {
        self.renderer.is_some()
    }

    fn current_identity(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }

    /// True while `issued` is still the signed-in uid.
    fn still_current(&self, issued: &Uid) -> bool {
        self.identity
            .borrow()
            .as_ref()
            .is_some_and(|i| &i.uid == issued)
    }

    fn collection_path(&self, uid: &Uid) -> Result<StorePath, StoreError> {
        Ok(StorePath::collection(&self.config.collection, uid)?)
    }

    fn record_path(&self, uid: &Uid, id: &RecordId) -> Result<StorePath, StoreError> {
        Ok(StorePath::record(&self.config.collection, uid, id)?)
    }

    fn require_identity(&self) -> Result<Identity, BoardError> {
        self.current_identity().ok_or(BoardError::NotSignedIn)
    }

    fn find_row(&self, id: &RecordId) -> Result<TaskRow, BoardError> {
        self.view
            .rows()
            .iter()
            .find(|r| &r.id == id)
            .cloned()
            .ok_or_else(|| BoardError::TaskNotFound(id.clone()))
    }

    /// React to an identity notification.
    ///
    /// Established: close any previous subscription and open one on the
    /// user's collection (nothing happens if that user is already
    /// subscribed). Cleared, or switched to another user: close the
    /// subscription, clear the list, reset the view state and drop any
    /// pending confirmation.
    ///
    /// # Errors
    ///
    /// [`BoardError::Subscribe`] if the store refuses the subscription; the
    /// error view is shown.
    pub fn on_identity_change(&mut self, identity: Option<&Identity>) -> Result<(), BoardError> {
        let Some(identity) = identity else {
            self.teardown();
            return Ok(());
        };
        if self.active.as_ref().is_some_and(|a| a.uid == identity.uid) {
            return Ok(());
        }
        if let Some(old) = self.active.take() {
            tracing::info!(tag = old.tag, "switching user, closing subscription");
            old.subscription.close();
        }
        self.reset_view();
        let path = self
            .collection_path(&identity.uid)
            .map_err(BoardError::Subscribe)?;
        match self.store.subscribe(&path) {
            Ok(subscription) => {
                self.next_tag += 1;
                tracing::info!(uid = %identity.uid, tag = self.next_tag, "subscription opened");
                self.active = Some(ActiveSubscription {
                    tag: self.next_tag,
                    uid: identity.uid.clone(),
                    subscription,
                });
                Ok(())
            }
            Err(e) => {
                tracing::error!(uid = %identity.uid, error = %e, "subscribe failed");
                self.view = BoardView::LoadError;
                Err(BoardError::Subscribe(e))
            }
        }
    }

    fn teardown(&mut self) {
        if let Some(old) = self.active.take() {
            tracing::info!(tag = old.tag, "identity cleared, closing subscription");
            old.subscription.close();
        }
        self.reset_view();
    }

    fn reset_view(&mut self) {
        if self.pending.take().is_some() {
            tracing::debug!("dropping pending confirmation");
        }
        self.view = BoardView::Empty;
        self.state = ViewState::new(self.config.default_day);
        self.modal.reset();
    }

    /// Close the live subscription without touching the view.
    pub fn close_subscription(&mut self) {
        if let Some(old) = self.active.take() {
            tracing::debug!(tag = old.tag, "subscription closed");
            old.subscription.close();
        }
    }

    /// Take the next queued event from the live subscription, if any.
    pub fn poll_event(&mut self) -> Option<TaggedEvent> {
        let active = self.active.as_mut()?;
        let event = active.subscription.try_next()?;
        Some(TaggedEvent {
            tag: active.tag,
            event,
        })
    }

    /// Wait for the next event from the live subscription. `None` if there
    /// is no subscription or the store side has gone away.
    pub async fn next_event(&mut self) -> Option<TaggedEvent> {
        let active = self.active.as_mut()?;
        let event = active.subscription.next().await?;
        Some(TaggedEvent {
            tag: active.tag,
            event,
        })
    }

    /// Apply one event. Events from a closed subscription are ignored.
    /// Returns whether the view changed.
    pub fn apply_event(&mut self, tagged: TaggedEvent) -> bool {
        if self.subscription_tag() != Some(tagged.tag) {
            tracing::debug!(tag = tagged.tag, "dropping event from stale subscription");
            return false;
        }
        match tagged.event {
            StoreEvent::Snapshot(snapshot) => {
                self.view = render::render_day(&snapshot, self.state.selected_day);
            }
            StoreEvent::Error(e) => {
                tracing::error!(tag = tagged.tag, error = %e, "realtime listener failed");
                self.view = BoardView::LoadError;
            }
        }
        true
    }

    /// Apply every queued event. Returns how many changed the view.
    pub fn drain_events(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.poll_event() {
            if self.apply_event(event) {
                applied += 1;
            }
        }
        applied
    }

    /// Switch day and re-render from a one-shot read.
    ///
    /// # Errors
    ///
    /// [`BoardError::Load`] if the read fails; the error view is shown.
    pub async fn select_day(&mut self, day: Weekday) -> Result<FlowOutcome, BoardError> {
        self.state.selected_day = day;
        let Some(identity) = self.current_identity() else {
            return Ok(FlowOutcome::Ignored);
        };
        let path = self.collection_path(&identity.uid).map_err(BoardError::Load)?;
        let result = self.store.read_once(&path).await;
        if !self.still_current(&identity.uid) {
            return Ok(FlowOutcome::Discarded);
        }
        match result {
            Ok(snapshot) => {
                self.view = render::render_day(&snapshot, self.state.selected_day);
                Ok(FlowOutcome::Rendered)
            }
            Err(e) => {
                tracing::error!(%day, error = %e, "reading tasks failed");
                self.view = BoardView::LoadError;
                Err(BoardError::Load(e))
            }
        }
    }

    /// Add the form as a new task, or ask to save the edit in progress.
    ///
    /// # Errors
    ///
    /// [`BoardError::NotSignedIn`], [`BoardError::EmptyFields`],
    /// [`BoardError::Modal`] or [`BoardError::Save`].
    pub async fn submit(&mut self) -> Result<FlowOutcome, BoardError> {
        let identity = self.require_identity()?;
        let draft = self.state.form.draft();
        if draft.has_empty_field() {
            return Err(BoardError::EmptyFields);
        }

        if let Some(id) = self.state.edit_target.clone() {
            let request = ConfirmRequest::save_edit(&draft.subject);
            return self.ask(request, ConfirmedAction::SaveEdit { id, draft });
        }

        let path = self
            .collection_path(&identity.uid)
            .map_err(BoardError::Save)?;
        let record = draft.into_new_record(self.state.selected_day, now_ms());
        let result = self.store.create(&path, record).await;
        if !self.still_current(&identity.uid) {
            return Ok(FlowOutcome::Discarded);
        }
        match result {
            Ok(id) => {
                tracing::info!(%id, day = %self.state.selected_day, "task added");
                self.state.form.clear();
                Ok(FlowOutcome::Added(id))
            }
            Err(e) => {
                tracing::error!(error = %e, "adding task failed");
                Err(BoardError::Save(e))
            }
        }
    }

    /// Ask before loading a task into the form.
    ///
    /// # Errors
    ///
    /// [`BoardError::NotSignedIn`], [`BoardError::TaskNotFound`] or
    /// [`BoardError::Modal`].
    pub fn request_edit(&mut self, id: &RecordId) -> Result<FlowOutcome, BoardError> {
        self.require_identity()?;
        let row = self.find_row(id)?;
        let request = ConfirmRequest::load_edit(&row.subject);
        self.ask(request, ConfirmedAction::LoadEdit(row))
    }

    /// Ask before deleting a task.
    ///
    /// # Errors
    ///
    /// [`BoardError::NotSignedIn`], [`BoardError::TaskNotFound`] or
    /// [`BoardError::Modal`].
    pub fn request_delete(&mut self, id: &RecordId) -> Result<FlowOutcome, BoardError> {
        self.require_identity()?;
        let row = self.find_row(id)?;
        let request = ConfirmRequest::delete(&row.subject);
        self.ask(request, ConfirmedAction::Delete(row.id))
    }

    /// Ask before logging out.
    ///
    /// # Errors
    ///
    /// [`BoardError::Modal`] if another confirmation is showing.
    pub fn request_logout(&mut self) -> Result<FlowOutcome, BoardError> {
        self.ask(ConfirmRequest::logout(), ConfirmedAction::Logout)
    }

    fn ask(
        &mut self,
        request: ConfirmRequest,
        action: ConfirmedAction,
    ) -> Result<FlowOutcome, BoardError> {
        let ticket = self.modal.open(request)?;
        let issued_by = self.current_identity().map(|i| i.uid);
        self.pending = Some(PendingConfirmation {
            ticket,
            action,
            issued_by,
        });
        Ok(FlowOutcome::AwaitingConfirmation)
    }

    /// Answer the open confirmation and run the confirmed work.
    ///
    /// # Errors
    ///
    /// [`BoardError::Modal`] if nothing is showing, or the error of the
    /// confirmed write. A confirmation answered after the user who opened
    /// it signed out or switched ends in [`FlowOutcome::Discarded`].
    pub async fn dismiss_modal(&mut self, dismissal: Dismissal) -> Result<FlowOutcome, BoardError> {
        self.modal.dismiss(dismissal)?;
        let Some(pending) = self.pending.take() else {
            self.modal.settle();
            return Ok(FlowOutcome::Cancelled);
        };
        if !pending.ticket.outcome().await {
            self.modal.settle();
            return Ok(FlowOutcome::Cancelled);
        }
        if let Some(uid) = pending.issued_by.as_ref().filter(|u| !self.still_current(u)) {
            tracing::warn!(%uid, "confirmation answered under another identity, dropping");
            self.modal.settle();
            return Ok(FlowOutcome::Discarded);
        }
        let result = self.run_confirmed(pending.action, pending.issued_by).await;
        self.modal.settle();
        result
    }

    async fn run_confirmed(
        &mut self,
        action: ConfirmedAction,
        issued_by: Option<Uid>,
    ) -> Result<FlowOutcome, BoardError> {
        match action {
            ConfirmedAction::LoadEdit(row) => {
                self.state.begin_edit(&row);
                Ok(FlowOutcome::EditLoaded(row.id))
            }
            ConfirmedAction::SaveEdit { id, draft } => {
                let uid = issued_by.ok_or(BoardError::NotSignedIn)?;
                let path = self.record_path(&uid, &id).map_err(BoardError::Save)?;
                let patch = TaskPatch::edit(draft, self.state.selected_day, now_ms());
                let result = self.store.update(&path, patch.to_fields()).await;
                if !self.still_current(&uid) {
                    return Ok(FlowOutcome::Discarded);
                }
                match result {
                    Ok(()) => {
                        tracing::info!(%id, "task updated");
                        self.state.end_edit();
                        Ok(FlowOutcome::Updated(id))
                    }
                    Err(e) => {
                        tracing::error!(%id, error = %e, "updating task failed");
                        Err(BoardError::Save(e))
                    }
                }
            }
            ConfirmedAction::Delete(id) => {
                let uid = issued_by.ok_or(BoardError::NotSignedIn)?;
                let path = self.record_path(&uid, &id).map_err(BoardError::Delete)?;
                let result = self.store.delete(&path).await;
                if !self.still_current(&uid) {
                    return Ok(FlowOutcome::Discarded);
                }
                match result {
                    Ok(()) => {
                        tracing::info!(%id, "task deleted");
                        Ok(FlowOutcome::Deleted(id))
                    }
                    Err(e) => {
                        tracing::error!(%id, error = %e, "deleting task failed");
                        Err(BoardError::Delete(e))
                    }
                }
            }
            ConfirmedAction::Logout => {
                self.close_subscription();
                Ok(FlowOutcome::SignOutRequested)
            }
        }
    }

    /// Escape: answers an open confirmation, otherwise leaves edit mode.
    ///
    /// # Errors
    ///
    /// Propagates [`dismiss_modal`](Self::dismiss_modal) errors.
    pub async fn handle_escape(&mut self) -> Result<FlowOutcome, BoardError> {
        if self.modal.is_open() {
            return self.dismiss_modal(Dismissal::Escape).await;
        }
        if self.state.is_editing() {
            self.state.end_edit();
            return Ok(FlowOutcome::EditCancelled);
        }
        Ok(FlowOutcome::Ignored)
    }

    /// Flip a rendered task's completion.
    ///
    /// # Errors
    ///
    /// [`BoardError::TaskNotFound`] or those of
    /// [`set_completed`](Self::set_completed).
    pub async fn toggle_completed(&mut self, id: &RecordId) -> Result<FlowOutcome, BoardError> {
        let row = self.find_row(id)?;
        self.set_completed(id, !row.completed).await
    }

    /// Write a task's completion flag.
    ///
    /// # Errors
    ///
    /// [`BoardError::NotSignedIn`] or [`BoardError::Update`].
    pub async fn set_completed(
        &mut self,
        id: &RecordId,
        completed: bool,
    ) -> Result<FlowOutcome, BoardError> {
        let identity = self.require_identity()?;
        let path = self
            .record_path(&identity.uid, id)
            .map_err(BoardError::Update)?;
        let result = self
            .store
            .update(&path, TaskPatch::completed(completed).to_fields())
            .await;
        if !self.still_current(&identity.uid) {
            return Ok(FlowOutcome::Discarded);
        }
        match result {
            Ok(()) => {
                tracing::debug!(%id, completed, "completion set");
                Ok(FlowOutcome::Toggled {
                    id: id.clone(),
                    completed,
                })
            }
            Err(e) => {
                tracing::error!(%id, error = %e, "updating task failed");
                Err(BoardError::Update(e))
            }
        }
    }

    /// Render the whole week and hand it to the renderer.
    ///
    /// # Errors
    ///
    /// [`BoardError::NotSignedIn`], [`BoardError::RendererMissing`],
    /// [`BoardError::ExportRead`] or [`BoardError::Export`].
    pub async fn export(&mut self) -> Result<FlowOutcome, BoardError> {
        let identity = self.require_identity()?;
        let Some(renderer) = self.renderer.as_ref() else {
            tracing::warn!("export requested without a renderer");
            return Err(BoardError::RendererMissing);
        };
        let path = self
            .collection_path(&identity.uid)
            .map_err(BoardError::ExportRead)?;
        let snapshot = match self.store.read_once(&path).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "reading tasks for export failed");
                return Err(BoardError::ExportRead(e));
            }
        };
        if !self.still_current(&identity.uid) {
            return Ok(FlowOutcome::Discarded);
        }
        let document = TimetableDocument::from_snapshot(&snapshot);
        match renderer.render(&document, &self.config.export).await {
            Ok(file) => Ok(FlowOutcome::Exported(file)),
            Err(e) => {
                tracing::error!(error = %e, "generating document failed");
                Err(BoardError::Export(e))
            }
        }
    }

    /// Fill the time field from the slot generator inputs.
    ///
    /// # Errors
    ///
    /// [`BoardError::Slot`] if the start or duration is missing or invalid.
    pub fn generate_slot(&mut self) -> Result<FlowOutcome, BoardError> {
        let form = &mut self.state.form;
        let slot = format_slot(&form.slot_start, &form.slot_minutes)?;
        form.time.clone_from(&slot);
        Ok(FlowOutcome::SlotGenerated(slot))
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
