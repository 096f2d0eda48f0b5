//! Integration tests for add, edit, toggle, delete and the confirmation
//! modal that gates them.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use timetable::board::{
    ADD_LABEL, BoardConfig, BoardError, FlowOutcome, TaskBoard, UPDATE_LABEL,
};
use timetable::export::command::CommandRenderer;
use timetable::modal::{ConfirmKind, ConfirmModal, ConfirmRequest, Dismissal, ModalError, ModalState};
use timetable::store::DocumentStore;
use timetable::store::memory::MemoryStore;
use timetable_proto::{Identity, RecordId, StorePath, Task, Weekday};
use tokio::sync::watch;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type Board = TaskBoard<MemoryStore, CommandRenderer>;

fn alice() -> Identity {
    Identity::new("alice", "alice@example.com")
}

fn collection() -> StorePath {
    StorePath::parse("timetables/alice").unwrap()
}

fn record(id: &RecordId) -> StorePath {
    collection().child(id.as_str()).unwrap()
}

fn signed_in() -> (Arc<MemoryStore>, watch::Sender<Option<Identity>>, Board) {
    let store = Arc::new(MemoryStore::new());
    let (tx, rx) = watch::channel(Some(alice()));
    let mut board = TaskBoard::new(Arc::clone(&store), None, rx, BoardConfig::default());
    board.on_identity_change(Some(&alice())).unwrap();
    board.drain_events();
    (store, tx, board)
}

fn fill(board: &mut Board, subject: &str, time: &str, goal: &str) {
    let form = board.form_mut();
    form.subject = subject.into();
    form.time = time.into();
    form.goal = goal.into();
}

async fn add(board: &mut Board, subject: &str) -> RecordId {
    fill(board, subject, "10:00 - 11:00", "Algebra");
    let FlowOutcome::Added(id) = board.submit().await.unwrap() else {
        panic!("expected Added");
    };
    board.drain_events();
    id
}

fn stored(store: &MemoryStore, id: &RecordId) -> Task {
    let value = store.peek(&record(id)).expect("record present");
    Task::decode(id.clone(), &value).unwrap()
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// ---------------------------------------------------------------------------
// Add
// ---------------------------------------------------------------------------

#[tokio::test]
async fn added_task_reads_back_with_defaults() {
    let (store, _tx, mut board) = signed_in();
    board.select_day(Weekday::Wednesday).await.unwrap();
    let before = now_ms();

    fill(&mut board, "  Physics ", "14:00 - 15:30", "Optics");
    let FlowOutcome::Added(id) = board.submit().await.unwrap() else {
        panic!("expected Added");
    };

    let snapshot = store.read_once(&collection()).await.unwrap();
    let tasks = snapshot.tasks();
    assert_eq!(tasks.len(), 1);
    let task = &tasks[0];
    assert_eq!(task.id, id);
    assert_eq!(task.subject, "Physics");
    assert_eq!(task.time, "14:00 - 15:30");
    assert_eq!(task.goal, "Optics");
    assert_eq!(task.day, Weekday::Wednesday);
    assert!(!task.completed);
    assert!(task.created_at >= before);
    assert_eq!(task.updated_at, None);

    board.drain_events();
    assert_eq!(board.view().rows()[0].id, id);
}

#[tokio::test]
async fn add_while_signed_out_is_refused() {
    let store = Arc::new(MemoryStore::new());
    let (_tx, rx) = watch::channel(None);
    let mut board: Board = TaskBoard::new(Arc::clone(&store), None, rx, BoardConfig::default());
    fill(&mut board, "Math", "t", "g");
    let err = board.submit().await.unwrap_err();
    assert!(matches!(err, BoardError::NotSignedIn));
    assert_eq!(err.notice(), "Please login first");
    assert_eq!(store.write_count(), 0);
}

// ---------------------------------------------------------------------------
// Edit
// ---------------------------------------------------------------------------

#[tokio::test]
async fn edit_keeps_id_and_created_at_but_takes_selected_day() {
    let (store, _tx, mut board) = signed_in();
    let id = add(&mut board, "Math").await;
    let original = stored(&store, &id);
    assert_eq!(original.day, Weekday::Monday);

    // Load into the form.
    assert_eq!(
        board.request_edit(&id).unwrap(),
        FlowOutcome::AwaitingConfirmation
    );
    assert_eq!(board.modal().request().unwrap().kind, ConfirmKind::Edit);
    assert_eq!(
        board.dismiss_modal(Dismissal::Confirm).await.unwrap(),
        FlowOutcome::EditLoaded(id.clone())
    );
    assert_eq!(board.state().form.subject, "Math");
    assert_eq!(board.state().submit_label, UPDATE_LABEL);

    // Switching day while editing reassigns the task on save.
    board.select_day(Weekday::Thursday).await.unwrap();
    board.form_mut().goal = "Calculus".into();
    assert_eq!(board.submit().await.unwrap(), FlowOutcome::AwaitingConfirmation);
    assert_eq!(
        board.dismiss_modal(Dismissal::Confirm).await.unwrap(),
        FlowOutcome::Updated(id.clone())
    );

    let edited = stored(&store, &id);
    assert_eq!(edited.id, original.id);
    assert_eq!(edited.created_at, original.created_at);
    assert_eq!(edited.day, Weekday::Thursday);
    assert_eq!(edited.goal, "Calculus");
    assert!(edited.updated_at.is_some());

    assert!(!board.state().is_editing());
    assert_eq!(board.state().submit_label, ADD_LABEL);
    assert!(board.state().form.subject.is_empty());
}

#[tokio::test]
async fn declined_save_stays_in_edit_mode() {
    let (store, _tx, mut board) = signed_in();
    let id = add(&mut board, "Math").await;
    board.request_edit(&id).unwrap();
    board.dismiss_modal(Dismissal::Confirm).await.unwrap();

    board.form_mut().subject = "History".into();
    board.submit().await.unwrap();
    assert_eq!(
        board.dismiss_modal(Dismissal::Cancel).await.unwrap(),
        FlowOutcome::Cancelled
    );

    assert!(board.state().is_editing());
    assert_eq!(board.state().form.subject, "History");
    assert_eq!(stored(&store, &id).subject, "Math");
}

#[tokio::test]
async fn declined_load_leaves_form_alone() {
    let (_store, _tx, mut board) = signed_in();
    let id = add(&mut board, "Math").await;
    board.form_mut().subject = "Draft".into();

    board.request_edit(&id).unwrap();
    assert_eq!(
        board.dismiss_modal(Dismissal::Escape).await.unwrap(),
        FlowOutcome::Cancelled
    );
    assert!(!board.state().is_editing());
    assert_eq!(board.state().form.subject, "Draft");
}

#[tokio::test]
async fn failed_save_reports_and_keeps_edit() {
    let (store, _tx, mut board) = signed_in();
    let id = add(&mut board, "Math").await;
    board.request_edit(&id).unwrap();
    board.dismiss_modal(Dismissal::Confirm).await.unwrap();

    store.fail_next_writes(1);
    board.submit().await.unwrap();
    let err = board.dismiss_modal(Dismissal::Confirm).await.unwrap_err();
    assert_eq!(err.notice(), "Failed to save task. Please try again.");
    assert!(board.state().is_editing());
    assert_eq!(board.modal().state(), ModalState::Closed);
}

// ---------------------------------------------------------------------------
// Toggle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn toggling_twice_restores_the_flag() {
    let (store, _tx, mut board) = signed_in();
    let id = add(&mut board, "Math").await;

    assert_eq!(
        board.toggle_completed(&id).await.unwrap(),
        FlowOutcome::Toggled {
            id: id.clone(),
            completed: true
        }
    );
    board.drain_events();
    assert!(board.view().rows()[0].completed);
    assert!(stored(&store, &id).completed);

    board.toggle_completed(&id).await.unwrap();
    board.drain_events();
    assert!(!board.view().rows()[0].completed);
    assert!(!stored(&store, &id).completed);
}

#[tokio::test]
async fn failed_toggle_reports_update_failure() {
    let (store, _tx, mut board) = signed_in();
    let id = add(&mut board, "Math").await;
    store.fail_next_writes(1);
    let err = board.toggle_completed(&id).await.unwrap_err();
    assert_eq!(err.notice(), "Failed to update task.");
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn outside_click_cancels_delete() {
    let (store, _tx, mut board) = signed_in();
    let id = add(&mut board, "Math").await;

    board.request_delete(&id).unwrap();
    let request = board.modal().request().unwrap();
    assert_eq!(request.kind, ConfirmKind::Delete);
    assert_eq!(request.confirm_label, "Delete");

    assert_eq!(
        board.dismiss_modal(Dismissal::OutsideClick).await.unwrap(),
        FlowOutcome::Cancelled
    );
    assert_eq!(board.modal().state(), ModalState::Closed);
    assert!(store.peek(&record(&id)).is_some());
    board.drain_events();
    assert_eq!(board.view().rows().len(), 1);
}

#[tokio::test]
async fn confirmed_delete_removes_the_row() {
    let (store, _tx, mut board) = signed_in();
    let keep = add(&mut board, "Keep").await;
    let gone = add(&mut board, "Gone").await;

    board.request_delete(&gone).unwrap();
    assert_eq!(
        board.dismiss_modal(Dismissal::Confirm).await.unwrap(),
        FlowOutcome::Deleted(gone.clone())
    );
    board.drain_events();
    assert!(store.peek(&record(&gone)).is_none());
    let rows = board.view().rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, keep);
}

#[tokio::test]
async fn deleting_a_vanished_record_still_succeeds() {
    let (store, _tx, mut board) = signed_in();
    let id = add(&mut board, "Math").await;

    board.request_delete(&id).unwrap();
    // Removed elsewhere while the dialog was up.
    store.delete(&record(&id)).await.unwrap();
    assert_eq!(
        board.dismiss_modal(Dismissal::Confirm).await.unwrap(),
        FlowOutcome::Deleted(id)
    );
}

#[tokio::test]
async fn unknown_row_cannot_be_targeted() {
    let (_store, _tx, mut board) = signed_in();
    let ghost = RecordId::new("ghost");
    let err = board.request_delete(&ghost).unwrap_err();
    assert!(matches!(err, BoardError::TaskNotFound(_)));
    assert!(!board.modal().is_open());
}

#[tokio::test]
async fn second_confirmation_waits_for_the_first() {
    let (_store, _tx, mut board) = signed_in();
    let id = add(&mut board, "Math").await;
    board.request_delete(&id).unwrap();
    let err = board.request_logout().unwrap_err();
    assert!(matches!(err, BoardError::Modal(ModalError::AlreadyOpen)));
    assert_eq!(board.modal().request().unwrap().kind, ConfirmKind::Delete);
}

// ---------------------------------------------------------------------------
// Logout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn confirmed_logout_closes_the_subscription() {
    let (store, _tx, mut board) = signed_in();
    board.request_logout().unwrap();
    assert_eq!(board.modal().request().unwrap().kind, ConfirmKind::Logout);
    assert_eq!(
        board.dismiss_modal(Dismissal::Confirm).await.unwrap(),
        FlowOutcome::SignOutRequested
    );
    assert!(!board.is_subscribed());
    assert_eq!(store.subscriber_count(), 0);
}

// ---------------------------------------------------------------------------
// Modal resolution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn every_dismissal_resolves_exactly_once() {
    for (dismissal, expected) in [
        (Dismissal::Confirm, true),
        (Dismissal::Cancel, false),
        (Dismissal::OutsideClick, false),
        (Dismissal::Escape, false),
    ] {
        let mut modal = ConfirmModal::new();
        let ticket = modal.open(ConfirmRequest::logout()).unwrap();
        assert_eq!(modal.dismiss(dismissal).unwrap(), expected);
        assert_eq!(modal.state(), ModalState::Resolving);

        // Any further dismissal is refused until the flow settles.
        for again in [Dismissal::Confirm, Dismissal::Cancel, Dismissal::Escape] {
            assert_eq!(modal.dismiss(again), Err(ModalError::NotOpen));
        }
        assert_eq!(ticket.outcome().await, expected);

        modal.settle();
        assert_eq!(modal.state(), ModalState::Closed);
        assert_eq!(modal.dismiss(Dismissal::Confirm), Err(ModalError::NotOpen));
    }
}

#[tokio::test]
async fn reset_resolves_open_ticket_as_declined() {
    let mut modal = ConfirmModal::new();
    let ticket = modal.open(ConfirmRequest::delete("Math")).unwrap();
    modal.reset();
    assert!(!modal.is_open());
    assert!(!ticket.outcome().await);
}
