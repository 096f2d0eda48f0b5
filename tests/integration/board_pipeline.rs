//! Integration tests for the snapshot-to-view pipeline and the live
//! subscription lifecycle.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use serde_json::{Map, Value, json};
use timetable::board::{BoardConfig, BoardError, BoardView, FlowOutcome, TaskBoard};
use timetable::export::command::CommandRenderer;
use timetable::modal::{Dismissal, ModalError, ModalState};
use timetable::store::memory::MemoryStore;
use timetable::store::{DocumentStore, StoreError, Subscription};
use timetable_proto::{Identity, RecordId, Snapshot, StorePath, Weekday};
use tokio::sync::watch;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type Board<S> = TaskBoard<S, CommandRenderer>;

fn alice() -> Identity {
    Identity::new("alice", "alice@example.com")
}

fn bob() -> Identity {
    Identity::new("bob", "bob@example.com")
}

fn collection(uid: &str) -> StorePath {
    StorePath::parse(&format!("timetables/{uid}")).unwrap()
}

fn signed_in(
    identity: &Identity,
) -> (Arc<MemoryStore>, watch::Sender<Option<Identity>>, Board<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let (tx, rx) = watch::channel(Some(identity.clone()));
    let mut board = TaskBoard::new(Arc::clone(&store), None, rx, BoardConfig::default());
    board.on_identity_change(Some(identity)).unwrap();
    board.drain_events();
    (store, tx, board)
}

async fn seed(
    store: &MemoryStore,
    uid: &str,
    subject: &str,
    day: &str,
    created_at: i64,
) -> RecordId {
    store
        .create(
            &collection(uid),
            json!({
                "subject": subject,
                "time": "10:00 - 11:00",
                "goal": "practice",
                "day": day,
                "completed": false,
                "createdAt": created_at,
            }),
        )
        .await
        .unwrap()
}

fn subjects(board: &Board<impl DocumentStore>) -> Vec<String> {
    board.view().rows().iter().map(|r| r.subject.clone()).collect()
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

#[tokio::test]
async fn task_for_another_day_is_stored_but_hidden() {
    let (store, _tx, mut board) = signed_in(&alice());
    board.select_day(Weekday::Tuesday).await.unwrap();

    let id = store
        .create(
            &collection("alice"),
            json!({
                "subject": "Math",
                "time": "10:00-11:00",
                "goal": "Algebra",
                "day": "Monday",
                "completed": false,
                "createdAt": 1,
            }),
        )
        .await
        .unwrap();
    board.drain_events();

    assert!(store.peek(&collection("alice").child(id.as_str()).unwrap()).is_some());
    assert_eq!(board.view(), &BoardView::Placeholder);

    assert_eq!(
        board.select_day(Weekday::Monday).await.unwrap(),
        FlowOutcome::Rendered
    );
    assert_eq!(subjects(&board), vec!["Math"]);
}

#[tokio::test]
async fn rows_follow_created_at_not_insertion() {
    let (store, _tx, mut board) = signed_in(&alice());
    seed(&store, "alice", "Late", "Monday", 300).await;
    seed(&store, "alice", "Early", "Monday", 100).await;
    seed(&store, "alice", "Other day", "Friday", 50).await;
    seed(&store, "alice", "Middle", "Monday", 200).await;

    board.drain_events();
    assert_eq!(subjects(&board), vec!["Early", "Middle", "Late"]);
}

#[tokio::test]
async fn equal_timestamps_keep_store_order() {
    let (store, _tx, mut board) = signed_in(&alice());
    seed(&store, "alice", "First", "Monday", 5).await;
    seed(&store, "alice", "Second", "Monday", 5).await;
    seed(&store, "alice", "Third", "Monday", 5).await;

    board.drain_events();
    assert_eq!(subjects(&board), vec!["First", "Second", "Third"]);
}

#[tokio::test]
async fn malformed_records_are_skipped() {
    let (store, _tx, mut board) = signed_in(&alice());
    seed(&store, "alice", "Good", "Monday", 1).await;
    store
        .set(&collection("alice").child("junk").unwrap(), json!({ "day": "Someday" }))
        .await
        .unwrap();

    board.drain_events();
    assert_eq!(subjects(&board), vec!["Good"]);
}

#[tokio::test]
async fn deleting_the_last_task_shows_placeholder() {
    let (store, _tx, mut board) = signed_in(&alice());
    let id = seed(&store, "alice", "Only", "Monday", 1).await;
    board.drain_events();
    assert_eq!(board.view().rows().len(), 1);

    store
        .delete(&collection("alice").child(id.as_str()).unwrap())
        .await
        .unwrap();
    board.drain_events();
    assert_eq!(board.view(), &BoardView::Placeholder);
    assert_eq!(
        board.view().message(),
        Some("No tasks for this day. Add one above!")
    );
}

#[tokio::test]
async fn failed_day_switch_shows_error_view() {
    let (store, _tx, mut board) = signed_in(&alice());
    store.fail_next_reads(1);
    let err = board.select_day(Weekday::Sunday).await.unwrap_err();
    assert_eq!(err.notice(), "Error loading tasks. Please refresh.");
    assert_eq!(board.view(), &BoardView::LoadError);
    assert_eq!(board.state().selected_day, Weekday::Sunday);
}

// ---------------------------------------------------------------------------
// Subscription lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn one_subscription_per_identity() {
    let (store, tx, mut board) = signed_in(&alice());
    assert_eq!(store.subscriber_count(), 1);
    assert_eq!(store.subscribers_at(&collection("alice")), 1);

    // Same user again: nothing changes.
    let tag = board.subscription_tag();
    board.on_identity_change(Some(&alice())).unwrap();
    assert_eq!(board.subscription_tag(), tag);
    assert_eq!(store.subscriber_count(), 1);

    tx.send_replace(Some(bob()));
    board.on_identity_change(Some(&bob())).unwrap();
    assert_eq!(store.subscriber_count(), 1);
    assert_eq!(store.subscribers_at(&collection("alice")), 0);
    assert_eq!(store.subscribers_at(&collection("bob")), 1);
    assert_ne!(board.subscription_tag(), tag);

    tx.send_replace(None);
    board.on_identity_change(None).unwrap();
    assert_eq!(store.subscriber_count(), 0);
}

#[tokio::test]
async fn previous_users_tasks_never_render_after_switch() {
    let (store, tx, mut board) = signed_in(&alice());
    seed(&store, "alice", "Alice task", "Monday", 1).await;

    // Alice's snapshot is queued but not applied before the switch.
    tx.send_replace(Some(bob()));
    board.on_identity_change(Some(&bob())).unwrap();
    board.drain_events();

    assert_eq!(board.view(), &BoardView::Placeholder);
    seed(&store, "bob", "Bob task", "Monday", 1).await;
    board.drain_events();
    assert_eq!(subjects(&board), vec!["Bob task"]);
}

#[tokio::test]
async fn switching_user_drops_edit_and_open_confirmation() {
    let (store, tx, mut board) = signed_in(&alice());
    let id = seed(&store, "alice", "Math", "Tuesday", 1).await;
    board.select_day(Weekday::Tuesday).await.unwrap();
    board.drain_events();

    board.request_edit(&id).unwrap();
    assert_eq!(
        board.dismiss_modal(Dismissal::Confirm).await.unwrap(),
        FlowOutcome::EditLoaded(id.clone())
    );
    board.form_mut().subject = "Physics".into();
    assert_eq!(board.submit().await.unwrap(), FlowOutcome::AwaitingConfirmation);

    // Bob arrives without a sign-out in between.
    tx.send_replace(Some(bob()));
    board.on_identity_change(Some(&bob())).unwrap();

    assert!(!board.state().is_editing());
    assert!(board.state().form.subject.is_empty());
    assert_eq!(board.state().selected_day, Weekday::Monday);
    assert_eq!(board.modal().state(), ModalState::Closed);
    assert!(matches!(
        board.dismiss_modal(Dismissal::Confirm).await,
        Err(BoardError::Modal(ModalError::NotOpen))
    ));

    assert_eq!(store.peek(&collection("bob")), None);
    let record = store
        .peek(&collection("alice").child(id.as_str()).unwrap())
        .unwrap();
    assert_eq!(record["subject"], json!("Math"));
}

#[tokio::test]
async fn confirmation_answered_under_another_user_is_discarded() {
    let (store, tx, mut board) = signed_in(&alice());
    let id = seed(&store, "alice", "Math", "Monday", 1).await;
    board.drain_events();
    let record_path = collection("alice").child(id.as_str()).unwrap();

    // Save edit: the identity moves on before the board hears about it.
    board.request_edit(&id).unwrap();
    board.dismiss_modal(Dismissal::Confirm).await.unwrap();
    board.form_mut().subject = "Physics".into();
    board.submit().await.unwrap();
    tx.send_replace(Some(bob()));
    assert_eq!(
        board.dismiss_modal(Dismissal::Confirm).await.unwrap(),
        FlowOutcome::Discarded
    );
    assert_eq!(board.modal().state(), ModalState::Closed);
    assert_eq!(store.peek(&collection("bob")), None);
    assert_eq!(store.peek(&record_path).unwrap()["subject"], json!("Math"));

    // Delete: same story.
    tx.send_replace(Some(alice()));
    board.request_delete(&id).unwrap();
    tx.send_replace(Some(bob()));
    assert_eq!(
        board.dismiss_modal(Dismissal::Confirm).await.unwrap(),
        FlowOutcome::Discarded
    );
    assert!(store.peek(&record_path).is_some());
}

#[tokio::test]
async fn revoked_listener_shows_error_view() {
    let (store, _tx, mut board) = signed_in(&alice());
    seed(&store, "alice", "Math", "Monday", 1).await;
    board.drain_events();

    store.revoke(
        &collection("alice"),
        &StoreError::PermissionDenied("timetables/alice".into()),
    );
    board.drain_events();
    assert_eq!(board.view(), &BoardView::LoadError);
}

#[tokio::test]
async fn offline_store_refuses_subscription() {
    let store = Arc::new(MemoryStore::new());
    store.set_offline(true);
    let (_tx, rx) = watch::channel(Some(alice()));
    let mut board: Board<MemoryStore> =
        TaskBoard::new(Arc::clone(&store), None, rx, BoardConfig::default());

    let err = board.on_identity_change(Some(&alice())).unwrap_err();
    assert_eq!(err.notice(), "Error loading tasks. Please refresh.");
    assert!(!board.is_subscribed());
    assert_eq!(board.view(), &BoardView::LoadError);
}

#[tokio::test]
async fn next_event_awaits_the_live_subscription() {
    let (store, _tx, mut board) = signed_in(&alice());
    seed(&store, "alice", "Math", "Monday", 1).await;
    let event = board.next_event().await.unwrap();
    assert!(board.apply_event(event));
    assert_eq!(subjects(&board), vec!["Math"]);
}

// ---------------------------------------------------------------------------
// Identity changes during in-flight calls
// ---------------------------------------------------------------------------

/// Store that swaps the signed-in identity while a call is in flight.
struct SwitchingStore {
    inner: MemoryStore,
    identity: watch::Sender<Option<Identity>>,
    switch_to: Option<Identity>,
}

impl SwitchingStore {
    fn switch(&self) {
        self.identity.send_replace(self.switch_to.clone());
    }
}

impl DocumentStore for SwitchingStore {
    async fn create(&self, parent: &StorePath, value: Value) -> Result<RecordId, StoreError> {
        let result = self.inner.create(parent, value).await;
        self.switch();
        result
    }

    async fn set(&self, path: &StorePath, value: Value) -> Result<(), StoreError> {
        self.inner.set(path, value).await
    }

    async fn update(&self, path: &StorePath, fields: Map<String, Value>) -> Result<(), StoreError> {
        let result = self.inner.update(path, fields).await;
        self.switch();
        result
    }

    async fn delete(&self, path: &StorePath) -> Result<(), StoreError> {
        self.inner.delete(path).await
    }

    async fn read_once(&self, path: &StorePath) -> Result<Snapshot, StoreError> {
        let result = self.inner.read_once(path).await;
        self.switch();
        result
    }

    fn subscribe(&self, path: &StorePath) -> Result<Subscription, StoreError> {
        self.inner.subscribe(path)
    }
}

fn switching_board(switch_to: Option<Identity>) -> (MemoryStore, Board<SwitchingStore>) {
    let inner = MemoryStore::new();
    let (tx, rx) = watch::channel(Some(alice()));
    let store = Arc::new(SwitchingStore {
        inner: inner.clone(),
        identity: tx,
        switch_to,
    });
    let mut board = TaskBoard::new(store, None, rx, BoardConfig::default());
    board.on_identity_change(Some(&alice())).unwrap();
    board.drain_events();
    (inner, board)
}

#[tokio::test]
async fn add_completing_after_sign_out_is_discarded() {
    let (inner, mut board) = switching_board(None);
    board.form_mut().subject = "Math".into();
    board.form_mut().time = "t".into();
    board.form_mut().goal = "g".into();

    assert_eq!(board.submit().await.unwrap(), FlowOutcome::Discarded);
    // The write itself landed; only its completion was ignored.
    assert_eq!(inner.write_count(), 1);
    assert_eq!(board.state().form.subject, "Math");
}

#[tokio::test]
async fn day_switch_completing_for_another_user_is_discarded() {
    let (_inner, mut board) = switching_board(Some(bob()));
    let before = board.view().clone();
    assert_eq!(
        board.select_day(Weekday::Friday).await.unwrap(),
        FlowOutcome::Discarded
    );
    assert_eq!(board.view(), &before);
}

#[tokio::test]
async fn toggle_completing_after_switch_is_discarded() {
    let (inner, mut board) = switching_board(Some(bob()));
    let id = seed(&inner, "alice", "Math", "Monday", 1).await;
    board.drain_events();
    assert_eq!(
        board.toggle_completed(&id).await.unwrap(),
        FlowOutcome::Discarded
    );
}
