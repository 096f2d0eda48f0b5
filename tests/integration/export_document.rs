//! Integration tests for exporting the week.
//!
//! A capturing renderer stands in for the converter so the document the
//! board hands over can be inspected.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use timetable::board::{BoardConfig, FlowOutcome, TaskBoard};
use timetable::export::{
    DocumentRenderer, EMPTY_DAY_TEXT, ExportError, ExportOptions, TimetableDocument,
};
use timetable::store::DocumentStore;
use timetable::store::memory::MemoryStore;
use timetable_proto::{Identity, StorePath, Weekday};
use tokio::sync::watch;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Records every document it is asked to render.
#[derive(Clone, Default)]
struct CapturingRenderer {
    rendered: Arc<Mutex<Vec<(TimetableDocument, ExportOptions)>>>,
    fail: bool,
}

impl DocumentRenderer for CapturingRenderer {
    async fn render(
        &self,
        document: &TimetableDocument,
        options: &ExportOptions,
    ) -> Result<PathBuf, ExportError> {
        if self.fail {
            return Err(ExportError::Failed {
                status: "exit status: 1".into(),
                stderr: "boom".into(),
            });
        }
        self.rendered
            .lock()
            .push((document.clone(), options.clone()));
        Ok(options.output_path())
    }
}

fn alice() -> Identity {
    Identity::new("alice", "alice@example.com")
}

fn board_with(
    renderer: Option<CapturingRenderer>,
    identity: Option<Identity>,
) -> (Arc<MemoryStore>, TaskBoard<MemoryStore, CapturingRenderer>) {
    let store = Arc::new(MemoryStore::new());
    let (_tx, rx) = watch::channel(identity);
    let config = BoardConfig {
        export: ExportOptions {
            output_dir: PathBuf::from("/tmp/exports"),
            ..ExportOptions::default()
        },
        ..BoardConfig::default()
    };
    (store.clone(), TaskBoard::new(store, renderer, rx, config))
}

async fn seed(store: &MemoryStore, subject: &str, day: &str, created_at: i64) {
    store
        .create(
            &StorePath::parse("timetables/alice").unwrap(),
            json!({
                "subject": subject,
                "time": "09:00 - 10:00",
                "goal": format!("{subject} goal"),
                "day": day,
                "completed": false,
                "createdAt": created_at,
            }),
        )
        .await
        .unwrap();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_days_get_placeholder_and_busy_days_keep_order() {
    let renderer = CapturingRenderer::default();
    let (store, mut board) = board_with(Some(renderer.clone()), Some(alice()));
    seed(&store, "Chemistry", "Monday", 30).await;
    seed(&store, "Biology", "Monday", 10).await;
    seed(&store, "Physics", "Monday", 20).await;

    let outcome = board.export().await.unwrap();
    assert_eq!(
        outcome,
        FlowOutcome::Exported(PathBuf::from("/tmp/exports/Weekly_Timetable.pdf"))
    );

    let rendered = renderer.rendered.lock();
    assert_eq!(rendered.len(), 1);
    let (document, options) = &rendered[0];
    assert_eq!(options.raster_scale, 2);
    assert_eq!(document.task_count(), 3);

    let monday = &document.days[Weekday::Monday.index()];
    let subjects: Vec<&str> = monday.entries.iter().map(|t| t.subject.as_str()).collect();
    assert_eq!(subjects, ["Biology", "Physics", "Chemistry"]);
    assert!(document.days[Weekday::Sunday.index()].entries.is_empty());

    let html = document.to_html();
    let sunday = html.find("Sunday").unwrap();
    assert!(html[sunday..].contains(EMPTY_DAY_TEXT));
    let bio = html.find("Biology").unwrap();
    let phys = html.find("Physics").unwrap();
    let chem = html.find("Chemistry").unwrap();
    assert!(bio < phys && phys < chem);
    let monday_at = html.find("Monday").unwrap();
    let tuesday_at = html.find("Tuesday").unwrap();
    assert!(monday_at < bio && chem < tuesday_at);
    assert_eq!(html.matches(EMPTY_DAY_TEXT).count(), 6);
}

#[tokio::test]
async fn missing_renderer_is_reported_before_reading() {
    let (store, mut board) = board_with(None, Some(alice()));
    store.fail_next_reads(1);
    let err = board.export().await.unwrap_err();
    assert_eq!(
        err.notice(),
        "PDF library not loaded. Please refresh and try again."
    );
    assert!(!board.can_export());
    // The injected read failure was never consumed.
    assert!(
        store
            .read_once(&StorePath::parse("timetables/alice").unwrap())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn export_requires_sign_in() {
    let (_store, mut board) = board_with(Some(CapturingRenderer::default()), None);
    let err = board.export().await.unwrap_err();
    assert_eq!(err.notice(), "Please login first");
}

#[tokio::test]
async fn read_failure_is_a_generation_failure() {
    let renderer = CapturingRenderer::default();
    let (store, mut board) = board_with(Some(renderer.clone()), Some(alice()));
    store.fail_next_reads(1);
    let err = board.export().await.unwrap_err();
    assert_eq!(err.notice(), "Failed to generate PDF. Please try again.");
    assert!(renderer.rendered.lock().is_empty());
}

#[tokio::test]
async fn renderer_failure_is_a_generation_failure() {
    let renderer = CapturingRenderer {
        fail: true,
        ..CapturingRenderer::default()
    };
    let (store, mut board) = board_with(Some(renderer), Some(alice()));
    seed(&store, "Math", "Friday", 1).await;
    let err = board.export().await.unwrap_err();
    assert_eq!(err.notice(), "Failed to generate PDF. Please try again.");
}
