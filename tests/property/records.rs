//! Property-based tests for record decoding.
//!
//! Uses proptest to verify:
//! 1. Arbitrary JSON never makes `Task::decode` panic.
//! 2. A record written from a draft decodes back to the same fields.
//! 3. `Snapshot::tasks` keeps store order and drops only undecodable children.

use proptest::prelude::*;
use serde_json::{Map, Value, json};
use timetable_proto::{RecordId, Snapshot, StorePath, Task, TaskDraft, TaskPatch, Weekday};

/// Strategy for arbitrary JSON values, a few levels deep.
fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        ".{0,16}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-zA-Z]{1,10}", inner), 0..6)
                .prop_map(|kv| Value::Object(kv.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Strategy for a weekday.
fn arb_day() -> impl Strategy<Value = Weekday> {
    (0usize..7).prop_map(|i| Weekday::ALL[i])
}

/// Strategy for non-empty, already-trimmed text fields.
fn arb_field() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9:]{1,20}"
}

proptest! {
    #[test]
    fn decode_never_panics(value in arb_json()) {
        let _ = Task::decode(RecordId::new("r"), &value);
    }

    #[test]
    fn draft_record_decodes_to_same_fields(
        subject in arb_field(),
        time in arb_field(),
        goal in arb_field(),
        day in arb_day(),
        created_at in 0i64..4_000_000_000_000,
    ) {
        let draft = TaskDraft::new(&subject, &time, &goal);
        let value = draft.into_new_record(day, created_at);
        let task = Task::decode(RecordId::new("r"), &value).unwrap();
        prop_assert_eq!(task.subject, subject);
        prop_assert_eq!(task.time, time);
        prop_assert_eq!(task.goal, goal);
        prop_assert_eq!(task.day, day);
        prop_assert!(!task.completed);
        prop_assert_eq!(task.created_at, created_at);
    }

    #[test]
    fn patch_fields_only_name_set_fields(completed in any::<bool>(), day in proptest::option::of(arb_day())) {
        let patch = TaskPatch { day, completed: Some(completed), ..TaskPatch::default() };
        let fields = patch.to_fields();
        prop_assert_eq!(fields.len(), 1 + usize::from(day.is_some()));
        prop_assert!(!fields.contains_key("createdAt"));
    }

    #[test]
    fn snapshot_tasks_preserve_store_order(
        entries in prop::collection::vec((arb_day(), any::<bool>()), 0..20),
    ) {
        let mut map = Map::new();
        let mut expected = Vec::new();
        for (i, (day, valid)) in entries.iter().enumerate() {
            let key = format!("k{i:03}");
            if *valid {
                map.insert(key.clone(), json!({
                    "subject": "s", "time": "t", "goal": "g", "day": day.name(), "createdAt": i
                }));
                expected.push(key);
            } else {
                map.insert(key, json!({ "day": "Nonday" }));
            }
        }
        let path = StorePath::parse("timetables/u").unwrap();
        let snap = Snapshot::new(path, Some(Value::Object(map)));
        let got: Vec<String> = snap.tasks().into_iter().map(|t| t.id.to_string()).collect();
        prop_assert_eq!(got, expected);
    }
}
