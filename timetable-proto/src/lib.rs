//! Shared record model for the weekly study timetable.
//!
//! Everything the store holds and every address it is reached by lives here,
//! so the client and any future store adapter agree on one wire shape.

pub mod identity;
pub mod path;
pub mod snapshot;
pub mod task;
pub mod weekday;

pub use identity::{Identity, Uid};
pub use path::{PathError, StorePath};
pub use snapshot::Snapshot;
pub use task::{RecordError, RecordId, Task, TaskDraft, TaskPatch};
pub use weekday::Weekday;
