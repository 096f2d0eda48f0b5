//! Weekly timetable export.
//!
//! A [`TimetableDocument`] groups every task under the seven weekdays,
//! Monday first, and renders to a styled HTML fragment. A
//! [`DocumentRenderer`] turns that into a file. Concrete renderers:
//! - [`command::CommandRenderer`]: pipes the HTML to an external
//!   HTML-to-PDF program

pub mod command;

use std::fmt::Write as _;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use timetable_proto::{Snapshot, Task, Weekday};

use crate::board::render::tasks_for_day;

/// Heading at the top of the document.
pub const DOCUMENT_TITLE: &str = "Weekly Study Timetable";

/// Line written under a day with no tasks.
pub const EMPTY_DAY_TEXT: &str = "No entries.";

/// Default output file name.
pub const DEFAULT_FILENAME: &str = "Weekly_Timetable.pdf";

/// Errors produced while exporting.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// No renderer is installed.
    #[error("renderer unavailable: {0}")]
    Unavailable(String),

    /// The renderer process could not be started or talked to.
    #[error("renderer I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The renderer ran but reported failure.
    #[error("renderer exited with {status}: {stderr}")]
    Failed {
        /// Exit status as printed by the OS.
        status: String,
        /// Trimmed standard error.
        stderr: String,
    },
}

/// Paper size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    /// ISO A4.
    #[default]
    A4,
    /// US Letter.
    Letter,
}

impl PageSize {
    /// Name as accepted by common HTML-to-PDF tools.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A4 => "A4",
            Self::Letter => "Letter",
        }
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Taller than wide.
    #[default]
    Portrait,
    /// Wider than tall.
    Landscape,
}

impl Orientation {
    /// Name as accepted by common HTML-to-PDF tools.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Portrait => "Portrait",
            Self::Landscape => "Landscape",
        }
    }
}

/// Output settings handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Page margin on every side, in inches.
    pub margin_in: f64,
    /// Output file name.
    pub filename: String,
    /// Directory the file is written to.
    pub output_dir: PathBuf,
    /// JPEG quality for embedded images, `0.0..=1.0`.
    pub image_quality: f64,
    /// Rasterisation scale factor.
    pub raster_scale: u32,
    /// Paper size.
    pub page_size: PageSize,
    /// Page orientation.
    pub orientation: Orientation,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            margin_in: 0.5,
            filename: DEFAULT_FILENAME.into(),
            output_dir: PathBuf::from("."),
            image_quality: 0.98,
            raster_scale: 2,
            page_size: PageSize::A4,
            orientation: Orientation::Portrait,
        }
    }
}

impl ExportOptions {
    /// Full path of the file the renderer should produce.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.filename)
    }
}

/// One day's heading and entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySection {
    /// The day.
    pub day: Weekday,
    /// Tasks, oldest first.
    pub entries: Vec<Task>,
}

/// The whole week, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimetableDocument {
    /// All seven days in [`Weekday::ALL`] order.
    pub days: Vec<DaySection>,
}

impl TimetableDocument {
    /// Group the tasks in `snapshot` by day. Days without tasks are kept.
    #[must_use]
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let days = Weekday::ALL
            .iter()
            .map(|&day| DaySection {
                day,
                entries: tasks_for_day(snapshot, day),
            })
            .collect();
        Self { days }
    }

    /// Total number of tasks.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.days.iter().map(|d| d.entries.len()).sum()
    }

    /// Styled HTML fragment for the document.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut html = String::from(
            "<div style=\"padding:1rem; font-family:'Segoe UI',sans-serif;\">\n",
        );
        let _ = writeln!(
            html,
            "<h1 style=\"text-align:center; color:#7b4ca0;\">{DOCUMENT_TITLE}</h1>"
        );
        for section in &self.days {
            let _ = writeln!(
                html,
                "<h2 style=\"color:#5f3d90; margin-top:1rem;\">{}</h2>",
                section.day
            );
            if section.entries.is_empty() {
                let _ = writeln!(html, "<p>{EMPTY_DAY_TEXT}</p>");
                continue;
            }
            for task in &section.entries {
                let _ = writeln!(
                    html,
                    "<div style=\"background:#f8f1fa; padding:10px; margin:8px 0; \
                     border-left:4px solid #a074c4; border-radius:8px;\">\
                     <strong>Subject:</strong> {}<br/>\
                     <strong>Time:</strong> {}<br/>\
                     <strong>Goal:</strong> {}<br/></div>",
                    escape_html(&task.subject),
                    escape_html(&task.time),
                    escape_html(&task.goal),
                );
            }
        }
        html.push_str("</div>\n");
        html
    }
}

/// Escape text for inclusion in HTML element content.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Turns a [`TimetableDocument`] into a file.
pub trait DocumentRenderer: Send + Sync {
    /// Render `document` and return the path written.
    fn render(
        &self,
        document: &TimetableDocument,
        options: &ExportOptions,
    ) -> impl std::future::Future<Output = Result<PathBuf, ExportError>> + Send;
}
