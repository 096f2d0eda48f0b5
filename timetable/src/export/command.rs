//! Renderer backed by an external HTML-to-PDF program.
//!
//! The program reads HTML on stdin and writes the PDF to the path given as
//! its last argument, which is how `wkhtmltopdf - <out>` behaves.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{DocumentRenderer, ExportError, ExportOptions, TimetableDocument};

/// Program looked up on `PATH` when none is configured.
pub const DEFAULT_PROGRAM: &str = "wkhtmltopdf";

/// Screen DPI the raster scale multiplies.
const BASE_DPI: u32 = 96;

/// Pipes the document to an installed converter.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: PathBuf,
}

impl CommandRenderer {
    /// Locate `program` (a bare name searched on `PATH`, or a path).
    ///
    /// # Errors
    ///
    /// [`ExportError::Unavailable`] if it cannot be found or is not
    /// executable.
    pub fn detect(program: &str) -> Result<Self, ExportError> {
        let program = which::which(program)
            .map_err(|e| ExportError::Unavailable(format!("{program}: {e}")))?;
        tracing::debug!(program = %program.display(), "pdf renderer found");
        Ok(Self { program })
    }

    /// Resolved program path.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn arguments(options: &ExportOptions, output: &Path) -> Vec<String> {
        let margin = format!("{}in", options.margin_in);
        let quality = (options.image_quality.clamp(0.0, 1.0) * 100.0).round();
        let mut args = vec!["--quiet".to_string()];
        for side in ["--margin-top", "--margin-bottom", "--margin-left", "--margin-right"] {
            args.push(side.into());
            args.push(margin.clone());
        }
        args.extend([
            "--page-size".into(),
            options.page_size.as_str().into(),
            "--orientation".into(),
            options.orientation.as_str().into(),
            "--image-quality".into(),
            format!("{quality}"),
            "--dpi".into(),
            (BASE_DPI * options.raster_scale.max(1)).to_string(),
            "-".into(),
            output.display().to_string(),
        ]);
        args
    }
}

impl DocumentRenderer for CommandRenderer {
    async fn render(
        &self,
        document: &TimetableDocument,
        options: &ExportOptions,
    ) -> Result<PathBuf, ExportError> {
        let output = options.output_path();
        let page = format!(
            "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"></head><body>\n{}</body></html>\n",
            document.to_html()
        );

        let mut child = Command::new(&self.program)
            .args(Self::arguments(options, &output))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(page.as_bytes()).await?;
            // Dropping stdin closes the pipe so the converter sees EOF.
        }

        let result = child.wait_with_output().await?;
        if !result.status.success() {
            return Err(ExportError::Failed {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        tracing::info!(path = %output.display(), tasks = document.task_count(), "timetable exported");
        Ok(output)
    }
}
