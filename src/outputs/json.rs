//! Status file writer.
//!
//! The status file is the only artifact of a run. Each write replaces the
//! whole file; there is no history and no locking, so the last writer wins.

use crate::error::PipelineError;
use crate::models::StatusRecord;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Write `record` to `path` as pretty-printed JSON with a trailing newline.
///
/// Creates the parent directory if it does not exist yet.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_status(record: &StatusRecord, path: &Path) -> Result<(), PipelineError> {
    let mut json = serde_json::to_string_pretty(record)?;
    json.push('\n');

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).await?;
    }

    fs::write(path, json).await?;
    info!(status = %record.status, updated = %record.updated, "Wrote status file");
    Ok(())
}
