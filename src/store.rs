//! Load phase: attach the generated message and write the record to disk.
//!
//! The remote API is never updated; each record is saved as a local JSON
//! file named after the user id and the wall-clock second it was written.

use crate::clock::{file_stamp, Clock};
use crate::model::User;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Path for one user's snapshot, e.g. `user_updates/user_1_20250314_120000.json`.
pub fn user_file_path(dir: &Path, user: &User, clock: &impl Clock) -> PathBuf {
    dir.join(format!("user_{}_{}.json", user.id, file_stamp(clock.now())))
}

/// Save a user snapshot as pretty JSON, creating `dir` when needed.
pub fn save_user_update(dir: &Path, user: &User, clock: &impl Clock) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("cannot create output directory {}", dir.display()))?;

    let path = user_file_path(dir, user, clock);
    let json = serde_json::to_string_pretty(user)?;
    fs::write(&path, json).with_context(|| format!("cannot write {}", path.display()))?;

    debug!(user_id = user.id, path = %path.display(), "user snapshot written");
    Ok(path)
}

/// Append a news item for `message` and persist the record.
///
/// Returns whether the write succeeded. The news item stays on the record
/// even when the write fails.
pub fn update_user_data(dir: &Path, user: &mut User, message: &str, clock: &impl Clock) -> bool {
    user.push_news(message, clock.now());

    match save_user_update(dir, user, clock) {
        Ok(_) => {
            println!("LOAD: data for {} updated", user.name);
            true
        }
        Err(e) => {
            warn!(user_id = user.id, "failed to persist user: {:#}", e);
            println!("Load error for {}: {:#}", user.name, e);
            false
        }
    }
}
