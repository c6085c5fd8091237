//! End-of-run summary report.

use crate::model::User;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Stand-in for `last_message` when a user has no news.
pub const NO_MESSAGE: &str = "N/A";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub user_id: i64,
    pub user_name: String,
    pub messages_count: usize,
    pub last_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub timestamp: NaiveDateTime,
    pub total_users_processed: usize,
    pub users_with_news: usize,
    pub total_messages_generated: usize,
    pub processing_summary: Vec<UserSummary>,
}

impl Report {
    pub fn build(users: &[User], timestamp: NaiveDateTime) -> Self {
        let processing_summary = users
            .iter()
            .map(|user| UserSummary {
                user_id: user.id,
                user_name: user.name.clone(),
                messages_count: user.news.len(),
                last_message: user
                    .last_news()
                    .map(|item| item.description.clone())
                    .unwrap_or_else(|| NO_MESSAGE.to_string()),
            })
            .collect();

        Self {
            timestamp,
            total_users_processed: users.len(),
            users_with_news: users.iter().filter(|u| !u.news.is_empty()).count(),
            total_messages_generated: users.iter().map(|u| u.news.len()).sum(),
            processing_summary,
        }
    }

    /// Write the report, replacing any previous one at `path`.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("cannot write report {}", path.display()))?;
        Ok(())
    }
}
