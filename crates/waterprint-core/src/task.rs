//! Tasks and achievements.
//!
//! A [`Task`] is a pending recommendation for one category. It converts into
//! an [`Achievement`] once a saving in that category has been realized.
//! Achievements are immutable and only ever appended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::CategoryId;

/// An actionable recommendation tied to a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub text: String,
    pub category: CategoryId,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(text: impl Into<String>, category: CategoryId, created_at: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            category,
            created_at,
        }
    }
}

/// Record discriminator; always serialized as `"Achievement"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AchievementKind {
    #[default]
    Achievement,
}

/// A realized water saving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub category: CategoryId,
    /// Liters saved, never negative.
    pub improvement: f64,
    pub message: String,
    pub date: DateTime<Utc>,
    #[serde(rename = "type", default)]
    pub kind: AchievementKind,
}

impl Achievement {
    pub fn new(
        category: CategoryId,
        improvement: f64,
        message: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            category,
            improvement: improvement.max(0.0),
            message: message.into(),
            date,
            kind: AchievementKind::Achievement,
        }
    }

    /// Identifier used when this achievement is folded into the ledger.
    pub fn ledger_task_id(&self) -> String {
        format!("{}@{}", self.category, self.date.to_rfc3339())
    }
}

/// Remove every task in `category`, returning how many were dropped.
pub fn remove_category(tasks: &mut Vec<Task>, category: &CategoryId) -> usize {
    let before = tasks.len();
    tasks.retain(|t| &t.category != category);
    before - tasks.len()
}

/// Number of pending tasks; all the notification layer needs.
pub fn pending_count(tasks: &[Task]) -> usize {
    tasks.len()
}
