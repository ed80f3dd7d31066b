//! Water footprint ledger.
//!
//! Keeps a user's current footprint as completed tasks reduce it, together
//! with an append-only history for charting. The profile is a plain record:
//! every operation takes the prior profile and returns the next one.
//!
//! The footprint is not clamped at zero unless configured. A negative value
//! means the user reported more savings than their baseline and is left for
//! the UI to flag. Completing the same task id twice counts twice; callers
//! must not double-submit.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CoreError, Result};
use crate::survey::{Answer, AnswerOption};
use crate::task::Achievement;

/// One applied task completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedTask {
    pub task_id: String,
    pub waterprint_reduction: f64,
    pub completion_date: DateTime<Utc>,
}

/// Footprint value at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPoint {
    pub date: DateTime<Utc>,
    pub waterprint: f64,
}

/// A user's footprint and its history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterprintProfile {
    pub initial_waterprint: f64,
    pub current_waterprint: f64,
    pub completed_tasks: Vec<CompletedTask>,
    pub progress_history: Vec<ProgressPoint>,
}

impl WaterprintProfile {
    /// Total reduction so far, recomputed from the two endpoints.
    pub fn current_reduction_total(&self) -> f64 {
        self.initial_waterprint - self.current_waterprint
    }

    /// Reductions per calendar day over the trailing `days` days.
    pub fn daily_reductions(&self, today: NaiveDate, days: u32) -> Result<Vec<DailySaving>> {
        bucket_daily(
            self.completed_tasks
                .iter()
                .map(|t| (t.completion_date, t.waterprint_reduction)),
            today,
            days,
        )
    }

    fn last_point_date(&self) -> Option<DateTime<Utc>> {
        self.progress_history.last().map(|p| p.date)
    }
}

/// Ledger behavior knobs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Floor the footprint at zero instead of letting it go negative.
    #[serde(default)]
    pub clamp_at_zero: bool,
}

/// Applies task completions to waterprint profiles.
#[derive(Debug, Clone, Default)]
pub struct WaterFootprintLedger {
    config: LedgerConfig,
}

impl WaterFootprintLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LedgerConfig) -> Self {
        Self { config }
    }

    /// Start a profile at `initial_waterprint`, seeding the history.
    pub fn create_profile(&self, initial_waterprint: f64, at: DateTime<Utc>) -> WaterprintProfile {
        info!(initial_waterprint, "waterprint profile created");
        WaterprintProfile {
            initial_waterprint,
            current_waterprint: initial_waterprint,
            completed_tasks: Vec::new(),
            progress_history: vec![ProgressPoint {
                date: at,
                waterprint: initial_waterprint,
            }],
        }
    }

    /// Subtract `waterprint_reduction` from the current footprint.
    ///
    /// History dates never go backwards: a completion stamped before the
    /// last history point is recorded at that point's date.
    ///
    /// # Errors
    /// `UnknownProfile` when `profile` is `None`.
    pub fn apply_task_completion(
        &self,
        profile: Option<&WaterprintProfile>,
        task_id: &str,
        waterprint_reduction: f64,
        at: DateTime<Utc>,
    ) -> Result<WaterprintProfile> {
        let mut next = profile.cloned().ok_or(CoreError::UnknownProfile)?;

        let mut waterprint = next.current_waterprint - waterprint_reduction;
        if self.config.clamp_at_zero {
            waterprint = waterprint.max(0.0);
        } else if waterprint < 0.0 {
            warn!(waterprint, task_id, "waterprint went negative");
        }

        let date = next.last_point_date().map_or(at, |last| last.max(at));
        next.current_waterprint = waterprint;
        next.completed_tasks.push(CompletedTask {
            task_id: task_id.to_string(),
            waterprint_reduction,
            completion_date: date,
        });
        next.progress_history.push(ProgressPoint { date, waterprint });

        info!(
            task_id,
            waterprint_reduction,
            current_waterprint = waterprint,
            "task completion applied"
        );
        Ok(next)
    }

    /// Fold an achievement's improvement into the footprint.
    pub fn apply_achievement(
        &self,
        profile: Option<&WaterprintProfile>,
        achievement: &Achievement,
        at: DateTime<Utc>,
    ) -> Result<WaterprintProfile> {
        self.apply_task_completion(
            profile,
            &achievement.ledger_task_id(),
            achievement.improvement,
            at,
        )
    }

    pub fn current_reduction_total(&self, profile: &WaterprintProfile) -> f64 {
        profile.current_reduction_total()
    }
}

/// Saving total for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySaving {
    pub date: NaiveDate,
    pub saved: f64,
}

/// Longest window [`bucket_daily`] accepts, ten years of days.
pub const MAX_WINDOW_DAYS: u32 = 3660;

/// Sum `(timestamp, amount)` entries per UTC calendar day over the `days`
/// days ending at `today`, oldest first. Days without entries are 0.
///
/// # Errors
/// `InvalidWindow` when `days` exceeds [`MAX_WINDOW_DAYS`] or the window
/// would start before the first representable date.
pub fn bucket_daily<I>(entries: I, today: NaiveDate, days: u32) -> Result<Vec<DailySaving>>
where
    I: IntoIterator<Item = (DateTime<Utc>, f64)>,
{
    if days == 0 {
        return Ok(Vec::new());
    }
    let invalid = CoreError::InvalidWindow {
        days,
        max: MAX_WINDOW_DAYS,
    };
    if days > MAX_WINDOW_DAYS {
        return Err(invalid);
    }
    let start = today
        .checked_sub_signed(Duration::days(i64::from(days) - 1))
        .ok_or(invalid)?;
    let mut buckets: BTreeMap<NaiveDate, f64> = (0..i64::from(days))
        .map(|offset| (start + Duration::days(offset), 0.0))
        .collect();

    for (at, amount) in entries {
        if let Some(total) = buckets.get_mut(&at.date_naive()) {
            *total += amount;
        }
    }

    Ok(buckets
        .into_iter()
        .map(|(date, saved)| DailySaving { date, saved })
        .collect())
}

/// Achievement improvements per day over the trailing window.
pub fn daily_savings(
    achievements: &[Achievement],
    today: NaiveDate,
    days: u32,
) -> Result<Vec<DailySaving>> {
    bucket_daily(
        achievements.iter().map(|a| (a.date, a.improvement)),
        today,
        days,
    )
}

/// Body of the backend's create-profile call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteProfileRequest {
    pub initial_waterprint: f64,
    pub answers: Vec<Answer>,
    pub correct_answers_count: usize,
}

impl RemoteProfileRequest {
    /// Answers that picked an Achievement option count as correct.
    pub fn new(initial_waterprint: f64, answers: Vec<Answer>) -> Self {
        let correct_answers_count = answers
            .iter()
            .filter(|a| matches!(a.option, AnswerOption::Achievement(_)))
            .count();
        Self {
            initial_waterprint,
            answers,
            correct_answers_count,
        }
    }
}

/// Body of the backend's update-profile call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteUpdate {
    pub task_id: String,
    pub waterprint_reduction: f64,
}

impl From<&CompletedTask> for RemoteUpdate {
    fn from(task: &CompletedTask) -> Self {
        Self {
            task_id: task.task_id.clone(),
            waterprint_reduction: task.waterprint_reduction,
        }
    }
}
