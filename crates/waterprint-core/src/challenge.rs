//! Challenge progress tracking.
//!
//! A challenge is a fixed-length commitment to save water in one category.
//! The user logs one [`DailyAction`] per day; the tracker validates each entry
//! against the category's daily cap and the challenge window, and decides the
//! outcome once every day is logged or the user finishes early.
//!
//! ## States
//!
//! ```text
//!   Active ──(all days logged / finish)──> Completed ──(>= 100 %)──> Resolved
//!     │
//!     ├──(today > end date, target met)──> Completed
//!     └──(today > end date, target missed)──> Expired
//! ```
//!
//! Completed and Resolved are stored on the challenge. Expired, and the
//! Completed reading of a lapsed challenge that met its target, are derived
//! from the current date, so an expired challenge stays readable but rejects new
//! actions through [`ChallengeProgressTracker::ensure_open`].
//!
//! Percentages are not clamped: a challenge may end above 100 %.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::{CategoryCatalog, CategoryId};
use crate::error::{ActionError, Result};
use crate::survey::SurveyResult;
use crate::task::{self, Achievement, Task};

/// Default challenge length in days.
pub const DEFAULT_DURATION_DAYS: u32 = 7;

/// Longest challenge the tracker will start.
pub const MAX_DURATION_DAYS: u32 = 366;

/// One logged day of a challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAction {
    /// 1-based day index.
    pub day: u32,
    pub saved: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    #[default]
    Active,
    Completed,
    Resolved,
    Expired,
}

impl ChallengeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeStatus::Active => "active",
            ChallengeStatus::Completed => "completed",
            ChallengeStatus::Resolved => "resolved",
            ChallengeStatus::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub category: CategoryId,
    pub start_date: NaiveDate,
    /// Inclusive last day.
    pub end_date: NaiveDate,
    pub target_saving: f64,
    pub daily_actions: Vec<DailyAction>,
    #[serde(default)]
    pub status: ChallengeStatus,
}

impl Challenge {
    pub fn duration_days(&self) -> u32 {
        u32::try_from((self.end_date - self.start_date).num_days() + 1).unwrap_or(0)
    }

    pub fn total_saved(&self) -> f64 {
        self.daily_actions.iter().map(|a| a.saved).sum()
    }

    /// Saved total as a percentage of the target. May exceed 100.
    pub fn completion_percentage(&self) -> f64 {
        self.total_saved() / self.target_saving * 100.0
    }

    /// Cumulative saved amount after each logged day.
    ///
    /// Prefixes may pass the target before the last day; nothing rejects that.
    pub fn running_totals(&self) -> Vec<f64> {
        self.daily_actions
            .iter()
            .scan(0.0, |acc, a| {
                *acc += a.saved;
                Some(*acc)
            })
            .collect()
    }

    pub fn all_days_logged(&self) -> bool {
        self.daily_actions.len() >= self.duration_days() as usize
    }

    pub fn next_day(&self) -> u32 {
        self.daily_actions.len() as u32 + 1
    }

    fn end_timestamp(&self) -> DateTime<Utc> {
        self.end_date.and_time(NaiveTime::MIN).and_utc()
    }
}

/// Result of finishing a challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeOutcome {
    pub challenge: Challenge,
    pub percentage: f64,
    /// Present when the target was met.
    pub achievement: Option<Achievement>,
    /// Task list after the Task to Achievement transition.
    pub tasks: Vec<Task>,
}

/// Validates and aggregates challenge progress.
#[derive(Debug, Clone)]
pub struct ChallengeProgressTracker {
    catalog: CategoryCatalog,
    duration_days: u32,
}

impl Default for ChallengeProgressTracker {
    fn default() -> Self {
        Self::new(CategoryCatalog::builtin(), DEFAULT_DURATION_DAYS)
    }
}

impl ChallengeProgressTracker {
    pub fn new(catalog: CategoryCatalog, duration_days: u32) -> Self {
        Self {
            catalog,
            duration_days,
        }
    }

    pub fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }

    pub fn duration_days(&self) -> u32 {
        self.duration_days
    }

    /// Start a challenge with the catalog's default target.
    pub fn start(&self, category: CategoryId, start_date: NaiveDate) -> Result<Challenge> {
        let target = self.catalog.target(&category, self.duration_days)?;
        self.start_with_target(category, start_date, target)
    }

    /// Start a challenge with an explicit target.
    ///
    /// # Errors
    /// `UnknownCategory` for unregistered categories, `InvalidAction` for a
    /// non-positive target, or a duration that is zero, above
    /// [`MAX_DURATION_DAYS`], or runs past the last representable date.
    pub fn start_with_target(
        &self,
        category: CategoryId,
        start_date: NaiveDate,
        target_saving: f64,
    ) -> Result<Challenge> {
        self.catalog.info(&category)?;
        if self.duration_days == 0 {
            return Err(ActionError::ZeroDuration.into());
        }
        let out_of_range = ActionError::DurationOutOfRange {
            duration: self.duration_days,
            max: MAX_DURATION_DAYS,
        };
        if self.duration_days > MAX_DURATION_DAYS {
            return Err(out_of_range.into());
        }
        if !(target_saving > 0.0) {
            return Err(ActionError::NonPositiveTarget {
                target: target_saving,
            }
            .into());
        }

        let end_date = start_date
            .checked_add_signed(Duration::days(i64::from(self.duration_days) - 1))
            .ok_or(out_of_range)?;
        info!(%category, %start_date, %end_date, target_saving, "challenge started");
        Ok(Challenge {
            category,
            start_date,
            end_date,
            target_saving,
            daily_actions: Vec::new(),
            status: ChallengeStatus::Active,
        })
    }

    /// One challenge per improvement area, all starting on `start_date`.
    pub fn plan_for(&self, survey: &SurveyResult, start_date: NaiveDate) -> Result<Vec<Challenge>> {
        survey
            .improvement_areas
            .iter()
            .map(|category| self.start(category.clone(), start_date))
            .collect()
    }

    /// Append the action for `day`.
    ///
    /// The challenge moves to Completed once every day is logged.
    ///
    /// # Errors
    /// `InvalidAction` naming the violated rule: closed challenge, day out of
    /// sequence or past the duration, saved amount outside `[0, cap]`, or a
    /// date outside the challenge window. `UnknownCategory` if the category
    /// has left the catalog.
    pub fn record_daily_action(
        &self,
        challenge: &Challenge,
        day: u32,
        saved: f64,
        date: NaiveDate,
    ) -> Result<Challenge> {
        if matches!(
            challenge.status,
            ChallengeStatus::Completed | ChallengeStatus::Resolved
        ) {
            return Err(ActionError::ChallengeClosed {
                category: challenge.category.clone(),
                state: challenge.status.as_str().to_string(),
            }
            .into());
        }

        let expected = challenge.next_day();
        if day != expected {
            return Err(ActionError::DayOutOfSequence { day, expected }.into());
        }
        let duration = challenge.duration_days();
        if day > duration {
            return Err(ActionError::DayBeyondDuration { day, duration }.into());
        }

        let cap = self.catalog.daily_cap(&challenge.category)?;
        if !(saved >= 0.0) {
            return Err(ActionError::SavedBelowZero { saved }.into());
        }
        if saved > cap {
            return Err(ActionError::SavedAboveCap {
                saved,
                cap,
                category: challenge.category.clone(),
            }
            .into());
        }

        if date < challenge.start_date || date > challenge.end_date {
            return Err(ActionError::DateOutsideWindow {
                date,
                start: challenge.start_date,
                end: challenge.end_date,
            }
            .into());
        }

        let mut next = challenge.clone();
        next.daily_actions.push(DailyAction { day, saved, date });
        debug!(
            category = %next.category,
            day,
            saved,
            percentage = next.completion_percentage(),
            "daily action recorded"
        );

        if next.all_days_logged() {
            next.status = ChallengeStatus::Completed;
            info!(
                category = %next.category,
                percentage = next.completion_percentage(),
                "challenge completed"
            );
        }
        Ok(next)
    }

    /// Current state as of `today`.
    ///
    /// An Active challenge past its end date reads as Completed when it met
    /// its target, and as Expired otherwise.
    pub fn status(&self, challenge: &Challenge, today: NaiveDate) -> ChallengeStatus {
        match challenge.status {
            ChallengeStatus::Active
                if today > challenge.end_date && challenge.completion_percentage() >= 100.0 =>
            {
                ChallengeStatus::Completed
            }
            ChallengeStatus::Active if today > challenge.end_date => ChallengeStatus::Expired,
            status => status,
        }
    }

    /// Reject challenges that no longer accept actions.
    pub fn ensure_open(&self, challenge: &Challenge, today: NaiveDate) -> Result<()> {
        match self.status(challenge, today) {
            ChallengeStatus::Active => Ok(()),
            state => Err(ActionError::ChallengeClosed {
                category: challenge.category.clone(),
                state: state.as_str().to_string(),
            }
            .into()),
        }
    }

    /// Finish a challenge and apply the Task to Achievement transition.
    ///
    /// At 100 % or more an Achievement dated on the end date is emitted and
    /// every Task in the category is removed. Below 100 % the category's
    /// Task is kept, and re-offered if none is pending.
    ///
    /// # Errors
    /// `InvalidAction` if the challenge was already resolved.
    pub fn conclude(
        &self,
        challenge: &Challenge,
        tasks: &[Task],
        now: DateTime<Utc>,
    ) -> Result<ChallengeOutcome> {
        if challenge.status == ChallengeStatus::Resolved {
            return Err(ActionError::ChallengeClosed {
                category: challenge.category.clone(),
                state: challenge.status.as_str().to_string(),
            }
            .into());
        }

        let descriptor = self.catalog.descriptor(&challenge.category)?.to_string();
        let mut next = challenge.clone();
        let mut tasks = tasks.to_vec();
        let percentage = next.completion_percentage();
        let total = next.total_saved();

        let achievement = if percentage >= 100.0 {
            next.status = ChallengeStatus::Resolved;
            let removed = task::remove_category(&mut tasks, &next.category);
            if removed > 1 {
                warn!(
                    category = %next.category,
                    removed,
                    "achievement removed several tasks in one category"
                );
            }
            Some(Achievement::new(
                next.category.clone(),
                total,
                format!(
                    "{descriptor}: saved {total} L over {} days ({percentage:.0}% of target)",
                    next.duration_days()
                ),
                next.end_timestamp(),
            ))
        } else {
            next.status = ChallengeStatus::Completed;
            if !tasks.iter().any(|t| t.category == next.category) {
                tasks.push(Task::new(descriptor, next.category.clone(), now));
            }
            None
        };

        info!(
            category = %next.category,
            percentage,
            achieved = achievement.is_some(),
            "challenge concluded"
        );
        Ok(ChallengeOutcome {
            challenge: next,
            percentage,
            achievement,
            tasks,
        })
    }
}
