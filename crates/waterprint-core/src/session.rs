//! Session state and the end-to-end flow.
//!
//! [`SessionState`] is everything one user owns: answers, survey result,
//! pending tasks, achievements, challenges and the waterprint profile.
//! [`Session`] runs the engines over it. Every operation computes the next
//! state completely before committing, so a rejected call leaves the state
//! untouched.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::CategoryId;
use crate::challenge::{Challenge, ChallengeOutcome, ChallengeProgressTracker, ChallengeStatus};
use crate::error::{ActionError, CoreError, Result};
use crate::ledger::{self, DailySaving, RemoteProfileRequest, WaterFootprintLedger, WaterprintProfile};
use crate::storage::Config;
use crate::survey::{Answer, SurveyResult, SurveyScoringEngine};
use crate::task::{self, Achievement, Task};

/// Everything persisted for one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    #[serde(default)]
    pub answers: Vec<Answer>,
    #[serde(default)]
    pub survey: Option<SurveyResult>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
    #[serde(default)]
    pub challenges: Vec<Challenge>,
    #[serde(default)]
    pub profile: Option<WaterprintProfile>,
}

impl SessionState {
    /// Most recent challenge for a category.
    pub fn challenge(&self, category: &CategoryId) -> Option<&Challenge> {
        self.challenges.iter().rev().find(|c| &c.category == category)
    }

    fn challenge_index(&self, category: &CategoryId) -> Result<usize> {
        self.challenges
            .iter()
            .rposition(|c| &c.category == category)
            .ok_or_else(|| {
                ActionError::NoChallenge {
                    category: category.clone(),
                }
                .into()
            })
    }
}

/// A challenge with its derived state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeView {
    pub challenge: Challenge,
    pub status: ChallengeStatus,
    pub total_saved: f64,
    pub percentage: f64,
}

/// Result of logging a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionLogged {
    pub challenge: Challenge,
    /// Set when this day completed the challenge.
    pub outcome: Option<ChallengeOutcome>,
}

/// Runs the engines over a [`SessionState`].
#[derive(Debug, Clone)]
pub struct Session {
    engine: SurveyScoringEngine,
    tracker: ChallengeProgressTracker,
    ledger: WaterFootprintLedger,
    state: SessionState,
}

impl Session {
    pub fn new(
        engine: SurveyScoringEngine,
        tracker: ChallengeProgressTracker,
        ledger: WaterFootprintLedger,
        state: SessionState,
    ) -> Self {
        Self {
            engine,
            tracker,
            ledger,
            state,
        }
    }

    /// Engines configured from `config`, with the built-in questionnaire.
    pub fn from_config(config: &Config, state: SessionState) -> Self {
        Self::new(
            SurveyScoringEngine::default(),
            config.tracker(),
            config.ledger(),
            state,
        )
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn into_state(self) -> SessionState {
        self.state
    }

    pub fn engine(&self) -> &SurveyScoringEngine {
        &self.engine
    }

    pub fn tracker(&self) -> &ChallengeProgressTracker {
        &self.tracker
    }

    /// Score a survey and start over from its baseline.
    ///
    /// Replaces answers, tasks and challenges, creates a profile at the
    /// survey's total usage and folds the survey's achievements into it.
    /// Achievements earned through challenges are kept; those that came from
    /// the previous survey are replaced by the new survey's.
    pub fn submit_survey(&mut self, answers: Vec<Answer>, now: DateTime<Utc>) -> Result<&SurveyResult> {
        let result = self.engine.score(&answers, now)?;

        let mut profile = self.ledger.create_profile(result.total_usage, now);
        for achievement in &result.achievements {
            profile = self.ledger.apply_achievement(Some(&profile), achievement, now)?;
        }

        let previous = self
            .state
            .survey
            .as_ref()
            .map(|s| s.achievements.as_slice())
            .unwrap_or_default();
        let mut achievements: Vec<Achievement> = self
            .state
            .achievements
            .iter()
            .filter(|a| !previous.contains(a))
            .cloned()
            .collect();
        achievements.extend(result.achievements.iter().cloned());

        self.state = SessionState {
            answers,
            tasks: result.tasks.clone(),
            achievements,
            challenges: Vec::new(),
            profile: Some(profile),
            survey: None,
        };
        Ok(self.state.survey.insert(result))
    }

    /// Start a challenge in `category`.
    ///
    /// # Errors
    /// `UnknownProfile` before a survey was submitted, `InvalidAction` if the
    /// category already has an active challenge.
    pub fn start_challenge(
        &mut self,
        category: CategoryId,
        start_date: NaiveDate,
        target: Option<f64>,
        today: NaiveDate,
    ) -> Result<&Challenge> {
        if self.state.profile.is_none() {
            return Err(CoreError::UnknownProfile);
        }
        if let Some(existing) = self.state.challenge(&category) {
            if self.tracker.status(existing, today) == ChallengeStatus::Active {
                return Err(ActionError::ChallengeAlreadyActive { category }.into());
            }
        }

        let challenge = match target {
            Some(target) => self.tracker.start_with_target(category, start_date, target)?,
            None => self.tracker.start(category, start_date)?,
        };
        self.state.challenges.push(challenge);
        let last = self.state.challenges.len() - 1;
        Ok(&self.state.challenges[last])
    }

    /// Start challenges for every improvement area without an active one.
    pub fn plan_challenges(&mut self, start_date: NaiveDate, today: NaiveDate) -> Result<Vec<Challenge>> {
        if self.state.profile.is_none() {
            return Err(CoreError::UnknownProfile);
        }
        let Some(survey) = self.state.survey.as_ref() else {
            return Ok(Vec::new());
        };

        let planned: Vec<Challenge> = self
            .tracker
            .plan_for(survey, start_date)?
            .into_iter()
            .filter(|c| {
                self.state
                    .challenge(&c.category)
                    .map_or(true, |existing| {
                        self.tracker.status(existing, today) != ChallengeStatus::Active
                    })
            })
            .collect();

        self.state.challenges.extend(planned.iter().cloned());
        Ok(planned)
    }

    /// Log `saved` liters as the next day of the category's challenge.
    ///
    /// When this completes the challenge it is concluded right away.
    pub fn log_action(
        &mut self,
        category: &CategoryId,
        saved: f64,
        date: NaiveDate,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<ActionLogged> {
        let idx = self.state.challenge_index(category)?;
        let current = &self.state.challenges[idx];
        self.tracker.ensure_open(current, today)?;

        let updated = self
            .tracker
            .record_daily_action(current, current.next_day(), saved, date)?;

        if updated.status == ChallengeStatus::Completed {
            let outcome = self.conclude_at(idx, updated, now)?;
            return Ok(ActionLogged {
                challenge: outcome.challenge.clone(),
                outcome: Some(outcome),
            });
        }

        self.state.challenges[idx] = updated.clone();
        Ok(ActionLogged {
            challenge: updated,
            outcome: None,
        })
    }

    /// Finish the category's challenge now, whatever its progress.
    pub fn finish_challenge(&mut self, category: &CategoryId, now: DateTime<Utc>) -> Result<ChallengeOutcome> {
        let idx = self.state.challenge_index(category)?;
        let challenge = self.state.challenges[idx].clone();
        self.conclude_at(idx, challenge, now)
    }

    fn conclude_at(&mut self, idx: usize, challenge: Challenge, now: DateTime<Utc>) -> Result<ChallengeOutcome> {
        let outcome = self.tracker.conclude(&challenge, &self.state.tasks, now)?;

        let profile = match &outcome.achievement {
            Some(achievement) => Some(self.ledger.apply_achievement(
                self.state.profile.as_ref(),
                achievement,
                now,
            )?),
            None => self.state.profile.clone(),
        };

        self.state.challenges[idx] = outcome.challenge.clone();
        self.state.tasks = outcome.tasks.clone();
        if let Some(achievement) = &outcome.achievement {
            self.state.achievements.push(achievement.clone());
        }
        self.state.profile = profile;
        Ok(outcome)
    }

    /// Apply a manual task completion to the profile.
    pub fn complete_task(
        &mut self,
        task_id: &str,
        waterprint_reduction: f64,
        now: DateTime<Utc>,
    ) -> Result<&WaterprintProfile> {
        let profile = self.ledger.apply_task_completion(
            self.state.profile.as_ref(),
            task_id,
            waterprint_reduction,
            now,
        )?;
        Ok(self.state.profile.insert(profile))
    }

    /// Every challenge with its derived status.
    pub fn challenge_views(&self, today: NaiveDate) -> Vec<ChallengeView> {
        self.state
            .challenges
            .iter()
            .map(|c| ChallengeView {
                challenge: c.clone(),
                status: self.tracker.status(c, today),
                total_saved: c.total_saved(),
                percentage: c.completion_percentage(),
            })
            .collect()
    }

    pub fn pending_task_count(&self) -> usize {
        task::pending_count(&self.state.tasks)
    }

    pub fn reminder_due(&self, config: &Config) -> bool {
        config.reminder_due(self.pending_task_count())
    }

    /// Achievement savings per day over the trailing `days` days.
    pub fn daily_savings(&self, today: NaiveDate, days: u32) -> Result<Vec<DailySaving>> {
        ledger::daily_savings(&self.state.achievements, today, days)
    }

    /// Body for the backend's create-profile call.
    pub fn remote_profile_request(&self) -> Result<RemoteProfileRequest> {
        let profile = self.state.profile.as_ref().ok_or(CoreError::UnknownProfile)?;
        Ok(RemoteProfileRequest::new(
            profile.initial_waterprint,
            self.state.answers.clone(),
        ))
    }
}
