//! Survey scoring.
//!
//! Turns an ordered sequence of answered questions into a footprint baseline
//! plus the tasks and achievements the answers imply.
//!
//! ## Option model
//!
//! On the wire an option is a flat record whose `type` may be `"Task"`,
//! `"Achievement"` or `null`. In memory it is an [`AnswerOption`] variant so
//! that a Task or Achievement option always carries its category and task
//! text. Records that set `type` without those fields are rejected at
//! deserialization.
//!
//! ## Ordering
//!
//! Sums are order independent. `improvement_areas` is not: it lists each
//! Task category once, in the order its first Task appeared.

mod questionnaire;

pub use questionnaire::{Gate, Questionnaire, SavingInconsistency};

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::CategoryId;
use crate::error::{AnswerError, Result};
use crate::task::{Achievement, Task};

/// A survey question. Category-less questions only gate other questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: u32,
    pub category: Option<CategoryId>,
    pub text: String,
    pub options: Vec<AnswerOption>,
    /// Only ask this question when another question was answered a given way.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<Gate>,
}

impl Question {
    pub fn has_option(&self, option: &AnswerOption) -> bool {
        self.options.iter().any(|o| o == option)
    }

    pub fn option_by_text(&self, text: &str) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.text() == text)
    }
}

/// Payload shared by Task and Achievement options.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOption {
    pub text: String,
    pub value_total: f64,
    pub value_saving: f64,
    pub category: CategoryId,
    /// Task text, or the achievement message.
    pub task: String,
}

/// An option with no follow-up, e.g. the answers of a gating question.
#[derive(Debug, Clone, PartialEq)]
pub struct NeutralOption {
    pub text: String,
    pub value_total: f64,
    pub value_saving: f64,
}

/// One answer choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OptionRecord", into = "OptionRecord")]
pub enum AnswerOption {
    Task(ActionOption),
    Achievement(ActionOption),
    Neutral(NeutralOption),
}

impl AnswerOption {
    pub fn text(&self) -> &str {
        match self {
            AnswerOption::Task(o) | AnswerOption::Achievement(o) => &o.text,
            AnswerOption::Neutral(o) => &o.text,
        }
    }

    pub fn value_total(&self) -> f64 {
        match self {
            AnswerOption::Task(o) | AnswerOption::Achievement(o) => o.value_total,
            AnswerOption::Neutral(o) => o.value_total,
        }
    }

    /// Raw saving as recorded in the question data; may be negative.
    pub fn value_saving(&self) -> f64 {
        match self {
            AnswerOption::Task(o) | AnswerOption::Achievement(o) => o.value_saving,
            AnswerOption::Neutral(o) => o.value_saving,
        }
    }

    pub fn category(&self) -> Option<&CategoryId> {
        match self {
            AnswerOption::Task(o) | AnswerOption::Achievement(o) => Some(&o.category),
            AnswerOption::Neutral(_) => None,
        }
    }

    /// Saving that may be applied to the footprint: never below zero and
    /// never above the option's own total.
    pub fn realized_saving(&self) -> f64 {
        self.value_saving().min(self.value_total()).max(0.0)
    }

    /// True when the raw saving exceeds the option's total usage.
    pub fn saving_exceeds_total(&self) -> bool {
        self.value_saving() > self.value_total()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum OptionKind {
    Task,
    Achievement,
}

/// Flat wire shape of an option.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionRecord {
    text: String,
    value_total: f64,
    value_saving: f64,
    #[serde(rename = "type")]
    kind: Option<OptionKind>,
    #[serde(default)]
    category: Option<CategoryId>,
    #[serde(default)]
    task: Option<String>,
}

impl TryFrom<OptionRecord> for AnswerOption {
    type Error = String;

    fn try_from(r: OptionRecord) -> Result<Self, Self::Error> {
        let Some(kind) = r.kind else {
            return Ok(AnswerOption::Neutral(NeutralOption {
                text: r.text,
                value_total: r.value_total,
                value_saving: r.value_saving,
            }));
        };
        let category = r
            .category
            .ok_or_else(|| format!("option '{}' has a type but no category", r.text))?;
        let task = r
            .task
            .ok_or_else(|| format!("option '{}' has a type but no task", r.text))?;
        let payload = ActionOption {
            text: r.text,
            value_total: r.value_total,
            value_saving: r.value_saving,
            category,
            task,
        };
        Ok(match kind {
            OptionKind::Task => AnswerOption::Task(payload),
            OptionKind::Achievement => AnswerOption::Achievement(payload),
        })
    }
}

impl From<AnswerOption> for OptionRecord {
    fn from(option: AnswerOption) -> Self {
        let (kind, payload) = match option {
            AnswerOption::Task(o) => (OptionKind::Task, o),
            AnswerOption::Achievement(o) => (OptionKind::Achievement, o),
            AnswerOption::Neutral(o) => {
                return OptionRecord {
                    text: o.text,
                    value_total: o.value_total,
                    value_saving: o.value_saving,
                    kind: None,
                    category: None,
                    task: None,
                }
            }
        };
        OptionRecord {
            text: payload.text,
            value_total: payload.value_total,
            value_saving: payload.value_saving,
            kind: Some(kind),
            category: Some(payload.category),
            task: Some(payload.task),
        }
    }
}

/// A chosen option for a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: u32,
    pub option: AnswerOption,
}

impl Answer {
    pub fn new(question_id: u32, option: AnswerOption) -> Self {
        Self {
            question_id,
            option,
        }
    }

    /// Answer `question` with its option at `index`.
    pub fn select(question: &Question, index: usize) -> Result<Self> {
        let option = question
            .options
            .get(index)
            .ok_or(AnswerError::OptionIndexOutOfRange {
                question_id: question.id,
                index,
                len: question.options.len(),
            })?;
        Ok(Self::new(question.id, option.clone()))
    }
}

/// Outcome of scoring a survey.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResult {
    pub total_usage: f64,
    pub total_saving: f64,
    pub tasks: Vec<Task>,
    pub achievements: Vec<Achievement>,
    pub improvement_areas: Vec<CategoryId>,
}

/// Fold options into a result, in the given order. No validation.
pub fn tally<'a, I>(options: I, now: DateTime<Utc>) -> SurveyResult
where
    I: IntoIterator<Item = &'a AnswerOption>,
{
    let mut result = SurveyResult::default();
    let mut seen: HashSet<CategoryId> = HashSet::new();

    for option in options {
        result.total_usage += option.value_total();
        // Raw saving, including baseline penalties
        result.total_saving += option.value_saving();

        match option {
            AnswerOption::Task(o) => {
                result
                    .tasks
                    .push(Task::new(o.task.clone(), o.category.clone(), now));
                if seen.insert(o.category.clone()) {
                    result.improvement_areas.push(o.category.clone());
                }
            }
            AnswerOption::Achievement(o) => {
                if option.saving_exceeds_total() {
                    warn!(
                        option = %o.text,
                        value_total = o.value_total,
                        value_saving = o.value_saving,
                        "option saving exceeds its total; realized saving capped"
                    );
                }
                result.achievements.push(Achievement::new(
                    o.category.clone(),
                    option.realized_saving(),
                    o.task.clone(),
                    now,
                ));
            }
            AnswerOption::Neutral(_) => {}
        }
    }

    result
}

/// Scores answers against a questionnaire.
#[derive(Debug, Clone)]
pub struct SurveyScoringEngine {
    questionnaire: Questionnaire,
}

impl Default for SurveyScoringEngine {
    fn default() -> Self {
        Self::new(Questionnaire::builtin())
    }
}

impl SurveyScoringEngine {
    pub fn new(questionnaire: Questionnaire) -> Self {
        Self { questionnaire }
    }

    pub fn questionnaire(&self) -> &Questionnaire {
        &self.questionnaire
    }

    /// Validate every answer, then fold them into a [`SurveyResult`].
    ///
    /// # Errors
    /// `InvalidAnswer` if the sequence is empty, names an unknown question,
    /// or picks an option that does not belong to its question. Nothing is
    /// produced unless every answer is valid.
    pub fn score(&self, answers: &[Answer], now: DateTime<Utc>) -> Result<SurveyResult> {
        self.validate(answers)?;
        let result = tally(answers.iter().map(|a| &a.option), now);
        info!(
            answers = answers.len(),
            total_usage = result.total_usage,
            total_saving = result.total_saving,
            tasks = result.tasks.len(),
            achievements = result.achievements.len(),
            "survey scored"
        );
        Ok(result)
    }

    fn validate(&self, answers: &[Answer]) -> Result<(), AnswerError> {
        if answers.is_empty() {
            return Err(AnswerError::EmptySubmission);
        }
        for answer in answers {
            let question = self.questionnaire.question(answer.question_id).ok_or(
                AnswerError::UnknownQuestion {
                    question_id: answer.question_id,
                },
            )?;
            if !question.has_option(&answer.option) {
                return Err(AnswerError::OptionNotInQuestion {
                    question_id: answer.question_id,
                    option: answer.option.text().to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn task_option(text: &str, total: f64, saving: f64, category: &str) -> AnswerOption {
        AnswerOption::Task(ActionOption {
            text: text.to_string(),
            value_total: total,
            value_saving: saving,
            category: category.into(),
            task: format!("Improve {category}"),
        })
    }

    fn two_question_engine() -> SurveyScoringEngine {
        let questions = vec![
            Question {
                id: 1,
                category: Some("Shower".into()),
                text: "Shower length?".into(),
                options: vec![task_option("Long", 20.0, 10.0, "Shower")],
                requires: None,
            },
            Question {
                id: 2,
                category: Some("Dishwashing".into()),
                text: "Dishes?".into(),
                options: vec![task_option("Running tap", 45.0, 15.0, "Dishwashing")],
                requires: None,
            },
        ];
        SurveyScoringEngine::new(Questionnaire::new(questions))
    }

    #[test]
    fn shower_and_dishwashing_scenario() {
        let engine = two_question_engine();
        let q = engine.questionnaire();
        let answers = vec![
            Answer::select(q.question(1).unwrap(), 0).unwrap(),
            Answer::select(q.question(2).unwrap(), 0).unwrap(),
        ];
        let result = engine.score(&answers, Utc::now()).unwrap();
        assert_eq!(result.total_usage, 65.0);
        assert_eq!(result.total_saving, 25.0);
        assert_eq!(
            result.improvement_areas,
            vec![CategoryId::from("Shower"), CategoryId::from("Dishwashing")]
        );
        assert_eq!(result.tasks.len(), 2);
        assert!(result.achievements.is_empty());
    }

    #[test]
    fn empty_submission_rejected() {
        let err = two_question_engine().score(&[], Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidAnswer(AnswerError::EmptySubmission)
        ));
    }

    #[test]
    fn foreign_option_rejected() {
        let engine = two_question_engine();
        let answers = vec![Answer::new(1, task_option("Running tap", 45.0, 15.0, "Dishwashing"))];
        let err = engine.score(&answers, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidAnswer(AnswerError::OptionNotInQuestion { question_id: 1, .. })
        ));
    }

    #[test]
    fn unknown_question_rejected() {
        let engine = two_question_engine();
        let answers = vec![Answer::new(99, task_option("Long", 20.0, 10.0, "Shower"))];
        let err = engine.score(&answers, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidAnswer(AnswerError::UnknownQuestion { question_id: 99 })
        ));
    }

    #[test]
    fn negative_saving_is_summed_raw() {
        let penalty = AnswerOption::Neutral(NeutralOption {
            text: "Sprinkler at noon".into(),
            value_total: 100.0,
            value_saving: -10.0,
        });
        let shower = task_option("Long", 20.0, 10.0, "Shower");
        let result = tally([&penalty, &shower], Utc::now());
        assert_eq!(result.total_usage, 120.0);
        assert_eq!(result.total_saving, 0.0);
        assert_eq!(result.improvement_areas, vec![CategoryId::from("Shower")]);
    }

    #[test]
    fn achievements_do_not_create_improvement_areas() {
        let done = AnswerOption::Achievement(ActionOption {
            text: "Dual flush".into(),
            value_total: 20.0,
            value_saving: 4.0,
            category: "Toilet".into(),
            task: "You already use a dual flush".into(),
        });
        let result = tally([&done], Utc::now());
        assert!(result.improvement_areas.is_empty());
        assert_eq!(result.achievements.len(), 1);
        assert_eq!(result.achievements[0].improvement, 4.0);
        assert_eq!(result.achievements[0].message, "You already use a dual flush");
    }

    #[test]
    fn achievement_improvement_capped_at_total() {
        let odd = AnswerOption::Achievement(ActionOption {
            text: "Yes".into(),
            value_total: 2.0,
            value_saving: 3.0,
            category: "Tap".into(),
            task: "Tap off while brushing".into(),
        });
        let result = tally([&odd], Utc::now());
        // Raw saving is preserved in the sum
        assert_eq!(result.total_saving, 3.0);
        assert_eq!(result.achievements[0].improvement, 2.0);
    }

    #[test]
    fn repeated_category_listed_once_in_first_seen_order() {
        let options = [
            task_option("a", 1.0, 1.0, "Laundry"),
            task_option("b", 1.0, 1.0, "Shower"),
            task_option("c", 1.0, 1.0, "Laundry"),
            task_option("d", 1.0, 1.0, "Garden"),
        ];
        let result = tally(options.iter(), Utc::now());
        let areas: Vec<&str> = result.improvement_areas.iter().map(|c| c.as_str()).collect();
        assert_eq!(areas, ["Laundry", "Shower", "Garden"]);
        assert_eq!(result.tasks.len(), 4);
    }

    #[test]
    fn option_wire_format_round_trips() {
        let json = r#"{"text":"Hose","valueTotal":25,"valueSaving":15,"type":"Task","category":"CarWash","task":"Use a bucket"}"#;
        let option: AnswerOption = serde_json::from_str(json).unwrap();
        assert!(matches!(&option, AnswerOption::Task(o) if o.category.as_str() == "CarWash"));

        let neutral = r#"{"text":"No","valueTotal":0,"valueSaving":0,"type":null,"category":null,"task":null}"#;
        let option: AnswerOption = serde_json::from_str(neutral).unwrap();
        assert!(matches!(option, AnswerOption::Neutral(_)));
        let back = serde_json::to_value(&option).unwrap();
        assert!(back["type"].is_null());
    }

    #[test]
    fn typed_option_without_category_rejected() {
        let json = r#"{"text":"Hose","valueTotal":25,"valueSaving":15,"type":"Task","task":"Use a bucket"}"#;
        assert!(serde_json::from_str::<AnswerOption>(json).is_err());
    }
}
