//! Question bank.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{ActionOption, Answer, AnswerOption, NeutralOption, Question};
use crate::catalog::CategoryId;
use crate::error::Result;

/// Ask a question only when `question_id` was answered with `option`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gate {
    pub question_id: u32,
    pub option: String,
}

impl Gate {
    fn is_open(&self, answers: &[Answer]) -> bool {
        answers
            .iter()
            .any(|a| a.question_id == self.question_id && a.option.text() == self.option)
    }
}

/// An option whose saving is larger than its total usage.
///
/// Reported as-is; the raw values are never corrected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingInconsistency {
    pub question_id: u32,
    pub option: String,
    pub value_total: f64,
    pub value_saving: f64,
}

/// Ordered set of survey questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Questionnaire {
    questions: Vec<Question>,
}

impl Questionnaire {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, id: u32) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Unanswered questions that should be asked next, in bank order.
    pub fn pending(&self, answers: &[Answer]) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| !answers.iter().any(|a| a.question_id == q.id))
            .filter(|q| q.requires.as_ref().map_or(true, |g| g.is_open(answers)))
            .collect()
    }

    /// Every option whose saving exceeds its total.
    pub fn audit(&self) -> Vec<SavingInconsistency> {
        self.questions
            .iter()
            .flat_map(|q| {
                q.options
                    .iter()
                    .filter(|o| o.saving_exceeds_total())
                    .map(move |o| SavingInconsistency {
                        question_id: q.id,
                        option: o.text().to_string(),
                        value_total: o.value_total(),
                        value_saving: o.value_saving(),
                    })
            })
            .collect()
    }

    /// The default water-usage survey. Values are liters per day.
    pub fn builtin() -> Self {
        Self::new(vec![
            Question {
                id: 1,
                category: Some("Shower".into()),
                text: "How long are your showers?".into(),
                options: vec![
                    achievement("Under 5 minutes", 20.0, 5.0, "Shower", "You already keep your showers short"),
                    task("5 to 10 minutes", 35.0, 10.0, "Shower", "Bring your showers under 5 minutes"),
                    task("Over 10 minutes", 50.0, 20.0, "Shower", "Bring your showers under 5 minutes"),
                ],
                requires: None,
            },
            Question {
                id: 2,
                category: Some("Dishwashing".into()),
                text: "How do you wash your dishes?".into(),
                options: vec![
                    achievement("Dishwasher, full loads only", 15.0, 5.0, "Dishwashing", "You only run full dishwasher loads"),
                    task("Dishwasher, whenever", 30.0, 10.0, "Dishwashing", "Only run the dishwasher when it is full"),
                    task("By hand under a running tap", 45.0, 15.0, "Dishwashing", "Fill a basin instead of running the tap"),
                ],
                requires: None,
            },
            Question {
                id: 3,
                category: Some("Laundry".into()),
                text: "How full is the washing machine when you run it?".into(),
                options: vec![
                    achievement("Always full", 25.0, 5.0, "Laundry", "You already wash full loads"),
                    task("Often half empty", 45.0, 20.0, "Laundry", "Wait for a full load before washing"),
                ],
                requires: None,
            },
            Question {
                id: 4,
                category: Some("Toilet".into()),
                text: "Does your toilet have a dual flush?".into(),
                options: vec![
                    achievement("Yes", 20.0, 4.0, "Toilet", "You use a dual-flush toilet"),
                    task("No", 30.0, 8.0, "Toilet", "Put a displacement bottle in the cistern"),
                ],
                requires: None,
            },
            Question {
                id: 5,
                category: Some("Tap".into()),
                text: "Do you turn the tap off while brushing your teeth?".into(),
                options: vec![
                    achievement("Yes", 2.0, 3.0, "Tap", "You turn the tap off while brushing"),
                    task("No", 12.0, 8.0, "Tap", "Turn the tap off while brushing"),
                ],
                requires: None,
            },
            Question {
                id: 6,
                category: None,
                text: "Do you have a garden?".into(),
                options: vec![neutral("Yes", 0.0, 0.0), neutral("No", 0.0, 0.0)],
                requires: None,
            },
            Question {
                id: 7,
                category: Some("Garden".into()),
                text: "How do you water your garden?".into(),
                options: vec![
                    achievement("Drip irrigation", 25.0, 5.0, "Garden", "You water with drip irrigation"),
                    task("Hose every day", 80.0, 30.0, "Garden", "Water every other day in the evening"),
                    neutral("Sprinkler at midday", 100.0, -10.0),
                ],
                requires: Some(Gate {
                    question_id: 6,
                    option: "Yes".into(),
                }),
            },
            Question {
                id: 8,
                category: Some("CarWash".into()),
                text: "How do you wash your car?".into(),
                options: vec![
                    neutral("I don't own a car", 0.0, 0.0),
                    task("With a hose", 25.0, 15.0, "CarWash", "Wash the car with a bucket"),
                    achievement("With a bucket", 8.0, 4.0, "CarWash", "You wash your car with a bucket"),
                    neutral("At a car wash station", 5.0, 0.0),
                ],
                requires: None,
            },
        ])
    }
}

impl Default for Questionnaire {
    fn default() -> Self {
        Self::builtin()
    }
}

fn action(text: &str, total: f64, saving: f64, category: &str, task: &str) -> ActionOption {
    ActionOption {
        text: text.into(),
        value_total: total,
        value_saving: saving,
        category: CategoryId::from(category),
        task: task.into(),
    }
}

fn task(text: &str, total: f64, saving: f64, category: &str, task: &str) -> AnswerOption {
    AnswerOption::Task(action(text, total, saving, category, task))
}

fn achievement(text: &str, total: f64, saving: f64, category: &str, message: &str) -> AnswerOption {
    AnswerOption::Achievement(action(text, total, saving, category, message))
}

fn neutral(text: &str, total: f64, saving: f64) -> AnswerOption {
    AnswerOption::Neutral(NeutralOption {
        text: text.into(),
        value_total: total,
        value_saving: saving,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CategoryCatalog;

    #[test]
    fn garden_question_gated_on_having_a_garden() {
        let bank = Questionnaire::builtin();
        let gate = bank.question(6).unwrap();

        let no = vec![Answer::select(gate, 1).unwrap()];
        assert!(bank.pending(&no).iter().all(|q| q.id != 7));

        let yes = vec![Answer::select(gate, 0).unwrap()];
        assert!(bank.pending(&yes).iter().any(|q| q.id == 7));
    }

    #[test]
    fn pending_skips_answered_questions() {
        let bank = Questionnaire::builtin();
        let answers = vec![Answer::select(bank.question(1).unwrap(), 1).unwrap()];
        let pending: Vec<u32> = bank.pending(&answers).iter().map(|q| q.id).collect();
        assert_eq!(pending, vec![2, 3, 4, 5, 6, 8]);
    }

    #[test]
    fn audit_flags_saving_above_total() {
        let flagged = Questionnaire::builtin().audit();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].question_id, 5);
        assert_eq!(flagged[0].value_total, 2.0);
        assert_eq!(flagged[0].value_saving, 3.0);
    }

    #[test]
    fn gating_question_options_are_neutral() {
        let bank = Questionnaire::builtin();
        for q in bank.questions().iter().filter(|q| q.category.is_none()) {
            for o in &q.options {
                assert!(matches!(o, AnswerOption::Neutral(_)));
                assert_eq!(o.value_total(), 0.0);
                assert_eq!(o.value_saving(), 0.0);
            }
        }
    }

    #[test]
    fn builtin_categories_are_registered() {
        let catalog = CategoryCatalog::builtin();
        for q in Questionnaire::builtin().questions() {
            for o in &q.options {
                if let Some(category) = o.category() {
                    assert!(catalog.contains(category), "{category} missing from catalog");
                }
            }
        }
    }

    #[test]
    fn json_round_trip_preserves_questions() {
        let bank = Questionnaire::builtin();
        let json = serde_json::to_string(&bank).unwrap();
        let parsed = Questionnaire::from_json(&json).unwrap();
        assert_eq!(parsed, bank);
    }
}
