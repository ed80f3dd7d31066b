use chrono::Utc;
use clap::Subcommand;
use waterprint_core::{Answer, Questionnaire};

use super::{print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum SurveyAction {
    /// List every question with its options
    Questions,
    /// Questions still to answer after the stored answers
    Pending,
    /// Answer the survey and reset the profile to its result
    Submit {
        /// Option index for each question as it comes up, e.g. "2,2,0,1"
        #[arg(value_delimiter = ',', required = true)]
        choices: Vec<usize>,
    },
    /// Show the stored survey result
    Result,
    /// Options whose saving is larger than their total
    Audit,
}

pub fn run(action: SurveyAction) -> CmdResult {
    match action {
        SurveyAction::Questions => print_json(Questionnaire::builtin().questions()),
        SurveyAction::Pending => {
            let ctx = Context::open()?;
            let bank = ctx.session.engine().questionnaire();
            print_json(&bank.pending(&ctx.session.state().answers))
        }
        SurveyAction::Submit { choices } => {
            let mut ctx = Context::open()?;
            let answers = answers_from_choices(ctx.session.engine().questionnaire(), &choices)?;
            let result = ctx.session.submit_survey(answers, Utc::now())?.clone();
            ctx.save()?;
            print_json(&result)
        }
        SurveyAction::Result => {
            let ctx = Context::open()?;
            match &ctx.session.state().survey {
                Some(result) => print_json(result),
                None => Err("no survey submitted yet".into()),
            }
        }
        SurveyAction::Audit => print_json(&Questionnaire::builtin().audit()),
    }
}

/// Walk the pending questions in order, picking one option index for each.
///
/// Gates are re-evaluated after every answer, so a choice that closes a gate
/// skips the questions behind it.
fn answers_from_choices(bank: &Questionnaire, choices: &[usize]) -> CmdResult<Vec<Answer>> {
    let mut answers = Vec::with_capacity(choices.len());
    for &index in choices {
        let question = bank.pending(&answers).into_iter().next().ok_or_else(|| {
            format!(
                "{} choices given but only {} questions apply",
                choices.len(),
                answers.len()
            )
        })?;
        answers.push(Answer::select(question, index)?);
    }
    Ok(answers)
}
