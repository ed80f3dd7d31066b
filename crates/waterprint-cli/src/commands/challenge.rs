use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use waterprint_core::CategoryId;

use super::{parse_date, print_json, today, with_session, CmdResult, Context};

#[derive(Subcommand)]
pub enum ChallengeAction {
    /// Start a challenge in a category
    Start {
        /// Category (e.g. "Shower", "Laundry")
        category: String,
        /// First day, YYYY-MM-DD (default: today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Target saving in liters (default: daily cap times duration)
        #[arg(long)]
        target: Option<f64>,
    },
    /// Log liters saved for the next day of a challenge
    Log {
        category: String,
        /// Liters saved
        #[arg(allow_negative_numbers = true)]
        saved: f64,
        /// Day the saving happened, YYYY-MM-DD (default: today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Show challenges with their progress
    Status {
        /// Only this category
        category: Option<String>,
    },
    /// Finish a challenge now
    Finish { category: String },
    /// Start challenges for every improvement area from the survey
    Plan {
        /// First day, YYYY-MM-DD (default: today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
}

pub fn run(action: ChallengeAction) -> CmdResult {
    let today = today();
    match action {
        ChallengeAction::Start {
            category,
            date,
            target,
        } => {
            let challenge = with_session(|s| {
                s.start_challenge(
                    CategoryId::from(category),
                    date.unwrap_or(today),
                    target,
                    today,
                )
                .cloned()
            })?;
            print_json(&challenge)
        }
        ChallengeAction::Log {
            category,
            saved,
            date,
        } => {
            let category = CategoryId::from(category);
            let logged = with_session(|s| {
                s.log_action(&category, saved, date.unwrap_or(today), today, Utc::now())
            })?;
            print_json(&logged)
        }
        ChallengeAction::Status { category } => {
            let ctx = Context::open()?;
            let views: Vec<_> = ctx
                .session
                .challenge_views(today)
                .into_iter()
                .filter(|v| category.as_deref().map_or(true, |c| v.challenge.category.as_str() == c))
                .collect();
            print_json(&views)
        }
        ChallengeAction::Finish { category } => {
            let category = CategoryId::from(category);
            let outcome = with_session(|s| s.finish_challenge(&category, Utc::now()))?;
            print_json(&outcome)
        }
        ChallengeAction::Plan { date } => {
            let planned = with_session(|s| s.plan_challenges(date.unwrap_or(today), today))?;
            print_json(&planned)
        }
    }
}
