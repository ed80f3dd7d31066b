//! Waterprint profile commands.
//!
//! Shows the ledger and applies manual task completions. Every ledger entry
//! is also queued in the local outbox for the backend profile API.

use chrono::Utc;
use clap::Subcommand;
use uuid::Uuid;
use waterprint_core::CoreError;

use super::{print_json, today, with_session, CmdResult, Context};

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show the current profile
    Show,

    /// Apply a completed task to the footprint
    Complete {
        /// Liters per day the task removes (negative adds)
        #[arg(allow_negative_numbers = true)]
        reduction: f64,
        /// Task identifier (default: a fresh UUID)
        #[arg(long)]
        task_id: Option<String>,
    },

    /// Footprint history, oldest first
    History,

    /// Achievement savings per day over a trailing window
    Savings {
        /// Window length (default: history.trailing_days)
        #[arg(long)]
        days: Option<u32>,
        /// Bucket ledger reductions instead of achievements
        #[arg(long)]
        ledger: bool,
    },

    /// Body for the backend create-profile call
    Request,

    /// Ledger updates not yet sent to the backend
    Outbox,

    /// Mark a queued update as sent
    Ack {
        /// Outbox entry id
        id: i64,
    },
}

pub fn run(action: ProfileAction) -> CmdResult {
    match action {
        ProfileAction::Show => {
            let ctx = Context::open()?;
            let profile = ctx
                .session
                .state()
                .profile
                .as_ref()
                .ok_or(CoreError::UnknownProfile)?;
            print_json(profile)
        }
        ProfileAction::Complete { reduction, task_id } => {
            let task_id = task_id.unwrap_or_else(|| Uuid::new_v4().to_string());
            let profile =
                with_session(|s| s.complete_task(&task_id, reduction, Utc::now()).cloned())?;
            print_json(&profile)
        }
        ProfileAction::History => {
            let ctx = Context::open()?;
            let profile = ctx
                .session
                .state()
                .profile
                .as_ref()
                .ok_or(CoreError::UnknownProfile)?;
            print_json(&profile.progress_history)
        }
        ProfileAction::Savings { days, ledger } => {
            let ctx = Context::open()?;
            let days = days.unwrap_or(ctx.config.history.trailing_days);
            if !ledger {
                return print_json(&ctx.session.daily_savings(today(), days)?);
            }
            let profile = ctx
                .session
                .state()
                .profile
                .as_ref()
                .ok_or(CoreError::UnknownProfile)?;
            print_json(&profile.daily_reductions(today(), days)?)
        }
        ProfileAction::Request => {
            let ctx = Context::open()?;
            print_json(&ctx.session.remote_profile_request()?)
        }
        ProfileAction::Outbox => {
            let ctx = Context::open()?;
            print_json(&ctx.db.pending_updates()?)
        }
        ProfileAction::Ack { id } => {
            let ctx = Context::open()?;
            if !ctx.db.mark_synced(id, Utc::now())? {
                return Err(format!("no pending update with id {id}").into());
            }
            println!("ok");
            Ok(())
        }
    }
}
