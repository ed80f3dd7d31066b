//! Task and achievement commands for CLI.

use clap::Subcommand;
use serde::Serialize;

use super::{print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum TaskAction {
    /// List pending tasks
    List {
        /// Only tasks in this category
        #[arg(long)]
        category: Option<String>,
    },
    /// Pending task count and whether a reminder is due
    Count,
    /// List achievements
    Achievements,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskCount {
    pending: usize,
    reminder_due: bool,
}

pub fn run(action: TaskAction) -> CmdResult {
    let ctx = Context::open()?;
    let state = ctx.session.state();

    match action {
        TaskAction::List { category } => {
            let tasks: Vec<_> = state
                .tasks
                .iter()
                .filter(|t| category.as_deref().map_or(true, |c| t.category.as_str() == c))
                .collect();
            print_json(&tasks)
        }
        TaskAction::Count => print_json(&TaskCount {
            pending: ctx.session.pending_task_count(),
            reminder_due: ctx.session.reminder_due(&ctx.config),
        }),
        TaskAction::Achievements => print_json(&state.achievements),
    }
}
