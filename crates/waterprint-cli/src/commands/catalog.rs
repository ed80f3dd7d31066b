use clap::Subcommand;
use serde::Serialize;
use waterprint_core::Config;

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum CatalogAction {
    /// List categories with their daily caps, including config overrides
    List,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CategoryRow<'a> {
    category: &'a str,
    daily_cap: f64,
    descriptor: &'a str,
    /// Default challenge target for the configured duration.
    target: f64,
}

pub fn run(action: CatalogAction) -> CmdResult {
    match action {
        CatalogAction::List => {
            let config = Config::load()?;
            let catalog = config.catalog();
            let days = f64::from(config.challenge.duration_days);
            let rows: Vec<_> = catalog
                .iter()
                .map(|(id, info)| CategoryRow {
                    category: id.as_str(),
                    daily_cap: info.daily_cap,
                    descriptor: &info.descriptor,
                    target: info.daily_cap * days,
                })
                .collect();
            print_json(&rows)
        }
    }
}
