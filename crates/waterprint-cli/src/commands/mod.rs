pub mod catalog;
pub mod challenge;
pub mod config;
pub mod profile;
pub mod survey;
pub mod task;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use waterprint_core::ledger::RemoteUpdate;
use waterprint_core::{Config, Database, Session, SessionStore};

pub type CmdResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Config, database and the stored session for one command.
pub struct Context {
    pub config: Config,
    pub db: Database,
    pub session: Session,
}

impl Context {
    pub fn open() -> CmdResult<Self> {
        let config = Config::load()?;
        let db = Database::open()?;
        let session = Session::from_config(&config, db.load()?);
        Ok(Self {
            config,
            db,
            session,
        })
    }

    pub fn save(&mut self) -> CmdResult {
        self.db.save(self.session.state())?;
        Ok(())
    }

    /// Number of ledger entries in the current profile.
    pub fn ledger_len(&self) -> usize {
        self.session
            .state()
            .profile
            .as_ref()
            .map_or(0, |p| p.completed_tasks.len())
    }

    /// Backend updates for every ledger entry after the first `since`.
    pub fn ledger_updates_since(&self, since: usize) -> Vec<RemoteUpdate> {
        self.session
            .state()
            .profile
            .as_ref()
            .map(|p| p.completed_tasks.iter().skip(since).map(RemoteUpdate::from).collect())
            .unwrap_or_default()
    }

    /// Save the session and queue ledger entries after the first `since`,
    /// atomically.
    pub fn save_queueing(&mut self, since: usize, now: DateTime<Utc>) -> CmdResult<usize> {
        let updates = self.ledger_updates_since(since);
        self.db.save_with_updates(self.session.state(), &updates, now)?;
        Ok(updates.len())
    }
}

/// Run `f` on the stored session and persist the state only if it succeeds.
///
/// Ledger entries added by `f` are queued for the backend in the same
/// transaction as the save.
pub fn with_session<T>(f: impl FnOnce(&mut Session) -> waterprint_core::Result<T>) -> CmdResult<T> {
    let mut ctx = Context::open()?;
    let since = ctx.ledger_len();
    let out = f(&mut ctx.session)?;
    ctx.save_queueing(since, Utc::now())?;
    Ok(out)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Parse a `YYYY-MM-DD` argument.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("invalid date '{s}': {e}"))
}
