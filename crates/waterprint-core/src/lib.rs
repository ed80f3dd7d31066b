//! # Waterprint Core Library
//!
//! Core logic for the waterprint household water-footprint tracker. All
//! operations are available through the standalone `waterprint` CLI, which
//! is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Survey**: scores questionnaire answers into a baseline usage, tasks,
//!   achievements and improvement areas
//! - **Challenges**: fixed-length saving challenges validated against the
//!   category catalog's daily caps
//! - **Ledger**: the user's waterprint profile, reduced by completed tasks
//!   and achievements
//! - **Storage**: SQLite session snapshot plus TOML configuration
//!
//! Engines are pure: they take the prior state and return the next one.
//! [`Session`] strings them together and [`SessionStore`] persists the result.
//!
//! ## Key Components
//!
//! - [`SurveyScoringEngine`]: answer validation and scoring
//! - [`ChallengeProgressTracker`]: challenge lifecycle
//! - [`WaterFootprintLedger`]: footprint accounting
//! - [`CategoryCatalog`]: per-category daily caps and descriptors

pub mod catalog;
pub mod challenge;
pub mod error;
pub mod ledger;
pub mod session;
pub mod storage;
pub mod survey;
pub mod task;

pub use catalog::{CategoryCatalog, CategoryId, CategoryInfo};
pub use challenge::{Challenge, ChallengeOutcome, ChallengeProgressTracker, ChallengeStatus, DailyAction};
pub use error::{ActionError, AnswerError, ConfigError, CoreError, DatabaseError, Result};
pub use ledger::{RemoteProfileRequest, RemoteUpdate, WaterFootprintLedger, WaterprintProfile};
pub use session::{ActionLogged, ChallengeView, Session, SessionState};
pub use storage::{Config, Database, MemoryStore, SessionStore};
pub use survey::{Answer, AnswerOption, Question, Questionnaire, SurveyResult, SurveyScoringEngine};
pub use task::{Achievement, Task};
