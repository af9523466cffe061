//! ClawHub skill monitor: fetch the newest catalog listing, diff it against
//! every skill seen before, and write a Markdown status report.
//!
//! All state lives in one working directory (`known_skills.json`,
//! `daily_report.md`, `fallback_skills.json`, `monitor.lock`).

pub mod catalog;
pub mod enrich;
pub mod error;
pub mod fetch;
pub mod lock;
pub mod parse;
pub mod pipeline;
pub mod report;
pub mod state;
pub mod types;

mod fsutil;

pub use {
    error::{Error, Result},
    pipeline::Monitor,
    types::{RunOutcome, RunStatus, RunSummary},
};
