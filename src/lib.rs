//! Reports on pull requests against an enhancement-proposal repository:
//! which group owns them, whether they carry LGTM and priority, and whether
//! they have gone stale.

pub mod command;
pub mod config;
pub mod enhancements;
pub mod github;
pub mod report;
pub mod stats;
