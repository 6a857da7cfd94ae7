//! Batch simulation harness: plays seeded trials of every configured agent
//! against hidden targets and summarises how often and how fast they win.

pub mod analytics;
pub mod config;
pub mod logging;
pub mod runner;
