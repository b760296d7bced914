//! Hackathon API access.
//!
//! `client` speaks HTTP; `scenarios` composes the calls into the workflows
//! the CLI exposes.

pub mod client;
pub mod scenarios;

pub use client::HackathonClient;
pub use scenarios::{datadog_payloads, dump_slack, fetch_all_scenarios};
