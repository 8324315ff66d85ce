//! Contact enrichment: parse pasted contacts, find each organization's leader,
//! and let an operator pick when the directory returns several people.

pub mod config;
pub mod contacts;
pub mod error;
pub mod gate;
pub mod lookup;
pub mod orchestrator;
pub mod report;
pub mod server;
