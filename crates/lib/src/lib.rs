//! Disclose core library: skill discovery and loading, the assistant turn loop, and the
//! configuration shared with the CLI.

pub mod assistant;
pub mod config;
pub mod conversation;
pub mod disclosure;
pub mod init;
pub mod reasoner;
pub mod skills;
