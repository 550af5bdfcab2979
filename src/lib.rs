//! The `pt` command-line front end for the project tracker.
//!
//! Storage, reference resolution, status transitions and commit parsing live
//! in `tracker-core`; this crate adds the terminal surface, configuration and
//! the HTTP client for the AI collaborator.

pub mod ai;
pub mod cli;
pub mod config;
