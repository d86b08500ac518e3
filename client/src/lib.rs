//! BoekLog client: a local book catalogue in SQLite, synchronized across
//! devices through one JSON file in a GitHub repository.
//!
//! - [`db`]: the local record store and settings
//! - [`remote`]: the versioned remote file (GitHub contents API)
//! - [`sync`]: pull, merge with [`boeklog_engine`], push, and the guarded
//!   service around it
//! - [`handlers`]: the commands of the `boeklog` binary

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod remote;
pub mod sync;
