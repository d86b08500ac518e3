//! Multi-device sync: the pull-merge-push protocol and the service that
//! guards and reports on it.

mod orchestrator;
mod service;
mod status;

pub use orchestrator::*;
pub use service::*;
pub use status::*;
