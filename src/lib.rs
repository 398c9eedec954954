pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod logging;
pub mod marker;
pub mod matcher;
pub mod model;
pub mod stats;
pub mod sync;

pub use config::{Project, Settings};
pub use error::{GitmetaError, Result};
pub use stats::StatsService;
pub use sync::SyncOrchestrator;
