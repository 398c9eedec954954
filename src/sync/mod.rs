pub mod backend;
pub mod catalog;
pub mod exec;
pub mod orchestrator;

pub use backend::{GitCli, SyncBackend};
pub use catalog::{unmatched_repos, RemoteRepo, RepoCatalog};
pub use orchestrator::{PullOutcome, SyncOrchestrator, SyncReport};
