pub mod history;
pub mod locate;
pub mod walker;

#[cfg(test)]
pub(crate) mod testutil;

pub use history::{GixHistory, HistoryError, HistorySource};
pub use locate::{discover, repo_name};
pub use walker::CommitWalker;
