use thiserror::Error;

pub type Result<T> = std::result::Result<T, GitmetaError>;

#[derive(Error, Debug)]
pub enum GitmetaError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Project {0} not found")]
    ProjectNotFound(String),
    #[error("Git error: {0}")]
    Git(#[from] Box<gix::open::Error>),
    #[error("Git history error: {0}")]
    History(String),
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("Sync error: {0}")]
    Sync(String),
    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Object find error: {0}")]
    ObjectFind(#[from] Box<gix::object::find::existing::Error>),
    #[error("Commit error: {0}")]
    Commit(#[from] Box<gix::object::commit::Error>),
}

// Manual From implementations for unboxed to boxed conversions
impl From<gix::open::Error> for GitmetaError {
    fn from(err: gix::open::Error) -> Self {
        GitmetaError::Git(Box::new(err))
    }
}

impl From<gix::object::find::existing::Error> for GitmetaError {
    fn from(err: gix::object::find::existing::Error) -> Self {
        GitmetaError::ObjectFind(Box::new(err))
    }
}

impl From<gix::object::commit::Error> for GitmetaError {
    fn from(err: gix::object::commit::Error) -> Self {
        GitmetaError::Commit(Box::new(err))
    }
}

impl GitmetaError {
    /// Configuration problems are the caller's fault; everything else is ours.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            GitmetaError::Configuration(_) | GitmetaError::ProjectNotFound(_)
        )
    }
}
