use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    /// Commit called on a session with an empty op log.
    #[error("nothing staged for ref {0:?}")]
    NothingStaged(String),

    /// The ref kept moving under us; every replay attempt lost the race.
    #[error("commit contention on ref {name:?}: gave up after {attempts} attempts")]
    CommitContention { name: String, attempts: usize },

    #[error("store error: {0}")]
    Store(#[from] vhs_store::StoreError),

    #[error("index error: {0}")]
    Index(#[from] vhs_index::IndexError),

    #[error("ref error: {0}")]
    Ref(#[from] vhs_refs::RefError),
}

pub type SdkResult<T> = Result<T, SdkError>;
