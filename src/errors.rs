use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("note {0} does not exist")]
    NotFound(String),
    #[error("invalid note id: {0}")]
    InvalidId(String),
    #[error("locked note requires a password")]
    MissingPassword,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

/// A stored record that is not well-formed. Listings skip it.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed note record {file}: {source}")]
    Json {
        file: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("locked note record {file} has no password")]
    LockedWithoutPassword { file: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UserError {
    #[error("Incorrect password!")]
    IncorrectPassword,
    #[error("Password cannot be empty")]
    EmptyPassword,
    #[error("Unlock note before deleting.")]
    NoteHidden,
    #[error("Unlock the note first.")]
    ContentHidden,
    #[error("no note selected")]
    NoSelection,
    #[error("note is already locked")]
    AlreadyLocked,
    #[error("note is not locked")]
    NotLocked,
    #[error("action cancelled")]
    Declined,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type SessionResult<T> = Result<T, SessionError>;
