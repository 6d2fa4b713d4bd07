use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum QdashError {
    #[error("Missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    #[error("Invalid option `{name}`: {reason}")]
    InvalidOption { name: &'static str, reason: String },
}

impl QdashError {
    /// Creates an invalid option error
    pub fn invalid_option<S: Into<String>>(name: &'static str, reason: S) -> Self {
        Self::InvalidOption {
            name,
            reason: reason.into(),
        }
    }
}

pub type QdashResult<T> = Result<T, QdashError>;
