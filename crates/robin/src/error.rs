//! Error types for the round-robin scheduler

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Participant already registered: {0}")]
    DuplicateParticipant(String),

    #[error("Participant is current and cannot be removed: {0}")]
    CurrentParticipant(String),

    #[error("No such participant: {0}")]
    NoSuchParticipant(String),
}

impl Error {
    /// Id of the participant the failed operation targeted
    pub fn participant_id(&self) -> &str {
        match self {
            Error::DuplicateParticipant(id)
            | Error::CurrentParticipant(id)
            | Error::NoSuchParticipant(id) => id,
        }
    }
}
