use thiserror::Error;

use crate::notify::NotificationKind;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid email or password. Please sign up first.")]
    InvalidCredentials,

    #[error("You must be logged in. Run 'ticketflow login' first.")]
    Unauthenticated,

    #[error("Ticket #{0} not found")]
    TicketNotFound(String),

    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl StoreError {
    /// Severity used to render the failure. Never drives program logic.
    pub fn kind(&self) -> NotificationKind {
        match self {
            Self::Unauthenticated => NotificationKind::Warning,
            _ => NotificationKind::Error,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
