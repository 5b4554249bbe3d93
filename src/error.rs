use axum::http::StatusCode;

use crate::types::ParticipantId;

pub type DrawResult<T> = Result<T, DrawError>;

/// Errors returned by roster and draw operations.
///
/// Every failing operation leaves the board untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DrawError {
    #[error("{0}")]
    Validation(String),

    #[error("Participant {0} not found")]
    NotFound(ParticipantId),

    #[error("All squads have already been drawn")]
    NoCandidates,

    #[error("A draw is already in progress")]
    DrawInProgress,

    #[error("The draw was cancelled by a reset")]
    DrawCancelled,
}

impl DrawError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Stable code sent to clients
    pub fn code(&self) -> &'static str {
        match self {
            DrawError::Validation(_) => "VALIDATION_ERROR",
            DrawError::NotFound(_) => "NOT_FOUND",
            DrawError::NoCandidates => "NO_CANDIDATES",
            DrawError::DrawInProgress => "DRAW_IN_PROGRESS",
            DrawError::DrawCancelled => "DRAW_CANCELLED",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            DrawError::Validation(_) => StatusCode::BAD_REQUEST,
            DrawError::NotFound(_) => StatusCode::NOT_FOUND,
            DrawError::NoCandidates | DrawError::DrawInProgress | DrawError::DrawCancelled => {
                StatusCode::CONFLICT
            }
        }
    }
}
