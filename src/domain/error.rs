// Dashboard error taxonomy
use super::widget::WidgetId;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DashboardError {
    /// Malformed or out-of-range form input. The form stays open.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A store operation referenced an id it does not hold.
    #[error("widget not found: {0}")]
    NotFound(WidgetId),

    /// The remote data source was unreachable or answered with a non-OK status.
    #[error("fetch failed: {0}")]
    FetchFailure(String),

    /// A key path did not resolve to a sequence in the fetched document.
    #[error("extraction failed: {0}")]
    ExtractionFailure(String),

    /// The action is not available in the controller's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl DashboardError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Stable machine-readable tag used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::FetchFailure(_) => "fetch_failure",
            Self::ExtractionFailure(_) => "extraction_failure",
            Self::InvalidState(_) => "invalid_state",
        }
    }
}

pub type DashboardResult<T> = Result<T, DashboardError>;
