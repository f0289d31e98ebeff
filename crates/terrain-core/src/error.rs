use thiserror::Error;

/// The closed set of failure modes the engine can report. Hosts are expected
/// to render `kind` (via [`EngineError::kind`]) to end users and log
/// `detail` for diagnostics.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("invalid input: {message}")]
    InvalidInput { message: String, detail: Option<String> },

    #[error("waypoint out of bounds: {message}")]
    OutOfBounds { message: String, detail: Option<String> },

    #[error("no feasible endpoint: {message}")]
    NoFeasibleEndpoint { message: String, detail: Option<String> },

    #[error("no path found: {message}")]
    NoPathFound { message: String, detail: Option<String> },

    #[error("search budget exceeded: {message}")]
    SearchBudgetExceeded { message: String, detail: Option<String> },

    #[error("search cancelled: {message}")]
    Cancelled { message: String, detail: Option<String> },

    #[error("internal invariant violated: {message}")]
    InternalInvariant { message: String, detail: Option<String> },
}

impl EngineError {
    /// The stable, user-safe discriminant. Hosts should render this,
    /// never `Display`/`detail`.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::InvalidInput { .. } => "InvalidInput",
            EngineError::OutOfBounds { .. } => "OutOfBounds",
            EngineError::NoFeasibleEndpoint { .. } => "NoFeasibleEndpoint",
            EngineError::NoPathFound { .. } => "NoPathFound",
            EngineError::SearchBudgetExceeded { .. } => "SearchBudgetExceeded",
            EngineError::Cancelled { .. } => "Cancelled",
            EngineError::InternalInvariant { .. } => "InternalInvariant",
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            EngineError::InvalidInput { detail, .. }
            | EngineError::OutOfBounds { detail, .. }
            | EngineError::NoFeasibleEndpoint { detail, .. }
            | EngineError::NoPathFound { detail, .. }
            | EngineError::SearchBudgetExceeded { detail, .. }
            | EngineError::Cancelled { detail, .. }
            | EngineError::InternalInvariant { detail, .. } => detail.as_deref(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        EngineError::InvalidInput { message: message.into(), detail: None }
    }

    pub fn out_of_bounds(message: impl Into<String>) -> Self {
        EngineError::OutOfBounds { message: message.into(), detail: None }
    }

    pub fn no_feasible_endpoint(message: impl Into<String>) -> Self {
        EngineError::NoFeasibleEndpoint { message: message.into(), detail: None }
    }

    pub fn no_path_found(message: impl Into<String>) -> Self {
        EngineError::NoPathFound { message: message.into(), detail: None }
    }

    pub fn search_budget_exceeded(message: impl Into<String>) -> Self {
        EngineError::SearchBudgetExceeded { message: message.into(), detail: None }
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        EngineError::Cancelled { message: message.into(), detail: None }
    }

    pub fn internal_invariant(message: impl Into<String>) -> Self {
        EngineError::InternalInvariant { message: message.into(), detail: None }
    }

    /// Attach (or replace) the diagnostic-only detail string.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        let d = Some(detail.into());
        match &mut self {
            EngineError::InvalidInput { detail, .. }
            | EngineError::OutOfBounds { detail, .. }
            | EngineError::NoFeasibleEndpoint { detail, .. }
            | EngineError::NoPathFound { detail, .. }
            | EngineError::SearchBudgetExceeded { detail, .. }
            | EngineError::Cancelled { detail, .. }
            | EngineError::InternalInvariant { detail, .. } => *detail = d,
        }
        self
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
