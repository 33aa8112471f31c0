//! Per-hook request state.

/// Observable state of one hook instance.
///
/// `Loading` and a terminal outcome are separate variants, so a hook can never
/// report an in-flight request and a settled result at the same time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestState<T> {
    #[default]
    Idle,
    Loading,
    Success(Option<T>),
    Error(String),
}

/// The `{loading, error, success}` triple a display component renders from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestFlags {
    pub loading: bool,
    pub error: Option<String>,
    pub success: bool,
}

impl<T> RequestState<T> {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, RequestState::Idle)
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestState::Loading)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, RequestState::Success(_))
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            RequestState::Error(message) => Some(message),
            _ => None,
        }
    }

    #[must_use]
    pub fn data(&self) -> Option<&T> {
        match self {
            RequestState::Success(data) => data.as_ref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn flags(&self) -> RequestFlags {
        RequestFlags {
            loading: self.is_loading(),
            error: self.error().map(ToString::to_string),
            success: self.is_success(),
        }
    }
}
