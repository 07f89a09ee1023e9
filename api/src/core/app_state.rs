use concierge::{Concierge, ConciergeConfig};

use crate::error_handler::AppResult;

/// Shared state for all HTTP handlers.
pub struct AppState {
    /// Request pipeline; owns the cached knowledge document and the LLM client.
    pub concierge: Concierge,
}

impl AppState {
    /// Load shared state from environment variables.
    ///
    /// A missing API key is not an error here: the server still starts and
    /// every chat request answers with a configuration error.
    pub fn from_env() -> AppResult<Self> {
        let config = ConciergeConfig::from_env()?;
        Ok(Self::new(Concierge::new(config)))
    }

    pub fn new(concierge: Concierge) -> Self {
        Self { concierge }
    }
}
