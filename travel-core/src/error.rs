use thiserror::Error;

pub type Result<T, E = TravelError> = std::result::Result<T, E>;

/// Failure taxonomy shared by the pipeline and its callers.
#[derive(Debug, Error)]
pub enum TravelError {
    /// A required parameter is missing or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Geocoding found no match for the requested city.
    #[error("city not found: {0}")]
    NotFound(String),

    /// The provider rejected our credentials for this data tier.
    #[error("{tier} is not available for the configured API key")]
    UpstreamUnauthorized { tier: String, hint: String },

    /// The provider answered with a non-success status.
    #[error("{provider} request failed with status {status}: {body}")]
    Upstream {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("failed to reach upstream provider: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode upstream response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl TravelError {
    /// Authorization failures abort a whole request; everything else that
    /// happens inside a per-day loop is recoverable for that day.
    pub fn is_fatal_for_day_loop(&self) -> bool {
        matches!(self, TravelError::UpstreamUnauthorized { .. })
    }

    /// Upstream HTTP status to forward to the client, if one was observed.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            TravelError::Upstream { status, .. } => Some(*status),
            TravelError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
