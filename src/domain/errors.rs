// Typed engine errors
use super::metric::MetricKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid timestamp `{value}`: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("unknown bucket size `{0}`")]
    BucketSize(String),
}

/// Geometry failures are isolated in the session so a retry can recover.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RenderError {
    #[error("non-finite coordinate while building {0:?} geometry")]
    NonFinite(MetricKey),
    #[error("chart has zero width")]
    ZeroWidth,
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("failed to load timeline for system {system_id}: {message}")]
    Fetch { system_id: String, message: String },
    #[error("failed to load predictions for system {system_id}: {message}")]
    Predictions { system_id: String, message: String },
}

impl RefreshError {
    /// Message suitable for a dismissible banner.
    pub fn user_message(&self) -> String {
        match self {
            RefreshError::Fetch { .. } => {
                "Unable to load battery history. Please try again.".to_string()
            }
            RefreshError::Predictions { .. } => {
                "Unable to load predictions. Please try again.".to_string()
            }
        }
    }
}
