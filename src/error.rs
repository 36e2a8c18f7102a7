//! Error types for haggle

use std::time::Duration;
use thiserror::Error;

use crate::types::Party;

/// Main error type for haggle
#[derive(Error, Debug)]
pub enum HaggleError {
    // Configuration errors
    #[error("Configuration error: {field}: {reason}")]
    Configuration { field: String, reason: String },

    #[error("Scenario parse error: {0}")]
    ScenarioParse(String),

    // Negotiation errors
    #[error("Invalid offer from {party}: {reason}")]
    InvalidOffer { party: Party, reason: String },

    #[error("Invalid negotiation state transition: {0}")]
    InvalidStateTransition(String),

    // Message service errors
    #[error("Message service error: {0}")]
    ExternalService(String),

    #[error("Message service timed out after {0:?}")]
    ServiceTimeout(Duration),

    // Scoring errors
    #[error("Decimal overflow while computing {0}")]
    Overflow(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HaggleError {
    /// Configuration error for a named field
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        HaggleError::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Invalid offer raised against one party
    pub fn invalid_offer(party: Party, reason: impl Into<String>) -> Self {
        HaggleError::InvalidOffer {
            party,
            reason: reason.into(),
        }
    }

    /// Whether this error came from bad construction-time input
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            HaggleError::Configuration { .. } | HaggleError::ScenarioParse(_)
        )
    }
}

impl From<ureq::Error> for HaggleError {
    fn from(e: ureq::Error) -> Self {
        HaggleError::ExternalService(e.to_string())
    }
}

/// Result type alias for haggle operations
pub type Result<T> = std::result::Result<T, HaggleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_names_field() {
        let err = HaggleError::config("seller.floor_price", "must not exceed start_price");
        assert_eq!(
            err.to_string(),
            "Configuration error: seller.floor_price: must not exceed start_price"
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn test_invalid_offer_error() {
        let err = HaggleError::invalid_offer(Party::Buyer, "price 95 exceeds ceiling 90");
        assert_eq!(
            err.to_string(),
            "Invalid offer from buyer: price 95 exceeds ceiling 90"
        );
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_error_conversion() {
        fn io_error_function() -> Result<()> {
            std::fs::read_to_string("/nonexistent/scenario.json")?;
            Ok(())
        }

        let result = io_error_function();
        assert!(matches!(result.unwrap_err(), HaggleError::Io(_)));
    }

    #[test]
    fn test_timeout_error() {
        let err = HaggleError::ServiceTimeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "Message service timed out after 250ms");
    }
}
