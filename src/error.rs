use thiserror::Error;

/// Underlying cause of a transport or decode failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Why a single user could not be fetched. Every variant is skippable.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("user {id} not found (HTTP {status})")]
    NotFound { id: i64, status: u16 },

    #[error("connection error fetching user {id}: {source}")]
    Transport {
        id: i64,
        #[source]
        source: BoxError,
    },

    #[error("malformed payload for user {id}: {source}")]
    Decode {
        id: i64,
        #[source]
        source: BoxError,
    },
}

impl FetchError {
    pub fn user_id(&self) -> i64 {
        match self {
            FetchError::NotFound { id, .. }
            | FetchError::Transport { id, .. }
            | FetchError::Decode { id, .. } => *id,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }
}

/// Configuration problems that stop the pipeline before it starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no API key configured; pass --api-key or set OPENAI_API_KEY")]
    MissingApiKey,

    #[error("the API key is still the placeholder value; configure your OpenAI API key")]
    PlaceholderApiKey,

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = FetchError::NotFound {
            id: 9999,
            status: 404,
        };
        assert_eq!(err.user_id(), 9999);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "user 9999 not found (HTTP 404)");
    }

    #[test]
    fn test_transport_message_keeps_cause() {
        let err = FetchError::Transport {
            id: 3,
            source: "connection refused".into(),
        };
        assert_eq!(err.user_id(), 3);
        assert!(!err.is_not_found());
        assert_eq!(
            err.to_string(),
            "connection error fetching user 3: connection refused"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_config_error_messages() {
        assert!(ConfigError::PlaceholderApiKey
            .to_string()
            .contains("placeholder"));
        let err = ConfigError::Invalid {
            field: "temperature",
            reason: "must be between 0 and 2".to_string(),
        };
        assert_eq!(err.to_string(), "invalid temperature: must be between 0 and 2");
    }
}
