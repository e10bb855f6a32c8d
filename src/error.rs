use thiserror::Error;

/// A non-2xx outcome reported by the payment provider, normalized from the
/// provider's error schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    /// HTTP status code of the provider response
    pub status: u16,
    /// Canonical reason phrase for the status
    pub status_text: String,
    /// Provider error text (`output_error`), when attached
    pub output_error: Option<String>,
}

impl std::fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status, self.status_text)?;
        if let Some(err) = &self.output_error {
            write!(f, ": {}", err)?;
        }
        Ok(())
    }
}

/// Error types for gateway client operations
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The recipient identifier matched neither a phone number nor a service
    /// provider code. Raised before an operation is chosen.
    #[error("recipient matches neither a phone number nor a service provider code")]
    InvalidReceiver,

    /// Required fields absent from the intent after optional-field completion
    #[error("missing required fields: {0:?}")]
    MissingProperties(Vec<&'static str>),

    /// Required fields present but failing their format pattern
    #[error("fields failed format validation: {0:?}")]
    Validation(Vec<&'static str>),

    /// No environment (host) is configured
    #[error("no API environment is configured")]
    InvalidHost,

    /// No usable auth context, or the token grant itself failed
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The provider answered with a non-2xx status
    #[error("provider request failed: {0}")]
    Provider(ProviderFailure),

    /// The call never produced a response
    #[error("connection error: {0}")]
    Connection(String),

    /// The transport timeout elapsed before a response arrived
    #[error("timeout: {0}")]
    Timeout(String),

    /// A request could not be assembled from the given values
    #[error("request build error: {0}")]
    Build(String),
}

impl GatewayError {
    /// Map a transport-level reqwest error onto the client taxonomy. Errors
    /// without an attached response stay distinguishable from provider
    /// failures.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout(err.to_string())
        } else {
            GatewayError::Connection(err.to_string())
        }
    }
}
