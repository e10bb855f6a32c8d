use std::time::Duration;

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::environment::Environment;
use crate::error::GatewayError;

const DEFAULT_ORIGIN: &str = "*";
const DEFAULT_USER_AGENT: &str = concat!("mpesa-gateway/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Raw client settings as supplied by the caller or the process environment.
/// Unset values stay `None` so optional-field completion can detect them.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub api_key: Option<String>,
    pub public_key: Option<String>,
    pub service_provider_code: Option<String>,
    pub initiator_identifier: Option<String>,
    pub security_credential: Option<String>,
    pub origin: Option<String>,
    pub user_agent: Option<String>,
    /// Request timeout in seconds
    pub timeout: Option<u64>,
    /// API host, with or without scheme and port
    pub host: Option<String>,
}

impl Settings {
    /// Read settings from `MPESA_*` environment variables.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok();
        Self {
            api_key: var("MPESA_API_KEY"),
            public_key: var("MPESA_PUBLIC_KEY"),
            service_provider_code: var("MPESA_SERVICE_PROVIDER_CODE"),
            initiator_identifier: var("MPESA_INITIATOR_IDENTIFIER"),
            security_credential: var("MPESA_SECURITY_CREDENTIAL"),
            origin: var("MPESA_ORIGIN"),
            user_agent: var("MPESA_USER_AGENT"),
            timeout: var("MPESA_TIMEOUT").and_then(|v| v.parse().ok()),
            host: var("MPESA_HOST"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: String,
}

/// Connection and credential state for one client instance.
///
/// Immutable for the client's lifetime except for the cached access token,
/// which is refreshed on demand behind a single-flight lock so concurrent
/// calls cannot race a duplicate token grant.
#[derive(Debug)]
pub struct Configuration {
    pub api_key: Option<String>,
    pub public_key: Option<String>,
    pub service_provider_code: Option<String>,
    pub initiator_identifier: Option<String>,
    pub security_credential: Option<String>,
    pub origin: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub environment: Option<Environment>,
    access_token: Mutex<Option<String>>,
}

impl Configuration {
    /// Build a configuration from settings. Fails only when the supplied host
    /// cannot be parsed.
    pub fn new(settings: Settings) -> Result<Self, GatewayError> {
        let environment = match settings.host.as_deref() {
            Some(host) => Some(Environment::from_url(host)?),
            None => None,
        };

        Ok(Self {
            api_key: settings.api_key,
            public_key: settings.public_key,
            service_provider_code: settings.service_provider_code,
            initiator_identifier: settings.initiator_identifier,
            security_credential: settings.security_credential,
            origin: settings.origin.unwrap_or_else(|| DEFAULT_ORIGIN.to_string()),
            user_agent: settings
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            timeout: Duration::from_secs(settings.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            environment,
            access_token: Mutex::new(None),
        })
    }

    /// Obtain a bearer token for the current request, minting one through the
    /// provider's client-credentials grant on first use. The lock is held
    /// across the grant so only one in-flight acquisition exists per client.
    pub(crate) async fn access_token(
        &self,
        http: &reqwest::Client,
        environment: &Environment,
    ) -> Result<String, GatewayError> {
        let mut cached = self.access_token.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        let (Some(api_key), Some(public_key)) = (&self.api_key, &self.public_key) else {
            return Err(GatewayError::Authentication(
                "api key and public key are not configured".to_string(),
            ));
        };

        let url = format!("{}/oauth/v1/generate", environment.to_url());
        debug!(%url, "requesting access token");
        let response = http
            .get(&url)
            .query(&[("grant_type", "client_credentials")])
            .basic_auth(api_key, Some(public_key))
            .send()
            .await
            .map_err(|e| GatewayError::Authentication(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::Authentication(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let grant: TokenGrant = response
            .json()
            .await
            .map_err(|e| GatewayError::Authentication(format!("malformed token grant: {e}")))?;

        *cached = Some(grant.access_token.clone());
        Ok(grant.access_token)
    }

    /// Whether a bearer token could be produced: either one is cached or the
    /// credentials for the grant are present.
    pub(crate) async fn has_auth_context(&self) -> bool {
        self.access_token.lock().await.is_some()
            || (self.api_key.is_some() && self.public_key.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Configuration::new(Settings::default()).unwrap();
        assert_eq!(config.origin, "*");
        assert!(config.user_agent.starts_with("mpesa-gateway/"));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.environment.is_none());
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_host_auto_completes_scheme() {
        let config = Configuration::new(Settings {
            host: Some("sandbox.safaricom.co.ke".into()),
            ..Settings::default()
        })
        .unwrap();

        let environment = config.environment.expect("environment should be set");
        assert_eq!(environment.to_url(), "https://sandbox.safaricom.co.ke");
    }

    #[test]
    fn test_invalid_host_is_rejected() {
        let result = Configuration::new(Settings {
            host: Some("https://".into()),
            ..Settings::default()
        });
        assert!(matches!(result, Err(GatewayError::Build(_))));
    }

    #[test]
    fn test_from_env() {
        temp_env::with_vars(
            [
                ("MPESA_API_KEY", Some("key-1")),
                ("MPESA_PUBLIC_KEY", Some("pub-1")),
                ("MPESA_SERVICE_PROVIDER_CODE", Some("123456")),
                ("MPESA_HOST", Some("sandbox.safaricom.co.ke")),
                ("MPESA_TIMEOUT", Some("10")),
                ("MPESA_ORIGIN", None),
            ],
            || {
                let settings = Settings::from_env();
                assert_eq!(settings.api_key.as_deref(), Some("key-1"));
                assert_eq!(settings.public_key.as_deref(), Some("pub-1"));
                assert_eq!(settings.service_provider_code.as_deref(), Some("123456"));
                assert_eq!(settings.host.as_deref(), Some("sandbox.safaricom.co.ke"));
                assert_eq!(settings.timeout, Some(10));
                assert_eq!(settings.origin, None);
            },
        );
    }

    #[tokio::test]
    async fn test_auth_context_requires_both_keys() {
        let config = Configuration::new(Settings {
            api_key: Some("key-1".into()),
            ..Settings::default()
        })
        .unwrap();
        assert!(!config.has_auth_context().await);

        let config = Configuration::new(Settings {
            api_key: Some("key-1".into()),
            public_key: Some("pub-1".into()),
            ..Settings::default()
        })
        .unwrap();
        assert!(config.has_auth_context().await);
    }
}
