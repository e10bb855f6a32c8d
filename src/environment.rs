use crate::error::GatewayError;

const DEFAULT_SCHEME: &str = "https";

/// Target API environment: scheme, host and an optional explicit port.
///
/// Parsed from a bare host (`sandbox.safaricom.co.ke`) or a full base URL
/// (`http://127.0.0.1:5000`). When no scheme is given, `https` is assumed.
/// A port given here overrides the per-operation port, which is what lets a
/// test point the client at a local mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    scheme: String,
    host: String,
    port: Option<u16>,
}

impl Environment {
    /// Parse an environment from a host string or base URL.
    pub fn from_url(url: &str) -> Result<Self, GatewayError> {
        let (scheme, rest) = match url.split_once("://") {
            Some((scheme, rest)) => (scheme, rest),
            None => (DEFAULT_SCHEME, url),
        };

        let rest = rest.trim_end_matches('/');
        let (host, port) = match rest.split_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| GatewayError::Build(format!("invalid port in host: {url}")))?;
                (host, Some(port))
            }
            None => (rest, None),
        };

        if host.is_empty() {
            return Err(GatewayError::Build(format!("invalid host: {url:?}")));
        }

        Ok(Self {
            scheme: scheme.to_string(),
            host: host.to_string(),
            port,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Render the fully qualified base URL, `scheme://host[:port]`.
    pub fn to_url(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}", self.scheme, self.host, port),
            None => format!("{}://{}", self.scheme, self.host),
        }
    }

    /// Base URL for one operation: an explicit environment port wins over the
    /// operation's own port.
    pub(crate) fn base_url(&self, operation_port: u16) -> String {
        format!(
            "{}://{}:{}",
            self.scheme,
            self.host,
            self.port.unwrap_or(operation_port)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url_completes_scheme() {
        let env = Environment::from_url("sandbox.safaricom.co.ke").unwrap();
        assert_eq!(env.scheme(), "https");
        assert_eq!(env.host(), "sandbox.safaricom.co.ke");
        assert_eq!(env.port(), None);
    }

    #[test]
    fn test_to_url_round_trip() {
        let env = Environment::from_url("sandbox.safaricom.co.ke").unwrap();
        assert_eq!(env.to_url(), "https://sandbox.safaricom.co.ke");
    }

    #[test]
    fn test_round_trip_is_idempotent() {
        let once = Environment::from_url("sandbox.safaricom.co.ke").unwrap();
        let twice = Environment::from_url(&once.to_url()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(twice.to_url(), "https://sandbox.safaricom.co.ke");
    }

    #[test]
    fn test_explicit_scheme_and_port() {
        let env = Environment::from_url("http://127.0.0.1:5000").unwrap();
        assert_eq!(env.scheme(), "http");
        assert_eq!(env.host(), "127.0.0.1");
        assert_eq!(env.port(), Some(5000));
        assert_eq!(env.to_url(), "http://127.0.0.1:5000");
    }

    #[test]
    fn test_environment_port_overrides_operation_port() {
        let env = Environment::from_url("http://127.0.0.1:5000").unwrap();
        assert_eq!(env.base_url(18345), "http://127.0.0.1:5000");

        let env = Environment::from_url("api.example.com").unwrap();
        assert_eq!(env.base_url(18345), "https://api.example.com:18345");
    }

    #[test]
    fn test_invalid_hosts_rejected() {
        assert!(Environment::from_url("").is_err());
        assert!(Environment::from_url("https://").is_err());
        assert!(Environment::from_url("host:notaport").is_err());
    }
}
