use tracing::debug;

use crate::config::{Configuration, Settings};
use crate::error::GatewayError;
use crate::intent::Intent;
use crate::operation::{HeaderValues, OperationKind, PHONE_NUMBER, SERVICE_PROVIDER_CODE};
use crate::response::{build_response, ProviderPayload, TransactionResponse};

/// Public entry point of the gateway client. Turns an intent plus an
/// operation hint into exactly one network call and one normalized result.
///
/// Each call is independent; the only state shared between in-flight calls is
/// the [`Configuration`], whose cached access token is refreshed behind a
/// single-flight lock.
pub struct Service {
    config: Configuration,
    http: reqwest::Client,
}

impl Service {
    /// Create a service from settings. The underlying HTTP client never
    /// follows redirects and applies the configured timeout to every call.
    pub fn new(settings: Settings) -> Result<Self, GatewayError> {
        let config = Configuration::new(settings)?;
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Build(e.to_string()))?;

        Ok(Self { config, http })
    }

    /// Create a service from `MPESA_*` environment variables.
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::new(Settings::from_env())
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Send money: classifies the recipient and dispatches to a
    /// business-to-customer or business-to-business payment.
    pub async fn handle_send(&self, intent: Intent) -> Result<TransactionResponse, GatewayError> {
        let kind = detect_operation(&intent)?;
        self.handle_request(kind, intent).await
    }

    /// Receive money from a customer (customer-to-business payment).
    pub async fn handle_receive(&self, intent: Intent) -> Result<TransactionResponse, GatewayError> {
        self.handle_request(OperationKind::C2bPayment, intent).await
    }

    /// Revert a previously completed transaction.
    pub async fn handle_revert(&self, intent: Intent) -> Result<TransactionResponse, GatewayError> {
        self.handle_request(OperationKind::Reversal, intent).await
    }

    /// Query the status of a transaction.
    pub async fn handle_query(&self, intent: Intent) -> Result<TransactionResponse, GatewayError> {
        self.handle_request(OperationKind::QueryTransactionStatus, intent).await
    }

    /// Common pipeline: complete optional fields, check required fields,
    /// validate formats, then perform the request. Every failed check is
    /// terminal and happens before any network side effect.
    pub async fn handle_request(
        &self,
        kind: OperationKind,
        mut intent: Intent,
    ) -> Result<TransactionResponse, GatewayError> {
        let operation = kind.descriptor();
        debug!(operation = operation.name, "operation resolved");

        operation.fill_optional_properties(&mut intent, &self.config);

        let missing = operation.detect_missing_properties(&intent);
        if !missing.is_empty() {
            return Err(GatewayError::MissingProperties(missing));
        }

        let invalid = operation.detect_errors(&intent);
        if !invalid.is_empty() {
            return Err(GatewayError::Validation(invalid));
        }

        self.perform_request(kind, &intent).await
    }

    /// Execute the network call for an already validated intent.
    async fn perform_request(
        &self,
        kind: OperationKind,
        intent: &Intent,
    ) -> Result<TransactionResponse, GatewayError> {
        let operation = kind.descriptor();

        let environment = self.config.environment.as_ref().ok_or(GatewayError::InvalidHost)?;
        if !self.config.has_auth_context().await {
            return Err(GatewayError::Authentication(
                "api key and public key are not configured".to_string(),
            ));
        }

        let access_token = self.config.access_token(&self.http, environment).await?;

        let headers = operation.build_request_headers(&HeaderValues {
            user_agent: &self.config.user_agent,
            origin: &self.config.origin,
            access_token: &access_token,
        })?;
        let body = operation.build_request_body(intent)?;

        let url = format!("{}{}", environment.base_url(operation.port), operation.path);
        debug!(%url, method = %operation.method, "dispatching provider request");

        let mut request = self
            .http
            .request(operation.method.clone(), &url)
            .headers(headers);
        request = if operation.method == http::Method::GET {
            request.query(&body)
        } else {
            request.json(&body)
        };

        let response = request.send().await.map_err(GatewayError::from_transport)?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(GatewayError::from_transport)?;

        build_response(status, ProviderPayload::from_body(&bytes))
    }
}

/// Classify the recipient identifier: phone shape means business-to-customer,
/// service-provider-code shape means business-to-business. The shapes are
/// disjoint (a phone match carries at least nine digits, a code exactly five
/// or six); phone is tested first as the explicit precedence rule.
fn detect_operation(intent: &Intent) -> Result<OperationKind, GatewayError> {
    if let Some(to) = intent.get("to") {
        if PHONE_NUMBER.is_match(to) {
            return Ok(OperationKind::B2cPayment);
        }
        if SERVICE_PROVIDER_CODE.is_match(to) {
            return Ok(OperationKind::B2bPayment);
        }
    }

    Err(GatewayError::InvalidReceiver)
}
