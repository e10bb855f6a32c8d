use http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{GatewayError, ProviderFailure};

/// Raw provider response fields, shared by the success and error schemas.
/// Parsed leniently: the provider omits fields freely and error bodies are
/// not always JSON.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderPayload {
    #[serde(rename = "output_ResponseCode")]
    pub response_code: Option<String>,
    #[serde(rename = "output_ResponseDesc")]
    pub response_desc: Option<String>,
    #[serde(rename = "output_ConversationID")]
    pub conversation_id: Option<String>,
    #[serde(rename = "output_TransactionID")]
    pub transaction_id: Option<String>,
    #[serde(rename = "output_ThirdPartyReference")]
    pub third_party_reference: Option<String>,
    #[serde(rename = "output_error")]
    pub error: Option<String>,
}

impl ProviderPayload {
    /// Decode a provider body, falling back to an empty payload when the body
    /// is not the expected JSON shape.
    pub(crate) fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

/// Provider response code and description alongside the HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseDetail {
    pub status: u16,
    pub code: Option<String>,
    pub desc: Option<String>,
}

/// Normalized success envelope returned for every 2xx provider response,
/// regardless of which operation produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionResponse {
    pub response: ResponseDetail,
    /// Provider-assigned conversation identifier
    pub conversation: Option<String>,
    /// Provider-assigned transaction identifier
    pub transaction: Option<String>,
    /// Third-party reference echoed back by the provider
    pub reference: Option<String>,
}

/// Normalize a provider response: 2xx becomes a [`TransactionResponse`],
/// anything else a [`GatewayError::Provider`] carrying the provider's error
/// text.
pub(crate) fn build_response(
    status: StatusCode,
    payload: ProviderPayload,
) -> Result<TransactionResponse, GatewayError> {
    if status.is_success() {
        return Ok(TransactionResponse {
            response: ResponseDetail {
                status: status.as_u16(),
                code: payload.response_code,
                desc: payload.response_desc,
            },
            conversation: payload.conversation_id,
            transaction: payload.transaction_id,
            reference: payload.third_party_reference,
        });
    }

    warn!(status = status.as_u16(), error = ?payload.error, "provider request failed");
    Err(GatewayError::Provider(ProviderFailure {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or("").to_string(),
        output_error: payload.error,
    }))
}
