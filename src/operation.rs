use std::collections::BTreeMap;

use http::header::{AUTHORIZATION, CONTENT_TYPE, ORIGIN, USER_AGENT};
use http::{HeaderMap, HeaderValue, Method};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::Configuration;
use crate::error::GatewayError;
use crate::intent::Intent;

/// Kenyan MSISDN in any accepted representation: bare local (`7XXXXXXXX`),
/// leading zero (`07XXXXXXXX`), `00`-prefixed or `+`-prefixed international.
/// One anchored pattern capturing the invariant 9-digit local part; chained
/// string replacements would double-transform ambiguous partial matches.
pub(crate) static PHONE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:(?:00|\+)?254|0)?(7[0-9]{8})$").unwrap());

/// Short numeric business code (5-6 digits). Disjoint from the phone shape,
/// which always carries at least nine digits.
pub(crate) static SERVICE_PROVIDER_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{5,6}$").unwrap());

static AMOUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[1-9][0-9]*(\.[0-9]+)?$").unwrap());

static REFERENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+$").unwrap());

/// Normalize a Kenyan phone number to its `254`-prefixed 12-digit form.
/// Returns `None` when the value matches no accepted representation.
pub fn normalize_phone_number(value: &str) -> Option<String> {
    PHONE_NUMBER
        .captures(value)
        .map(|captures| format!("254{}", &captures[1]))
}

/// Configuration attribute an optional intent field can be backfilled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    ServiceProviderCode,
    InitiatorIdentifier,
    SecurityCredential,
}

impl ConfigSource {
    fn resolve<'a>(&self, config: &'a Configuration) -> Option<&'a str> {
        match self {
            ConfigSource::ServiceProviderCode => config.service_provider_code.as_deref(),
            ConfigSource::InitiatorIdentifier => config.initiator_identifier.as_deref(),
            ConfigSource::SecurityCredential => config.security_credential.as_deref(),
        }
    }
}

/// The closed set of payment operations the gateway supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Customer-to-business payment
    C2bPayment,
    /// Business-to-customer payment
    B2cPayment,
    /// Business-to-business payment
    B2bPayment,
    /// Undo a previously completed transaction
    Reversal,
    /// Query the status of a transaction
    QueryTransactionStatus,
}

impl OperationKind {
    /// The static descriptor for this operation kind.
    pub fn descriptor(&self) -> &'static Operation {
        match self {
            OperationKind::C2bPayment => &C2B_PAYMENT,
            OperationKind::B2cPayment => &B2C_PAYMENT,
            OperationKind::B2bPayment => &B2B_PAYMENT,
            OperationKind::Reversal => &REVERSAL,
            OperationKind::QueryTransactionStatus => &QUERY_TRANSACTION_STATUS,
        }
    }

    pub const ALL: [OperationKind; 5] = [
        OperationKind::C2bPayment,
        OperationKind::B2cPayment,
        OperationKind::B2bPayment,
        OperationKind::Reversal,
        OperationKind::QueryTransactionStatus,
    ];
}

/// Static contract for one payment operation: endpoint, local-to-wire field
/// mapping, per-field validation and required/optional field lists. Shared
/// read-only across every request of that kind.
pub struct Operation {
    pub name: &'static str,
    pub method: Method,
    pub port: u16,
    pub path: &'static str,
    mapping: &'static [(&'static str, &'static str)],
    validation: &'static [(&'static str, &'static Lazy<Regex>)],
    required: &'static [&'static str],
    optional: &'static [(&'static str, ConfigSource)],
    /// Fields carrying a customer MSISDN, passed through phone normalization
    /// when the wire body is built
    normalized: &'static [&'static str],
}

static C2B_PAYMENT: Operation = Operation {
    name: "C2B_PAYMENT",
    method: Method::POST,
    port: 18352,
    path: "/ipg/v1x/c2bPayment/singleStage/",
    mapping: &[
        ("from", "input_CustomerMSISDN"),
        ("to", "input_ServiceProviderCode"),
        ("amount", "input_Amount"),
        ("transaction", "input_TransactionReference"),
        ("reference", "input_ThirdPartyReference"),
    ],
    validation: &[
        ("from", &PHONE_NUMBER),
        ("to", &SERVICE_PROVIDER_CODE),
        ("amount", &AMOUNT),
        ("transaction", &REFERENCE),
        ("reference", &REFERENCE),
    ],
    required: &["from", "to", "amount", "transaction", "reference"],
    optional: &[("to", ConfigSource::ServiceProviderCode)],
    normalized: &["from"],
};

static B2C_PAYMENT: Operation = Operation {
    name: "B2C_PAYMENT",
    method: Method::POST,
    port: 18345,
    path: "/ipg/v1x/b2cPayment/",
    mapping: &[
        ("to", "input_CustomerMSISDN"),
        ("from", "input_ServiceProviderCode"),
        ("amount", "input_Amount"),
        ("transaction", "input_TransactionReference"),
        ("reference", "input_ThirdPartyReference"),
    ],
    validation: &[
        ("to", &PHONE_NUMBER),
        ("from", &SERVICE_PROVIDER_CODE),
        ("amount", &AMOUNT),
        ("transaction", &REFERENCE),
        ("reference", &REFERENCE),
    ],
    required: &["to", "from", "amount", "transaction", "reference"],
    optional: &[("from", ConfigSource::ServiceProviderCode)],
    normalized: &["to"],
};

static B2B_PAYMENT: Operation = Operation {
    name: "B2B_PAYMENT",
    method: Method::POST,
    port: 18349,
    path: "/ipg/v1x/b2bPayment/",
    mapping: &[
        ("to", "input_ReceiverPartyCode"),
        ("from", "input_PrimaryPartyCode"),
        ("amount", "input_Amount"),
        ("transaction", "input_TransactionReference"),
        ("reference", "input_ThirdPartyReference"),
    ],
    validation: &[
        ("to", &SERVICE_PROVIDER_CODE),
        ("from", &SERVICE_PROVIDER_CODE),
        ("amount", &AMOUNT),
        ("transaction", &REFERENCE),
        ("reference", &REFERENCE),
    ],
    required: &["to", "from", "amount", "transaction", "reference"],
    optional: &[("from", ConfigSource::ServiceProviderCode)],
    normalized: &[],
};

static REVERSAL: Operation = Operation {
    name: "REVERSAL",
    method: Method::PUT,
    port: 18354,
    path: "/ipg/v1x/reversal/",
    mapping: &[
        ("to", "input_ServiceProviderCode"),
        ("amount", "input_ReversalAmount"),
        ("reference", "input_ThirdPartyReference"),
        ("transaction", "input_TransactionID"),
        ("security_credential", "input_SecurityCredential"),
        ("initiator_identifier", "input_InitiatorIdentifier"),
    ],
    validation: &[
        ("to", &SERVICE_PROVIDER_CODE),
        ("amount", &AMOUNT),
        ("reference", &REFERENCE),
        ("transaction", &REFERENCE),
        ("security_credential", &REFERENCE),
        ("initiator_identifier", &REFERENCE),
    ],
    required: &[
        "to",
        "amount",
        "reference",
        "transaction",
        "security_credential",
        "initiator_identifier",
    ],
    optional: &[
        ("to", ConfigSource::ServiceProviderCode),
        ("initiator_identifier", ConfigSource::InitiatorIdentifier),
        ("security_credential", ConfigSource::SecurityCredential),
    ],
    normalized: &[],
};

static QUERY_TRANSACTION_STATUS: Operation = Operation {
    name: "QUERY_TRANSACTION_STATUS",
    method: Method::GET,
    port: 18353,
    path: "/ipg/v1x/queryTransactionStatus/",
    mapping: &[
        ("from", "input_ServiceProviderCode"),
        ("query", "input_QueryReference"),
        ("reference", "input_ThirdPartyReference"),
    ],
    validation: &[
        ("from", &SERVICE_PROVIDER_CODE),
        ("query", &REFERENCE),
        ("reference", &REFERENCE),
    ],
    required: &["from", "query", "reference"],
    optional: &[("from", ConfigSource::ServiceProviderCode)],
    normalized: &[],
};

/// Value bag for assembling the fixed request header set.
pub struct HeaderValues<'a> {
    pub user_agent: &'a str,
    pub origin: &'a str,
    pub access_token: &'a str,
}

impl Operation {
    /// Request path including the operation port, e.g. `:18345/ipg/v1x/b2cPayment/`.
    pub fn to_url(&self) -> String {
        format!(":{}{}", self.port, self.path)
    }

    pub fn required(&self) -> &'static [&'static str] {
        self.required
    }

    fn wire_name(&self, field: &str) -> Option<&'static str> {
        self.mapping
            .iter()
            .find(|(local, _)| *local == field)
            .map(|(_, wire)| *wire)
    }

    fn pattern(&self, field: &str) -> Option<&'static Regex> {
        self.validation
            .iter()
            .find(|(local, _)| *local == field)
            .map(|(_, pattern)| Lazy::force(pattern))
    }

    /// Map intent fields onto provider wire parameters. Fields without a
    /// mapping entry are dropped; MSISDN fields are normalized to the
    /// `254`-prefixed form.
    pub fn build_request_body(
        &self,
        intent: &Intent,
    ) -> Result<BTreeMap<&'static str, String>, GatewayError> {
        let mut body = BTreeMap::new();
        for (field, value) in intent.iter() {
            let Some(wire) = self.wire_name(field) else {
                continue;
            };
            let value = match self.normalized.iter().find(|f| **f == field) {
                Some(msisdn_field) => normalize_phone_number(value)
                    .ok_or_else(|| GatewayError::Validation(vec![*msisdn_field]))?,
                None => value.to_string(),
            };
            body.insert(wire, value);
        }
        Ok(body)
    }

    /// Fixed header set for a provider request. Header names are
    /// provider-defined constants, not derived from the value bag.
    pub fn build_request_headers(
        &self,
        values: &HeaderValues<'_>,
    ) -> Result<HeaderMap, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(values.user_agent)
                .map_err(|e| GatewayError::Build(format!("invalid user agent: {e}")))?,
        );
        headers.insert(
            ORIGIN,
            HeaderValue::from_str(values.origin)
                .map_err(|e| GatewayError::Build(format!("invalid origin: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", values.access_token))
                .map_err(|e| GatewayError::Build(format!("invalid access token: {e}")))?,
        );
        Ok(headers)
    }

    /// Names of required fields whose present value fails its format pattern.
    /// Absence is not a validation error here; [`detect_missing_properties`]
    /// covers it.
    ///
    /// [`detect_missing_properties`]: Operation::detect_missing_properties
    pub fn detect_errors(&self, intent: &Intent) -> Vec<&'static str> {
        self.required
            .iter()
            .filter(|field| match intent.get(field) {
                Some(value) => match self.pattern(field) {
                    Some(pattern) => !pattern.is_match(value),
                    None => false,
                },
                None => false,
            })
            .copied()
            .collect()
    }

    /// Names of required fields absent from the intent, in `required` order.
    pub fn detect_missing_properties(&self, intent: &Intent) -> Vec<&'static str> {
        self.required
            .iter()
            .filter(|field| !intent.contains(field))
            .copied()
            .collect()
    }

    /// Backfill optional fields from configuration. A value the caller
    /// supplied is never overwritten.
    pub fn fill_optional_properties(&self, intent: &mut Intent, config: &Configuration) {
        for (field, source) in self.optional {
            if !intent.contains(field) {
                if let Some(value) = source.resolve(config) {
                    intent.insert(*field, value);
                }
            }
        }
    }
}
