//! M-Pesa payment gateway client
//!
//! Async client for the M-Pesa open API: given an intent describing a
//! transfer or status query, it resolves the applicable operation, completes
//! missing fields from configuration, validates per-operation rules, builds
//! the provider wire request and normalizes the provider's divergent
//! success/error schemas into one envelope.
//!
//! Five operations are supported: customer-to-business, business-to-customer
//! and business-to-business payments, reversal, and transaction status query.
//!
//! # Examples
//!
//! ## Sending a payment
//!
//! ```no_run
//! use mpesa_gateway::{Intent, Service, Settings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = Service::new(Settings {
//!     api_key: Some("api-key".into()),
//!     public_key: Some("public-key".into()),
//!     service_provider_code: Some("123456".into()),
//!     host: Some("sandbox.safaricom.co.ke".into()),
//!     ..Settings::default()
//! })?;
//!
//! // A phone-shaped recipient routes to a business-to-customer payment,
//! // a 5-6 digit service provider code to business-to-business.
//! let intent = Intent::new()
//!     .with("to", "+254712345678")
//!     .with("amount", "10")
//!     .with("transaction", "T12345")
//!     .with("reference", "REF12345");
//!
//! let outcome = service.handle_send(intent).await?;
//! println!("transaction: {:?}", outcome.transaction);
//! # Ok(())
//! # }
//! ```
//!
//! ## Querying transaction status
//!
//! ```no_run
//! use mpesa_gateway::{Intent, Service};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = Service::from_env()?;
//!
//! let intent = Intent::new()
//!     .with("query", "T12345")
//!     .with("reference", "REF12345");
//!
//! let outcome = service.handle_query(intent).await?;
//! println!("status code: {:?}", outcome.response.code);
//! # Ok(())
//! # }
//! ```

mod config;
mod environment;
mod error;
mod intent;
mod operation;
mod response;
mod service;

// Re-export public API
pub use config::{Configuration, Settings};
pub use environment::Environment;
pub use error::{GatewayError, ProviderFailure};
pub use intent::Intent;
pub use operation::{normalize_phone_number, ConfigSource, HeaderValues, Operation, OperationKind};
pub use response::{ProviderPayload, ResponseDetail, TransactionResponse};
pub use service::Service;

// Re-export commonly used types from dependencies
pub use http::{Method, StatusCode};
