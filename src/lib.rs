//! Checkly provider
//!
//! A provider plugin that manages [Checkly](https://www.checklyhq.com)
//! monitoring objects (checks, check groups, monitors, alert channels,
//! dashboards, status pages, maintenance windows, private locations and
//! more) for an infrastructure-as-code host.
//!
//! # Overview
//!
//! Every resource type follows the same pattern:
//!
//! ```text
//! schema  →  from_attributes  →  typed model  →  Checkly API
//!                                     ↓
//! state   ←  to_attributes   ←  typed model  ←  API response
//! ```
//!
//! - [`schema`] describes attributes, nested blocks, defaults and validators.
//! - [`attributes`] converts between loose attribute maps and the typed
//!   [`models`], keeping repeated applies free of spurious diffs.
//! - [`plan`] computes planned states and replacement decisions.
//! - [`client`] talks to the Checkly REST API with a per-call timeout.
//! - [`resources`] and [`data_sources`] hold one module per type.
//! - [`provider::ChecklyProvider`] dispatches host requests to them, and
//!   [`server`] exposes it over gRPC.
//!
//! # Handshake
//!
//! The binary prints one line to stdout once it listens:
//!
//! ```text
//! CHECKLY_PROVIDER|1|127.0.0.1:50051
//! ```
//!
//! Format: `CHECKLY_PROVIDER|<protocol_version>|<address>`. Logs go to stderr.
//!
//! # Configuration
//!
//! | Setting      | Provider attribute | Environment          | Default                      |
//! |--------------|--------------------|----------------------|------------------------------|
//! | API key      | `api_key`          | `CHECKLY_API_KEY`    | required                     |
//! | Account id   | `account_id`       | `CHECKLY_ACCOUNT_ID` | none                         |
//! | API URL      | `api_url`          | `CHECKLY_API_URL`    | `https://api.checklyhq.com`  |
//! | Call timeout |                    | `API_CALL_TIMEOUT`   | `15s`                        |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod attributes;
pub mod client;
pub mod config;
pub mod data_sources;
pub mod error;
pub mod logging;
pub mod models;
pub mod plan;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod server;
pub mod testing;
pub mod types;
pub mod validation;

/// Types generated from `proto/provider.proto`.
#[allow(missing_docs)]
#[allow(clippy::all)]
pub mod generated {
    tonic::include_proto!("checkly.provider.v1");
}

pub use client::{ApiError, ChecklyClient, HttpTransport, Transport};
pub use config::{ConfigError, ProviderConfig};
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::ChecklyProvider;
pub use schema::ProviderSchema;
pub use server::{serve, serve_on, serve_until, serve_with_options, ProviderService, ServeOptions};
pub use types::{
    AttributeChange, ImportedResource, PlanResult, ProviderMetadata, ServerCapabilities,
    HANDSHAKE_PREFIX, PROTOCOL_VERSION,
};
pub use validation::validate;
