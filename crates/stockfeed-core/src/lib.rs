//! # Stockfeed Core
//!
//! Concurrent fetch-and-decode engine for stock and ETF market data.
//!
//! ## Overview
//!
//! - **Rate-limited HTTP access** with bounded concurrency, one shared
//!   connection context and a single retry after a throttle response
//! - **Per-data-type fetchers** that validate parameters before any request
//! - **Decoders** for flat JSON records, `[timestamp, price]` series and
//!   index-encoded SvelteKit documents
//! - **Orchestrators** that fan out every fetch for a ticker and merge the
//!   results all-or-nothing
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`decode`] | Decode strategies and label tables |
//! | [`domain`] | Validated request parameters |
//! | [`envelope`] | Data types, fetch envelopes and composed results |
//! | [`error`] | Validation, decode and fetch errors |
//! | [`fetchers`] | One fetcher per data type |
//! | [`http_client`] | Transport contract and reqwest transport |
//! | [`orchestrator`] | Stock and ETF composition plans |
//! | [`policy`] | Limits, endpoints and environment configuration |
//! | [`retry`] | `Retry-After` parsing |
//! | [`service`] | String-parameter facade for a routing layer |
//! | [`throttling`] | Rate-limited client and request pacing |
//! | [`url_template`] | Named-placeholder URL building |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stockfeed_core::MarketDataService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = MarketDataService::from_env()?;
//!
//!     let quote = service.quote("AAPL", "stock").await?;
//!     println!("{}", serde_json::to_string_pretty(&quote)?);
//!
//!     let composed = service.compose_etf("SCHD").await?;
//!     println!("{:?}", composed.data.keys().collect::<Vec<_>>());
//!
//!     service.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ MarketDataService│
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │  Orchestrator    │────▶│  Fetchers        │
//! │  (fan-out/in)    │     │  (per data type) │
//! └──────────────────┘     └────────┬─────────┘
//!                                   │
//!                 ┌─────────────────┴──────────────┐
//!                 ▼                                ▼
//!        ┌──────────────────┐            ┌──────────────────┐
//!        │ RateLimitedClient│            │ DecodeStrategy   │
//!        │ (gate, session)  │            │ (flat/indexed/…) │
//!        └────────┬─────────┘            └──────────────────┘
//!                 ▼
//!        ┌──────────────────┐
//!        │ HttpClient       │
//!        │ (reqwest/mock)   │
//!        └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns [`FetchError`]; [`FetchError::code`] gives a
//! stable string for logs and API responses:
//!
//! ```rust
//! use stockfeed_core::{FetchError, ValidationError};
//!
//! fn describe(error: &FetchError) -> &'static str {
//!     match error {
//!         FetchError::Validation(ValidationError::InvalidRange { .. }) => "bad range",
//!         FetchError::Upstream { status: 429, .. } => "throttled twice",
//!         _ => error.code(),
//!     }
//! }
//! ```

pub mod decode;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod fetchers;
pub mod http_client;
pub mod orchestrator;
pub mod policy;
pub mod retry;
pub mod service;
pub mod throttling;
pub mod url_template;

// Decoding
pub use decode::{DecodeStrategy, IndexedRows, LabelTable};

// Domain types
pub use domain::{AssetClass, HistoryRange, Period, StatementPeriod, Ticker};

// Envelope types
pub use envelope::{ComposedResult, DataEnvelope, DataType, DecodedRecord, Payload};

// Error types
pub use error::{DecodeError, FetchError, ValidationError};

// Fetchers
pub use fetchers::{
    AssetRef, Fetchers, HistoricalFetcher, HistoryRequest, QuoteFetcher, RevenueFetcher,
    Statement, StatementFetcher, StatementRequest, TimeSeriesFetcher,
};

// HTTP client types
pub use http_client::{
    HttpClient, HttpConnector, HttpError, HttpRequest, HttpResponse, ReqwestConnector,
    ReqwestHttpClient,
};

// Orchestration
pub use orchestrator::{ComposePlan, FetchStep, Orchestrator};

// Configuration
pub use policy::{CalendarOffset, Endpoints, FetchPolicy, RequestQuota};

// Service facade
pub use service::MarketDataService;

// Throttling
pub use throttling::{RateLimitedClient, RequestPacer};

pub use url_template::UrlTemplate;
