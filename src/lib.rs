//! # citegraph
//!
//! Acquire a multi-hop citation graph from the OpenAlex works API.
//!
//! The crate covers the acquisition side of a citation-network pipeline:
//!
//! - [`api`]: a concurrency-bounded, retrying, backoff-aware HTTP client
//!   with lazy cursor-based pagination and typed filter composition
//! - [`graph`]: field normalization, multi-key deduplication and the
//!   breadth-first frontier expander that grows the graph hop by hop
//! - [`models`]: wire-shape and canonical work records
//! - [`config`]: plain-scalar configuration, loadable from TOML
//!
//! Storage, clustering and visualization are downstream consumers of
//! [`graph::Expansion`] and are out of scope here.
//!
//! ```rust,no_run
//! use citegraph::{build_seed, expand, ApiClient, Config};
//! use citegraph::graph::{ExpandOptions, SeedOptions};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! config.validate()?;
//! let client = ApiClient::new(&config.api, config.retry);
//!
//! let seed = build_seed(&client, "vector spaces", &SeedOptions::from(&config)).await?;
//! let expansion = expand(&client, seed, &ExpandOptions::from(&config)).await?;
//! println!("collected {} works over {} hops", expansion.works.len(), expansion.layers.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod graph;
pub mod models;

pub use api::{ApiClient, ApiError, WorkFilter, WorksQuery};
pub use config::{Config, ConfigError};
pub use graph::{build_seed, expand, Deduper, ExpandError, Expansion};
pub use models::{RawWork, Work};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
