//! HTTP access to the works API.
//!
//! [`ApiClient`] owns the connection pool, the concurrency semaphore and all
//! retry handling; [`WorkFilter`] composes the comma-separated filter
//! predicate; [`WorksQuery`] plus [`ApiClient::stream_works`] turn one
//! logical query into a lazy cursor-paginated record stream.

mod client;
mod filter;
mod pagination;

pub use client::ApiClient;
pub use filter::WorkFilter;
pub use pagination::WorksQuery;

use thiserror::Error;

/// Errors surfaced by the API layer.
///
/// Transient failures (rate limiting, blocks, network errors, server errors)
/// are retried internally and only become visible as `RetriesExhausted` once
/// the attempt budget for a single fetch operation runs out.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The retry budget for one fetch operation ran out.
    #[error("Request failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of failed attempts, equal to the configured budget.
        attempts: u32,
        /// Description of the final failure.
        last: String,
    },

    /// Invalid request composition, detected before any network call.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
