//! HTTP client construction and retry policy.
//!
//! - [`client`] - Client creation with tracing middleware, proxy and headers
//! - [`retry`] - Failure classification and exponential backoff between attempts
//!
//! Retrying is not done by middleware: a transfer whose body stream dies
//! half-way has to restart from zero, which only the fetcher can do. The
//! [`RetryPolicy`] is consulted by the fetcher after every failed attempt.

pub mod client;
pub mod retry;

pub use client::{create_http_client, HttpClientConfig};
pub use retry::{RetryDecision, RetryPolicy};
