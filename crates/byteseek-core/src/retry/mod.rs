//! Retry and backoff policy for chunk fetches.
//!
//! Disabled unless configured: the default policy allows a single attempt, so
//! any failure ends the session. When more attempts are allowed, only
//! transient failures (timeouts, connection errors, 429/503/5xx) are retried.

mod classify;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
