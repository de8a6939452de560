//! Candymine Core - shared plumbing for the candymine batch tools
//!
//! Retry state machine, sequential item driver, HTTP runtime, logging,
//! progress and shutdown handling used by every pipeline.

pub mod driver;
pub mod error;
pub mod http;
pub mod logging;
pub mod progress;
pub mod retry;
pub mod shutdown;

// Re-exports for convenience
pub use driver::{
    Diagnostics, Driver, LogDiagnostics, Resolution, Resolver, Sink, Summary, WorkItem,
    unresolved_on_decode,
};
pub use error::RequestError;
pub use http::{HttpReply, SHARED_RUNTIME, http_client, post_bytes, post_json};
pub use logging::{IndicatifLogger, init_logging};
pub use progress::ProgressContext;
pub use retry::{FailedAttempt, ItemOutcome, ItemState, MAX_RETRIES, RetryPolicy, RetryState, retry};
pub use shutdown::{install_signal_handlers, is_shutdown_requested, shutdown_flag, sleep_unless_shutdown};
