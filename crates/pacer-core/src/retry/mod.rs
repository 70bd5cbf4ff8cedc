//! Retry with exponential backoff.
//!
//! Failures are classified into a [`FailureKind`]; the policy retries the
//! kinds it was configured for and surfaces everything else immediately.
//! Executors exist for blocking callers (sleeping through a [`Sleeper`]) and
//! for async callers (sleeping on the tokio timer).

mod kind;
mod policy;
mod run;
mod sleep;

pub use kind::{Classify, FailureKind, RetryOn};
pub use policy::{RetryDecision, RetryPolicy, RetryPolicyBuilder};
pub use run::Retrying;
pub use sleep::{RecordingSleeper, Sleeper, ThreadSleeper};
