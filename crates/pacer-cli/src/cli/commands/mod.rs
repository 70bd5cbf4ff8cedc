//! CLI command handlers. Each command is in its own file.

mod completions;
mod config;
mod events;
mod limit;
mod man;
mod retry;

pub use completions::run_completions;
pub use config::run_config;
pub use limit::{run_limit, LimitOptions};
pub use man::run_man;
pub use retry::{run_retry, RetryOptions};
