// crates/core/src/jobs/mod.rs
//! Tab-scoped job cache.
//!
//! Provides:
//! - `JobCache` - begin/complete/fail/read/clear over the shared store
//! - `JobEntry` - the persisted record under `summary_<key>`
//! - `JobView` - what an observer renders for a key
//! - `JobTicket` - fence handed to the executor by `begin_job`

pub mod cache;
pub mod types;

pub use cache::{Clock, JobCache, SystemClock, SUMMARY_TTL};
pub use types::{summary_key, JobEntry, JobTicket, JobView, SUMMARY_KEY_PREFIX};
