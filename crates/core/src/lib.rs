// crates/core/src/lib.rs
//! Tab-scoped summary jobs.
//!
//! A context (a browser tab, a document, anything with a stable id) asks
//! for a summary; the job's state lives in a shared [`store::Store`] under
//! that context's key. Observers read it on attach and follow it through
//! [`notify::ChangeNotifier`]; the [`executor::SummaryExecutor`] writes the
//! outcome back. Nothing is handed back directly to the caller.
pub mod bridge;
pub mod error;
pub mod executor;
pub mod jobs;
pub mod lifecycle;
pub mod llm;
pub mod notify;
pub mod panel;
pub mod service;
pub mod settings;
pub mod store;

pub use error::*;
pub use executor::SummaryExecutor;
pub use jobs::{JobCache, JobEntry, JobTicket, JobView};
pub use lifecycle::{ContextEvent, LifecycleManager};
pub use notify::{ChangeNotifier, Subscription};
pub use panel::{Panel, PanelView};
pub use service::{SummarizeAck, SummarizeRequest, SummaryService};
pub use settings::Settings;
pub use store::{FileStore, MemoryStore, Store, StoreChange};
