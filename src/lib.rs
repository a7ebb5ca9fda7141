// src/lib.rs
// Public library surface for the binary and the integration tests.

pub mod analyze;
pub mod compose;
pub mod config;
pub mod illustrate;
pub mod ingest;
pub mod pipeline;
pub mod publish;

// ---- Re-exports for the common entry points ----
pub use crate::analyze::condenser::{Condensation, Condenser};
pub use crate::analyze::selector::{Selection, Selector};
pub use crate::config::AppConfig;
pub use crate::ingest::types::{FeedSource, NewsRecord};
pub use crate::pipeline::{Pipeline, RunOutcome, StageError};
