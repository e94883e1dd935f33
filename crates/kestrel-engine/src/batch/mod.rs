//! Per-kind accumulation of draw requests between flushes.

mod service;

pub use service::{AddOutcome, BatchingService, Slot};
