//! Task persistence contracts and their implementations.
//!
//! # Responsibility
//! - Define the `TaskStore` contract consumed by the controller.
//! - Isolate SQLite query details from controller logic.
//! - Run store operations off the caller's thread and publish snapshots.
//!
//! # Invariants
//! - Write paths enforce the title rule even when callers already did.
//! - Operations on a missing id return `StoreError::NotFound`, never panic.

pub mod store_worker;
pub mod task_store;
