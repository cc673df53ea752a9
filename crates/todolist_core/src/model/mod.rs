//! Task list domain model.
//!
//! # Responsibility
//! - Define the task record and the title rule shared by every write path.
//! - Define the completion filter applied to snapshots.
//!
//! # Invariants
//! - Every persisted task is identified by a store-assigned `TaskId`.
//! - Deletion is permanent; there is no tombstone state.

pub mod filter;
pub mod task;
