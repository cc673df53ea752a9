//! Core use-case services.
//!
//! # Responsibility
//! - Turn presentation intents into validated store requests.
//! - Keep UI layers decoupled from storage details.

pub mod intent;
pub mod task_list_controller;
