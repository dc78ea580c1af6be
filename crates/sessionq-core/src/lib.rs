//! Shared vocabulary for the sessionq workspace.
//!
//! This crate provides:
//! - The error taxonomy for session acquisition, execution, and close
//! - The listener configuration schema
//! - Collaborator traits for the broker client and the host executor

pub mod broker;
pub mod config;
pub mod error;
pub mod executor;

pub use broker::{QueueSession, SessionClient};
pub use config::ListenerConfig;
pub use error::{AcceptError, CloseError, ExecutionError, ListenerError};
pub use executor::{SessionExecutor, SessionInput};
