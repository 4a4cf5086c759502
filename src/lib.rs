//! RoleGate Core - Permission Authorization Engine
//!
//! This crate provides the authorization core for the RoleGate business
//! suite: the declarative resource/action catalog, the durable role
//! assignment store, the catalog reconciler, the per-role permission cache,
//! and the request-time guard consulted by every protected operation.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod guard;
pub mod middleware;
pub mod migration;
pub mod reconciler;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use config::Config;
pub use engine::AuthzEngine;
pub use error::{AppError, Result};
