//! # API Shared
//!
//! Shared wire types and utilities for the screener APIs.
//!
//! Contains:
//! - Request/response types for the relay and export endpoints (`wire` module)
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and by the integration tests for common shapes.

pub mod health;
pub mod wire;

pub use health::HealthService;
pub use wire::*;
