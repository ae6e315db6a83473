//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - Scripted transport that records replayed requests
//! - Queue and coordinator fixtures over memory, SQLite and wiremock
//! - Custom assertion macros

pub mod mock_transport;

// Re-export commonly used utilities
pub use fixtures::*;
pub use mock_transport::*;
