//! Integration tests for the admission gateway.
//!
//! - **api_tests**: End-to-end tests driving the gated router
//! - **config_tests**: Configuration loading and validation tests

pub mod api_tests;
pub mod config_tests;
