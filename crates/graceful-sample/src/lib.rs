//! # Graceful Sample Library
//!
//! Exposes the sample services and their wiring for the demo binary and integration tests.

pub mod lifecycle;
pub mod services;
