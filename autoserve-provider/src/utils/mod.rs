//! Utility modules.

/// Timestamp serialization helpers.
pub mod datetime;

/// Log sanitization utilities to prevent sensitive data exposure.
pub mod log_sanitizer;
