//! HTTP surface modules.

/// Shared header names and form field names.
pub mod constants;
/// Conversion endpoint handler.
pub mod convert;
/// Error response mapping.
pub mod errors;
/// Health and metrics endpoints.
pub mod health;
/// Multipart form decoding.
pub mod multipart;
/// Router construction and server host.
pub mod router;
/// Metrics middleware for HTTP requests.
pub mod telemetry;
