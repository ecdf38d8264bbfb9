//! Infrastructure Layer - Adapters and runtime wiring.
//!
//! Environment-driven configuration, tracing setup, and concrete
//! implementations of the application-layer data ports.

/// Environment-driven configuration.
pub mod config;

/// Data-port adapters (local filesystem).
pub mod providers;

/// Tracing subscriber setup.
pub mod telemetry;
