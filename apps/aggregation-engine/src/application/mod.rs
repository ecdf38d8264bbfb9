//! Application Layer - Port definitions.
//!
//! This layer contains the port interfaces that define how the
//! aggregation domain reaches external systems for raw data.

/// Port interfaces for external data access.
pub mod ports;
