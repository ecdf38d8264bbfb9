//! Domain layer - Core market data and subscription types.
//!
//! No dependencies on the application or infrastructure layers.

/// Market data points and consolidated bar types.
pub mod market;

/// Subscription descriptors: resolutions, tick types, data kinds.
pub mod subscription;

/// Time providers for real and simulated clocks.
pub mod time;
