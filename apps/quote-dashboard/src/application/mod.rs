//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the application services and port interfaces
//! that define how the quote state interacts with external systems.

/// Port interfaces for external systems (history provider, display surface).
pub mod ports;

/// Snapshot loading, stream ingestion and rendering services.
pub mod services;
