//! Domain Layer - Core quote state types.
//!
//! This layer holds the quote store and the types it is built from. Nothing
//! here performs I/O.

/// Static instrument universe and book values.
pub mod instrument;

/// Observations, the quote store and push feed ticks.
pub mod quote;

/// Push feed connection state.
pub mod feed;
