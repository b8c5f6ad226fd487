//! Application Services
//!
//! Services that orchestrate domain logic and coordinate between ports.
//!
//! - `SnapshotLoader`: primes the quote store from a bulk history query
//! - `StreamIngestor`: applies push feed events to the quote store
//! - `render`: pure projection of the store onto a frame
//! - `render_loop`: fixed-cadence presentation of frames
//! - `IngestionTasks`: bounded shutdown of background tasks

pub mod ingestor;
pub mod lifecycle;
pub mod render;
pub mod render_loop;
pub mod snapshot_loader;

pub use ingestor::StreamIngestor;
pub use lifecycle::{IngestionTasks, ShutdownOutcome};
pub use render::{Direction, FrameRow, GainCell, GainTone, PriceCell, RenderFrame, build_frame};
pub use render_loop::{RenderContext, run_render_loop};
pub use snapshot_loader::{LastBar, SnapshotError, SnapshotLoader, SnapshotReport};
