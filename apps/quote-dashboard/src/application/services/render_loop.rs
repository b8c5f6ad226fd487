//! Render Loop
//!
//! Draws a frame, sleeps a fixed interval, repeats. The cadence is set by the
//! clock alone; ingestion speed has no influence on it.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio_util::sync::CancellationToken;

use crate::application::ports::DisplaySurface;
use crate::application::services::render::{RenderFrame, build_frame};
use crate::domain::feed::FeedStatus;
use crate::domain::instrument::Universe;
use crate::domain::quote::QuoteStore;
use crate::infrastructure::metrics;

/// Shared state read by the render loop.
#[derive(Clone)]
pub struct RenderContext {
    /// Static instrument list.
    pub universe: Arc<Universe>,
    /// Quote store.
    pub store: Arc<QuoteStore>,
    /// Feed status for the footer.
    pub feed: Arc<FeedStatus>,
}

impl RenderContext {
    /// Build the frame for the current instant.
    #[must_use]
    pub fn frame(&self) -> RenderFrame {
        build_frame(
            &self.universe,
            &self.store.snapshot(),
            Local::now().time(),
            self.feed.state(),
        )
    }
}

/// Run until `cancel` fires. Returns the number of frames presented.
///
/// Surface errors are logged and the loop carries on.
pub async fn run_render_loop<S: DisplaySurface>(
    ctx: &RenderContext,
    surface: &mut S,
    interval: Duration,
    cancel: CancellationToken,
) -> u64 {
    let mut frames = 0u64;

    loop {
        if cancel.is_cancelled() {
            break;
        }

        let frame = ctx.frame();
        match surface.present(&frame) {
            Ok(()) => {
                frames += 1;
                metrics::record_frame_rendered();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to present frame");
            }
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(interval) => {}
        }
    }

    tracing::debug!(frames, "Render loop stopped");
    frames
}
