//! Live attendance feed.
//!
//! One polling loop per open viewer connection: on subscribe, and then every
//! [`FEED_INTERVAL`], the loop re-reads the event's attendance and pushes a
//! full snapshot frame. Loops share nothing and never block each other. A
//! failed read is logged and skipped; only viewer disconnect (the drop guard)
//! or an explicit cancel ends the loop, checked on every iteration.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::interval;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::warn;

use crate::models::AttendanceRecord;
use crate::store::Store;

pub const FEED_INTERVAL: Duration = Duration::from_secs(3);

const FRAME_BUFFER: usize = 8;

/// One snapshot pushed to a viewer: the event's full attendance, most recent
/// time-in first, plus the server time it was read.
#[derive(Clone, Debug, Serialize)]
pub struct FeedFrame {
    pub attendance: Vec<AttendanceRecord>,
    pub timestamp: String,
}

pub struct FeedSubscription {
    pub frames: mpsc::Receiver<FeedFrame>,
    /// Cancels the polling loop when the subscription is dropped.
    pub guard: DropGuard,
}

pub fn subscribe(
    store: Arc<dyn Store>,
    event_id: String,
    every: Duration,
) -> FeedSubscription {
    let token = CancellationToken::new();
    let cancelled = token.clone();
    let (tx, rx) = mpsc::channel(FRAME_BUFFER);

    tokio::spawn(async move {
        // first tick fires immediately, giving the viewer a snapshot on open
        let mut ticker = interval(every);

        loop {
            tokio::select! {
                _ = cancelled.cancelled() => break,
                _ = ticker.tick() => {
                    let frame = match store.list_attendance(&event_id).await {
                        Ok(attendance) => FeedFrame {
                            attendance,
                            timestamp: Utc::now().to_rfc3339(),
                        },
                        Err(err) => {
                            // stale beats disconnected; keep the loop alive
                            warn!("Attendance poll for event {event_id} failed: {err}");
                            continue;
                        }
                    };

                    if tx.send(frame).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    FeedSubscription {
        frames: rx,
        guard: token.drop_guard(),
    }
}
