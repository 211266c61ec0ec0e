//! Structured diagnostics emitted by the trip store.
//!
//! The store never logs directly. It reports [`StoreEvent`]s to the
//! [`DiagnosticSink`] it was constructed with; [`LogSink`] forwards them to the
//! `log` facade and [`RecordingSink`] keeps them in memory.
use std::{path::PathBuf, sync::Mutex};

use log::{debug, error, info, warn};

/// Something the trip store did or failed to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A directory under the root was ignored because its metadata is unreadable
    TripSkipped { dir: PathBuf, reason: String },
    /// The root directory itself could not be listed
    ScanFailed { root: PathBuf, reason: String },
    DirectoryRenamed {
        trip_id: String,
        from: PathBuf,
        to: PathBuf,
    },
    /// A trip's old directory was folded into an already occupied one
    DirectoriesMerged {
        trip_id: String,
        from: PathBuf,
        to: PathBuf,
        moved: usize,
        skipped: Vec<String>,
    },
    /// A metadata file belonging to another trip was overwritten
    MetadataReplaced {
        dir: PathBuf,
        previous_id: String,
        trip_id: String,
    },
    AttachmentWritten { trip_id: String, path: PathBuf },
    TripSaved { trip_id: String, dir: PathBuf },
    SaveFailed { trip_id: String, reason: String },
    TripDeleted { trip_id: String, dir: PathBuf },
    DeleteFailed { trip_id: String, reason: String },
}

/// Receiver for store events, injected at construction time.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, event: StoreEvent);
}

/// Forwards every event to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn record(&self, event: StoreEvent) {
        match event {
            StoreEvent::TripSkipped { dir, reason } => {
                warn!("Skipping trip directory {}: {}", dir.display(), reason)
            }
            StoreEvent::ScanFailed { root, reason } => {
                error!("Failed to scan trips in {}: {}", root.display(), reason)
            }
            StoreEvent::DirectoryRenamed { trip_id, from, to } => info!(
                "Moved trip {} from {} to {}",
                trip_id,
                from.display(),
                to.display()
            ),
            StoreEvent::DirectoriesMerged {
                trip_id,
                from,
                to,
                moved,
                skipped,
            } => {
                info!(
                    "Merged trip {} from {} into existing {} ({} moved)",
                    trip_id,
                    from.display(),
                    to.display(),
                    moved
                );
                if !skipped.is_empty() {
                    warn!(
                        "Kept existing files in {} instead of: {}",
                        to.display(),
                        skipped.join(", ")
                    );
                }
            }
            StoreEvent::MetadataReplaced {
                dir,
                previous_id,
                trip_id,
            } => warn!(
                "Metadata of trip {} in {} replaced by trip {}",
                previous_id,
                dir.display(),
                trip_id
            ),
            StoreEvent::AttachmentWritten { trip_id, path } => {
                debug!("Wrote attachment {} for trip {}", path.display(), trip_id)
            }
            StoreEvent::TripSaved { trip_id, dir } => {
                info!("Trip {} saved to {}", trip_id, dir.display())
            }
            StoreEvent::SaveFailed { trip_id, reason } => {
                error!("Error saving trip {}: {}", trip_id, reason)
            }
            StoreEvent::TripDeleted { trip_id, dir } => {
                info!("Trip {} deleted ({})", trip_id, dir.display())
            }
            StoreEvent::DeleteFailed { trip_id, reason } => {
                error!("Error deleting trip {}: {}", trip_id, reason)
            }
        }
    }
}

/// Keeps events in memory, in the order they were recorded.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<StoreEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn events(&self) -> Vec<StoreEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl DiagnosticSink for RecordingSink {
    fn record(&self, event: StoreEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
