use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{debug, info, trace};

use crate::{
    is_plain_file_name, load_trip_from_file, move_path, read_record, write_record_atomic,
    Attachment, DiagnosticSink, Result, StoreEvent, TravelError, Trip,
};

/// Name of the metadata file inside every trip directory.
pub const METADATA_FILE: &str = "metadata.json";

/// Owns the root directory and the mapping of trips to their directories.
///
/// Every trip lives in `<root>/<start_date>_<city>_<country>/` next to its
/// attachments. The store keeps no cache: every read scans the root.
pub struct TripStore {
    /// Directory holding one subdirectory per trip
    root: PathBuf,

    /// Receiver for skipped directories, renames, merges and failures
    sink: Arc<dyn DiagnosticSink>,
}

impl TripStore {
    /// Creates a store over `root`, creating the directory if it is missing.
    ///
    /// # Arguments
    ///
    /// * `root` - Directory holding the trip folders
    /// * `sink` - Receiver for the store's diagnostic events
    pub fn new(root: impl Into<PathBuf>, sink: Arc<dyn DiagnosticSink>) -> Result<Self> {
        let root = root.into();
        if !root.exists() {
            debug!("Trips directory does not exist, creating: {}", root.display());
            fs::create_dir_all(&root).map_err(|e| {
                debug!("Failed to create trips directory: {}", e);
                TravelError::DirectoryError { path: root.clone() }
            })?;
        }

        info!("Trip store opened at {}", root.display());
        Ok(Self { root, sink })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory the trip belongs in, derived from its date and location.
    pub fn trip_dir(&self, trip: &Trip) -> PathBuf {
        self.root.join(trip.folder_name())
    }

    /// Full path of an attachment. Existence is not checked.
    pub fn attachment_path(&self, trip: &Trip, filename: &str) -> PathBuf {
        self.trip_dir(trip).join(filename)
    }

    /// Loads every trip under the root, newest `start_date` first.
    ///
    /// Directories without `metadata.json` are ignored. Directories whose
    /// metadata cannot be parsed are reported to the sink and skipped.
    pub fn scan_all(&self) -> Vec<Trip> {
        let mut trips: Vec<Trip> = self
            .scan_located()
            .into_iter()
            .map(|(_, trip)| trip)
            .collect();

        // Stable: equal dates keep the folder-name order from scan_located
        trips.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        debug!("Scanned {} trips from {}", trips.len(), self.root.display());
        trips
    }

    /// Finds a trip by id with a linear scan.
    pub fn find_by_id(&self, id: &str) -> Option<Trip> {
        self.locate(id).map(|(_, trip)| trip)
    }

    /// Saves a trip and writes the supplied attachments next to it.
    ///
    /// Moves or merges the trip's previous directory when its date or location
    /// changed, and updates `trip.attachments` with the newly written files.
    /// Failures are reported to the sink and returned as `false`; nothing done
    /// before the failure is rolled back.
    pub fn save(&self, trip: &mut Trip, uploads: &[Attachment]) -> bool {
        match self.try_save(trip, uploads) {
            Ok(_) => true,
            Err(e) => {
                self.sink.record(StoreEvent::SaveFailed {
                    trip_id: trip.id.clone(),
                    reason: e.to_string(),
                });
                false
            }
        }
    }

    /// Fallible form of [`TripStore::save`], returning the trip's directory.
    pub fn try_save(&self, trip: &mut Trip, uploads: &[Attachment]) -> Result<PathBuf> {
        info!("Saving trip: {}", trip.id);

        if let Some(upload) = uploads
            .iter()
            .find(|u| !is_plain_file_name(&u.filename) || u.filename == METADATA_FILE)
        {
            return Err(TravelError::InvalidInput {
                message: format!("Attachment name not allowed: {:?}", upload.filename),
            });
        }

        if let Some((found_dir, existing)) = self.locate(&trip.id) {
            self.relocate(&trip.id, &existing, &found_dir, trip)?;
        }

        let trip_dir = self.trip_dir(trip);
        fs::create_dir_all(&trip_dir)?;

        let written = self.write_attachments(&trip.id, &trip_dir, uploads)?;
        let mut attachments: Vec<String> = Vec::with_capacity(trip.attachments.len());
        for filename in trip.attachments.drain(..).chain(written) {
            if !attachments.contains(&filename) {
                attachments.push(filename);
            }
        }
        trip.attachments = attachments;

        self.check_metadata_owner(&trip_dir, &trip.id);
        let metadata_path = trip_dir.join(METADATA_FILE);
        write_record_atomic(&metadata_path, &trip.to_record())?;

        self.sink.record(StoreEvent::TripSaved {
            trip_id: trip.id.clone(),
            dir: trip_dir.clone(),
        });
        Ok(trip_dir)
    }

    /// Deletes the directory of the trip with the given id.
    ///
    /// Returns `false` when no trip matches or the removal fails.
    pub fn delete(&self, id: &str) -> bool {
        match self.try_delete(id) {
            Ok(()) => true,
            Err(TravelError::TripNotFound { .. }) => {
                debug!("Nothing to delete for trip {}", id);
                false
            }
            Err(e) => {
                self.sink.record(StoreEvent::DeleteFailed {
                    trip_id: id.to_string(),
                    reason: e.to_string(),
                });
                false
            }
        }
    }

    /// Fallible form of [`TripStore::delete`].
    ///
    /// Only the `id` key of each metadata file is consulted, so a malformed
    /// record for another trip never prevents the deletion.
    pub fn try_delete(&self, id: &str) -> Result<()> {
        info!("Deleting trip: {}", id);

        for dir in self.trip_dirs()? {
            let metadata_path = dir.join(METADATA_FILE);
            if !metadata_path.is_file() {
                continue;
            }

            let record = match read_record(&metadata_path) {
                Ok(record) => record,
                Err(e) => {
                    trace!("Ignoring unreadable {}: {}", metadata_path.display(), e);
                    continue;
                }
            };

            if record.get("id").and_then(|v| v.as_str()) == Some(id) {
                fs::remove_dir_all(&dir)?;
                self.sink.record(StoreEvent::TripDeleted {
                    trip_id: id.to_string(),
                    dir,
                });
                return Ok(());
            }
        }

        Err(TravelError::TripNotFound { id: id.to_string() })
    }

    /// Immediate subdirectories of the root, sorted by name.
    fn trip_dirs(&self) -> Result<Vec<PathBuf>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut dirs = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    /// Every parseable trip together with the directory it was found in.
    fn scan_located(&self) -> Vec<(PathBuf, Trip)> {
        let dirs = match self.trip_dirs() {
            Ok(dirs) => dirs,
            Err(e) => {
                self.sink.record(StoreEvent::ScanFailed {
                    root: self.root.clone(),
                    reason: e.to_string(),
                });
                return Vec::new();
            }
        };

        let mut found = Vec::with_capacity(dirs.len());
        for dir in dirs {
            let metadata_path = dir.join(METADATA_FILE);
            if !metadata_path.is_file() {
                trace!("No metadata in {}, ignoring", dir.display());
                continue;
            }

            match load_trip_from_file(&metadata_path) {
                Ok(trip) => found.push((dir, trip)),
                Err(e) => self.sink.record(StoreEvent::TripSkipped {
                    dir,
                    reason: e.to_string(),
                }),
            }
        }
        found
    }

    fn locate(&self, id: &str) -> Option<(PathBuf, Trip)> {
        self.scan_located()
            .into_iter()
            .find(|(_, trip)| trip.id == id)
    }

    /// Brings the stored directory of `existing` to the name `updated` maps to.
    fn relocate(
        &self,
        trip_id: &str,
        existing: &Trip,
        found_dir: &Path,
        updated: &Trip,
    ) -> Result<()> {
        let new_dir = self.trip_dir(updated);

        // The expected folder only counts when it holds this trip's record;
        // otherwise the folder was renamed by hand and the record lives elsewhere
        let expected_dir = self.trip_dir(existing);
        let old_dir = if metadata_id(&expected_dir).as_deref() == Some(trip_id) {
            expected_dir
        } else {
            found_dir.to_path_buf()
        };

        if old_dir == new_dir || !old_dir.is_dir() {
            return Ok(());
        }

        if !new_dir.exists() {
            move_path(&old_dir, &new_dir)?;
            self.sink.record(StoreEvent::DirectoryRenamed {
                trip_id: trip_id.to_string(),
                from: old_dir,
                to: new_dir,
            });
        } else {
            self.merge_into(trip_id, &old_dir, &new_dir)?;
        }
        Ok(())
    }

    /// Moves every entry of `from` into `to` unless `to` already has that
    /// name, then removes `from`. Not atomic: a crash part way through
    /// leaves entries in both directories.
    fn merge_into(&self, trip_id: &str, from: &Path, to: &Path) -> Result<()> {
        let mut moved = 0;
        let mut skipped = Vec::new();

        for entry in fs::read_dir(from)? {
            let entry = entry?;
            let name = entry.file_name();
            let dest = to.join(&name);

            if dest.exists() {
                skipped.push(name.to_string_lossy().to_string());
                continue;
            }
            move_path(&entry.path(), &dest)?;
            moved += 1;
        }

        fs::remove_dir_all(from)?;
        self.sink.record(StoreEvent::DirectoriesMerged {
            trip_id: trip_id.to_string(),
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            moved,
            skipped,
        });
        Ok(())
    }

    /// Writes each upload into `dir`, overwriting files of the same name.
    /// Returns the names written, in upload order.
    fn write_attachments(
        &self,
        trip_id: &str,
        dir: &Path,
        uploads: &[Attachment],
    ) -> Result<Vec<String>> {
        let mut written = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let path = dir.join(&upload.filename);
            fs::write(&path, &upload.bytes)?;
            self.sink.record(StoreEvent::AttachmentWritten {
                trip_id: trip_id.to_string(),
                path,
            });
            written.push(upload.filename.clone());
        }
        Ok(written)
    }

    /// Reports when the metadata about to be written belongs to another trip.
    fn check_metadata_owner(&self, dir: &Path, trip_id: &str) {
        if let Some(previous_id) = metadata_id(dir) {
            if previous_id != trip_id {
                self.sink.record(StoreEvent::MetadataReplaced {
                    dir: dir.to_path_buf(),
                    previous_id,
                    trip_id: trip_id.to_string(),
                });
            }
        }
    }
}

/// The `id` recorded in `dir`'s metadata file, if it can be read.
fn metadata_id(dir: &Path) -> Option<String> {
    let metadata_path = dir.join(METADATA_FILE);
    if !metadata_path.is_file() {
        return None;
    }
    read_record(&metadata_path)
        .ok()
        .and_then(|record| record.get("id").and_then(|v| v.as_str()).map(String::from))
}
