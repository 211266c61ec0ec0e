use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use log::{debug, error, trace};
use serde_json::Value;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::{Result, TravelError, Trip};

/// Reads a metadata file as an untyped record
pub fn read_record(path: &Path) -> Result<Value> {
    trace!("Reading record from {}", path.display());
    let content = fs::read_to_string(path).map_err(|e| {
        debug!("Failed to open metadata file {}: {}", path.display(), e);
        TravelError::Io(e)
    })?;

    Ok(serde_json::from_str(&content)?)
}

/// Helper method to load a single trip from its metadata file
pub fn load_trip_from_file(path: &Path) -> Result<Trip> {
    let trip = Trip::from_record(read_record(path)?)?;

    if trip.id.trim().is_empty() {
        return Err(TravelError::MalformedRecord {
            message: format!("Trip from {} has an empty ID", path.display()),
        });
    }

    trace!("Successfully loaded trip: {}", trip.id);
    Ok(trip)
}

/// Writes a record as pretty JSON through a temporary file in the same
/// directory, so readers never observe a half-written metadata file.
pub fn write_record_atomic(path: &Path, record: &Value) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| {
        error!("Failed to create temporary file in {}: {}", dir.display(), e);
        TravelError::Io(e)
    })?;

    let json = serde_json::to_string_pretty(record)?;
    temp_file.write_all(json.as_bytes())?;
    temp_file.flush()?;

    temp_file.persist(path).map_err(|e| {
        error!("Failed to persist file {}: {}", path.display(), e.error);
        TravelError::Io(e.error)
    })?;
    Ok(())
}

/// Moves a file or directory, copying and removing the source when a plain
/// rename is refused (for instance across file systems).
pub fn move_path(from: &Path, to: &Path) -> Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            debug!(
                "Rename {} -> {} failed ({}), falling back to copy",
                from.display(),
                to.display(),
                rename_err
            );
            if from.is_dir() {
                copy_dir_recursive(from, to)?;
                fs::remove_dir_all(from)?;
            } else {
                fs::copy(from, to)?;
                fs::remove_file(from)?;
            }
            Ok(())
        }
    }
}

fn copy_dir_recursive(from: &Path, to: &Path) -> Result<()> {
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(|e| TravelError::Io(e.into()))?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|_| TravelError::DirectoryError {
                path: entry.path().to_path_buf(),
            })?;
        let target: PathBuf = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Accepts only names that stay inside a single directory.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && Path::new(name).file_name().is_some_and(|n| n == name)
}

// Helper method for parsing tags
pub fn parse_tags(tags: Option<String>) -> Vec<String> {
    let mut parsed: Vec<String> = Vec::new();
    for tag in tags.iter().flat_map(|t| t.split(',')) {
        let tag = tag.trim();
        if !tag.is_empty() && !parsed.iter().any(|t| t == tag) {
            parsed.push(tag.to_string());
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_tags_trims_and_drops_duplicates() {
        assert_eq!(
            parse_tags(Some(" beach, food ,,beach".to_string())),
            vec!["beach".to_string(), "food".to_string()]
        );
        assert!(parse_tags(None).is_empty());
    }

    #[test]
    fn plain_file_names() {
        assert!(is_plain_file_name("ticket.pdf"));
        assert!(is_plain_file_name("my photo.jpg"));
        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name("../escape.txt"));
        assert!(!is_plain_file_name("nested/file.txt"));
    }

    #[test]
    fn atomic_write_replaces_previous_content() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("metadata.json");
        fs::write(&path, "old").unwrap();

        write_record_atomic(&path, &serde_json::json!({"id": "x"})).unwrap();

        let value = read_record(&path).unwrap();
        assert_eq!(value["id"], "x");
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[test]
    fn load_rejects_empty_id() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("metadata.json");
        let mut trip = Trip::new("2024-01", "2024-01", "Rome", "Italy");
        trip.id = String::new();
        fs::write(&path, trip.to_record().to_string()).unwrap();

        assert!(matches!(
            load_trip_from_file(&path),
            Err(TravelError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn copy_fallback_preserves_tree() {
        let tmp = tempdir().unwrap();
        let from = tmp.path().join("from");
        fs::create_dir_all(from.join("inner")).unwrap();
        fs::write(from.join("a.txt"), "a").unwrap();
        fs::write(from.join("inner").join("b.txt"), "b").unwrap();

        let to = tmp.path().join("to");
        copy_dir_recursive(&from, &to).unwrap();

        assert_eq!(fs::read_to_string(to.join("a.txt")).unwrap(), "a");
        assert_eq!(fs::read_to_string(to.join("inner").join("b.txt")).unwrap(), "b");
    }
}
