//! Error types for the travellog application.
//!
//! This module defines the error taxonomy shared by the trip record, the trip
//! store and the command-line front end.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the travellog application.
#[derive(Error, Debug)]
pub enum TravelError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A metadata record exists but does not describe a valid trip.
    #[error("Malformed trip record: {message}")]
    MalformedRecord { message: String },

    /// No trip carries the requested id.
    #[error("Trip not found: {id}")]
    TripNotFound { id: String },

    /// Caller-supplied values were rejected before touching the disk.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// file not found
    #[error("File not found: {file_path}")]
    FileNotFound { file_path: String },

    /// Generic application error with a custom message.
    #[error("{message}")]
    ApplicationError { message: String },

    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] globset::Error),

    #[error("{message}")]
    EditorError { message: String },
}
