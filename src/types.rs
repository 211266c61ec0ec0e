//! Shared types for the travellog application.
//!
//! This module contains the upload payload type, the crate-wide `Result`
//! alias and the command-line subcommands.
use std::{fs, path::{Path, PathBuf}};

use clap::{Args, Subcommand};

use crate::TravelError;

/// A specialized Result type for travellog operations.
pub type Result<T> = std::result::Result<T, TravelError>;

/// A file supplied by the caller to be stored next to a trip's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Plain file name (no directories) the payload is stored under
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Reads a file from disk, keeping only its final path component as the name.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(TravelError::FileNotFound {
                file_path: path.display().to_string(),
            });
        }

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| TravelError::InvalidInput {
                message: format!("No file name in path: {}", path.display()),
            })?;

        Ok(Self {
            filename,
            bytes: fs::read(path)?,
        })
    }
}

/// Options for recording a new trip
#[derive(Args, Debug, Clone)]
pub struct AddTripOptions {
    /// First day (`YYYY-MM-DD`) or month (`YYYY-MM`) of the trip
    #[clap(short, long)]
    pub start: String,

    /// Last day or month, same format as --start
    #[clap(short, long)]
    pub end: String,

    #[clap(long)]
    pub city: String,

    #[clap(long)]
    pub country: String,

    #[clap(short, long)]
    pub notes: Option<String>,

    /// Tags to associate with the trip (comma-separated)
    #[clap(short = 't', long)]
    pub tags: Option<String>,

    /// Files to store with the trip
    #[clap(short, long = "attach")]
    pub attachments: Vec<PathBuf>,

    /// Write the notes in an editor before saving
    #[clap(long)]
    pub edit: bool,
}

/// Options for listing trips
#[derive(Args, Debug, Clone)]
pub struct ListTripsOptions {
    /// Only trips carrying this tag
    #[clap(short, long)]
    pub tag: Option<String>,

    /// Only trips to this country
    #[clap(short, long)]
    pub country: Option<String>,

    /// Limit the number of trips shown (defaults to the configured limit)
    #[clap(short = 'n', long)]
    pub limit: Option<usize>,

    /// Format output as JSON
    #[clap(short, long)]
    pub json: bool,
}

/// Options for editing an existing trip
#[derive(Args, Debug, Clone)]
pub struct EditTripOptions {
    /// ID of the trip to edit
    pub id: String,

    #[clap(short, long)]
    pub start: Option<String>,

    #[clap(short, long)]
    pub end: Option<String>,

    #[clap(long)]
    pub city: Option<String>,

    #[clap(long)]
    pub country: Option<String>,

    /// Replace the notes
    #[clap(short, long)]
    pub notes: Option<String>,

    /// Tags to add (comma-separated)
    #[clap(long)]
    pub add_tags: Option<String>,

    /// Tags to remove (comma-separated)
    #[clap(long)]
    pub remove_tags: Option<String>,

    /// Edit the notes in an editor
    #[clap(long = "edit")]
    pub open_editor: bool,
}

/// Available subcommands for the travellog application
#[derive(Subcommand)]
pub enum Commands {
    /// Record a new trip
    Add(AddTripOptions),

    /// List trips, newest first
    List(ListTripsOptions),

    /// Show a trip by ID
    Show {
        /// ID of the trip to show
        id: String,

        /// Format output as raw JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Edit an existing trip
    Edit(EditTripOptions),

    /// Store files with an existing trip
    Attach {
        /// ID of the trip
        id: String,

        /// Files, or directories whose files should be attached
        #[clap(required = true)]
        paths: Vec<PathBuf>,

        /// Glob applied to files found inside directories
        #[clap(short, long)]
        pattern: Option<String>,

        /// Descend into subdirectories
        #[clap(short, long)]
        recursive: bool,
    },

    /// Delete a trip and all of its files
    Delete {
        /// ID of the trip to delete
        id: String,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Show travel totals
    Stats {
        #[clap(short, long)]
        json: bool,
    },

    /// Count visits per country
    Countries {
        #[clap(short, long)]
        json: bool,
    },
}
