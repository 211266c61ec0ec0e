use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use which::which;

use crate::{Result, TravelError};

const CONFIG_FILE: &str = "config.json";

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Directory holding one folder per trip
    #[serde(default = "default_trips_dir")]
    pub trips_dir: PathBuf,

    /// Editor used for writing trip notes
    #[serde(default)]
    pub editor_command: Option<String>,

    /// Number of trips `list` shows when no limit is given
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,

    /// How trip start dates are shown in list headings
    #[serde(default)]
    pub date_display: DateDisplay,
}

/// Precision of the date shown in list headings
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DateDisplay {
    /// `YYYY-MM`, whatever the stored precision
    #[default]
    Month,
    /// The stored date as is
    Full,
}

impl DateDisplay {
    pub fn heading(self, date: &str) -> &str {
        match self {
            DateDisplay::Month => date.get(..7).unwrap_or(date),
            DateDisplay::Full => date,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trips_dir: default_trips_dir(),
            editor_command: None,
            list_limit: default_list_limit(),
            date_display: DateDisplay::default(),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "travellog")
}

fn default_trips_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("trips_data"))
        .unwrap_or_else(|| PathBuf::from("trips_data"))
}

fn default_list_limit() -> usize {
    20
}

impl Config {
    /// Location of the config file when none is given on the command line
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Loads configuration from `path`, or from the default location.
    ///
    /// An explicitly given file must exist. A missing default file yields
    /// the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        if !path.is_file() {
            if explicit {
                return Err(TravelError::ConfigError {
                    message: format!("Config file not found: {}", path.display()),
                });
            }
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| TravelError::ConfigError {
                message: format!("Invalid config {}: {}", path.display(), e),
            })?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    // This method provides smart fallbacks when no editor is configured
    pub fn get_editor_command(&self) -> String {
        if let Some(editor) = &self.editor_command {
            return editor.clone();
        }

        if let Ok(editor) = std::env::var("EDITOR") {
            return editor;
        }

        if cfg!(windows) {
            "notepad".to_string()
        } else if cfg!(target_os = "macos") {
            "open -t".to_string()
        } else {
            for editor in &["nano", "vim", "vi", "emacs"] {
                if which(editor).is_ok() {
                    return editor.to_string();
                }
            }
            "nano".to_string()
        }
    }
}
