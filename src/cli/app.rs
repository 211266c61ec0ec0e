//! CLI module for the travellog application
//!
//! This module turns parsed commands into calls on the trip store and prints
//! the results.
use std::{
    fs::{read_to_string, OpenOptions},
    io::{stdin, stdout, Write},
    path::{Path, PathBuf},
    process::Command,
};

use globset::{GlobBuilder, GlobMatcher};
use log::{info, warn};
use shell_words::split;
use tempfile::Builder;
use walkdir::WalkDir;

use crate::{
    country_summaries, parse_tags, tag_counts, AddTripOptions, Attachment, Commands, Config,
    DateGranularity, EditTripOptions, ListTripsOptions, Result, TravelError, Trip, TripStats,
    TripStore,
};

/// CLI Application handler - processes CLI commands and interfaces with TripStore
pub struct App {
    store: TripStore,

    /// Application configuration
    config: Config,

    /// Whether to display verbose output
    verbose: bool,
}

impl App {
    pub fn new(store: TripStore, config: Config, verbose: bool) -> Self {
        Self {
            store,
            config,
            verbose,
        }
    }

    /// Run the CLI application with the given command
    pub fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Add(options) => self.add_trip(options),
            Commands::List(options) => self.list_trips(options),
            Commands::Show { id, json } => self.show_trip(&id, json),
            Commands::Edit(options) => self.handle_edit(options),
            Commands::Attach {
                id,
                paths,
                pattern,
                recursive,
            } => self.handle_attach(&id, &paths, pattern.as_deref(), recursive),
            Commands::Delete { id, force } => self.handle_delete(&id, force),
            Commands::Stats { json } => self.show_stats(json),
            Commands::Countries { json } => self.show_countries(json),
        }
    }

    fn add_trip(&self, options: AddTripOptions) -> Result<()> {
        let mut trip = Trip::new(
            options.start.trim(),
            options.end.trim(),
            options.city.trim(),
            options.country.trim(),
        );
        validate_trip(&trip)?;

        trip.tags = parse_tags(options.tags);
        trip.notes = match (options.notes, options.edit) {
            (Some(notes), _) => notes,
            (None, true) => self.open_editor_for_notes(&trip, "")?,
            (None, false) => String::new(),
        };

        let uploads = options
            .attachments
            .iter()
            .map(|path| Attachment::from_path(path))
            .collect::<Result<Vec<_>>>()?;

        self.save(&mut trip, &uploads)?;
        println!("Trip created with ID: {}", trip.id);
        Ok(())
    }

    /// List trips according to provided filters and options
    fn list_trips(&self, options: ListTripsOptions) -> Result<()> {
        let mut trips: Vec<Trip> = self
            .store
            .scan_all()
            .into_iter()
            .filter(|trip| matches_filters(trip, options.tag.as_deref(), options.country.as_deref()))
            .collect();

        let limit = options.limit.unwrap_or(self.config.list_limit);
        if limit > 0 && trips.len() > limit {
            trips.truncate(limit);
        }

        if trips.is_empty() {
            println!("No trips recorded yet.");
            return Ok(());
        }

        if options.json {
            println!("{}", serde_json::to_string_pretty(&trips)?);
        } else {
            self.display_trips_text(&trips);
            println!(
                "\nShowing {} trip{}",
                trips.len(),
                if trips.len() == 1 { "" } else { "s" }
            );
        }
        Ok(())
    }

    fn display_trips_text(&self, trips: &[Trip]) {
        let term_width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80);

        for (i, trip) in trips.iter().enumerate() {
            if i > 0 {
                println!("{}", "-".repeat(term_width.min(50)));
            }

            let display_date = self.config.date_display.heading(&trip.start_date);
            println!(
                "{} | {}",
                display_date,
                console::style(format!("{}, {}", trip.city, trip.country)).bold()
            );
            println!("ID: {}", trip.id);
            println!("Dates: {} to {}", trip.start_date, trip.end_date);

            if !trip.tags.is_empty() {
                let tags = trip
                    .tags
                    .iter()
                    .map(|tag| format!("#{}", tag))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("Tags: {}", console::style(tags).cyan());
            }
            if !trip.attachments.is_empty() {
                println!("Attachments: {}", trip.attachments.len());
            }
            if self.verbose && !trip.notes.is_empty() {
                println!("\n{}", trip.notes);
            }
        }
    }

    fn show_trip(&self, id: &str, json: bool) -> Result<()> {
        let trip = self.require_trip(id)?;

        if json {
            println!("{}", serde_json::to_string_pretty(&trip.to_record())?);
            return Ok(());
        }

        println!(
            "{}",
            console::style(format!("{}, {}", trip.city, trip.country)).bold()
        );
        println!("ID:      {}", trip.id);
        println!("Dates:   {} to {}", trip.start_date, trip.end_date);
        println!("Folder:  {}", self.store.trip_dir(&trip).display());
        if !trip.tags.is_empty() {
            println!("Tags:    {}", trip.tags.join(", "));
        }
        if !trip.notes.is_empty() {
            println!("\n{}\n", trip.notes);
        }

        if !trip.attachments.is_empty() {
            println!("Attachments:");
            for name in &trip.attachments {
                let path = self.store.attachment_path(&trip, name);
                if path.exists() {
                    println!("  {}", path.display());
                } else {
                    println!("  {} {}", path.display(), console::style("(missing)").red());
                }
            }
        }
        Ok(())
    }

    fn handle_edit(&self, options: EditTripOptions) -> Result<()> {
        if options.notes.is_some() && options.open_editor {
            return Err(TravelError::ApplicationError {
                message: "Cannot specify both --notes and --edit options".to_string(),
            });
        }

        let mut trip = self.require_trip(&options.id)?;
        let previous_dir = self.store.trip_dir(&trip);

        if let Some(start) = options.start {
            trip.start_date = start.trim().to_string();
        }
        if let Some(end) = options.end {
            trip.end_date = end.trim().to_string();
        }
        if let Some(city) = options.city {
            trip.city = city.trim().to_string();
        }
        if let Some(country) = options.country {
            trip.country = country.trim().to_string();
        }
        validate_trip(&trip)?;

        if let Some(notes) = options.notes {
            trip.notes = notes;
        } else if options.open_editor {
            let existing = trip.notes.clone();
            trip.notes = self.open_editor_for_notes(&trip, &existing)?;
        }

        apply_tag_changes(
            &mut trip.tags,
            parse_tags(options.add_tags),
            &parse_tags(options.remove_tags),
        );

        self.save(&mut trip, &[])?;

        let new_dir = self.store.trip_dir(&trip);
        if previous_dir != new_dir {
            println!("Trip folder is now {}", new_dir.display());
        }
        println!("Trip {} updated successfully", trip.id);
        Ok(())
    }

    fn handle_attach(
        &self,
        id: &str,
        paths: &[PathBuf],
        pattern: Option<&str>,
        recursive: bool,
    ) -> Result<()> {
        let mut trip = self.require_trip(id)?;

        let matcher = build_matcher(pattern)?;

        let mut files = Vec::new();
        for path in paths {
            if path.is_dir() {
                files.extend(files_in_dir(path, matcher.as_ref(), recursive));
            } else {
                files.push(path.clone());
            }
        }

        if files.is_empty() {
            println!("No matching files to attach.");
            return Ok(());
        }

        let mut uploads = Vec::with_capacity(files.len());
        for file in &files {
            if self.verbose {
                println!("Attaching: {}", file.display());
            }
            uploads.push(Attachment::from_path(file)?);
        }

        self.save(&mut trip, &uploads)?;
        println!(
            "Attached {} file{} to trip {}",
            uploads.len(),
            if uploads.len() == 1 { "" } else { "s" },
            trip.id
        );
        Ok(())
    }

    fn handle_delete(&self, id: &str, force: bool) -> Result<()> {
        let trip = self.require_trip(id)?;

        if !force {
            println!("You are about to delete the following trip:");
            println!("ID:          {}", trip.id);
            println!("Place:       {}, {}", trip.city, trip.country);
            println!("Dates:       {} to {}", trip.start_date, trip.end_date);
            println!("Attachments: {}", trip.attachments.len());

            println!("\nThe trip folder and all its files will be removed!");
            print!("Are you sure you want to delete this trip? [y/N]: ");
            stdout().flush()?;

            let mut input = String::new();
            stdin().read_line(&mut input)?;

            let input = input.trim().to_lowercase();
            if input != "y" && input != "yes" {
                println!("Deletion cancelled.");
                return Ok(());
            }
        }

        if !self.store.delete(id) {
            return Err(TravelError::ApplicationError {
                message: format!("Failed to delete trip {}", id),
            });
        }
        println!("Trip {} deleted", id);
        Ok(())
    }

    fn show_stats(&self, json: bool) -> Result<()> {
        let trips = self.store.scan_all();
        let stats = TripStats::compute(&trips);

        if json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            return Ok(());
        }

        println!("Total trips:          {}", stats.total_trips);
        println!("Countries visited:    {}", stats.total_countries);
        println!("Total days traveled:  {}", stats.total_days);

        let tags = tag_counts(&trips);
        if !tags.is_empty() {
            let top = tags
                .iter()
                .take(5)
                .map(|(tag, count)| format!("#{} ({})", tag, count))
                .collect::<Vec<_>>()
                .join(", ");
            println!("Top tags:             {}", top);
        }
        Ok(())
    }

    fn show_countries(&self, json: bool) -> Result<()> {
        let summaries = country_summaries(&self.store, &self.store.scan_all());

        if json {
            println!("{}", serde_json::to_string_pretty(&summaries)?);
            return Ok(());
        }

        if summaries.is_empty() {
            println!("No countries visited yet.");
        }
        for summary in summaries {
            match summary.photo {
                Some(photo) => println!(
                    "{:<32} {:>4}  {}",
                    summary.country,
                    summary.trips,
                    console::style(photo.display()).dim()
                ),
                None => println!(
                    "{:<32} {:>4}  {}",
                    summary.country,
                    summary.trips,
                    console::style("No photos uploaded yet").dim()
                ),
            }
        }
        Ok(())
    }

    fn require_trip(&self, id: &str) -> Result<Trip> {
        self.store
            .find_by_id(id)
            .ok_or_else(|| TravelError::TripNotFound { id: id.to_string() })
    }

    fn save(&self, trip: &mut Trip, uploads: &[Attachment]) -> Result<()> {
        if self.store.save(trip, uploads) {
            Ok(())
        } else {
            Err(TravelError::ApplicationError {
                message: format!("Failed to save trip {}; see the log for details", trip.id),
            })
        }
    }

    fn open_editor_for_notes(&self, trip: &Trip, existing: &str) -> Result<String> {
        let temp_file = Builder::new().suffix(".md").tempfile()?;
        let temp_path = temp_file.path().to_path_buf();

        {
            let mut file = OpenOptions::new().write(true).open(&temp_path)?;
            writeln!(
                file,
                "<!-- Notes for {}, {} ({}) -->",
                trip.city, trip.country, trip.start_date
            )?;
            writeln!(file, "<!-- Lines like these are ignored. Save and exit when done. -->")?;
            write!(file, "{}", existing)?;
        }

        let editor_cmd = self.config.get_editor_command();
        info!("Opening editor to write trip notes. Save and exit when done...");
        self.launch_editor(&editor_cmd, &temp_path)?;

        let content = read_to_string(&temp_path)?;
        Ok(process_editor_content(&content))
    }

    fn launch_editor(&self, editor_cmd: &str, file_path: &Path) -> Result<()> {
        let args = split(editor_cmd).map_err(|e| TravelError::EditorError {
            message: format!("Failed to parse editor command: {}", e),
        })?;

        let (program, rest) = args.split_first().ok_or_else(|| TravelError::EditorError {
            message: "Empty editor command".to_string(),
        })?;

        let status = Command::new(program).args(rest).arg(file_path).status()?;
        if !status.success() {
            return Err(TravelError::EditorError {
                message: "Editor exited with non-zero status".to_string(),
            });
        }
        Ok(())
    }
}

/// Case-insensitive tag and country filters of `list`; `None` matches everything.
pub fn matches_filters(trip: &Trip, tag: Option<&str>, country: Option<&str>) -> bool {
    let normalize = |value: &str| value.trim().to_lowercase();

    let tag_ok = tag.map_or(true, |tag| {
        let tag = normalize(tag);
        trip.tags.iter().any(|t| normalize(t) == tag)
    });
    let country_ok = country.map_or(true, |country| normalize(&trip.country) == normalize(country));

    tag_ok && country_ok
}

/// Adds new tags in order, skipping ones already present, then drops `remove`.
pub fn apply_tag_changes(tags: &mut Vec<String>, add: Vec<String>, remove: &[String]) {
    for tag in add {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags.retain(|tag| !remove.contains(tag));
}

/// Compiles an `attach --pattern` glob, matched case-insensitively.
pub fn build_matcher(pattern: Option<&str>) -> Result<Option<GlobMatcher>> {
    pattern
        .map(|p| -> Result<GlobMatcher> {
            Ok(GlobBuilder::new(p)
                .case_insensitive(true)
                .build()?
                .compile_matcher())
        })
        .transpose()
}

/// Files inside `dir` whose name matches the glob, if any, sorted by path.
pub fn files_in_dir(dir: &Path, matcher: Option<&GlobMatcher>, recursive: bool) -> Vec<PathBuf> {
    let walker = WalkDir::new(dir).min_depth(1);
    let walker = if recursive { walker } else { walker.max_depth(1) };

    let mut files = Vec::new();
    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() => {
                if matcher.map_or(true, |m| m.is_match(entry.file_name())) {
                    files.push(entry.into_path());
                }
            }
            Ok(_) => {} // Skip directories
            Err(e) => warn!("Error accessing path: {}", e),
        }
    }
    files.sort();
    files
}

/// Checks the caller-side rules the store itself does not enforce.
pub fn validate_trip(trip: &Trip) -> Result<()> {
    if trip.city.trim().is_empty() || trip.country.trim().is_empty() {
        return Err(TravelError::InvalidInput {
            message: "City and country are required".to_string(),
        });
    }

    for date in [&trip.start_date, &trip.end_date] {
        if DateGranularity::detect(date).is_none() {
            return Err(TravelError::InvalidInput {
                message: format!("Invalid date {:?}: expected YYYY-MM-DD or YYYY-MM", date),
            });
        }
    }

    if trip.has_mixed_granularity() {
        warn!(
            "Trip {} mixes day and month dates ({} / {}); durations may be off",
            trip.id, trip.start_date, trip.end_date
        );
    }
    if trip.end_date < trip.start_date {
        warn!("Trip {} ends before it starts", trip.id);
    }
    Ok(())
}

fn process_editor_content(content: &str) -> String {
    content
        .lines()
        .filter(|line| {
            !(line.trim_start().starts_with("<!--") && line.trim_end().ends_with("-->"))
        })
        .collect::<Vec<&str>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn tagged(country: &str, tags: &[&str]) -> Trip {
        let mut trip = Trip::new("2024-05", "2024-05", "Somewhere", country);
        trip.tags = tags.iter().map(|t| t.to_string()).collect();
        trip
    }

    #[test]
    fn list_filters_ignore_case_and_whitespace() {
        let trip = tagged("New Zealand", &["Hiking", "coast"]);

        assert!(matches_filters(&trip, None, None));
        assert!(matches_filters(&trip, Some(" hiking "), None));
        assert!(matches_filters(&trip, None, Some("new zealand")));
        assert!(matches_filters(&trip, Some("COAST"), Some("New Zealand ")));
        assert!(!matches_filters(&trip, Some("city"), None));
        assert!(!matches_filters(&trip, Some("hiking"), Some("Australia")));
    }

    #[test]
    fn tag_changes_add_without_duplicates_then_remove() {
        let mut tags = vec!["food".to_string(), "beach".to_string()];
        apply_tag_changes(
            &mut tags,
            vec!["beach".to_string(), "museum".to_string()],
            &["food".to_string(), "unknown".to_string()],
        );
        assert_eq!(tags, vec!["beach".to_string(), "museum".to_string()]);
    }

    #[test]
    fn files_in_dir_applies_glob_and_depth() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        fs::create_dir_all(dir.join("day2")).unwrap();
        fs::write(dir.join("beach.JPG"), "a").unwrap();
        fs::write(dir.join("ticket.pdf"), "b").unwrap();
        fs::write(dir.join("day2").join("sunset.jpg"), "c").unwrap();

        let all_top = files_in_dir(dir, None, false);
        assert_eq!(all_top, vec![dir.join("beach.JPG"), dir.join("ticket.pdf")]);

        let jpgs = build_matcher(Some("*.jpg")).unwrap();
        assert_eq!(files_in_dir(dir, jpgs.as_ref(), false), vec![dir.join("beach.JPG")]);
        assert_eq!(
            files_in_dir(dir, jpgs.as_ref(), true),
            vec![dir.join("beach.JPG"), dir.join("day2").join("sunset.jpg")]
        );
    }

    #[test]
    fn invalid_glob_is_rejected() {
        assert!(matches!(
            build_matcher(Some("[unclosed")),
            Err(TravelError::InvalidPattern(_))
        ));
        assert!(build_matcher(None).unwrap().is_none());
    }

    #[test]
    fn validation_rejects_bad_dates_and_blank_places() {
        assert!(validate_trip(&Trip::new("2024-05-01", "2024-05-02", "Paris", "France")).is_ok());
        assert!(validate_trip(&Trip::new("2024-05", "2024-06", "Paris", "France")).is_ok());
        assert!(validate_trip(&Trip::new("05/01/2024", "2024-05-02", "Paris", "France")).is_err());
        assert!(validate_trip(&Trip::new("2024-05-01", "2024-05-02", " ", "France")).is_err());
        assert!(validate_trip(&Trip::new("2024-05-01", "2024-05-02", "Paris", "")).is_err());
    }

    #[test]
    fn mixed_granularity_is_only_a_warning() {
        assert!(validate_trip(&Trip::new("2024-05", "2024-05-20", "Paris", "France")).is_ok());
    }

    #[test]
    fn editor_comments_are_stripped() {
        let content = "<!-- Notes for Paris -->\n<!-- ignored -->\nGreat food.\nSaw the Louvre.\n";
        assert_eq!(process_editor_content(content), "Great food.\nSaw the Louvre.");
    }
}
