//! Aggregate figures over a set of trips.
use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::{parse_trip_date, Trip, TripStore};

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Totals shown at the top of the travel history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TripStats {
    pub total_trips: usize,
    /// Distinct `country` values, compared exactly
    pub total_countries: usize,
    pub total_days: i64,
}

impl TripStats {
    pub fn compute(trips: &[Trip]) -> Self {
        let countries: HashSet<&str> = trips.iter().map(|t| t.country.as_str()).collect();
        let total_days = trips.iter().filter_map(trip_duration_days).sum();

        Self {
            total_trips: trips.len(),
            total_countries: countries.len(),
            total_days,
        }
    }
}

/// Days between start and end, never negative.
///
/// Month-only dates count from the first of the month, so a trip within a
/// single month recorded as `YYYY-MM` lasts zero days. Returns `None` when
/// either date does not parse.
pub fn trip_duration_days(trip: &Trip) -> Option<i64> {
    let (start, _) = parse_trip_date(&trip.start_date)?;
    let (end, _) = parse_trip_date(&trip.end_date)?;
    Some((end - start).num_days().max(0))
}

/// Number of trips per country, most visited first, ties by name.
pub fn country_counts(trips: &[Trip]) -> Vec<(String, usize)> {
    ranked(trips.iter().map(|t| t.country.as_str()))
}

/// Number of trips carrying each tag, most used first, ties by name.
pub fn tag_counts(trips: &[Trip]) -> Vec<(String, usize)> {
    ranked(trips.iter().flat_map(|t| t.tags.iter().map(String::as_str)))
}

/// One row of the per-country view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountrySummary {
    pub country: String,
    pub trips: usize,
    /// An image attachment from some trip to this country
    pub photo: Option<PathBuf>,
}

/// Country counts, most visited first, each with a photo when one exists.
pub fn country_summaries(store: &TripStore, trips: &[Trip]) -> Vec<CountrySummary> {
    country_counts(trips)
        .into_iter()
        .map(|(country, count)| CountrySummary {
            photo: country_photo(store, trips, &country),
            country,
            trips: count,
        })
        .collect()
}

/// First image attachment of a trip to `country` that exists on disk.
///
/// Trips are searched in the order given, attachments in their recorded order.
pub fn country_photo(store: &TripStore, trips: &[Trip], country: &str) -> Option<PathBuf> {
    trips
        .iter()
        .filter(|trip| trip.country == country)
        .flat_map(|trip| {
            trip.attachments
                .iter()
                .filter(|name| is_image_file(name))
                .map(move |name| store.attachment_path(trip, name))
        })
        .find(|path| path.is_file())
}

/// Whether the attachment name carries a common photo extension.
pub fn is_image_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|image| ext.eq_ignore_ascii_case(image))
        })
}

fn ranked<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }

    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(value, count)| (value.to_string(), count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Attachment, RecordingSink};
    use std::{fs, sync::Arc};
    use tempfile::tempdir;

    fn trip(start: &str, end: &str, country: &str, tags: &[&str]) -> Trip {
        let mut trip = Trip::new(start, end, "Somewhere", country);
        trip.tags = tags.iter().map(|t| t.to_string()).collect();
        trip
    }

    #[test]
    fn totals_over_mixed_precision_trips() {
        let trips = vec![
            trip("2024-05-01", "2024-05-08", "France", &[]),
            trip("2024-01", "2024-03", "Japan", &[]),
            trip("2023-07-10", "2023-07-12", "France", &[]),
        ];

        let stats = TripStats::compute(&trips);
        assert_eq!(stats.total_trips, 3);
        assert_eq!(stats.total_countries, 2);
        // 7 + 60 (Jan 1 -> Mar 1, 2024 is a leap year) + 2
        assert_eq!(stats.total_days, 69);
    }

    #[test]
    fn reversed_and_unparsable_dates_add_nothing() {
        assert_eq!(
            trip_duration_days(&trip("2024-05-08", "2024-05-01", "France", &[])),
            Some(0)
        );
        assert_eq!(
            trip_duration_days(&trip("sometime", "2024-05-01", "France", &[])),
            None
        );
        assert_eq!(TripStats::compute(&[]), TripStats::default());
    }

    #[test]
    fn country_counts_rank_by_visits() {
        let trips = vec![
            trip("2024-01", "2024-01", "Spain", &[]),
            trip("2024-02", "2024-02", "Italy", &[]),
            trip("2024-03", "2024-03", "Spain", &[]),
            trip("2024-04", "2024-04", "Austria", &[]),
        ];
        assert_eq!(
            country_counts(&trips),
            vec![
                ("Spain".to_string(), 2),
                ("Austria".to_string(), 1),
                ("Italy".to_string(), 1),
            ]
        );
    }

    #[test]
    fn tag_counts_cover_every_tag() {
        let trips = vec![
            trip("2024-01", "2024-01", "Spain", &["beach", "food"]),
            trip("2024-02", "2024-02", "Italy", &["food"]),
        ];
        assert_eq!(
            tag_counts(&trips),
            vec![("food".to_string(), 2), ("beach".to_string(), 1)]
        );
    }

    #[test]
    fn image_extensions_are_recognised_case_insensitively() {
        assert!(is_image_file("beach.jpg"));
        assert!(is_image_file("Beach.JPEG"));
        assert!(is_image_file("map.png"));
        assert!(is_image_file("sunset.webp"));
        assert!(!is_image_file("ticket.pdf"));
        assert!(!is_image_file("jpg"));
        assert!(!is_image_file("notes.jpg.txt"));
    }

    #[test]
    fn country_photo_skips_non_images_and_missing_files() {
        let tmp = tempdir().unwrap();
        let store =
            TripStore::new(tmp.path().join("trips"), Arc::new(RecordingSink::new())).unwrap();

        let mut first = Trip::new("2024-01", "2024-01", "Rome", "Italy");
        store.save(&mut first, &[Attachment::new("ticket.pdf", "pdf")]);
        first.attachments.push("gone.jpg".to_string());

        let mut second = Trip::new("2023-06", "2023-06", "Milan", "Italy");
        store.save(
            &mut second,
            &[
                Attachment::new("receipt.txt", "txt"),
                Attachment::new("duomo.JPG", "jpeg"),
            ],
        );
        let mut elsewhere = Trip::new("2022-03", "2022-03", "Nice", "France");
        store.save(&mut elsewhere, &[Attachment::new("plage.png", "png")]);

        let trips = vec![first, second.clone(), elsewhere];
        assert_eq!(
            country_photo(&store, &trips, "Italy"),
            Some(store.attachment_path(&second, "duomo.JPG"))
        );
        assert_eq!(country_photo(&store, &trips, "Japan"), None);

        fs::remove_file(store.attachment_path(&second, "duomo.JPG")).unwrap();
        assert_eq!(country_photo(&store, &trips, "Italy"), None);

        let summaries = country_summaries(&store, &trips);
        assert_eq!(summaries[0].country, "Italy");
        assert_eq!(summaries[0].trips, 2);
        assert_eq!(summaries[0].photo, None);
        assert!(summaries[1].photo.as_ref().is_some_and(|p| p.ends_with("plage.png")));
    }
}
