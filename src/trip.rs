//! Core data structures for the travellog application.
//!
//! A [`Trip`] is the durable record of one journey. It converts losslessly to
//! and from the structured record stored in each trip's `metadata.json`.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{Result, TravelError};

/// Represents a single trip in our system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    /// Unique identifier, fixed at creation
    pub id: String,
    /// `YYYY-MM-DD` or `YYYY-MM`
    pub start_date: String,
    /// Same granularity as `start_date`
    pub end_date: String,
    pub city: String,
    pub country: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Filenames inside the trip's directory
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl Trip {
    /// Creates a new trip with a freshly generated id and no notes, tags or attachments
    pub fn new(
        start_date: impl Into<String>,
        end_date: impl Into<String>,
        city: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Trip {
            id: Uuid::new_v4().to_string(),
            start_date: start_date.into(),
            end_date: end_date.into(),
            city: city.into(),
            country: country.into(),
            notes: String::new(),
            tags: Vec::new(),
            attachments: Vec::new(),
        }
    }

    /// Converts the trip into its structured record form.
    pub fn to_record(&self) -> Value {
        serde_json::json!({
            "id": self.id,
            "start_date": self.start_date,
            "end_date": self.end_date,
            "city": self.city,
            "country": self.country,
            "notes": self.notes,
            "tags": self.tags,
            "attachments": self.attachments,
        })
    }

    /// Rebuilds a trip from a structured record.
    ///
    /// `id`, `start_date`, `end_date`, `city` and `country` are required.
    /// Missing `notes`, `tags` and `attachments` fall back to empty values.
    pub fn from_record(record: Value) -> Result<Self> {
        serde_json::from_value(record).map_err(|e| TravelError::MalformedRecord {
            message: e.to_string(),
        })
    }

    /// Name of the directory holding this trip: `{start_date}_{city}_{country}`
    /// with city and country trimmed and spaces turned into underscores.
    pub fn folder_name(&self) -> String {
        format!(
            "{}_{}_{}",
            self.start_date,
            folder_component(&self.city),
            folder_component(&self.country)
        )
    }

    /// True when both dates parse but one is day-precise and the other month-only.
    pub fn has_mixed_granularity(&self) -> bool {
        match (
            DateGranularity::detect(&self.start_date),
            DateGranularity::detect(&self.end_date),
        ) {
            (Some(start), Some(end)) => start != end,
            _ => false,
        }
    }
}

fn folder_component(value: &str) -> String {
    value.trim().replace(' ', "_")
}

/// Precision of a trip date string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateGranularity {
    /// `YYYY-MM-DD`
    Day,
    /// `YYYY-MM`
    Month,
}

impl DateGranularity {
    pub fn detect(date: &str) -> Option<Self> {
        parse_trip_date(date).map(|(_, granularity)| granularity)
    }
}

/// Parses a trip date, mapping month-only dates to the first day of the month.
pub fn parse_trip_date(date: &str) -> Option<(NaiveDate, DateGranularity)> {
    match date.len() {
        10 => NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .ok()
            .map(|d| (d, DateGranularity::Day)),
        7 => NaiveDate::parse_from_str(&format!("{}-01", date), "%Y-%m-%d")
            .ok()
            .map(|d| (d, DateGranularity::Month)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Trip {
        let mut trip = Trip::new("2024-05-01", "2024-05-09", "New York", "United States");
        trip.notes = "Museums and bagels".to_string();
        trip.tags = vec!["city".to_string(), "food".to_string()];
        trip.attachments = vec!["photo.jpg".to_string()];
        trip
    }

    #[test]
    fn record_round_trip_preserves_every_field() {
        let trip = sample();
        let restored = Trip::from_record(trip.to_record()).unwrap();
        assert_eq!(restored, trip);
    }

    #[test]
    fn record_uses_the_documented_keys() {
        let record = sample().to_record();
        let object = record.as_object().unwrap();
        for key in [
            "id",
            "start_date",
            "end_date",
            "city",
            "country",
            "notes",
            "tags",
            "attachments",
        ] {
            assert!(object.contains_key(key), "missing {}", key);
        }
        assert_eq!(object.len(), 8);
    }

    #[test]
    fn optional_fields_default_when_absent() {
        let record = serde_json::json!({
            "id": "abc",
            "start_date": "2023-11",
            "end_date": "2023-11",
            "city": "Oslo",
            "country": "Norway",
        });
        let trip = Trip::from_record(record).unwrap();
        assert_eq!(trip.notes, "");
        assert!(trip.tags.is_empty());
        assert!(trip.attachments.is_empty());
    }

    #[test]
    fn missing_required_field_is_malformed() {
        let record = serde_json::json!({
            "id": "abc",
            "start_date": "2023-11",
            "end_date": "2023-11",
            "country": "Norway",
        });
        let err = Trip::from_record(record).unwrap_err();
        assert!(matches!(err, TravelError::MalformedRecord { .. }));
    }

    #[test]
    fn wrongly_shaped_field_is_malformed() {
        let record = serde_json::json!({
            "id": "abc",
            "start_date": "2023-11",
            "end_date": "2023-11",
            "city": "Oslo",
            "country": "Norway",
            "tags": "not-a-list",
        });
        assert!(matches!(
            Trip::from_record(record),
            Err(TravelError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn new_trips_get_distinct_ids() {
        let a = Trip::new("2024-01", "2024-01", "Rome", "Italy");
        let b = Trip::new("2024-01", "2024-01", "Rome", "Italy");
        assert_ne!(a.id, b.id);
        assert!(Uuid::parse_str(&a.id).is_ok());
    }

    #[test]
    fn folder_name_trims_and_replaces_spaces() {
        let trip = Trip::new("2024-05-01", "2024-05-03", "  San Francisco ", "United States ");
        assert_eq!(trip.folder_name(), "2024-05-01_San_Francisco_United_States");
    }

    #[test]
    fn granularity_detection() {
        assert_eq!(DateGranularity::detect("2024-05-01"), Some(DateGranularity::Day));
        assert_eq!(DateGranularity::detect("2024-05"), Some(DateGranularity::Month));
        assert_eq!(DateGranularity::detect("2024-13"), None);
        assert_eq!(DateGranularity::detect("May 2024"), None);

        let mixed = Trip::new("2024-05", "2024-05-20", "Paris", "France");
        assert!(mixed.has_mixed_granularity());
        assert!(!sample().has_mixed_granularity());
    }
}
