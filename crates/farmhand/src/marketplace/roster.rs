//! Worker roster import from CSV exports.
//!
//! List columns (`skills`, `availability`, `languages`) are `;`-separated. Availability
//! entries may be plain dates or RFC 3339 instants; instants are reduced to their
//! calendar day in their own offset.

use std::collections::BTreeSet;
use std::io::Read;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};

use super::domain::{Worker, WorkerId};

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("roster csv unreadable: {0}")]
    Csv(#[from] csv::Error),
    #[error("worker {worker}: unrecognized availability date '{value}'")]
    InvalidDate { worker: String, value: String },
    #[error("worker {worker}: rating {rating} is outside 0-5")]
    InvalidRating { worker: String, rating: f32 },
    #[error("worker {worker}: {column} must be positive")]
    InvalidRate {
        worker: String,
        column: &'static str,
    },
    #[error("worker {worker}: distance {distance_km} km is negative")]
    InvalidDistance { worker: String, distance_km: f32 },
    #[error("worker {0} appears more than once")]
    DuplicateWorker(String),
}

pub struct WorkerRoster;

impl WorkerRoster {
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Worker>, RosterError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut seen = BTreeSet::new();
        let mut workers = Vec::new();

        for record in csv_reader.deserialize::<RosterRow>() {
            let row = record?;
            if !seen.insert(row.id.clone()) {
                return Err(RosterError::DuplicateWorker(row.id));
            }
            workers.push(row.into_worker()?);
        }

        Ok(workers)
    }
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    id: String,
    name: String,
    phone: String,
    location: String,
    #[serde(default)]
    skills: String,
    experience_years: u32,
    daily_rate: u32,
    hourly_rate: u32,
    rating: f32,
    #[serde(default)]
    total_reviews: u32,
    #[serde(default)]
    bio: String,
    #[serde(default)]
    availability: String,
    is_available: bool,
    #[serde(default)]
    languages: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    distance_km: Option<f32>,
}

impl RosterRow {
    fn into_worker(self) -> Result<Worker, RosterError> {
        if !(0.0..=5.0).contains(&self.rating) {
            return Err(RosterError::InvalidRating {
                worker: self.id,
                rating: self.rating,
            });
        }
        for (column, rate) in [("daily_rate", self.daily_rate), ("hourly_rate", self.hourly_rate)] {
            if rate == 0 {
                return Err(RosterError::InvalidRate {
                    worker: self.id,
                    column,
                });
            }
        }
        if let Some(distance_km) = self.distance_km.filter(|distance| *distance < 0.0) {
            return Err(RosterError::InvalidDistance {
                worker: self.id,
                distance_km,
            });
        }

        let mut availability = Vec::new();
        for value in split_list(&self.availability) {
            let date = parse_calendar_day(&value).ok_or_else(|| RosterError::InvalidDate {
                worker: self.id.clone(),
                value: value.clone(),
            })?;
            availability.push(date);
        }

        Ok(Worker {
            id: WorkerId(self.id),
            name: self.name,
            phone: self.phone,
            location: self.location,
            skills: split_list(&self.skills).collect(),
            experience_years: self.experience_years,
            daily_rate: self.daily_rate,
            hourly_rate: self.hourly_rate,
            rating: self.rating,
            total_reviews: self.total_reviews,
            bio: self.bio,
            availability,
            is_available: self.is_available,
            languages: split_list(&self.languages).collect(),
            distance_km: self.distance_km,
        })
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
}

fn parse_calendar_day(value: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|instant| instant.date_naive())
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<f32>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
