//! # Listing Prep
//!
//! `listing_prep` turns the per-city CSV exports of a short-term rental
//! platform into a single monthly table ready for forecasting.
//!
//! The stages are:
//!
//! - **Sources**: extract a city's archive and locate its calendar, listing and review parts
//! - **Calendar**: keep available nights, snap dates to the month and de-duplicate
//! - **Listings**: combine the short and long listing exports
//! - **Merge**: join calendar rows to listings and clean prices
//! - **Amenities**: attach each neighbourhood's most common amenities
//! - **Enrichment**: optional sentiment and category labels from pluggable models
//!
//! ## Usage Example
//!
//! ```no_run
//! use listing_prep::prepare::{prepare_city, write_prepared, PrepConfig};
//! use listing_prep::sources::{CitySource, LocalDirectorySource};
//!
//! let config = PrepConfig::default();
//! let source = LocalDirectorySource::new("data", config.parts);
//! let files = source.fetch("lisbon")?;
//!
//! let rows = prepare_city(&files, &config)?;
//! write_prepared(&rows, "lisbon_merged.csv")?;
//! # Ok::<(), listing_prep::PrepError>(())
//! ```

use thiserror::Error;

pub mod amenities;
pub mod calendar;
pub mod enrichment;
pub mod listings;
pub mod merge;
pub mod prepare;
pub mod reviews;
pub mod sources;
pub mod utils;

pub use calendar::{CalendarEntry, CalendarRecord};
pub use enrichment::{SentimentModel, SentimentScore, ZeroShotClassifier};
pub use listings::{Listing, ListingRecord, LongListingRecord};
pub use merge::{DateWindow, PreparedRow};
pub use prepare::{prepare_city, PrepConfig};
pub use sources::{
    ArchiveSource, CityFiles, CitySource, LocalDirectorySource, PartCounts, SUPPORTED_CITIES,
};

/// Errors that can occur while preparing listing data
#[derive(Error, Debug)]
pub enum PrepError {
    #[error("City not supported: {0}")]
    UnknownCity(String),

    #[error("Data loading error: {0}")]
    DataLoadError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Enrichment error: {0}")]
    Enrichment(String),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for preparation operations
pub type Result<T> = std::result::Result<T, PrepError>;
