//! End-to-end preparation of one city

use crate::amenities::attach_top_amenities;
use crate::calendar::process_calendar;
use crate::enrichment::{
    apply_description_sentiment, classify_properties, EnrichmentConfig, SentimentModel,
    ZeroShotClassifier,
};
use crate::listings::process_listings;
use crate::merge::{merge_calendar_listings, DateWindow, PreparedRow};
use crate::reviews::{apply_review_rankings, load_reviews, rank_listings, ReviewWindow};
use crate::sources::{CityFiles, PartCounts};
use crate::utils::{read_csv, write_csv};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Settings for preparing a city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepConfig {
    pub parts: PartCounts,
    /// Calendar months kept in the prepared table
    pub window: DateWindow,
    /// Number of amenities listed per neighbourhood
    pub top_amenities: usize,
    pub review_window: ReviewWindow,
    pub enrichment: EnrichmentConfig,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            parts: PartCounts::default(),
            window: DateWindow::default(),
            top_amenities: 10,
            review_window: ReviewWindow::default(),
            enrichment: EnrichmentConfig::default(),
        }
    }
}

/// Models used for optional text enrichment
#[derive(Default)]
pub struct Enrichers<'a> {
    pub sentiment: Option<&'a dyn SentimentModel>,
    pub classifier: Option<&'a dyn ZeroShotClassifier>,
}

/// Calendar, listing and merge stages followed by amenity aggregation
pub fn prepare_city(files: &CityFiles, config: &PrepConfig) -> Result<Vec<PreparedRow>> {
    let calendar = process_calendar(&files.calendar)?;
    let listings = process_listings(&files.listings, &files.listings_long)?;
    let mut rows = merge_calendar_listings(calendar, &listings, config.window)?;
    attach_top_amenities(&mut rows, config.top_amenities);

    info!(city = %files.city, rows = rows.len(), "prepared city table");
    Ok(rows)
}

/// Run whichever enrichment models are available over prepared rows.
///
/// Review ranking needs both a sentiment model and review files.
pub fn enrich(
    rows: &mut [PreparedRow],
    files: &CityFiles,
    config: &PrepConfig,
    enrichers: &Enrichers<'_>,
) -> Result<()> {
    if let Some(model) = enrichers.sentiment {
        apply_description_sentiment(rows, model, &config.enrichment)?;

        if !files.reviews.is_empty() {
            let reviews = load_reviews(&files.reviews)?;
            let ids: HashSet<i64> = rows.iter().map(|r| r.id).collect();
            let rankings = rank_listings(
                &reviews,
                &ids,
                config.review_window,
                model,
                &config.enrichment,
            )?;
            apply_review_rankings(rows, &rankings);
        }
    }

    if let Some(classifier) = enrichers.classifier {
        classify_properties(rows, classifier, &config.enrichment)?;
    }

    Ok(())
}

/// Write prepared rows to CSV
pub fn write_prepared<P: AsRef<Path>>(rows: &[PreparedRow], path: P) -> Result<()> {
    write_csv(rows, path)
}

/// Read prepared rows back from CSV
pub fn read_prepared<P: AsRef<Path>>(path: P) -> Result<Vec<PreparedRow>> {
    read_csv(path.as_ref())
}
