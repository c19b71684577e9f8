//! Joining calendar rows to listings

use crate::calendar::CalendarEntry;
use crate::listings::Listing;
use crate::utils::{coerce_f64, mean_present, parse_price};
use crate::{PrepError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Half-open date range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Check whether `date` falls inside the window
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }
}

impl Default for DateWindow {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2023, 9, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap_or_default(),
        }
    }
}

/// One listing-month of the prepared table.
///
/// Field names are the column names of the written CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedRow {
    pub id: i64,
    pub date: NaiveDate,
    pub available: Option<String>,
    pub price: Option<f64>,
    pub name: Option<String>,
    pub host_id: Option<String>,
    pub host_name: Option<String>,
    pub number_of_reviews: Option<String>,
    pub reviews_per_month: Option<f64>,
    pub calculated_host_listings_count: Option<String>,
    pub availability_365: Option<String>,
    pub description: Option<String>,
    pub host_total_listings_count: Option<String>,
    pub neighbourhood_cleansed: Option<String>,
    pub amenities: Option<String>,
    pub review_scores_rating: Option<f64>,
    pub top_amenities_with_percentages: Option<String>,
    #[serde(rename = "Positivity_Score(1to5)")]
    pub positivity_score: Option<String>,
    pub sentiment_score: Option<f64>,
    pub category: Option<String>,
    #[serde(rename = "Customer_Positivity_Ranking(1to5)")]
    pub customer_positivity_ranking: Option<String>,
}

impl PreparedRow {
    fn from_parts(entry: CalendarEntry, listing: &Listing, price: Option<f64>) -> Self {
        Self {
            id: entry.listing_id,
            date: entry.date,
            available: entry.available,
            price,
            name: listing.name.clone(),
            host_id: listing.host_id.clone(),
            host_name: listing.host_name.clone(),
            number_of_reviews: listing.number_of_reviews.clone(),
            reviews_per_month: coerce_f64(listing.reviews_per_month.as_deref()),
            calculated_host_listings_count: listing.calculated_host_listings_count.clone(),
            availability_365: listing.availability_365.clone(),
            description: listing.description.clone(),
            host_total_listings_count: listing.host_total_listings_count.clone(),
            neighbourhood_cleansed: listing.neighbourhood_cleansed.clone(),
            amenities: listing.amenities.clone(),
            review_scores_rating: listing.review_scores_rating,
            top_amenities_with_percentages: None,
            positivity_score: None,
            sentiment_score: None,
            category: None,
            customer_positivity_ranking: None,
        }
    }
}

/// Left-join calendar entries to listings and clean the result.
///
/// Rows are dropped when the listing is unknown or has no listing-level price,
/// or when the month falls outside `window`. Missing `reviews_per_month` values
/// are imputed with the mean of the surviving rows.
pub fn merge_calendar_listings(
    calendar: Vec<CalendarEntry>,
    listings: &[Listing],
    window: DateWindow,
) -> Result<Vec<PreparedRow>> {
    let by_id: HashMap<i64, &Listing> = listings.iter().rev().map(|l| (l.id, l)).collect();
    let initial = calendar.len();

    let mut rows = Vec::with_capacity(calendar.len());
    for entry in calendar {
        let Some(listing) = by_id.get(&entry.listing_id) else {
            continue;
        };
        if listing.listing_price.as_deref().map_or(true, |p| p.trim().is_empty()) {
            continue;
        }
        if !window.contains(entry.date) {
            continue;
        }
        let price = match entry.price.as_deref() {
            Some(raw) => parse_price(raw).map_err(|e| {
                PrepError::ParseError(format!(
                    "listing {} on {}: {}",
                    entry.listing_id, entry.date, e
                ))
            })?,
            None => None,
        };
        rows.push(PreparedRow::from_parts(entry, listing, price));
    }

    let mean_reviews = mean_present(rows.iter().map(|r| r.reviews_per_month));
    for row in &mut rows {
        if row.reviews_per_month.is_none() {
            row.reviews_per_month = mean_reviews;
        }
    }

    info!(before = initial, after = rows.len(), "merged calendar with listings");
    Ok(rows)
}
