//! Listing export processing
//!
//! Each city ships a short listing export and a long one with free-text and
//! review columns. They are combined into one [`Listing`] per (id, host).

use crate::utils::{coerce_f64, mean_present, parse_id, read_parts};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tracing::info;

/// Row of the short listing export
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListingRecord {
    pub id: String,
    pub name: Option<String>,
    pub host_id: Option<String>,
    pub host_name: Option<String>,
    pub price: Option<String>,
    pub number_of_reviews: Option<String>,
    pub reviews_per_month: Option<String>,
    pub calculated_host_listings_count: Option<String>,
    pub availability_365: Option<String>,
}

/// Row of the long listing export; only the merged columns are read
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LongListingRecord {
    pub id: String,
    pub host_id: Option<String>,
    pub description: Option<String>,
    pub host_total_listings_count: Option<String>,
    pub neighbourhood_cleansed: Option<String>,
    pub amenities: Option<String>,
    pub review_scores_rating: Option<String>,
}

/// A listing with its long-export details merged in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub id: i64,
    pub name: Option<String>,
    pub host_id: Option<String>,
    pub host_name: Option<String>,
    /// Listing-level price; rows without one are dropped at merge time
    pub listing_price: Option<String>,
    pub number_of_reviews: Option<String>,
    pub reviews_per_month: Option<String>,
    pub calculated_host_listings_count: Option<String>,
    pub availability_365: Option<String>,
    /// Falls back to `name` when the long export has no description
    pub description: Option<String>,
    pub host_total_listings_count: Option<String>,
    pub neighbourhood_cleansed: Option<String>,
    pub amenities: Option<String>,
    /// Missing ratings are imputed with the mean rating
    pub review_scores_rating: Option<f64>,
}

/// Read both listing exports of a city and combine them
pub fn process_listings(short_paths: &[PathBuf], long_paths: &[PathBuf]) -> Result<Vec<Listing>> {
    let short: Vec<ListingRecord> = read_parts(short_paths)?;
    let long: Vec<LongListingRecord> = read_parts(long_paths)?;
    combine_listings(short, long)
}

/// Combine short and long records.
///
/// Both sides are de-duplicated on (id, host_id), keeping the first record. The
/// long columns are left-joined by id using the first long record per id.
pub fn combine_listings(
    short: Vec<ListingRecord>,
    long: Vec<LongListingRecord>,
) -> Result<Vec<Listing>> {
    let short = dedup_by_host(short, |r| (r.id.clone(), r.host_id.clone()));
    let long = dedup_by_host(long, |r| (r.id.clone(), r.host_id.clone()));

    let mut details: HashMap<i64, LongListingRecord> = HashMap::new();
    for record in long {
        let id = parse_id(&record.id)?;
        details.entry(id).or_insert(record);
    }

    let mut listings = Vec::with_capacity(short.len());
    for record in short {
        let id = parse_id(&record.id)?;
        let detail = details.get(&id);
        let description = detail
            .and_then(|d| d.description.clone())
            .or_else(|| record.name.clone());

        listings.push(Listing {
            id,
            name: record.name,
            host_id: record.host_id,
            host_name: record.host_name,
            listing_price: record.price,
            number_of_reviews: record.number_of_reviews,
            reviews_per_month: record.reviews_per_month,
            calculated_host_listings_count: record.calculated_host_listings_count,
            availability_365: record.availability_365,
            description,
            host_total_listings_count: detail.and_then(|d| d.host_total_listings_count.clone()),
            neighbourhood_cleansed: detail.and_then(|d| d.neighbourhood_cleansed.clone()),
            amenities: detail.and_then(|d| d.amenities.clone()),
            review_scores_rating: detail
                .and_then(|d| coerce_f64(d.review_scores_rating.as_deref())),
        });
    }

    let mean_rating = mean_present(listings.iter().map(|l| l.review_scores_rating));
    let mut imputed = 0usize;
    for listing in &mut listings {
        if listing.review_scores_rating.is_none() && mean_rating.is_some() {
            listing.review_scores_rating = mean_rating;
            imputed += 1;
        }
    }

    info!(
        listings = listings.len(),
        with_details = listings
            .iter()
            .filter(|l| details.contains_key(&l.id))
            .count(),
        imputed_ratings = imputed,
        "combined listing exports"
    );
    Ok(listings)
}

fn dedup_by_host<T, F>(records: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> (String, Option<String>),
{
    let mut seen = HashSet::new();
    records.into_iter().filter(|r| seen.insert(key(r))).collect()
}
