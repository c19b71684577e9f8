//! Review sentiment ranking per listing

use crate::enrichment::{score_in_batches, EnrichmentConfig, SentimentModel};
use crate::merge::PreparedRow;
use crate::utils::{parse_date, parse_id, read_parts};
use crate::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use tracing::info;

/// Ranking attached to listings that have no review in the window
pub const NO_REVIEWS: &str = "No reviews found";

/// One raw review row; reviewer columns are ignored
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReviewRecord {
    pub listing_id: String,
    pub date: Option<String>,
    pub comments: Option<String>,
}

/// Inclusive date range of reviews taken into account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Default for ReviewWindow {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2023, 7, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap_or_default(),
        }
    }
}

/// Read every review part of a city
pub fn load_reviews(paths: &[PathBuf]) -> Result<Vec<ReviewRecord>> {
    read_parts(paths)
}

/// Map an average sentiment score to a star bucket
pub fn star_label(average: f64) -> &'static str {
    match average {
        s if (0.0..=0.20).contains(&s) => "1 star",
        s if s > 0.20 && s <= 0.40 => "2 stars",
        s if s > 0.40 && s <= 0.60 => "3 stars",
        s if s > 0.60 && s <= 0.80 => "4 stars",
        s if s > 0.80 && s <= 1.00 => "5 stars",
        _ => "Unknown",
    }
}

/// Truncate a comment to at most `max_chars` characters
fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Star ranking per listing from the mean sentiment of its reviews.
///
/// Only reviews inside `window` whose listing is in `listing_ids` are scored.
/// Reviews with an unparseable date or listing id are ignored.
pub fn rank_listings<M: SentimentModel + ?Sized>(
    reviews: &[ReviewRecord],
    listing_ids: &HashSet<i64>,
    window: ReviewWindow,
    model: &M,
    config: &EnrichmentConfig,
) -> Result<HashMap<i64, String>> {
    let mut owners = Vec::new();
    let mut comments = Vec::new();
    for review in reviews {
        let Some(date) = review.date.as_deref().and_then(parse_date) else {
            continue;
        };
        if date < window.start || date > window.end {
            continue;
        }
        let Ok(id) = parse_id(&review.listing_id) else {
            continue;
        };
        if !listing_ids.contains(&id) {
            continue;
        }
        owners.push(id);
        comments.push(truncate_chars(
            review.comments.as_deref().unwrap_or_default(),
            config.max_review_chars,
        ));
    }
    info!(
        reviews = reviews.len(),
        in_window = comments.len(),
        "selected reviews for scoring"
    );

    let scores = score_in_batches(model, &comments, config.review_batch_size)?;

    let mut sums: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    for (id, score) in owners.into_iter().zip(&scores) {
        let entry = sums.entry(id).or_insert((0.0, 0));
        entry.0 += score.score;
        entry.1 += 1;
    }

    Ok(sums
        .into_iter()
        .map(|(id, (sum, count))| (id, star_label(sum / count as f64).to_string()))
        .collect())
}

/// Attach `Customer_Positivity_Ranking(1to5)` to every row
pub fn apply_review_rankings(rows: &mut [PreparedRow], rankings: &HashMap<i64, String>) {
    for row in rows.iter_mut() {
        row.customer_positivity_ranking = Some(
            rankings
                .get(&row.id)
                .cloned()
                .unwrap_or_else(|| NO_REVIEWS.to_string()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, "1 star")]
    #[case(0.20, "1 star")]
    #[case(0.205, "2 stars")]
    #[case(0.40, "2 stars")]
    #[case(0.55, "3 stars")]
    #[case(0.61, "4 stars")]
    #[case(0.95, "5 stars")]
    #[case(1.2, "Unknown")]
    #[case(-0.1, "Unknown")]
    #[case(f64::NAN, "Unknown")]
    fn buckets_are_contiguous(#[case] score: f64, #[case] expected: &str) {
        assert_eq!(star_label(score), expected);
    }

    #[test]
    fn truncates_by_characters() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
    }
}
