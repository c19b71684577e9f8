//! Text enrichment through pluggable sentiment and classification models
//!
//! The models themselves live outside this crate. Implementations only have to
//! score or label a batch of texts; batching, chunking and attaching the results
//! to rows happens here.

use crate::merge::PreparedRow;
use crate::{PrepError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Labels used for property classification
pub const PROPERTY_CATEGORIES: [&str; 3] = ["Luxury", "Standard", "Economy"];

/// Sentiment of one text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    /// Model label, e.g. `"4 stars"`
    pub label: String,
    /// Confidence in `[0, 1]`
    pub score: f64,
}

/// Scores the sentiment of texts
pub trait SentimentModel {
    /// Return one score per input text, in input order
    fn score_batch(&self, texts: &[String]) -> Result<Vec<SentimentScore>>;
}

/// Picks the best matching label for texts
pub trait ZeroShotClassifier {
    /// Return the top label per input text, in input order
    fn classify_batch(&self, texts: &[String], labels: &[&str]) -> Result<Vec<String>>;
}

/// Settings for description and review enrichment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub description_batch_size: usize,
    pub max_words_per_chunk: usize,
    pub classification_batch_size: usize,
    pub review_batch_size: usize,
    pub max_review_chars: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            description_batch_size: 32,
            max_words_per_chunk: 512,
            classification_batch_size: 32,
            review_batch_size: 256,
            max_review_chars: 512,
        }
    }
}

/// Split text into chunks of at most `max_words` whitespace-separated words.
///
/// Text without words becomes a single empty chunk so it still gets scored.
pub fn split_words(text: &str, max_words: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return vec![String::new()];
    }
    words
        .chunks(max_words.max(1))
        .map(|chunk| chunk.join(" "))
        .collect()
}

/// Score texts in batches, checking the model returned one result per text
pub fn score_in_batches<M: SentimentModel + ?Sized>(
    model: &M,
    texts: &[String],
    batch_size: usize,
) -> Result<Vec<SentimentScore>> {
    let mut scores = Vec::with_capacity(texts.len());
    for (i, batch) in texts.chunks(batch_size.max(1)).enumerate() {
        let batch_scores = model.score_batch(batch)?;
        if batch_scores.len() != batch.len() {
            return Err(PrepError::Enrichment(format!(
                "sentiment model returned {} scores for {} texts in batch {}",
                batch_scores.len(),
                batch.len(),
                i
            )));
        }
        scores.extend(batch_scores);
        debug!(batch = i, done = scores.len(), total = texts.len(), "scored batch");
    }
    Ok(scores)
}

/// Score descriptions, each by its highest-scoring word chunk
pub fn score_descriptions<M: SentimentModel + ?Sized>(
    model: &M,
    descriptions: &[String],
    config: &EnrichmentConfig,
) -> Result<Vec<SentimentScore>> {
    let mut results = Vec::with_capacity(descriptions.len());
    for batch in descriptions.chunks(config.description_batch_size.max(1)) {
        let chunked: Vec<Vec<String>> = batch
            .iter()
            .map(|d| split_words(d, config.max_words_per_chunk))
            .collect();
        let flat: Vec<String> = chunked.iter().flatten().cloned().collect();
        let scores = score_in_batches(model, &flat, flat.len())?;

        let mut offset = 0;
        for chunks in &chunked {
            let best = scores[offset..offset + chunks.len()]
                .iter()
                .max_by(|a, b| a.score.total_cmp(&b.score))
                .cloned()
                .ok_or_else(|| PrepError::Enrichment("description without chunks".to_string()))?;
            results.push(best);
            offset += chunks.len();
        }
    }
    Ok(results)
}

/// Attach `Positivity_Score(1to5)` and `sentiment_score` to every row.
///
/// Each distinct description is scored once.
pub fn apply_description_sentiment<M: SentimentModel + ?Sized>(
    rows: &mut [PreparedRow],
    model: &M,
    config: &EnrichmentConfig,
) -> Result<()> {
    let mut unique: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for row in rows.iter() {
        let text = row.description.clone().unwrap_or_default();
        if !index.contains_key(&text) {
            index.insert(text.clone(), unique.len());
            unique.push(text);
        }
    }

    let scores = score_descriptions(model, &unique, config)?;
    for row in rows.iter_mut() {
        let text = row.description.as_deref().unwrap_or_default();
        if let Some(score) = index.get(text).and_then(|&i| scores.get(i)) {
            row.positivity_score = Some(score.label.clone());
            row.sentiment_score = Some(score.score);
        }
    }

    info!(
        rows = rows.len(),
        descriptions = unique.len(),
        "attached description sentiment"
    );
    Ok(())
}

/// Classify each distinct (id, description) pair and attach the label as `category`
pub fn classify_properties<C: ZeroShotClassifier + ?Sized>(
    rows: &mut [PreparedRow],
    classifier: &C,
    config: &EnrichmentConfig,
) -> Result<()> {
    let mut pairs: Vec<(i64, String)> = Vec::new();
    let mut index: HashMap<(i64, String), usize> = HashMap::new();
    for row in rows.iter() {
        let key = (row.id, row.description.clone().unwrap_or_default());
        if !index.contains_key(&key) {
            index.insert(key.clone(), pairs.len());
            pairs.push(key);
        }
    }

    let texts: Vec<String> = pairs.iter().map(|(_, d)| d.clone()).collect();
    let mut labels = Vec::with_capacity(texts.len());
    for batch in texts.chunks(config.classification_batch_size.max(1)) {
        let batch_labels = classifier.classify_batch(batch, &PROPERTY_CATEGORIES)?;
        if batch_labels.len() != batch.len() {
            return Err(PrepError::Enrichment(format!(
                "classifier returned {} labels for {} texts",
                batch_labels.len(),
                batch.len()
            )));
        }
        labels.extend(batch_labels);
    }

    for row in rows.iter_mut() {
        let key = (row.id, row.description.clone().unwrap_or_default());
        row.category = index.get(&key).and_then(|&i| labels.get(i)).cloned();
    }

    info!(pairs = pairs.len(), "classified properties");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Scores by length so longer chunks win
    struct LengthModel;

    impl SentimentModel for LengthModel {
        fn score_batch(&self, texts: &[String]) -> Result<Vec<SentimentScore>> {
            Ok(texts
                .iter()
                .map(|t| SentimentScore {
                    label: format!("{} stars", t.split_whitespace().count().min(5)),
                    score: t.len() as f64 / 100.0,
                })
                .collect())
        }
    }

    #[test]
    fn splits_on_word_count() {
        assert_eq!(split_words("a b c d e", 2), vec!["a b", "c d", "e"]);
        assert_eq!(split_words("   ", 2), vec![""]);
    }

    #[test]
    fn description_takes_best_chunk() {
        let config = EnrichmentConfig {
            max_words_per_chunk: 2,
            ..EnrichmentConfig::default()
        };
        let descriptions = vec!["aa bb c".to_string(), "x".to_string()];

        let scores = score_descriptions(&LengthModel, &descriptions, &config).unwrap();

        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].label, "2 stars");
        assert_eq!(scores[1].label, "1 stars");
    }
}
