//! Most common amenities per neighbourhood

use crate::merge::PreparedRow;
use std::collections::HashMap;
use tracing::debug;

/// Split an exported amenities cell like `["Wifi", "Kitchen"]` into names
pub fn parse_amenities(raw: &str) -> Vec<String> {
    raw.trim()
        .trim_matches(|c| c == '[' || c == ']')
        .replace('"', "")
        .split(", ")
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}

/// Format the `top_n` most frequent amenities of one neighbourhood.
///
/// Each entry reads `Amenity (count, pct%)` where pct is relative to the number
/// of rows in the neighbourhood. Ties keep first-appearance order.
pub fn top_amenities(rows: &[Vec<String>], top_n: usize) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for amenity in rows.iter().flatten() {
        match index.get(amenity.as_str()) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(amenity.as_str(), counts.len());
                counts.push((amenity.as_str(), 1));
            }
        }
    }

    // Stable sort keeps first appearance among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let total = rows.len().max(1) as f64;
    counts
        .into_iter()
        .take(top_n)
        .map(|(amenity, count)| {
            format!(
                "{} ({}, {:.2}%)",
                amenity,
                count,
                count as f64 / total * 100.0
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Attach each neighbourhood's top amenities to all of its rows.
///
/// Rows without a neighbourhood are left untouched.
pub fn attach_top_amenities(rows: &mut [PreparedRow], top_n: usize) {
    let mut groups: HashMap<String, Vec<Vec<String>>> = HashMap::new();
    for row in rows.iter() {
        if let Some(neighbourhood) = &row.neighbourhood_cleansed {
            let amenities = row
                .amenities
                .as_deref()
                .map(parse_amenities)
                .unwrap_or_default();
            groups
                .entry(neighbourhood.clone())
                .or_default()
                .push(amenities);
        }
    }

    let summaries: HashMap<String, String> = groups
        .into_iter()
        .map(|(neighbourhood, lists)| {
            let summary = top_amenities(&lists, top_n);
            (neighbourhood, summary)
        })
        .collect();
    debug!(neighbourhoods = summaries.len(), "aggregated amenities");

    for row in rows.iter_mut() {
        row.top_amenities_with_percentages = row
            .neighbourhood_cleansed
            .as_ref()
            .and_then(|n| summaries.get(n).cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_exported_list() {
        assert_eq!(
            parse_amenities("[\"Wifi\", \"Kitchen\", \"Hair dryer\"]"),
            vec!["Wifi", "Kitchen", "Hair dryer"]
        );
        assert!(parse_amenities("[]").is_empty());
    }

    #[test]
    fn counts_and_percentages() {
        let rows = vec![
            vec!["Wifi".to_string(), "Kitchen".to_string()],
            vec!["Wifi".to_string()],
            vec!["Pool".to_string(), "Kitchen".to_string(), "Wifi".to_string()],
            vec![],
        ];

        assert_eq!(
            top_amenities(&rows, 2),
            "Wifi (3, 75.00%), Kitchen (2, 50.00%)"
        );
    }

    #[test]
    fn ties_keep_first_appearance() {
        let rows = vec![vec!["Iron".to_string(), "Heating".to_string()]];

        assert_eq!(
            top_amenities(&rows, 10),
            "Iron (1, 100.00%), Heating (1, 100.00%)"
        );
    }
}
