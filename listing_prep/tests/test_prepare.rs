use listing_prep::enrichment::{SentimentModel, SentimentScore, ZeroShotClassifier};
use listing_prep::prepare::{enrich, prepare_city, read_prepared, write_prepared, Enrichers};
use listing_prep::reviews::NO_REVIEWS;
use listing_prep::sources::{ArchiveSource, CitySource, LocalDirectorySource, PartCounts};
use listing_prep::{PrepConfig, PrepError};
use pretty_assertions::assert_eq;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::{tempdir, TempDir};
use zip::write::FileOptions;
use zip::ZipWriter;

const CALENDAR_HEADER: &str = "listing_id,date,available,price,adjusted_price,minimum_nights,maximum_nights";
const LISTINGS_HEADER: &str = "id,name,host_id,host_name,neighbourhood,latitude,longitude,room_type,price,minimum_nights,number_of_reviews,last_review,reviews_per_month,calculated_host_listings_count,availability_365,license";
const LONG_HEADER: &str = "id,host_id,description,host_total_listings_count,neighbourhood_cleansed,amenities,review_scores_rating";

fn write(dir: &Path, name: &str, lines: &[&str]) {
    fs::write(dir.join(name), lines.join("\n") + "\n").unwrap();
}

/// A two-part city with three listings in two neighbourhoods
fn city_dir() -> TempDir {
    let dir = tempdir().unwrap();
    let root = dir.path();

    write(
        root,
        "calendar_lisbon1.csv",
        &[
            CALENDAR_HEADER,
            "1,2023-09-03,t,\"$1,100.00\",,2,30",
            "1,2023-09-04,t,\"$1,150.00\",,2,30",
            "1,2023-10-10,t,$120.00,,2,30",
            "2,2023-09-05,f,$80.00,,1,10",
        ],
    );
    write(
        root,
        "calendar_lisbon2.csv",
        &[
            CALENDAR_HEADER,
            "2,2023-10-05,t,$85.00,,1,10",
            "3.0,2023-11-01,t,$60.00,,1,10",
            "3,2024-07-01,t,$65.00,,1,10",
            "4,2023-11-01,t,$50.00,,1,10",
        ],
    );
    write(
        root,
        "lisbon_listings1.csv",
        &[
            LISTINGS_HEADER,
            "1,Sea view,10,Ana,Alfama,38.7,-9.1,Entire home,$100,2,12,2024-01-01,1.5,1,200,",
            "2,Old town room,11,Rui,Alfama,38.7,-9.1,Private room,$80,1,3,2024-01-01,,1,100,",
        ],
    );
    write(
        root,
        "lisbon_listings2.csv",
        &[
            LISTINGS_HEADER,
            "3,Garden studio,12,Eva,Belem,38.6,-9.2,Entire home,$60,1,0,,0.5,1,300,",
            "4,No price,13,Ivo,Belem,38.6,-9.2,Entire home,,1,0,,,1,300,",
        ],
    );
    write(
        root,
        "lisbon_listings1_long.csv",
        &[
            LONG_HEADER,
            "1,10,Bright flat with a view,1,Alfama,\"[\"\"Wifi\"\", \"\"Kitchen\"\"]\",4.9",
            "2,11,,1,Alfama,\"[\"\"Wifi\"\"]\",",
        ],
    );
    write(
        root,
        "lisbon_listings2_long.csv",
        &[
            LONG_HEADER,
            "3,12,Quiet studio,1,Belem,\"[\"\"Garden\"\"]\",4.5",
        ],
    );
    write(
        root,
        "lisbon_reviews1.csv",
        &[
            "listing_id,id,date,reviewer_id,reviewer_name,comments",
            "1,100,2023-08-01,5,Joe,Lovely stay",
            "1,101,2024-01-01,6,Sam,Great view",
            "3,102,2022-01-01,7,Kim,Too old to count",
        ],
    );
    dir
}

fn parts() -> PartCounts {
    PartCounts {
        calendar: 2,
        listings: 2,
        reviews: 1,
    }
}

fn config() -> PrepConfig {
    PrepConfig {
        parts: parts(),
        ..PrepConfig::default()
    }
}

#[test]
fn test_prepare_city_end_to_end() {
    let dir = city_dir();
    let files = LocalDirectorySource::new(dir.path(), parts())
        .fetch("lisbon")
        .unwrap();
    assert_eq!(files.reviews.len(), 1);

    let rows = prepare_city(&files, &config()).unwrap();

    let keys: Vec<(i64, String)> = rows.iter().map(|r| (r.id, r.date.to_string())).collect();
    assert_eq!(
        keys,
        vec![
            (1, "2023-09-01".to_string()),
            (1, "2023-10-01".to_string()),
            (2, "2023-10-01".to_string()),
            (3, "2023-11-01".to_string()),
        ]
    );
    assert_eq!(rows[0].price, Some(1100.0));
    assert_eq!(rows[2].description.as_deref(), Some("Old town room"));
    assert_eq!(rows[2].review_scores_rating, Some(4.7));
    assert_eq!(rows[2].reviews_per_month, Some(1.1666666666666667));
    assert_eq!(
        rows[0].top_amenities_with_percentages.as_deref(),
        Some("Wifi (3, 100.00%), Kitchen (2, 66.67%)")
    );
    assert_eq!(
        rows[3].top_amenities_with_percentages.as_deref(),
        Some("Garden (1, 100.00%)")
    );
}

#[test]
fn test_missing_files_fail_fast() {
    let dir = city_dir();
    fs::remove_file(dir.path().join("calendar_lisbon2.csv")).unwrap();

    let result = LocalDirectorySource::new(dir.path(), parts()).fetch("lisbon");

    assert!(matches!(result, Err(PrepError::DataLoadError(msg)) if msg.contains("calendar_lisbon2.csv")));
}

#[test]
fn test_prepared_rows_round_trip() {
    let dir = city_dir();
    let files = LocalDirectorySource::new(dir.path(), parts())
        .fetch("lisbon")
        .unwrap();
    let rows = prepare_city(&files, &config()).unwrap();
    let path = dir.path().join("lisbon_merged.csv");

    write_prepared(&rows, &path).unwrap();
    let back = read_prepared(&path).unwrap();

    assert_eq!(back.len(), rows.len());
    assert_eq!(back[0].id, rows[0].id);
    assert_eq!(back[0].date, rows[0].date);
    assert_eq!(back[0].neighbourhood_cleansed, rows[0].neighbourhood_cleansed);

    let header = fs::read_to_string(&path).unwrap();
    let header = header.lines().next().unwrap();
    assert!(header.contains("neighbourhood_cleansed"));
    assert!(header.contains("Customer_Positivity_Ranking(1to5)"));
}

struct FixedSentiment(f64);

impl SentimentModel for FixedSentiment {
    fn score_batch(&self, texts: &[String]) -> listing_prep::Result<Vec<SentimentScore>> {
        Ok(texts
            .iter()
            .map(|_| SentimentScore {
                label: "5 stars".to_string(),
                score: self.0,
            })
            .collect())
    }
}

struct LengthClassifier;

impl ZeroShotClassifier for LengthClassifier {
    fn classify_batch(&self, texts: &[String], labels: &[&str]) -> listing_prep::Result<Vec<String>> {
        Ok(texts
            .iter()
            .map(|t| if t.len() > 15 { labels[0] } else { labels[2] }.to_string())
            .collect())
    }
}

#[test]
fn test_enrichment_attaches_labels() {
    let dir = city_dir();
    let files = LocalDirectorySource::new(dir.path(), parts())
        .fetch("lisbon")
        .unwrap();
    let config = config();
    let mut rows = prepare_city(&files, &config).unwrap();

    let sentiment = FixedSentiment(0.9);
    let enrichers = Enrichers {
        sentiment: Some(&sentiment),
        classifier: Some(&LengthClassifier),
    };
    enrich(&mut rows, &files, &config, &enrichers).unwrap();

    assert!(rows.iter().all(|r| r.positivity_score.as_deref() == Some("5 stars")));
    assert!(rows.iter().all(|r| r.sentiment_score == Some(0.9)));
    assert_eq!(rows[0].category.as_deref(), Some("Luxury"));
    assert_eq!(rows[3].category.as_deref(), Some("Economy"));

    // Only listing 1 has a review inside the window
    assert_eq!(rows[0].customer_positivity_ranking.as_deref(), Some("5 stars"));
    assert_eq!(rows[3].customer_positivity_ranking.as_deref(), Some(NO_REVIEWS));
}

#[test]
fn test_enrichment_without_models_is_a_no_op() {
    let dir = city_dir();
    let files = LocalDirectorySource::new(dir.path(), parts())
        .fetch("lisbon")
        .unwrap();
    let config = config();
    let mut rows = prepare_city(&files, &config).unwrap();
    let before = rows.clone();

    enrich(&mut rows, &files, &config, &Enrichers::default()).unwrap();

    assert_eq!(rows, before);
}

/// Pack every file of `src` under a `lisbon/` folder in `<dest>/lisbon.zip`
fn zip_city(src: &Path, dest: &Path) {
    let mut names: Vec<String> = fs::read_dir(src)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();

    let mut writer = ZipWriter::new(fs::File::create(dest.join("lisbon.zip")).unwrap());
    writer
        .add_directory("lisbon/", FileOptions::default())
        .unwrap();
    for name in names {
        writer
            .start_file(format!("lisbon/{}", name), FileOptions::default())
            .unwrap();
        writer.write_all(&fs::read(src.join(&name)).unwrap()).unwrap();
    }
    writer.finish().unwrap();
}

#[test]
fn test_archive_source_extracts_then_resolves() {
    let extracted = city_dir();
    let archives = tempdir().unwrap();
    zip_city(extracted.path(), archives.path());

    let from_archive = ArchiveSource::new(archives.path(), parts())
        .fetch("Lisbon")
        .unwrap();
    let from_directory = LocalDirectorySource::new(extracted.path(), parts())
        .fetch("lisbon")
        .unwrap();

    assert!(archives.path().join("calendar_lisbon1.csv").is_file());
    assert_eq!(from_archive.reviews.len(), 1);
    assert_eq!(
        prepare_city(&from_archive, &config()).unwrap(),
        prepare_city(&from_directory, &config()).unwrap()
    );
}

#[test]
fn test_archive_source_without_archive_reads_directory() {
    let dir = city_dir();

    let files = ArchiveSource::new(dir.path(), parts())
        .fetch("lisbon")
        .unwrap();

    assert_eq!(files.calendar.len(), 2);
}

#[test]
fn test_archive_source_without_files_is_an_error() {
    let dir = tempdir().unwrap();

    let result = ArchiveSource::new(dir.path(), parts()).fetch("lisbon");

    assert!(matches!(result, Err(PrepError::DataLoadError(_))));
}

#[test]
fn test_corrupt_archive_is_an_error() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("lisbon.zip"), b"not a zip").unwrap();

    let result = ArchiveSource::new(dir.path(), parts()).fetch("lisbon");

    assert!(matches!(result, Err(PrepError::Archive(_))));
}
