//! Locating the exported part files of a city

use crate::{PrepError, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// Cities with published exports
pub const SUPPORTED_CITIES: [&str; 7] = [
    "barcelona",
    "florence",
    "lisbon",
    "madrid",
    "mallorca",
    "milan",
    "rome",
];

/// Check whether a city is in [`SUPPORTED_CITIES`]
pub fn is_supported(city: &str) -> bool {
    SUPPORTED_CITIES.contains(&city)
}

/// Number of part files per export kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartCounts {
    pub calendar: usize,
    pub listings: usize,
    pub reviews: usize,
}

impl Default for PartCounts {
    fn default() -> Self {
        Self {
            calendar: 4,
            listings: 4,
            reviews: 4,
        }
    }
}

/// Kinds of exported files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Calendar,
    Listings,
    ListingsLong,
    Reviews,
}

/// File name of one part, numbered from 1
pub fn part_file_name(city: &str, kind: FileKind, part: usize) -> String {
    match kind {
        FileKind::Calendar => format!("calendar_{}{}.csv", city, part),
        FileKind::Listings => format!("{}_listings{}.csv", city, part),
        FileKind::ListingsLong => format!("{}_listings{}_long.csv", city, part),
        FileKind::Reviews => format!("{}_reviews{}.csv", city, part),
    }
}

/// Resolved part files of one city
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityFiles {
    pub city: String,
    pub calendar: Vec<PathBuf>,
    pub listings: Vec<PathBuf>,
    pub listings_long: Vec<PathBuf>,
    /// Review parts; empty when the city has no review export
    pub reviews: Vec<PathBuf>,
}

impl CityFiles {
    /// Every resolved path
    pub fn all(&self) -> Vec<PathBuf> {
        self.calendar
            .iter()
            .chain(&self.listings)
            .chain(&self.listings_long)
            .chain(&self.reviews)
            .cloned()
            .collect()
    }
}

/// Provides the extracted files of a city
pub trait CitySource {
    /// Resolve the files of `city`, failing if any required part is missing
    fn fetch(&self, city: &str) -> Result<CityFiles>;
}

/// Reads already extracted exports from a local directory
#[derive(Debug, Clone)]
pub struct LocalDirectorySource {
    root: PathBuf,
    parts: PartCounts,
}

impl LocalDirectorySource {
    pub fn new<P: AsRef<Path>>(root: P, parts: PartCounts) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            parts,
        }
    }

    /// Directory the files are read from
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, city: &str, kind: FileKind, count: usize) -> Vec<PathBuf> {
        (1..=count)
            .map(|part| self.root.join(part_file_name(city, kind, part)))
            .collect()
    }
}

impl CitySource for LocalDirectorySource {
    fn fetch(&self, city: &str) -> Result<CityFiles> {
        let city = city.trim().to_lowercase();
        if !is_supported(&city) {
            return Err(PrepError::UnknownCity(city));
        }

        let calendar = self.resolve(&city, FileKind::Calendar, self.parts.calendar);
        let listings = self.resolve(&city, FileKind::Listings, self.parts.listings);
        let listings_long = self.resolve(&city, FileKind::ListingsLong, self.parts.listings);

        let missing: Vec<String> = calendar
            .iter()
            .chain(&listings)
            .chain(&listings_long)
            .filter(|path| !path.is_file())
            .map(|path| path.display().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PrepError::DataLoadError(format!(
                "Missing files for {}: {}",
                city,
                missing.join(", ")
            )));
        }

        let reviews = self.resolve(&city, FileKind::Reviews, self.parts.reviews);
        let reviews = if reviews.iter().all(|path| path.is_file()) {
            reviews
        } else {
            warn!(city = %city, "review parts incomplete, continuing without reviews");
            Vec::new()
        };

        info!(
            city = %city,
            root = %self.root.display(),
            reviews = reviews.len(),
            "resolved city files"
        );

        Ok(CityFiles {
            city,
            calendar,
            listings,
            listings_long,
            reviews,
        })
    }
}

/// File name of a city's zipped export
pub fn archive_file_name(city: &str) -> String {
    format!("{}.zip", city)
}

/// Extract every file of a zip archive flat into `dest_dir`.
///
/// Directory entries and entries with unsafe paths are skipped. Returns the extracted paths.
pub fn extract_archive<P: AsRef<Path>, Q: AsRef<Path>>(
    archive: P,
    dest_dir: Q,
) -> Result<Vec<PathBuf>> {
    let dest_dir = dest_dir.as_ref();
    fs::create_dir_all(dest_dir)?;

    let archive = archive.as_ref();
    let mut archive = ZipArchive::new(File::open(archive)?)?;
    let mut extracted = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let name = match entry.enclosed_name().and_then(|path| path.file_name()) {
            Some(name) => name.to_os_string(),
            None => {
                warn!(entry = entry.name(), "skipping archive entry with unsafe path");
                continue;
            }
        };

        let outpath = dest_dir.join(name);
        let mut outfile = File::create(&outpath)?;
        io::copy(&mut entry, &mut outfile)?;
        debug!(path = %outpath.display(), "extracted");
        extracted.push(outpath);
    }

    info!(
        dest = %dest_dir.display(),
        files = extracted.len(),
        "extracted city archive"
    );
    Ok(extracted)
}

/// Extracts `<city>.zip` from a directory, then resolves the parts like
/// [`LocalDirectorySource`].
///
/// Without an archive the directory is read as already extracted.
#[derive(Debug, Clone)]
pub struct ArchiveSource {
    local: LocalDirectorySource,
}

impl ArchiveSource {
    pub fn new<P: AsRef<Path>>(root: P, parts: PartCounts) -> Self {
        Self {
            local: LocalDirectorySource::new(root, parts),
        }
    }

    /// Directory holding the archives and their extracted files
    pub fn root(&self) -> &Path {
        self.local.root()
    }
}

impl CitySource for ArchiveSource {
    fn fetch(&self, city: &str) -> Result<CityFiles> {
        let city = city.trim().to_lowercase();
        if !is_supported(&city) {
            return Err(PrepError::UnknownCity(city));
        }

        let archive = self.root().join(archive_file_name(&city));
        if archive.is_file() {
            extract_archive(&archive, self.root())?;
        } else {
            debug!(city = %city, "no archive found, reading extracted files");
        }

        self.local.fetch(&city)
    }
}
