//! Candle datasets and their on-disk forms.
//!
//! A [`Dataset`] is an ordered, schema-fixed table of candles with the columns
//! `timestamp, open, high, low, close, volume`. It has no mutating API: once a
//! fetcher or loader hands one out it stays as it was.
//!
//! Storage format is chosen by file extension: `.parquet` → Parquet, anything
//! else → CSV with a header row.

pub mod csv_io;
pub mod parquet_io;

use crate::domain::Candle;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("No file found at {}.", path.display())]
    NotFound { path: PathBuf },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("parquet error: {0}")]
    Parquet(String),
}

/// On-disk representation of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Csv,
    Parquet,
}

impl DatasetFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("parquet") => DatasetFormat::Parquet,
            _ => DatasetFormat::Csv,
        }
    }
}

/// Ordered table of candles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    candles: Vec<Candle>,
}

impl Dataset {
    pub fn new(candles: Vec<Candle>) -> Self {
        Self { candles }
    }

    /// Empty dataset; still carries the six-column schema.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &'static [&'static str; 6] {
        &Candle::COLUMNS
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn first(&self) -> Option<&Candle> {
        self.candles.first()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Open times of the first and last candle.
    pub fn time_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.first()?.timestamp, self.last()?.timestamp))
    }

    /// Values of a numeric column, or `None` for an unknown column name.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        if !Candle::COLUMNS[1..].iter().any(|c| *c == name) {
            return None;
        }
        self.candles.iter().map(|c| c.field(name)).collect()
    }

    /// True if timestamps strictly increase.
    pub fn is_strictly_ordered(&self) -> bool {
        self.candles
            .windows(2)
            .all(|w| w[0].timestamp < w[1].timestamp)
    }

    /// BLAKE3 content hash over every field of every candle.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for c in &self.candles {
            hasher.update(&c.timestamp_ms().to_le_bytes());
            for v in [c.open, c.high, c.low, c.close, c.volume] {
                hasher.update(&v.to_bits().to_le_bytes());
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;

    fn into_iter(self) -> Self::IntoIter {
        self.candles.iter()
    }
}

/// Load a dataset from `path`.
///
/// Fails with [`DatasetError::NotFound`] before any read is attempted if the
/// path does not exist.
pub fn load_data(path: impl AsRef<Path>) -> Result<Dataset, DatasetError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DatasetError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let dataset = match DatasetFormat::from_path(path) {
        DatasetFormat::Csv => csv_io::read(path)?,
        DatasetFormat::Parquet => parquet_io::read(path)?,
    };
    tracing::info!(rows = dataset.len(), "Dataset loaded from {}.", path.display());
    Ok(dataset)
}

/// Save a dataset to `path`, creating parent directories as needed.
///
/// An existing file is overwritten. Passing `None` is a validation error and
/// leaves the filesystem untouched.
pub fn save_data(data: Option<&Dataset>, path: impl AsRef<Path>) -> Result<(), DatasetError> {
    let path = path.as_ref();
    let data =
        data.ok_or_else(|| DatasetError::Validation("No dataset available to save.".into()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| DatasetError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    match DatasetFormat::from_path(path) {
        DatasetFormat::Csv => csv_io::write(data, path)?,
        DatasetFormat::Parquet => parquet_io::write(data, path)?,
    }
    tracing::info!(rows = data.len(), "Dataset saved to {}.", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(ts: i64, close: f64) -> Candle {
        Candle::from_millis(ts, close - 1.0, close + 1.0, close - 2.0, close, 3.0).unwrap()
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(DatasetFormat::from_path(Path::new("a/b.csv")), DatasetFormat::Csv);
        assert_eq!(DatasetFormat::from_path(Path::new("a/b.PARQUET")), DatasetFormat::Parquet);
        assert_eq!(DatasetFormat::from_path(Path::new("noext")), DatasetFormat::Csv);
    }

    #[test]
    fn empty_dataset_keeps_schema() {
        let ds = Dataset::empty();
        assert!(ds.is_empty());
        assert_eq!(
            ds.columns(),
            &["timestamp", "open", "high", "low", "close", "volume"]
        );
        assert_eq!(ds.time_range(), None);
        assert_eq!(ds.column("close"), Some(vec![]));
    }

    #[test]
    fn column_extraction() {
        let ds = Dataset::new(vec![candle(0, 10.0), candle(60_000, 11.0)]);
        assert_eq!(ds.column("close"), Some(vec![10.0, 11.0]));
        assert_eq!(ds.column("volume"), Some(vec![3.0, 3.0]));
        assert_eq!(ds.column("timestamp"), None);
        assert_eq!(ds.column("vwap"), None);
    }

    #[test]
    fn ordering_check() {
        assert!(Dataset::new(vec![candle(0, 1.0), candle(1, 1.0)]).is_strictly_ordered());
        assert!(!Dataset::new(vec![candle(1, 1.0), candle(1, 1.0)]).is_strictly_ordered());
        assert!(Dataset::empty().is_strictly_ordered());
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = Dataset::new(vec![candle(0, 10.0)]);
        let b = Dataset::new(vec![candle(0, 10.5)]);
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn save_none_is_validation_error_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");

        let err = save_data(None, &path).unwrap_err();
        assert!(matches!(err, DatasetError::Validation(_)));
        assert!(!path.exists());
        assert!(!dir.path().join("nested").exists());
    }

    #[test]
    fn load_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.csv");
        let err = load_data(&path).unwrap_err();
        assert!(matches!(err, DatasetError::NotFound { .. }));
        assert!(!path.exists());
    }
}
