//! Parquet datasets.
//!
//! `timestamp` is stored as Int64 epoch milliseconds; the price and volume
//! columns as Float64.

use super::{Dataset, DatasetError};
use crate::domain::Candle;
use polars::prelude::*;
use std::fs;
use std::path::Path;

/// Write a dataset to a Parquet file, replacing any existing file.
pub fn write(dataset: &Dataset, path: &Path) -> Result<(), DatasetError> {
    let mut df = to_dataframe(dataset)?;
    let file = fs::File::create(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| DatasetError::Parquet(format!("write {}: {e}", path.display())))?;
    Ok(())
}

/// Read a dataset from a Parquet file.
pub fn read(path: &Path) -> Result<Dataset, DatasetError> {
    let file = fs::File::open(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DatasetError::Parquet(format!("read {}: {e}", path.display())))?;
    from_dataframe(&df)
}

/// Convert a dataset to a Polars DataFrame in dataset column order.
pub fn to_dataframe(dataset: &Dataset) -> Result<DataFrame, DatasetError> {
    let candles = dataset.candles();
    let timestamps: Vec<i64> = candles.iter().map(|c| c.timestamp_ms()).collect();
    let opens: Vec<f64> = candles.iter().map(|c| c.open).collect();
    let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();

    DataFrame::new(vec![
        Column::new("timestamp".into(), timestamps),
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
    ])
    .map_err(|e| DatasetError::Parquet(format!("dataframe creation: {e}")))
}

/// Convert a DataFrame with the dataset columns back into a dataset.
pub fn from_dataframe(df: &DataFrame) -> Result<Dataset, DatasetError> {
    for name in Candle::COLUMNS {
        if df.column(name).is_err() {
            return Err(DatasetError::Parquet(format!("missing column '{name}'")));
        }
    }

    let col = |name: &str| {
        df.column(name)
            .map_err(|e| DatasetError::Parquet(format!("column read: {e}")))
    };
    let f64_col = |name: &'static str| -> Result<Float64Chunked, DatasetError> {
        col(name)?
            .f64()
            .cloned()
            .map_err(|e| DatasetError::Parquet(format!("{name} column type: {e}")))
    };

    let ts_ca = col("timestamp")?
        .i64()
        .cloned()
        .map_err(|e| DatasetError::Parquet(format!("timestamp column type: {e}")))?;
    let open_ca = f64_col("open")?;
    let high_ca = f64_col("high")?;
    let low_ca = f64_col("low")?;
    let close_ca = f64_col("close")?;
    let vol_ca = f64_col("volume")?;

    let n = df.height();
    let mut candles = Vec::with_capacity(n);
    for i in 0..n {
        let ts = ts_ca
            .get(i)
            .ok_or_else(|| DatasetError::Parquet(format!("null timestamp at row {i}")))?;
        let candle = Candle::from_millis(
            ts,
            open_ca.get(i).unwrap_or(f64::NAN),
            high_ca.get(i).unwrap_or(f64::NAN),
            low_ca.get(i).unwrap_or(f64::NAN),
            close_ca.get(i).unwrap_or(f64::NAN),
            vol_ca.get(i).unwrap_or(f64::NAN),
        )
        .ok_or_else(|| DatasetError::Parquet(format!("timestamp out of range at row {i}: {ts}")))?;
        candles.push(candle);
    }

    Ok(Dataset::new(candles))
}
