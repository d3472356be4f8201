//! CSV datasets: header row, one candle per line.
//!
//! ```text
//! timestamp,open,high,low,close,volume
//! 2024-01-01 00:00:00,42000.1,42500.0,41800.0,42300.5,12.5
//! ```

use super::{Dataset, DatasetError};
use crate::domain::Candle;
use std::io;
use std::path::Path;

/// Read a dataset from a CSV file.
pub fn read(path: &Path) -> Result<Dataset, DatasetError> {
    let file = std::fs::File::open(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    from_reader(file).map_err(|e| match e {
        DatasetError::Csv(msg) => DatasetError::Csv(format!("{}: {msg}", path.display())),
        other => other,
    })
}

/// Write a dataset to a CSV file, replacing any existing file.
pub fn write(dataset: &Dataset, path: &Path) -> Result<(), DatasetError> {
    let file = std::fs::File::create(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    to_writer(dataset, file)
}

/// Parse CSV from any reader. Columns are matched by header name.
pub fn from_reader<R: io::Read>(reader: R) -> Result<Dataset, DatasetError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let candles = rdr
        .deserialize::<Candle>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DatasetError::Csv(e.to_string()))?;
    Ok(Dataset::new(candles))
}

/// Serialize a dataset as CSV. The header is written even when there are no rows.
pub fn to_writer<W: io::Write>(dataset: &Dataset, writer: W) -> Result<(), DatasetError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record(Candle::COLUMNS)
        .map_err(|e| DatasetError::Csv(e.to_string()))?;
    for candle in dataset {
        wtr.serialize(candle)
            .map_err(|e| DatasetError::Csv(e.to_string()))?;
    }
    wtr.flush()
        .map_err(|e| DatasetError::Csv(format!("failed to flush CSV writer: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::new(vec![
            Candle::from_millis(1_704_067_200_000, 42_000.1, 42_500.0, 41_800.0, 42_300.5, 12.5)
                .unwrap(),
            Candle::from_millis(1_704_070_800_000, 42_300.5, 42_400.0, 42_100.0, 42_200.0, 8.25)
                .unwrap(),
        ])
    }

    fn to_string(ds: &Dataset) -> String {
        let mut buf = Vec::new();
        to_writer(ds, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn writes_header_and_rows() {
        let text = to_string(&sample());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "timestamp,open,high,low,close,volume");
        assert_eq!(lines[1], "2024-01-01 00:00:00,42000.1,42500.0,41800.0,42300.5,12.5");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn empty_dataset_writes_header_only() {
        assert_eq!(
            to_string(&Dataset::empty()),
            "timestamp,open,high,low,close,volume\n"
        );
    }

    #[test]
    fn reads_back_what_it_wrote() {
        let text = to_string(&sample());
        let back = from_reader(text.as_bytes()).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn reads_columns_by_name_and_ignores_extras() {
        let text = "volume,timestamp,open,high,low,close,trades\n\
                    1.5,2024-01-01 00:00:00,1,2,0.5,1.5,7\n";
        let ds = from_reader(text.as_bytes()).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.candles()[0].volume, 1.5);
        assert_eq!(ds.candles()[0].close, 1.5);
    }

    #[test]
    fn missing_column_is_csv_error() {
        let text = "timestamp,open,high,low,close\n2024-01-01 00:00:00,1,2,0.5,1.5\n";
        assert!(matches!(
            from_reader(text.as_bytes()),
            Err(DatasetError::Csv(_))
        ));
    }

    #[test]
    fn bad_timestamp_is_csv_error() {
        let text = "timestamp,open,high,low,close,volume\nlast tuesday,1,2,0.5,1.5,3\n";
        assert!(matches!(
            from_reader(text.as_bytes()),
            Err(DatasetError::Csv(_))
        ));
    }
}
