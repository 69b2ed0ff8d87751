// CSV reading and writing for station rows (segment artifacts and the cache file)
use crate::domain::station::{DateRange, StationRow};
use chrono::{DateTime, NaiveDateTime};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const TIMESTAMP_COLUMN: &str = "timestamp";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %I:%M %p",
    "%m/%d/%y %I:%M:%S %p",
];

#[derive(Debug, Error)]
pub enum StationCsvError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path}, record {record}: {message}")]
    Malformed {
        path: PathBuf,
        record: usize,
        message: String,
    },
}

/// Location of the artifact the retrieval step leaves behind for `segment`.
pub fn artifact_path(dir: &Path, segment: &DateRange) -> PathBuf {
    dir.join(format!("{}.csv", segment.artifact_stem()))
}

/// Parse a timestamp cell into epoch milliseconds.
///
/// Accepts integer epoch milliseconds, RFC 3339, and the naive formats
/// station exports and loggers use (naive times are taken as UTC).
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ms) = raw.parse::<i64>() {
        return DateTime::from_timestamp_millis(ms).map(|_| ms);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.and_utc().timestamp_millis())
}

pub fn format_timestamp(time_ms: i64) -> String {
    match DateTime::from_timestamp_millis(time_ms) {
        Some(dt) if time_ms % 1000 == 0 => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
        None => time_ms.to_string(),
    }
}

/// Parse a numeric cell; empty or non-numeric cells are absent.
pub fn parse_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Read station rows positionally: first column is the timestamp, the next
/// `metric_count` columns are metric values. Returns the header too.
pub fn read_station_rows(
    path: &Path,
    metric_count: usize,
) -> Result<(Vec<String>, Vec<StationRow>), StationCsvError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| csv_error(path, source))?;

    let header: Vec<String> = reader
        .headers()
        .map_err(|source| csv_error(path, source))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|source| csv_error(path, source))?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        if record.len() != metric_count + 1 {
            return Err(StationCsvError::Malformed {
                path: path.to_path_buf(),
                record: index + 1,
                message: format!(
                    "expected {} columns, found {}",
                    metric_count + 1,
                    record.len()
                ),
            });
        }

        let time_ms = parse_timestamp(&record[0]).ok_or_else(|| StationCsvError::Malformed {
            path: path.to_path_buf(),
            record: index + 1,
            message: format!("unparseable timestamp '{}'", &record[0]),
        })?;
        let values = record.iter().skip(1).map(parse_value).collect();

        rows.push(StationRow::new(time_ms, values));
    }

    Ok((header, rows))
}

/// Write rows under a `timestamp,<columns...>` header, replacing `path`
/// through a sibling temporary file.
pub fn write_station_rows(
    path: &Path,
    columns: &[String],
    rows: &[StationRow],
) -> Result<(), StationCsvError> {
    let tmp_path = path.with_extension("csv.tmp");
    {
        let mut writer =
            csv::Writer::from_path(&tmp_path).map_err(|source| csv_error(&tmp_path, source))?;

        let header = std::iter::once(TIMESTAMP_COLUMN).chain(columns.iter().map(String::as_str));
        writer
            .write_record(header)
            .map_err(|source| csv_error(&tmp_path, source))?;

        for row in rows {
            let cells = std::iter::once(format_timestamp(row.time_ms)).chain(
                row.values
                    .iter()
                    .map(|v| v.map(|v| v.to_string()).unwrap_or_default()),
            );
            writer
                .write_record(cells)
                .map_err(|source| csv_error(&tmp_path, source))?;
        }

        writer.flush().map_err(|source| StationCsvError::Io {
            path: tmp_path.clone(),
            source,
        })?;
    }

    std::fs::rename(&tmp_path, path).map_err(|source| StationCsvError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn csv_error(path: &Path, source: csv::Error) -> StationCsvError {
    if !source.is_io_error() {
        return StationCsvError::Csv {
            path: path.to_path_buf(),
            source,
        };
    }

    match source.into_kind() {
        csv::ErrorKind::Io(source) => StationCsvError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => StationCsvError::Malformed {
            path: path.to_path_buf(),
            record: 0,
            message: format!("{other:?}"),
        },
    }
}
