//! Raw time series CSV -> chart series
//!
//! Upstream rows arrive newest-first as `timestamp,open,high,low,close,volume`.
//! The transformer keeps the newest `points` rows, flips them to oldest-first,
//! charts the high/low midpoint and pads the value range by 10% of the spread.

use crate::constants::{csv_column, RANGE_BUFFER_RATIO};
use crate::error::{Error, Result};
use crate::models::{ChartSeries, SeriesPoint, ValueRange};
use crate::utils::round_to;
use csv::{ReaderBuilder, StringRecord};
use tracing::warn;

/// How to treat a high/low field that is not a number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumericPolicy {
    /// Fail the job with a parse error naming the row and column
    #[default]
    Strict,
    /// Substitute 0.0 and log a warning
    Lenient,
}

/// Build the chart series for the newest `points` rows of `csv_data`
pub fn transform(csv_data: &[u8], points: usize, policy: NumericPolicy) -> Result<ChartSeries> {
    if points == 0 {
        return Err(Error::Parse("requested window must contain at least one point".to_string()));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(csv_data);

    // Newest-first, as delivered
    let mut newest_first = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result.map_err(|e| Error::Parse(format!("unable to parse the csv data: {}", e)))?;
        // +2: 1-based, and the header is line 1
        newest_first.push(parse_row(&record, i + 2, policy)?);
    }

    if newest_first.len() < points {
        return Err(Error::InsufficientData {
            requested: points,
            available: newest_first.len(),
        });
    }

    newest_first.truncate(points);
    newest_first.reverse();
    let window = newest_first;

    let range = display_range(&window);
    Ok(ChartSeries::new(window, range))
}

fn parse_row(record: &StringRecord, line: usize, policy: NumericPolicy) -> Result<SeriesPoint> {
    if record.len() < csv_column::REQUIRED {
        return Err(Error::Parse(format!(
            "line {}: expected at least {} columns, found {}",
            line,
            csv_column::REQUIRED,
            record.len()
        )));
    }

    let label = record.get(csv_column::TIMESTAMP).unwrap_or("").to_string();
    let high = parse_price(record, csv_column::HIGH, "high", line, policy)?;
    let low = parse_price(record, csv_column::LOW, "low", line, policy)?;

    Ok(SeriesPoint {
        label,
        value: round_to((high + low) / 2.0, 2),
    })
}

fn parse_price(
    record: &StringRecord,
    column: usize,
    column_name: &str,
    line: usize,
    policy: NumericPolicy,
) -> Result<f64> {
    let raw = record.get(column).unwrap_or("");
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => match policy {
            NumericPolicy::Strict => Err(Error::Parse(format!(
                "line {}: invalid {} value '{}'",
                line, column_name, raw
            ))),
            NumericPolicy::Lenient => {
                warn!(line, column = column_name, value = raw, "Invalid price, using 0.0");
                Ok(0.0)
            }
        },
    }
}

/// `[min - buffer, max + buffer]` with the bounds floored/ceiled to 0.1
fn display_range(points: &[SeriesPoint]) -> ValueRange {
    let (min, max) = points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p.value), hi.max(p.value))
    });
    let buffer = RANGE_BUFFER_RATIO * (max - min);

    ValueRange {
        min: snap(min - buffer).floor() / 10.0,
        max: snap(max + buffer).ceil() / 10.0,
    }
}

/// Scale to tenths and drop float noise below 1e-6 so that 21.0000000001
/// does not ceil up to 21.1
fn snap(value: f64) -> f64 {
    round_to(value * 10.0, 6)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "timestamp,open,high,low,close,volume";

    /// Newest-first CSV for days `1..=days`, with high = day + 1, low = day - 1
    fn daily_csv(days: u32) -> String {
        let mut csv = String::from(HEADER);
        for day in (1..=days).rev() {
            csv.push_str(&format!(
                "\n2024-01-{:02},{d}.0,{}.0,{}.0,{d}.0,1000",
                day,
                day + 1,
                day - 1,
                d = day
            ));
        }
        csv
    }

    #[test]
    fn test_window_keeps_most_recent_in_chronological_order() {
        let series = transform(daily_csv(10).as_bytes(), 3, NumericPolicy::Strict).unwrap();

        assert_eq!(series.labels().len(), 3);
        assert_eq!(series.labels(), vec!["2024-01-08", "2024-01-09", "2024-01-10"]);
        assert_eq!(series.values(), vec![8.0, 9.0, 10.0]);
    }

    #[test]
    fn test_exact_row_count_uses_everything() {
        let series = transform(daily_csv(5).as_bytes(), 5, NumericPolicy::Strict).unwrap();
        assert_eq!(
            series.labels(),
            vec!["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04", "2024-01-05"]
        );
        assert_eq!(series.labels().len(), series.values().len());
    }

    #[test]
    fn test_insufficient_rows() {
        let err = transform(daily_csv(4).as_bytes(), 5, NumericPolicy::Strict).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientData { requested: 5, available: 4 }
        ));

        let err = transform(HEADER.as_bytes(), 4, NumericPolicy::Strict).unwrap_err();
        assert!(matches!(err, Error::InsufficientData { available: 0, .. }));
    }

    #[test]
    fn test_transform_is_deterministic() {
        let csv = daily_csv(8);
        let first = transform(csv.as_bytes(), 6, NumericPolicy::Strict).unwrap();
        let second = transform(csv.as_bytes(), 6, NumericPolicy::Strict).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_midpoint_rounding() {
        let csv = format!("{}\n2024-01-01,10.0,10.004,10.001,10.002,5", HEADER);
        let series = transform(csv.as_bytes(), 1, NumericPolicy::Strict).unwrap();
        assert_eq!(series.values(), vec![10.0]);

        let csv = format!("{}\n2024-01-01,1,2.5,1.75,2,5", HEADER);
        let series = transform(csv.as_bytes(), 1, NumericPolicy::Strict).unwrap();
        assert_eq!(series.values(), vec![2.13]);
    }

    #[test]
    fn test_midpoint_ignores_close() {
        let csv = format!("{}\n2024-01-01,1.0,30.0,10.0,99.0,5", HEADER);
        let series = transform(csv.as_bytes(), 1, NumericPolicy::Strict).unwrap();
        assert_eq!(series.values(), vec![20.0]);
    }

    #[test]
    fn test_range_padding() {
        // Newest first: 20 then 10
        let csv = format!(
            "{}\n2024-01-02,0,21,19,0,0\n2024-01-01,0,11,9,0,0",
            HEADER
        );
        let series = transform(csv.as_bytes(), 2, NumericPolicy::Strict).unwrap();
        assert_eq!(series.values(), vec![10.0, 20.0]);
        assert_eq!(series.range(), ValueRange { min: 9.0, max: 21.0 });
    }

    #[test]
    fn test_range_rounds_outward() {
        // values 10.03 and 10.51 -> buffer 0.048 -> [9.982, 10.558] -> [9.9, 10.6]
        let csv = format!(
            "{}\n2024-01-02,0,10.52,10.50,0,0\n2024-01-01,0,10.04,10.02,0,0",
            HEADER
        );
        let series = transform(csv.as_bytes(), 2, NumericPolicy::Strict).unwrap();
        assert_eq!(series.values(), vec![10.03, 10.51]);
        assert_eq!(series.range(), ValueRange { min: 9.9, max: 10.6 });
    }

    #[test]
    fn test_flat_series_range() {
        let csv = format!("{}\n2024-01-02,0,5,5,0,0\n2024-01-01,0,5,5,0,0", HEADER);
        let series = transform(csv.as_bytes(), 2, NumericPolicy::Strict).unwrap();
        assert_eq!(series.range(), ValueRange { min: 5.0, max: 5.0 });
    }

    #[test]
    fn test_strict_rejects_bad_numbers() {
        let csv = format!("{}\n2024-01-02,0,abc,1,0,0\n2024-01-01,0,2,1,0,0", HEADER);
        let err = transform(csv.as_bytes(), 2, NumericPolicy::Strict).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, Error::Parse(_)));
        assert!(msg.contains("line 2"), "{}", msg);
        assert!(msg.contains("high"), "{}", msg);
    }

    #[test]
    fn test_lenient_defaults_bad_numbers_to_zero() {
        let csv = format!("{}\n2024-01-02,0,abc,4,0,0\n2024-01-01,0,2,1,0,0", HEADER);
        let series = transform(csv.as_bytes(), 2, NumericPolicy::Lenient).unwrap();
        assert_eq!(series.values(), vec![1.5, 2.0]);
    }

    #[test]
    fn test_structural_errors() {
        // Ragged row
        let csv = format!("{}\n2024-01-02,0,2,1,0,0\n2024-01-01,0,2", HEADER);
        assert!(matches!(
            transform(csv.as_bytes(), 2, NumericPolicy::Strict),
            Err(Error::Parse(_))
        ));

        // Consistently too few columns
        let csv = "timestamp,open,high\n2024-01-01,1,2\n";
        assert!(matches!(
            transform(csv.as_bytes(), 1, NumericPolicy::Lenient),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_zero_points_rejected() {
        assert!(matches!(
            transform(daily_csv(3).as_bytes(), 0, NumericPolicy::Strict),
            Err(Error::Parse(_))
        ));
    }
}
