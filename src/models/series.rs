use crate::models::Period;

/// One charted observation
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    /// Timestamp label as delivered upstream (e.g. "2024-01-31")
    pub label: String,
    /// Midpoint of high and low, rounded to 2 decimals
    pub value: f64,
}

/// Value axis bounds for display
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

/// Oldest-first window of points plus the padded display range
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    points: Vec<SeriesPoint>,
    range: ValueRange,
}

impl ChartSeries {
    pub(crate) fn new(points: Vec<SeriesPoint>, range: ValueRange) -> Self {
        Self { points, range }
    }

    pub fn labels(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.label.as_str()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn range(&self) -> ValueRange {
        self.range
    }
}

/// Everything the chart renderer needs for one page
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub name: String,
    pub ticker: String,
    pub period: Period,
    pub points: usize,
    pub series: ChartSeries,
}

impl RenderJob {
    /// "Acme (ACME) - Daily (5)"
    pub fn title(&self) -> String {
        format!(
            "{} ({}) - {} ({})",
            self.name,
            self.ticker,
            self.period.label(),
            self.points
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series() -> ChartSeries {
        ChartSeries::new(
            vec![
                SeriesPoint { label: "2024-01-01".to_string(), value: 10.0 },
                SeriesPoint { label: "2024-01-02".to_string(), value: 12.5 },
            ],
            ValueRange { min: 9.7, max: 12.8 },
        )
    }

    #[test]
    fn test_labels_and_values_line_up() {
        let series = series();
        assert_eq!(series.labels(), vec!["2024-01-01", "2024-01-02"]);
        assert_eq!(series.values(), vec![10.0, 12.5]);
        assert_eq!(series.range().max, 12.8);
    }

    #[test]
    fn test_render_job_title() {
        let job = RenderJob {
            name: "Acme".to_string(),
            ticker: "ACME".to_string(),
            period: Period::Weekly,
            points: 2,
            series: series(),
        };
        assert_eq!(job.title(), "Acme (ACME) - Weekly (2)");
    }
}
