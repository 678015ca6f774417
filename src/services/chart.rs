//! Chart rendering
//!
//! Rendering sits behind [`ChartRenderer`] so the pipeline only deals in
//! titles, labels, values and a range. [`EChartsRenderer`] fills an embedded
//! HTML template with an ECharts option object.

use crate::error::{Error, Result};
use crate::models::{RenderJob, ValueRange};
use crate::utils::escape_html;
use serde_json::json;

const CHART_TEMPLATE: &str = include_str!("../../templates/chart.html");

/// Input for a single line chart page
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub series_name: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub range: ValueRange,
}

impl ChartSpec {
    pub fn from_job(job: &RenderJob) -> Self {
        Self {
            title: job.title(),
            series_name: job.name.clone(),
            labels: job.series.labels().into_iter().map(str::to_string).collect(),
            values: job.series.values(),
            range: job.series.range(),
        }
    }
}

/// Turns a [`ChartSpec`] into a complete HTML document
pub trait ChartRenderer: Send + Sync {
    fn render(&self, spec: &ChartSpec) -> Result<String>;
}

/// Interactive line chart with axis tooltips and a filled area
#[derive(Debug, Clone, Default)]
pub struct EChartsRenderer;

impl EChartsRenderer {
    pub fn new() -> Self {
        Self
    }

    fn option(spec: &ChartSpec) -> serde_json::Value {
        json!({
            "title": { "text": spec.title, "left": "center" },
            "tooltip": { "trigger": "axis" },
            "legend": { "data": [spec.series_name], "top": 30 },
            "xAxis": {
                "type": "category",
                "boundaryGap": false,
                "data": spec.labels,
            },
            "yAxis": {
                "type": "value",
                "min": spec.range.min,
                "max": spec.range.max,
            },
            "series": [{
                "name": spec.series_name,
                "type": "line",
                "showSymbol": false,
                "areaStyle": {},
                "data": spec.values,
            }],
        })
    }
}

impl ChartRenderer for EChartsRenderer {
    fn render(&self, spec: &ChartSpec) -> Result<String> {
        if spec.labels.len() != spec.values.len() {
            return Err(Error::Render(format!(
                "{} labels but {} values",
                spec.labels.len(),
                spec.values.len()
            )));
        }
        if spec.range.min > spec.range.max {
            return Err(Error::Render(format!(
                "invalid value range [{}, {}]",
                spec.range.min, spec.range.max
            )));
        }

        let option = serde_json::to_string(&Self::option(spec))
            .map_err(|e| Error::Render(format!("failed to serialize chart options: {}", e)))?;
        // Keep a label containing "</script>" from closing the script block
        let option = option.replace("</", "<\\/");

        Ok(CHART_TEMPLATE
            .replace("{{TITLE}}", &escape_html(&spec.title))
            .replace("{{OPTION_JSON}}", &option))
    }
}
