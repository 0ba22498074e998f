// Chart type conversion map - re-derives a description for an interchangeable family
use super::chart_builder::{category_chart, parse_labels, parse_values, pie_chart};
use crate::domain::chart::{Axis, ChartDescription, SeriesData, SeriesKind};
use crate::domain::error::{DashboardError, DashboardResult};
use crate::domain::widget::ChartType;
use serde::{Deserialize, Serialize};

const CONVERTED_PIE_SERIES: &str = "Converted";

/// Types a widget of `source` may be converted into, in menu order
pub fn convertible_targets(source: ChartType) -> &'static [ChartType] {
    match source {
        ChartType::PieChart => &[ChartType::LineChart, ChartType::BarChart],
        ChartType::LineChart => &[ChartType::BarChart, ChartType::PieChart],
        ChartType::BarChart => &[ChartType::LineChart, ChartType::PieChart],
        ChartType::AreaChart
        | ChartType::KpiCard
        | ChartType::MetricCard
        | ChartType::TemperatureGauge
        | ChartType::SpeedGauge => &[],
    }
}

/// Underlying labels and values of a description. Name/value series yield
/// their names; category charts yield the axis labels. Anything else is empty.
pub fn extract_points(description: Option<&ChartDescription>) -> (Vec<String>, Vec<f64>) {
    let Some(description) = description else {
        return (Vec::new(), Vec::new());
    };
    let Some(series) = description.first_series() else {
        return (Vec::new(), Vec::new());
    };

    match (&series.data, &description.axis) {
        (SeriesData::Named(points), _) if !points.is_empty() => (
            points.iter().map(|p| p.name.clone()).collect(),
            points.iter().map(|p| p.value).collect(),
        ),
        (SeriesData::Values(values), Axis::Category { labels }) if !labels.is_empty() => {
            (labels.clone(), values.clone())
        }
        _ => (Vec::new(), Vec::new()),
    }
}

pub fn rebuild(
    target: ChartType,
    labels: Vec<String>,
    values: Vec<f64>,
    title: &str,
) -> DashboardResult<ChartDescription> {
    match target {
        ChartType::PieChart => Ok(pie_chart(title, CONVERTED_PIE_SERIES, labels, values)),
        ChartType::LineChart => Ok(category_chart(SeriesKind::Line, title, title, labels, values)),
        ChartType::BarChart => Ok(category_chart(SeriesKind::Bar, title, title, labels, values)),
        other => Err(DashboardError::validation(format!(
            "{} is not a conversion target",
            other
        ))),
    }
}

/// Submitted conversion form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionFields {
    pub target: ChartType,
    pub title: String,
    pub labels: String,
    pub values: String,
}

impl ConversionFields {
    pub fn rebuild_for(&self, source: ChartType) -> DashboardResult<ChartDescription> {
        if !convertible_targets(source).contains(&self.target) {
            return Err(DashboardError::validation(format!(
                "{} cannot be converted to {}",
                source, self.target
            )));
        }
        if self.title.trim().is_empty() {
            return Err(DashboardError::validation("title is required"));
        }
        let labels = parse_labels(&self.labels)?;
        let values = parse_values(&self.values)?;
        rebuild(self.target, labels, values, self.title.trim())
    }
}
