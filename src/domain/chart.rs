// Chart description domain model - renderer-agnostic chart declaration
use super::error::{DashboardError, DashboardResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDescription {
    pub title: String,
    pub axis: Axis,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Axis {
    /// Ordered category labels, one per value in every series
    Category { labels: Vec<String> },
    /// Dial bounds for gauge families
    Gauge { min: f64, max: f64 },
    /// Name/value series (pie) carry their own labels
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SeriesKind {
    Line,
    Bar,
    Pie,
    Gauge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SeriesData {
    Values(Vec<f64>),
    Named(Vec<NamedValue>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    pub name: String,
    pub value: f64,
}

impl NamedValue {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub name: String,
    pub kind: SeriesKind,
    /// Display suffix for the series values, e.g. "°C"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub data: SeriesData,
}

impl Series {
    pub fn new(name: impl Into<String>, kind: SeriesKind, data: SeriesData) -> Self {
        Self {
            name: name.into(),
            kind,
            unit: None,
            data,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

impl ChartDescription {
    pub fn new(title: impl Into<String>, axis: Axis, series: Vec<Series>) -> Self {
        Self {
            title: title.into(),
            axis,
            series,
        }
    }

    pub fn first_series(&self) -> Option<&Series> {
        self.series.first()
    }

    /// Checks the description is complete and internally consistent before it is
    /// handed to a renderer.
    pub fn validate(&self) -> DashboardResult<()> {
        if self.series.is_empty() {
            return Err(DashboardError::validation("chart has no data series"));
        }

        match &self.axis {
            Axis::Category { labels } => {
                for series in &self.series {
                    let SeriesData::Values(values) = &series.data else {
                        return Err(DashboardError::validation(format!(
                            "series '{}' must hold plain values on a category axis",
                            series.name
                        )));
                    };
                    if values.len() != labels.len() {
                        return Err(DashboardError::validation(format!(
                            "series '{}' has {} values for {} categories",
                            series.name,
                            values.len(),
                            labels.len()
                        )));
                    }
                    ensure_finite(values.iter().copied())?;
                }
            }
            Axis::Gauge { min, max } => {
                ensure_finite([*min, *max])?;
                if min >= max {
                    return Err(DashboardError::validation(
                        "gauge minimum must be less than maximum",
                    ));
                }
                for series in &self.series {
                    match &series.data {
                        SeriesData::Named(points) if points.len() == 1 => {
                            ensure_finite([points[0].value])?;
                        }
                        _ => {
                            return Err(DashboardError::validation(
                                "gauge series must hold exactly one reading",
                            ));
                        }
                    }
                }
            }
            Axis::None => {
                for series in &self.series {
                    let SeriesData::Named(points) = &series.data else {
                        return Err(DashboardError::validation(format!(
                            "series '{}' needs name/value pairs without a category axis",
                            series.name
                        )));
                    };
                    ensure_finite(points.iter().map(|p| p.value))?;
                }
            }
        }

        Ok(())
    }
}

fn ensure_finite(values: impl IntoIterator<Item = f64>) -> DashboardResult<()> {
    if values.into_iter().all(f64::is_finite) {
        Ok(())
    } else {
        Err(DashboardError::validation("chart values must be finite numbers"))
    }
}
