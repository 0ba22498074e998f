// Chart description builder - maps collected form fields to chart descriptions
use crate::domain::chart::{Axis, ChartDescription, NamedValue, Series, SeriesData, SeriesKind};
use crate::domain::error::{DashboardError, DashboardResult};
use crate::domain::widget::ChartType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEVICE_TITLE_PATH: &str = "datasets.0.label";
const DEVICE_DEFAULT_TITLE: &str = "Device Chart";

/// Raw fields of a labels/values form, entered as comma-separated text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesFields {
    pub title: String,
    pub labels: String,
    pub values: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugeFields {
    pub title: String,
    pub current: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn name(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "Celsius",
            TemperatureUnit::Fahrenheit => "Fahrenheit",
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    fn from_name(name: &str) -> Self {
        if name == TemperatureUnit::Fahrenheit.name() {
            TemperatureUnit::Fahrenheit
        } else {
            TemperatureUnit::Celsius
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureGaugeFields {
    pub title: String,
    pub current: f64,
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub unit: TemperatureUnit,
}

/// Submitted form, one variant per chart family that has a form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "camelCase")]
pub enum ChartFields {
    Line(SeriesFields),
    Bar(SeriesFields),
    Pie(SeriesFields),
    TemperatureGauge(TemperatureGaugeFields),
    SpeedGauge(GaugeFields),
}

impl ChartFields {
    pub fn chart_type(&self) -> ChartType {
        match self {
            ChartFields::Line(_) => ChartType::LineChart,
            ChartFields::Bar(_) => ChartType::BarChart,
            ChartFields::Pie(_) => ChartType::PieChart,
            ChartFields::TemperatureGauge(_) => ChartType::TemperatureGauge,
            ChartFields::SpeedGauge(_) => ChartType::SpeedGauge,
        }
    }

    pub fn build(&self) -> DashboardResult<ChartDescription> {
        match self {
            ChartFields::Line(fields) => build_category(SeriesKind::Line, fields, "Line Chart"),
            ChartFields::Bar(fields) => build_category(SeriesKind::Bar, fields, "Bar Chart"),
            ChartFields::Pie(fields) => {
                let labels = parse_labels(&fields.labels)?;
                let values = parse_values(&fields.values)?;
                let title = non_empty_or(&fields.title, "Pie Chart");
                Ok(pie_chart(title, "Categories", labels, values))
            }
            ChartFields::TemperatureGauge(fields) => {
                check_gauge_bounds(fields.min, fields.max, fields.current)?;
                Ok(gauge_chart(
                    non_empty_or(&fields.title, "Temperature Gauge"),
                    fields.min,
                    fields.max,
                    Series::new(
                        "Temperature",
                        SeriesKind::Gauge,
                        SeriesData::Named(vec![NamedValue::new(fields.unit.name(), fields.current)]),
                    )
                    .with_unit(fields.unit.suffix()),
                ))
            }
            ChartFields::SpeedGauge(fields) => {
                check_gauge_bounds(fields.min, fields.max, fields.current)?;
                Ok(gauge_chart(
                    non_empty_or(&fields.title, "Speed Gauge"),
                    fields.min,
                    fields.max,
                    Series::new(
                        "Speed",
                        SeriesKind::Gauge,
                        SeriesData::Named(vec![NamedValue::new("Speed", fields.current)]),
                    )
                    .with_unit("km/h"),
                ))
            }
        }
    }
}

fn build_category(
    kind: SeriesKind,
    fields: &SeriesFields,
    default_title: &str,
) -> DashboardResult<ChartDescription> {
    let labels = parse_labels(&fields.labels)?;
    let values = parse_values(&fields.values)?;
    let title = non_empty_or(&fields.title, default_title);
    Ok(category_chart(kind, title, title, labels, values))
}

fn check_gauge_bounds(min: f64, max: f64, current: f64) -> DashboardResult<()> {
    if ![min, max, current].iter().all(|v| v.is_finite()) {
        return Err(DashboardError::validation("gauge readings must be finite numbers"));
    }
    if min >= max {
        return Err(DashboardError::validation(
            "minimum must be less than maximum",
        ));
    }
    Ok(())
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() { fallback } else { trimmed }
}

/// Category axis chart; values are zero-padded or cut to the label count.
pub fn category_chart(
    kind: SeriesKind,
    title: &str,
    series_name: &str,
    labels: Vec<String>,
    mut values: Vec<f64>,
) -> ChartDescription {
    values.resize(labels.len(), 0.0);
    ChartDescription::new(
        title,
        Axis::Category { labels },
        vec![Series::new(series_name, kind, SeriesData::Values(values))],
    )
}

/// Name/value chart; labels without a value get 0.
pub fn pie_chart(
    title: &str,
    series_name: &str,
    labels: Vec<String>,
    values: Vec<f64>,
) -> ChartDescription {
    let points = labels
        .into_iter()
        .enumerate()
        .map(|(i, name)| NamedValue::new(name, values.get(i).copied().unwrap_or(0.0)))
        .collect();
    ChartDescription::new(
        title,
        Axis::None,
        vec![Series::new(series_name, SeriesKind::Pie, SeriesData::Named(points))],
    )
}

fn gauge_chart(title: &str, min: f64, max: f64, series: Series) -> ChartDescription {
    ChartDescription::new(title, Axis::Gauge { min, max }, vec![series])
}

pub fn parse_labels(text: &str) -> DashboardResult<Vec<String>> {
    if text.trim().is_empty() {
        return Err(DashboardError::validation("labels are required"));
    }
    Ok(text.split(',').map(|label| label.trim().to_string()).collect())
}

pub fn parse_values(text: &str) -> DashboardResult<Vec<f64>> {
    if text.trim().is_empty() {
        return Err(DashboardError::validation("values are required"));
    }
    text.split(',')
        .map(|token| {
            let token = token.trim();
            token
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| DashboardError::validation(format!("'{}' is not a number", token)))
        })
        .collect()
}

/// Resolves a dotted path in a JSON tree. Segments index objects by key and
/// arrays by integer position; any miss yields `None`.
pub fn extract<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |current, segment| match current {
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        Value::Object(map) => map.get(segment),
        _ => None,
    })
}

/// Labels, values and suggested title pulled out of a fetched document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicePrefill {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

pub fn extract_device_series(
    document: &Value,
    labels_path: &str,
    values_path: &str,
) -> DashboardResult<DevicePrefill> {
    let (Some(Value::Array(labels)), Some(Value::Array(values))) =
        (extract(document, labels_path), extract(document, values_path))
    else {
        return Err(DashboardError::ExtractionFailure(
            "chosen keys must point to array values".to_string(),
        ));
    };

    let labels = labels.iter().map(label_text).collect();
    let values = values
        .iter()
        .map(|value| {
            numeric_value(value).ok_or_else(|| {
                DashboardError::ExtractionFailure(format!("{} is not a number", value))
            })
        })
        .collect::<DashboardResult<Vec<f64>>>()?;

    let title = extract(document, DEVICE_TITLE_PATH)
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEVICE_DEFAULT_TITLE)
        .to_string();

    Ok(DevicePrefill {
        title,
        labels,
        values,
    })
}

fn label_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// Field values shown when a form opens for an existing widget
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FormPrefill {
    Series {
        title: String,
        labels: Vec<String>,
        values: Vec<f64>,
    },
    #[serde(rename_all = "camelCase")]
    Gauge {
        title: String,
        current: f64,
        min: f64,
        max: f64,
        unit: Option<TemperatureUnit>,
    },
}

impl FormPrefill {
    pub fn from_description(
        chart_type: ChartType,
        title: &str,
        description: Option<&ChartDescription>,
    ) -> Option<Self> {
        let description = description?;
        match chart_type {
            ChartType::TemperatureGauge | ChartType::SpeedGauge => {
                let Axis::Gauge { min, max } = description.axis else {
                    return None;
                };
                let point = match &description.first_series()?.data {
                    SeriesData::Named(points) => points.first()?,
                    SeriesData::Values(_) => return None,
                };
                let unit = (chart_type == ChartType::TemperatureGauge)
                    .then(|| TemperatureUnit::from_name(&point.name));
                Some(FormPrefill::Gauge {
                    title: title.to_string(),
                    current: point.value,
                    min,
                    max,
                    unit,
                })
            }
            _ => {
                let (labels, values) = super::conversion::extract_points(Some(description));
                Some(FormPrefill::Series {
                    title: title.to_string(),
                    labels,
                    values,
                })
            }
        }
    }
}
