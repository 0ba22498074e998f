// Widget domain model
use super::chart::ChartDescription;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque widget identity, unique for the lifetime of a dashboard
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetId(String);

impl WidgetId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Closed set of widget families offered by the component library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartType {
    LineChart,
    BarChart,
    PieChart,
    AreaChart,
    KpiCard,
    MetricCard,
    TemperatureGauge,
    SpeedGauge,
}

impl ChartType {
    pub const ALL: [ChartType; 8] = [
        ChartType::LineChart,
        ChartType::BarChart,
        ChartType::PieChart,
        ChartType::AreaChart,
        ChartType::KpiCard,
        ChartType::MetricCard,
        ChartType::TemperatureGauge,
        ChartType::SpeedGauge,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            ChartType::LineChart => "Line Chart",
            ChartType::BarChart => "Bar Chart",
            ChartType::PieChart => "Pie Chart",
            ChartType::AreaChart => "Area Chart",
            ChartType::KpiCard => "KPI Card",
            ChartType::MetricCard => "Metric Card",
            ChartType::TemperatureGauge => "Temperature Gauge",
            ChartType::SpeedGauge => "Speed Gauge",
        }
    }

    /// Whether adding this type goes through a configuration form
    pub fn needs_form(self) -> bool {
        match self {
            ChartType::LineChart
            | ChartType::BarChart
            | ChartType::PieChart
            | ChartType::TemperatureGauge
            | ChartType::SpeedGauge => true,
            ChartType::AreaChart | ChartType::KpiCard | ChartType::MetricCard => false,
        }
    }

    /// Whether the type's form can be pre-filled from a remote JSON document
    pub fn supports_device_mode(self) -> bool {
        matches!(
            self,
            ChartType::LineChart | ChartType::BarChart | ChartType::PieChart
        )
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    pub id: WidgetId,
    #[serde(rename = "type")]
    pub widget_type: ChartType,
    pub title: String,
    pub chart_description: Option<ChartDescription>,
}

impl Widget {
    pub fn new(
        id: WidgetId,
        widget_type: ChartType,
        title: String,
        chart_description: Option<ChartDescription>,
    ) -> Self {
        Self {
            id,
            widget_type,
            title,
            chart_description,
        }
    }
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetPatch {
    pub chart_description: Option<ChartDescription>,
    pub title: Option<String>,
    pub widget_type: Option<ChartType>,
}

impl WidgetPatch {
    pub fn apply(self, widget: &mut Widget) {
        if let Some(description) = self.chart_description {
            widget.chart_description = Some(description);
        }
        if let Some(title) = self.title {
            widget.title = title;
        }
        if let Some(widget_type) = self.widget_type {
            widget.widget_type = widget_type;
        }
    }
}
