// Dashboard snapshot domain model - persisted shape of widgets and layouts
use super::layout::{Breakpoint, LayoutEntry};
use super::widget::{Widget, WidgetId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type WidgetMap = BTreeMap<WidgetId, Widget>;
pub type LayoutMap = BTreeMap<Breakpoint, Vec<LayoutEntry>>;

/// Serialized blobs of a snapshot, keyed independently
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSnapshot {
    pub widgets: String,
    pub layouts: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub widgets: WidgetMap,
    pub layouts: LayoutMap,
}

impl DashboardSnapshot {
    pub fn new(widgets: WidgetMap, layouts: LayoutMap) -> Self {
        Self { widgets, layouts }
    }

    /// Ordered maps keep the output byte-stable for identical state.
    pub fn encode(&self) -> serde_json::Result<EncodedSnapshot> {
        Ok(EncodedSnapshot {
            widgets: serde_json::to_string_pretty(&self.widgets)?,
            layouts: serde_json::to_string_pretty(&self.layouts)?,
        })
    }

    /// Absent or unreadable blobs decode to empty collections.
    pub fn decode(widgets: Option<&str>, layouts: Option<&str>) -> Self {
        Self {
            widgets: decode_blob(widgets, "widgets"),
            layouts: decode_blob(layouts, "layouts"),
        }
    }
}

fn decode_blob<T: for<'de> Deserialize<'de> + Default>(blob: Option<&str>, key: &str) -> T {
    let Some(blob) = blob else {
        return T::default();
    };

    match serde_json::from_str(blob) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Discarding corrupt {} snapshot: {}", key, e);
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::widget::ChartType;

    #[test]
    fn test_decode_absent_and_corrupt() {
        let snapshot = DashboardSnapshot::decode(None, Some("{not json"));
        assert!(snapshot.widgets.is_empty());
        assert!(snapshot.layouts.is_empty());
    }

    #[test]
    fn test_encode_decode_lossless() {
        let id = WidgetId::new("comp-1-abc");
        let mut widgets = WidgetMap::new();
        widgets.insert(
            id.clone(),
            Widget::new(id.clone(), ChartType::KpiCard, "KPI Card".to_string(), None),
        );
        let mut layouts = LayoutMap::new();
        layouts.insert(Breakpoint::Lg, vec![LayoutEntry::new(id, 0, 0, 4, 6)]);

        let snapshot = DashboardSnapshot::new(widgets, layouts);
        let encoded = snapshot.encode().unwrap();
        let decoded = DashboardSnapshot::decode(Some(&encoded.widgets), Some(&encoded.layouts));

        assert_eq!(decoded, snapshot);
        assert_eq!(decoded.encode().unwrap(), encoded);
        assert!(encoded.layouts.contains("\"lg\""));
    }
}
