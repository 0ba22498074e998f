// Widget store - owns the widget records keyed by id
use super::id_generator::IdGenerator;
use crate::domain::chart::ChartDescription;
use crate::domain::dashboard::WidgetMap;
use crate::domain::error::{DashboardError, DashboardResult};
use crate::domain::widget::{ChartType, Widget, WidgetId, WidgetPatch};

#[derive(Debug, Default)]
pub struct WidgetStore {
    widgets: WidgetMap,
    ids: IdGenerator,
}

impl WidgetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded from a snapshot; restored ids are never reissued
    pub fn from_widgets(widgets: WidgetMap) -> Self {
        let mut ids = IdGenerator::new();
        for id in widgets.keys() {
            ids.reserve(id);
        }
        Self { widgets, ids }
    }

    pub fn add(
        &mut self,
        widget_type: ChartType,
        title: String,
        chart_description: Option<ChartDescription>,
    ) -> WidgetId {
        let id = self.ids.new_id();
        let widget = Widget::new(id.clone(), widget_type, title, chart_description);
        self.widgets.insert(id.clone(), widget);
        id
    }

    pub fn update(&mut self, id: &WidgetId, patch: WidgetPatch) -> DashboardResult<&Widget> {
        let widget = self
            .widgets
            .get_mut(id)
            .ok_or_else(|| DashboardError::NotFound(id.clone()))?;
        patch.apply(widget);
        Ok(widget)
    }

    pub fn remove(&mut self, id: &WidgetId) -> DashboardResult<Widget> {
        self.widgets
            .remove(id)
            .ok_or_else(|| DashboardError::NotFound(id.clone()))
    }

    pub fn get(&self, id: &WidgetId) -> Option<&Widget> {
        self.widgets.get(id)
    }

    pub fn contains(&self, id: &WidgetId) -> bool {
        self.widgets.contains_key(id)
    }

    pub fn all(&self) -> &WidgetMap {
        &self.widgets
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// Drops every widget. Issued ids stay reserved.
    pub fn clear(&mut self) {
        self.widgets.clear();
    }
}
