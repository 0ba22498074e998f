// Layout store - per-breakpoint placement rectangles keyed by widget id
use crate::domain::dashboard::LayoutMap;
use crate::domain::layout::{Breakpoint, LayoutEntry, DEFAULT_ENTRY_HEIGHT, DEFAULT_ENTRY_WIDTH};
use crate::domain::widget::WidgetId;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutStore {
    layouts: LayoutMap,
}

impl Default for LayoutStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutStore {
    /// Every known breakpoint starts with an empty list.
    pub fn new() -> Self {
        Self {
            layouts: Breakpoint::ALL.into_iter().map(|bp| (bp, Vec::new())).collect(),
        }
    }

    pub fn from_layouts(layouts: LayoutMap) -> Self {
        let mut store = Self::new();
        store.layouts.extend(layouts);
        store
    }

    /// Appends a default-sized entry below the last row of every breakpoint.
    pub fn add_entry_for_all_breakpoints(&mut self, id: &WidgetId) {
        for bp in Breakpoint::ALL {
            self.add_entry(bp, id);
        }
    }

    fn add_entry(&mut self, bp: Breakpoint, id: &WidgetId) {
        let entries = self.layouts.entry(bp).or_default();
        let y = entries.iter().map(LayoutEntry::bottom).max().unwrap_or(0);
        entries.push(LayoutEntry::new(
            id.clone(),
            0,
            y,
            DEFAULT_ENTRY_WIDTH,
            DEFAULT_ENTRY_HEIGHT,
        ));
    }

    /// Removes the id's entry from every breakpoint; returns how many were dropped
    pub fn remove_entry(&mut self, id: &WidgetId) -> usize {
        let mut removed = 0;
        for entries in self.layouts.values_mut() {
            let before = entries.len();
            entries.retain(|entry| &entry.widget_id != id);
            removed += before - entries.len();
        }
        removed
    }

    /// Wholesale replacement of the given breakpoints' lists
    pub fn replace_all(&mut self, layouts: LayoutMap) {
        self.layouts.extend(layouts);
    }

    pub fn entries(&self, bp: Breakpoint) -> &[LayoutEntry] {
        self.layouts.get(&bp).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn all(&self) -> &LayoutMap {
        &self.layouts
    }

    /// Ids referenced on one breakpoint
    pub fn ids(&self, bp: Breakpoint) -> BTreeSet<&WidgetId> {
        self.entries(bp).iter().map(|entry| &entry.widget_id).collect()
    }

    /// Brings the layouts in line with the given widget ids: unknown entries
    /// and duplicates are dropped, missing widgets get a default entry.
    pub fn reconcile<'a>(&mut self, widget_ids: impl IntoIterator<Item = &'a WidgetId> + Clone) -> bool {
        let known: BTreeSet<&WidgetId> = widget_ids.clone().into_iter().collect();
        let mut changed = false;

        for bp in Breakpoint::ALL {
            let entries = self.layouts.entry(bp).or_default();
            let mut seen = BTreeSet::new();
            let before = entries.len();
            entries.retain(|entry| known.contains(&entry.widget_id) && seen.insert(entry.widget_id.clone()));
            changed |= before != entries.len();

            let missing: Vec<WidgetId> = widget_ids
                .clone()
                .into_iter()
                .filter(|id| !seen.contains(*id))
                .cloned()
                .collect();
            for id in missing {
                self.add_entry(bp, &id);
                changed = true;
            }
        }

        changed
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }
}
