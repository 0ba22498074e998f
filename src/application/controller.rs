// Dashboard controller - user actions over the widget and layout stores
use super::chart_builder::{extract_device_series, ChartFields, DevicePrefill, FormPrefill};
use super::conversion::{convertible_targets, extract_points, ConversionFields};
use super::layout_store::LayoutStore;
use super::snapshot_repository::{SnapshotKey, SnapshotRepository};
use super::widget_store::WidgetStore;
use crate::domain::chart::ChartDescription;
use crate::domain::dashboard::{DashboardSnapshot, LayoutMap, WidgetMap};
use crate::domain::error::{DashboardError, DashboardResult};
use crate::domain::layout::{breakpoint_specs, BreakpointSpec, ROW_HEIGHT_PX};
use crate::domain::widget::{ChartType, WidgetId, WidgetPatch};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

const CONVERSION_NOTICE: &str = "Conversion is only allowed for Line, Bar, and Pie charts.";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum UiState {
    Idle,
    AddModalOpen,
    FormOpen(FormSession),
    #[serde(rename_all = "camelCase")]
    ConfirmRemove { widget_id: WidgetId },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FormMode {
    Create,
    #[serde(rename_all = "camelCase")]
    Edit { widget_id: WidgetId },
    #[serde(rename_all = "camelCase")]
    Convert { widget_id: WidgetId },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSession {
    /// Distinguishes this form from earlier ones, so late fetch results are dropped
    pub serial: u64,
    pub mode: FormMode,
    pub chart_type: ChartType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefill: Option<FormPrefill>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<ChartType>,
    pub device: DeviceState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum FetchStatus {
    Pending { url: String },
    Success { url: String },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum KeyStatus {
    Success(DevicePrefill),
    Error { message: String },
}

/// Device-mode progress of an open form
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceState {
    pub fetch: Option<FetchStatus>,
    pub keys: Option<KeyStatus>,
    /// Id of the fetch still in flight; only its result is accepted
    #[serde(skip)]
    pending: Option<u64>,
    #[serde(skip)]
    document: Option<Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modes {
    pub configure: bool,
    pub convert: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClickInterpretation {
    Configure,
    Convert,
}

impl Modes {
    /// Configure wins when both toggles are on.
    fn interpretation(self) -> Option<ClickInterpretation> {
        if self.configure {
            Some(ClickInterpretation::Configure)
        } else if self.convert {
            Some(ClickInterpretation::Convert)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ClickOutcome {
    Ignored,
    FormOpened { mode: FormMode },
    Notice { message: String },
}

#[derive(Debug, Clone)]
pub struct FetchTicket {
    pub serial: u64,
    pub fetch_id: u64,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub widgets: WidgetMap,
    pub layouts: LayoutMap,
    pub breakpoints: Vec<BreakpointSpec>,
    pub row_height: u32,
    pub ui: UiState,
    pub modes: Modes,
    pub locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

pub struct DashboardController {
    widgets: WidgetStore,
    layouts: LayoutStore,
    repository: Box<dyn SnapshotRepository>,
    state: UiState,
    modes: Modes,
    locked: bool,
    notice: Option<String>,
    next_serial: u64,
    next_fetch: u64,
}

impl DashboardController {
    /// Restores the last snapshot. Missing or corrupt blobs start empty.
    pub fn load(repository: Box<dyn SnapshotRepository>) -> Self {
        let [widgets_blob, layouts_blob] = SnapshotKey::ALL.map(|key| {
            repository.load(key).unwrap_or_else(|e| {
                tracing::warn!("Failed to read {} snapshot: {:#}", key, e);
                None
            })
        });
        let snapshot = DashboardSnapshot::decode(widgets_blob.as_deref(), layouts_blob.as_deref());

        let widgets = WidgetStore::from_widgets(snapshot.widgets);
        let mut layouts = LayoutStore::from_layouts(snapshot.layouts);
        let repaired = layouts.reconcile(widgets.all().keys());

        let controller = Self {
            widgets,
            layouts,
            repository,
            state: UiState::Idle,
            modes: Modes::default(),
            locked: true,
            notice: None,
            next_serial: 0,
            next_fetch: 0,
        };

        tracing::info!("Loaded dashboard with {} widgets", controller.widgets.len());
        if repaired {
            tracing::warn!("Layout snapshot was out of sync with widgets, repaired");
            controller.persist();
        }
        controller
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn widgets(&self) -> &WidgetStore {
        &self.widgets
    }

    pub fn layouts(&self) -> &LayoutStore {
        &self.layouts
    }

    pub fn view(&self) -> DashboardView {
        DashboardView {
            widgets: self.widgets.all().clone(),
            layouts: self.layouts.all().clone(),
            breakpoints: breakpoint_specs(),
            row_height: ROW_HEIGHT_PX,
            ui: self.state.clone(),
            modes: self.modes,
            locked: self.locked,
            notice: self.notice.clone(),
        }
    }

    /// Every breakpoint references exactly the ids held by the widget store
    pub fn is_consistent(&self) -> bool {
        let ids: BTreeSet<&WidgetId> = self.widgets.all().keys().collect();
        self.layouts.all().iter().all(|(bp, entries)| {
            entries.len() == ids.len() && self.layouts.ids(*bp) == ids
        })
    }

    pub fn set_modes(&mut self, modes: Modes) {
        self.notice = None;
        tracing::debug!("Click modes: configure={} convert={}", modes.configure, modes.convert);
        self.modes = modes;
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.notice = None;
        self.locked = locked;
    }

    pub fn open_add_menu(&mut self) -> DashboardResult<()> {
        self.notice = None;
        self.require_idle("open the add menu")?;
        self.transition(UiState::AddModalOpen);
        Ok(())
    }

    pub fn close_add_menu(&mut self) -> DashboardResult<()> {
        self.notice = None;
        if !matches!(self.state, UiState::AddModalOpen) {
            return Err(DashboardError::invalid_state("add menu is not open"));
        }
        self.transition(UiState::Idle);
        Ok(())
    }

    /// Types with a form open it; library widgets are added straight away.
    pub fn select_chart_type(&mut self, chart_type: ChartType) -> DashboardResult<Option<WidgetId>> {
        self.notice = None;
        if !matches!(self.state, UiState::AddModalOpen) {
            return Err(DashboardError::invalid_state("add menu is not open"));
        }

        if chart_type.needs_form() {
            let session = self.new_session(FormMode::Create, chart_type, None, Vec::new());
            self.transition(UiState::FormOpen(session));
            return Ok(None);
        }

        let id = self.add_widget(chart_type, chart_type.display_name().to_string(), None);
        self.transition(UiState::Idle);
        Ok(Some(id))
    }

    pub fn click_widget(&mut self, id: &WidgetId) -> DashboardResult<ClickOutcome> {
        self.require_idle("open a widget")?;
        let widget = self
            .widgets
            .get(id)
            .ok_or_else(|| DashboardError::NotFound(id.clone()))?;
        let widget_type = widget.widget_type;
        self.notice = None;

        let outcome = match self.modes.interpretation() {
            None => ClickOutcome::Ignored,
            Some(ClickInterpretation::Configure) if !widget_type.needs_form() => {
                ClickOutcome::Notice {
                    message: format!("{} has no configuration form.", widget_type),
                }
            }
            Some(ClickInterpretation::Configure) => {
                let prefill = FormPrefill::from_description(
                    widget_type,
                    &widget.title,
                    widget.chart_description.as_ref(),
                );
                let mode = FormMode::Edit { widget_id: id.clone() };
                let session = self.new_session(mode.clone(), widget_type, prefill, Vec::new());
                self.transition(UiState::FormOpen(session));
                ClickOutcome::FormOpened { mode }
            }
            Some(ClickInterpretation::Convert) => {
                let targets = convertible_targets(widget_type);
                if targets.is_empty() {
                    ClickOutcome::Notice {
                        message: CONVERSION_NOTICE.to_string(),
                    }
                } else {
                    let (labels, values) = extract_points(widget.chart_description.as_ref());
                    let prefill = FormPrefill::Series {
                        title: widget.title.clone(),
                        labels,
                        values,
                    };
                    let mode = FormMode::Convert { widget_id: id.clone() };
                    let session =
                        self.new_session(mode.clone(), widget_type, Some(prefill), targets.to_vec());
                    self.transition(UiState::FormOpen(session));
                    ClickOutcome::FormOpened { mode }
                }
            }
        };

        if let ClickOutcome::Notice { message } = &outcome {
            self.notice = Some(message.clone());
        }
        Ok(outcome)
    }

    /// Commits a create or edit form. Validation failures leave the form open.
    pub fn submit_form(&mut self, fields: ChartFields) -> DashboardResult<WidgetId> {
        self.notice = None;
        let session = self.open_session()?;
        let (mode, chart_type) = (session.mode.clone(), session.chart_type);

        if fields.chart_type() != chart_type {
            return Err(DashboardError::validation(format!(
                "form is for {}, got {} fields",
                chart_type,
                fields.chart_type()
            )));
        }
        let description = fields.build()?;
        description.validate()?;

        let id = match mode {
            FormMode::Create => {
                let title = title_or(&description, chart_type.display_name());
                self.add_widget(chart_type, title, Some(description))
            }
            FormMode::Edit { widget_id } => {
                let title = (!description.title.trim().is_empty()).then(|| description.title.clone());
                self.update_widget(
                    &widget_id,
                    WidgetPatch {
                        chart_description: Some(description),
                        title,
                        widget_type: None,
                    },
                )?;
                widget_id
            }
            FormMode::Convert { .. } => {
                return Err(DashboardError::invalid_state(
                    "conversion forms take conversion fields",
                ));
            }
        };

        self.transition(UiState::Idle);
        Ok(id)
    }

    pub fn submit_conversion(&mut self, fields: ConversionFields) -> DashboardResult<WidgetId> {
        self.notice = None;
        let session = self.open_session()?;
        let FormMode::Convert { widget_id } = session.mode.clone() else {
            return Err(DashboardError::invalid_state("no conversion form is open"));
        };
        let source = session.chart_type;

        let description = fields.rebuild_for(source)?;
        description.validate()?;

        self.update_widget(
            &widget_id,
            WidgetPatch {
                title: Some(description.title.clone()),
                chart_description: Some(description),
                widget_type: Some(fields.target),
            },
        )?;
        tracing::info!("Converted widget {} from {:?} to {:?}", widget_id, source, fields.target);

        self.transition(UiState::Idle);
        Ok(widget_id)
    }

    pub fn cancel_form(&mut self) -> DashboardResult<()> {
        self.notice = None;
        self.open_session()?;
        self.transition(UiState::Idle);
        Ok(())
    }

    /// Marks the open form as fetching; the returned ticket ties the result to it.
    pub fn begin_fetch(&mut self, url: &str) -> DashboardResult<FetchTicket> {
        let url = url.trim();
        self.notice = None;
        let UiState::FormOpen(session) = &mut self.state else {
            return Err(DashboardError::invalid_state("no form is open"));
        };
        if matches!(session.mode, FormMode::Convert { .. }) || !session.chart_type.supports_device_mode() {
            return Err(DashboardError::invalid_state(format!(
                "{} form has no device mode",
                session.chart_type
            )));
        }
        if url.is_empty() {
            return Err(DashboardError::validation("an API URL is required"));
        }

        self.next_fetch += 1;
        session.device = DeviceState {
            fetch: Some(FetchStatus::Pending { url: url.to_string() }),
            keys: None,
            pending: Some(self.next_fetch),
            document: None,
        };
        Ok(FetchTicket {
            serial: session.serial,
            fetch_id: self.next_fetch,
            url: url.to_string(),
        })
    }

    /// Stores a fetch result on the form it was started from. A form that was
    /// closed or replaced meanwhile, or a fetch superseded by a later one, is left alone.
    pub fn complete_fetch(&mut self, ticket: &FetchTicket, result: DashboardResult<Value>) -> DashboardResult<()> {
        let session = match &mut self.state {
            UiState::FormOpen(session) if session.serial == ticket.serial => session,
            _ => {
                tracing::debug!("Dropping fetch result for closed form {}", ticket.serial);
                return Err(DashboardError::invalid_state("form closed before the fetch completed"));
            }
        };
        if session.device.pending != Some(ticket.fetch_id) {
            tracing::debug!("Dropping superseded fetch result from {}", ticket.url);
            return Err(DashboardError::invalid_state("a newer fetch replaced this one"));
        }
        session.device.pending = None;
        let url = ticket.url.clone();

        match result {
            Ok(document) => {
                session.device.fetch = Some(FetchStatus::Success { url });
                session.device.document = Some(document);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Device fetch from {} failed: {}", url, e);
                session.device.fetch = Some(FetchStatus::Error {
                    message: e.to_string(),
                });
                session.device.document = None;
                Err(e)
            }
        }
    }

    /// Pulls labels and values out of the fetched document by key path.
    pub fn apply_device_keys(&mut self, labels_path: &str, values_path: &str) -> DashboardResult<DevicePrefill> {
        self.notice = None;
        let UiState::FormOpen(session) = &mut self.state else {
            return Err(DashboardError::invalid_state("no form is open"));
        };
        let Some(document) = &session.device.document else {
            return Err(DashboardError::validation("fetch a document before choosing keys"));
        };
        let (labels_path, values_path) = (labels_path.trim(), values_path.trim());
        if labels_path.is_empty() || values_path.is_empty() {
            return Err(DashboardError::validation("choose both labels and values keys"));
        }

        match extract_device_series(document, labels_path, values_path) {
            Ok(prefill) => {
                session.device.keys = Some(KeyStatus::Success(prefill.clone()));
                Ok(prefill)
            }
            Err(e) => {
                session.device.keys = Some(KeyStatus::Error {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// First step of removal; nothing changes until confirmed.
    pub fn request_remove(&mut self, id: &WidgetId) -> DashboardResult<()> {
        self.notice = None;
        self.require_idle("remove a widget")?;
        if !self.widgets.contains(id) {
            return Err(DashboardError::NotFound(id.clone()));
        }
        self.transition(UiState::ConfirmRemove { widget_id: id.clone() });
        Ok(())
    }

    pub fn confirm_remove(&mut self) -> DashboardResult<WidgetId> {
        self.notice = None;
        let UiState::ConfirmRemove { widget_id } = &self.state else {
            return Err(DashboardError::invalid_state("no removal is pending"));
        };
        let id = widget_id.clone();
        self.remove_widget(&id)?;
        self.transition(UiState::Idle);
        Ok(id)
    }

    pub fn cancel_remove(&mut self) -> DashboardResult<()> {
        self.notice = None;
        if !matches!(self.state, UiState::ConfirmRemove { .. }) {
            return Err(DashboardError::invalid_state("no removal is pending"));
        }
        self.transition(UiState::Idle);
        Ok(())
    }

    /// Accepts a rearrangement from the grid engine. Every list handed in must
    /// place each widget exactly once with a non-empty rectangle.
    pub fn replace_layouts(&mut self, layouts: LayoutMap) -> DashboardResult<()> {
        self.notice = None;
        if self.locked {
            return Err(DashboardError::invalid_state("layout is locked"));
        }

        let known: BTreeSet<&WidgetId> = self.widgets.all().keys().collect();
        for (bp, entries) in &layouts {
            let mut seen = BTreeSet::new();
            for entry in entries {
                if !entry.has_area() {
                    return Err(DashboardError::validation(format!(
                        "{}: entry for {} has no area",
                        bp, entry.widget_id
                    )));
                }
                if !known.contains(&entry.widget_id) || !seen.insert(&entry.widget_id) {
                    return Err(DashboardError::validation(format!(
                        "{}: unknown or duplicate widget {}",
                        bp, entry.widget_id
                    )));
                }
            }
            if seen.len() != known.len() {
                return Err(DashboardError::validation(format!(
                    "{}: layout is missing widgets",
                    bp
                )));
            }
        }

        self.layouts.replace_all(layouts);
        self.persist();
        Ok(())
    }

    /// Empties both stores and drops the persisted snapshot.
    pub fn reset(&mut self) -> DashboardResult<()> {
        self.require_idle("reset the dashboard")?;
        self.widgets.clear();
        self.layouts.clear();
        self.notice = None;
        for key in SnapshotKey::ALL {
            if let Err(e) = self.repository.clear(key) {
                tracing::warn!("Failed to clear {} snapshot: {:#}", key, e);
            }
        }
        tracing::info!("Dashboard reset");
        Ok(())
    }

    fn add_widget(
        &mut self,
        chart_type: ChartType,
        title: String,
        description: Option<ChartDescription>,
    ) -> WidgetId {
        let id = self.widgets.add(chart_type, title, description);
        self.layouts.add_entry_for_all_breakpoints(&id);
        tracing::info!("Added {:?} widget {}", chart_type, id);
        self.persist();
        id
    }

    fn update_widget(&mut self, id: &WidgetId, patch: WidgetPatch) -> DashboardResult<()> {
        self.widgets
            .update(id, patch)
            .map_err(invariant_violation)?;
        tracing::info!("Updated widget {}", id);
        self.persist();
        Ok(())
    }

    fn remove_widget(&mut self, id: &WidgetId) -> DashboardResult<()> {
        self.widgets.remove(id).map_err(invariant_violation)?;
        let purged = self.layouts.remove_entry(id);
        tracing::info!("Removed widget {} and {} layout entries", id, purged);
        self.persist();
        Ok(())
    }

    /// Fire-and-forget snapshot write after a committed mutation
    fn persist(&self) {
        debug_assert!(self.is_consistent(), "widget and layout stores diverged");

        let snapshot = DashboardSnapshot::new(self.widgets.all().clone(), self.layouts.all().clone());
        let encoded = match snapshot.encode() {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!("Failed to encode snapshot: {}", e);
                return;
            }
        };

        for (key, blob) in [
            (SnapshotKey::Widgets, &encoded.widgets),
            (SnapshotKey::Layouts, &encoded.layouts),
        ] {
            if let Err(e) = self.repository.save(key, blob) {
                tracing::warn!("Failed to save {} snapshot: {:#}", key, e);
            }
        }
    }

    fn require_idle(&self, action: &str) -> DashboardResult<()> {
        if matches!(self.state, UiState::Idle) {
            Ok(())
        } else {
            Err(DashboardError::invalid_state(format!(
                "cannot {} while a dialog is open",
                action
            )))
        }
    }

    fn open_session(&self) -> DashboardResult<&FormSession> {
        match &self.state {
            UiState::FormOpen(session) => Ok(session),
            _ => Err(DashboardError::invalid_state("no form is open")),
        }
    }

    fn new_session(
        &mut self,
        mode: FormMode,
        chart_type: ChartType,
        prefill: Option<FormPrefill>,
        targets: Vec<ChartType>,
    ) -> FormSession {
        self.next_serial += 1;
        FormSession {
            serial: self.next_serial,
            mode,
            chart_type,
            prefill,
            targets,
            device: DeviceState::default(),
        }
    }

    fn transition(&mut self, next: UiState) {
        tracing::debug!("UI state {} -> {}", state_name(&self.state), state_name(&next));
        self.state = next;
    }
}

fn state_name(state: &UiState) -> &'static str {
    match state {
        UiState::Idle => "idle",
        UiState::AddModalOpen => "addModalOpen",
        UiState::FormOpen(_) => "formOpen",
        UiState::ConfirmRemove { .. } => "confirmRemove",
    }
}

fn title_or(description: &ChartDescription, fallback: &str) -> String {
    let title = description.title.trim();
    if title.is_empty() {
        fallback.to_string()
    } else {
        title.to_string()
    }
}

/// A store rejected an id the controller had already checked.
fn invariant_violation(err: DashboardError) -> DashboardError {
    tracing::error!("Controller and store out of sync: {}", err);
    if cfg!(debug_assertions) {
        panic!("controller and store out of sync: {}", err);
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::chart_builder::{GaugeFields, SeriesFields};
    use crate::domain::chart::{Axis, NamedValue, SeriesData};
    use crate::domain::layout::{Breakpoint, LayoutEntry};
    use crate::infrastructure::memory_snapshot_repository::MemorySnapshotRepository;
    use serde_json::json;

    fn controller() -> (DashboardController, MemorySnapshotRepository) {
        let repository = MemorySnapshotRepository::new();
        let controller = DashboardController::load(Box::new(repository.clone()));
        (controller, repository)
    }

    fn series(title: &str, labels: &str, values: &str) -> SeriesFields {
        SeriesFields {
            title: title.to_string(),
            labels: labels.to_string(),
            values: values.to_string(),
        }
    }

    fn add_chart(controller: &mut DashboardController, fields: ChartFields) -> WidgetId {
        controller.open_add_menu().unwrap();
        assert_eq!(controller.select_chart_type(fields.chart_type()).unwrap(), None);
        controller.submit_form(fields).unwrap()
    }

    fn add_library(controller: &mut DashboardController, chart_type: ChartType) -> WidgetId {
        controller.open_add_menu().unwrap();
        controller.select_chart_type(chart_type).unwrap().unwrap()
    }

    fn remove(controller: &mut DashboardController, id: &WidgetId) {
        controller.request_remove(id).unwrap();
        controller.confirm_remove().unwrap();
    }

    #[test]
    fn test_add_bar_chart_then_remove() {
        let (mut controller, _) = controller();
        let other = add_library(&mut controller, ChartType::KpiCard);
        let sales = add_chart(
            &mut controller,
            ChartFields::Bar(series("Sales", "Jan,Feb,Mar", "10,20,30")),
        );

        let widget = controller.widgets().get(&sales).unwrap();
        assert_eq!(widget.title, "Sales");
        let description = widget.chart_description.as_ref().unwrap();
        assert_eq!(
            description.axis,
            Axis::Category {
                labels: vec!["Jan".to_string(), "Feb".to_string(), "Mar".to_string()]
            }
        );
        assert_eq!(
            description.first_series().unwrap().data,
            SeriesData::Values(vec![10.0, 20.0, 30.0])
        );

        let before: Vec<LayoutEntry> = controller.layouts().entries(Breakpoint::Md).to_vec();
        remove(&mut controller, &sales);

        for bp in Breakpoint::ALL {
            let entries = controller.layouts().entries(bp);
            assert!(entries.iter().all(|e| e.widget_id != sales));
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].widget_id, other);
        }
        assert_eq!(controller.layouts().entries(Breakpoint::Md)[0], before[0]);
        assert!(controller.is_consistent());
        assert!(matches!(controller.state(), UiState::Idle));
    }

    #[test]
    fn test_stores_stay_consistent_over_add_remove_sequences() {
        let (mut controller, _) = controller();
        let mut live = Vec::new();

        for round in 0..12 {
            let chart_type = [ChartType::KpiCard, ChartType::MetricCard, ChartType::AreaChart][round % 3];
            live.push(add_library(&mut controller, chart_type));
            assert!(controller.is_consistent());

            if round % 4 == 3 {
                let id = live.remove(round % live.len());
                remove(&mut controller, &id);
                assert!(controller.is_consistent());
            }
        }

        assert_eq!(controller.widgets().len(), live.len());
        for bp in Breakpoint::ALL {
            assert_eq!(controller.layouts().ids(bp), live.iter().collect::<BTreeSet<_>>());
        }
    }

    #[test]
    fn test_cancel_form_does_not_mutate() {
        let (mut controller, repository) = controller();
        controller.open_add_menu().unwrap();
        controller.select_chart_type(ChartType::PieChart).unwrap();
        assert!(matches!(controller.state(), UiState::FormOpen(_)));

        controller.cancel_form().unwrap();
        assert!(controller.widgets().is_empty());
        assert!(repository.blob(SnapshotKey::Widgets).is_none());
        assert!(matches!(controller.state(), UiState::Idle));
    }

    #[test]
    fn test_gauge_validation_keeps_form_open() {
        let (mut controller, _) = controller();
        controller.open_add_menu().unwrap();
        controller.select_chart_type(ChartType::SpeedGauge).unwrap();

        let err = controller
            .submit_form(ChartFields::SpeedGauge(GaugeFields {
                title: "Pump".to_string(),
                current: 7.0,
                min: 10.0,
                max: 5.0,
            }))
            .unwrap_err();
        assert!(matches!(err, DashboardError::Validation(_)));
        assert!(matches!(controller.state(), UiState::FormOpen(_)));
        assert!(controller.widgets().is_empty());

        let id = controller
            .submit_form(ChartFields::SpeedGauge(GaugeFields {
                title: "Pump".to_string(),
                current: 42.0,
                min: 0.0,
                max: 100.0,
            }))
            .unwrap();
        let description = controller.widgets().get(&id).unwrap().chart_description.clone().unwrap();
        assert_eq!(description.axis, Axis::Gauge { min: 0.0, max: 100.0 });
    }

    #[test]
    fn test_form_family_must_match_selection() {
        let (mut controller, _) = controller();
        controller.open_add_menu().unwrap();
        controller.select_chart_type(ChartType::LineChart).unwrap();

        let err = controller
            .submit_form(ChartFields::Bar(series("Sales", "Jan", "1")))
            .unwrap_err();
        assert!(matches!(err, DashboardError::Validation(_)));
    }

    #[test]
    fn test_configure_mode_edits_in_place() {
        let (mut controller, _) = controller();
        let id = add_chart(&mut controller, ChartFields::Line(series("Visits", "Mon,Tue", "1,2")));
        let type_before = controller.widgets().get(&id).unwrap().widget_type;

        controller.set_modes(Modes { configure: true, convert: false });
        let outcome = controller.click_widget(&id).unwrap();
        assert_eq!(
            outcome,
            ClickOutcome::FormOpened {
                mode: FormMode::Edit { widget_id: id.clone() }
            }
        );
        let UiState::FormOpen(session) = controller.state() else {
            panic!("form should be open");
        };
        assert_eq!(
            session.prefill,
            Some(FormPrefill::Series {
                title: "Visits".to_string(),
                labels: vec!["Mon".to_string(), "Tue".to_string()],
                values: vec![1.0, 2.0],
            })
        );

        let edited = controller
            .submit_form(ChartFields::Line(series("Daily visits", "Mon,Tue,Wed", "1,2,3")))
            .unwrap();
        assert_eq!(edited, id);

        let widget = controller.widgets().get(&id).unwrap();
        assert_eq!(widget.title, "Daily visits");
        assert_eq!(widget.widget_type, type_before);
        assert_eq!(controller.widgets().len(), 1);
    }

    #[test]
    fn test_configure_takes_precedence_over_convert() {
        let (mut controller, _) = controller();
        let id = add_chart(&mut controller, ChartFields::Bar(series("Sales", "Jan", "1")));

        controller.set_modes(Modes { configure: true, convert: true });
        let outcome = controller.click_widget(&id).unwrap();
        assert!(matches!(
            outcome,
            ClickOutcome::FormOpened { mode: FormMode::Edit { .. } }
        ));
    }

    #[test]
    fn test_click_without_mode_is_ignored() {
        let (mut controller, _) = controller();
        let id = add_library(&mut controller, ChartType::KpiCard);
        assert_eq!(controller.click_widget(&id).unwrap(), ClickOutcome::Ignored);
        assert!(matches!(controller.state(), UiState::Idle));

        let ghost = WidgetId::new("comp-0-ghost");
        assert_eq!(
            controller.click_widget(&ghost).unwrap_err(),
            DashboardError::NotFound(ghost)
        );
    }

    #[test]
    fn test_convert_pie_to_bar() {
        let (mut controller, _) = controller();
        let id = add_chart(&mut controller, ChartFields::Pie(series("Share", "A,B", "1,2")));

        controller.set_modes(Modes { configure: false, convert: true });
        controller.click_widget(&id).unwrap();
        let UiState::FormOpen(session) = controller.state() else {
            panic!("conversion form should be open");
        };
        assert_eq!(session.targets, vec![ChartType::LineChart, ChartType::BarChart]);

        controller
            .submit_conversion(ConversionFields {
                target: ChartType::BarChart,
                title: "Share by bar".to_string(),
                labels: "A, B".to_string(),
                values: "1, 2".to_string(),
            })
            .unwrap();

        let widget = controller.widgets().get(&id).unwrap();
        assert_eq!(widget.widget_type, ChartType::BarChart);
        assert_eq!(widget.title, "Share by bar");
        let description = widget.chart_description.as_ref().unwrap();
        assert_eq!(
            description.axis,
            Axis::Category {
                labels: vec!["A".to_string(), "B".to_string()]
            }
        );
        assert_eq!(
            description.first_series().unwrap().data,
            SeriesData::Values(vec![1.0, 2.0])
        );
        assert!(controller.is_consistent());
    }

    #[test]
    fn test_convert_unsupported_type_reports_notice() {
        let (mut controller, _) = controller();
        let id = add_library(&mut controller, ChartType::MetricCard);

        controller.set_modes(Modes { configure: false, convert: true });
        let outcome = controller.click_widget(&id).unwrap();
        assert_eq!(
            outcome,
            ClickOutcome::Notice {
                message: CONVERSION_NOTICE.to_string()
            }
        );
        assert!(matches!(controller.state(), UiState::Idle));
        assert_eq!(controller.view().notice.as_deref(), Some(CONVERSION_NOTICE));

        controller.open_add_menu().unwrap();
        assert_eq!(controller.view().notice, None);
    }

    #[test]
    fn test_remove_requires_confirmation() {
        let (mut controller, _) = controller();
        let id = add_library(&mut controller, ChartType::KpiCard);

        controller.request_remove(&id).unwrap();
        assert!(controller.widgets().contains(&id));
        controller.cancel_remove().unwrap();
        assert!(controller.widgets().contains(&id));

        assert!(controller.confirm_remove().is_err());
        remove(&mut controller, &id);
        assert!(controller.widgets().is_empty());
    }

    #[test]
    fn test_reset_clears_stores_and_snapshot() {
        let (mut controller, repository) = controller();
        add_library(&mut controller, ChartType::KpiCard);
        assert!(repository.blob(SnapshotKey::Widgets).is_some());

        controller.reset().unwrap();
        assert!(controller.widgets().is_empty());
        assert!(controller.layouts().all().values().all(Vec::is_empty));
        assert!(repository.blob(SnapshotKey::Widgets).is_none());
        assert!(repository.blob(SnapshotKey::Layouts).is_none());
    }

    #[test]
    fn test_snapshot_round_trip_is_byte_stable() {
        let (mut first, repository) = controller();
        add_chart(&mut first, ChartFields::Pie(series("Share", "A,B", "1,2")));
        add_library(&mut first, ChartType::KpiCard);
        let second_widgets = repository.blob(SnapshotKey::Widgets).unwrap();
        let second_layouts = repository.blob(SnapshotKey::Layouts).unwrap();

        let reloaded = DashboardController::load(Box::new(repository.clone()));
        reloaded.persist();

        assert_eq!(repository.blob(SnapshotKey::Widgets).unwrap(), second_widgets);
        assert_eq!(repository.blob(SnapshotKey::Layouts).unwrap(), second_layouts);
        assert_eq!(reloaded.widgets().all(), first.widgets().all());
    }

    #[test]
    fn test_corrupt_snapshot_starts_empty() {
        let repository = MemorySnapshotRepository::new();
        repository.save(SnapshotKey::Widgets, "][").unwrap();

        let controller = DashboardController::load(Box::new(repository));
        assert!(controller.widgets().is_empty());
        assert!(controller.is_consistent());
    }

    #[test]
    fn test_load_repairs_missing_layout_entries() {
        let (mut first, repository) = controller();
        let id = add_library(&mut first, ChartType::KpiCard);
        repository.clear(SnapshotKey::Layouts).unwrap();

        let reloaded = DashboardController::load(Box::new(repository.clone()));
        assert!(reloaded.is_consistent());
        assert_eq!(reloaded.layouts().entries(Breakpoint::Sm)[0].widget_id, id);
        assert!(repository.blob(SnapshotKey::Layouts).is_some());
    }

    #[test]
    fn test_replace_layouts() {
        let (mut controller, _) = controller();
        let id = add_library(&mut controller, ChartType::KpiCard);
        let moved = LayoutMap::from([(Breakpoint::Lg, vec![LayoutEntry::new(id.clone(), 3, 2, 6, 4)])]);

        assert!(matches!(
            controller.replace_layouts(moved.clone()),
            Err(DashboardError::InvalidState(_))
        ));

        controller.set_locked(false);
        controller.replace_layouts(moved).unwrap();
        assert_eq!(controller.layouts().entries(Breakpoint::Lg)[0].x, 3);
        assert_eq!(controller.widgets().len(), 1);

        let stray = LayoutMap::from([(
            Breakpoint::Md,
            vec![LayoutEntry::new(WidgetId::new("comp-0-ghost"), 0, 0, 4, 6)],
        )]);
        assert!(controller.replace_layouts(stray).is_err());

        let flat = LayoutMap::from([(Breakpoint::Md, vec![LayoutEntry::new(id, 0, 0, 0, 6)])]);
        assert!(controller.replace_layouts(flat).is_err());
        assert!(controller.is_consistent());
    }

    #[test]
    fn test_device_fetch_and_keys() {
        let (mut controller, _) = controller();
        controller.open_add_menu().unwrap();
        controller.select_chart_type(ChartType::BarChart).unwrap();

        assert!(matches!(
            controller.apply_device_keys("labels", "data"),
            Err(DashboardError::Validation(_))
        ));
        assert!(matches!(controller.begin_fetch("  "), Err(DashboardError::Validation(_))));

        let ticket = controller.begin_fetch("http://device.local/api/bar").unwrap();
        controller
            .complete_fetch(
                &ticket,
                Ok(json!({ "labels": ["a", "b"], "datasets": [{ "data": [1, 2] }] })),
            )
            .unwrap();

        assert!(matches!(
            controller.apply_device_keys("labels", ""),
            Err(DashboardError::Validation(_))
        ));
        assert!(matches!(
            controller.apply_device_keys("labels", "datasets"),
            Err(DashboardError::ExtractionFailure(_))
        ));

        let prefill = controller.apply_device_keys("labels", "datasets.0.data").unwrap();
        assert_eq!(prefill.values, vec![1.0, 2.0]);
        assert_eq!(prefill.title, "Device Chart");
        assert!(controller.widgets().is_empty());
    }

    #[test]
    fn test_fetch_failure_leaves_form_usable() {
        let (mut controller, _) = controller();
        controller.open_add_menu().unwrap();
        controller.select_chart_type(ChartType::PieChart).unwrap();

        let ticket = controller.begin_fetch("http://device.local/api/pie").unwrap();
        let err = controller
            .complete_fetch(&ticket, Err(DashboardError::FetchFailure("timeout".to_string())))
            .unwrap_err();
        assert!(matches!(err, DashboardError::FetchFailure(_)));

        let UiState::FormOpen(session) = controller.state() else {
            panic!("form should stay open");
        };
        assert!(matches!(session.device.fetch, Some(FetchStatus::Error { .. })));

        let id = controller.submit_form(ChartFields::Pie(series("Share", "A", "1"))).unwrap();
        assert!(controller.widgets().contains(&id));
    }

    #[test]
    fn test_stale_fetch_result_is_dropped() {
        let (mut controller, _) = controller();
        controller.open_add_menu().unwrap();
        controller.select_chart_type(ChartType::LineChart).unwrap();
        let ticket = controller.begin_fetch("http://device.local/api/line").unwrap();

        controller.cancel_form().unwrap();
        controller.open_add_menu().unwrap();
        controller.select_chart_type(ChartType::LineChart).unwrap();

        assert!(controller.complete_fetch(&ticket, Ok(json!({}))).is_err());
        let UiState::FormOpen(session) = controller.state() else {
            panic!("second form should be open");
        };
        assert!(session.device.fetch.is_none());
    }

    #[test]
    fn test_superseded_fetch_result_is_dropped() {
        let (mut controller, _) = controller();
        controller.open_add_menu().unwrap();
        controller.select_chart_type(ChartType::BarChart).unwrap();

        let first = controller.begin_fetch("http://device.local/a").unwrap();
        let second = controller.begin_fetch("http://device.local/b").unwrap();
        assert_eq!(first.serial, second.serial);
        assert_ne!(first.fetch_id, second.fetch_id);

        controller
            .complete_fetch(&second, Ok(json!({ "src": ["B"], "vals": [2] })))
            .unwrap();
        let late = controller.complete_fetch(&first, Ok(json!({ "src": ["A"], "vals": [1] })));
        assert!(matches!(late, Err(DashboardError::InvalidState(_))));

        let UiState::FormOpen(session) = controller.state() else {
            panic!("form should stay open");
        };
        assert_eq!(
            session.device.fetch,
            Some(FetchStatus::Success {
                url: "http://device.local/b".to_string()
            })
        );
        let prefill = controller.apply_device_keys("src", "vals").unwrap();
        assert_eq!(prefill.labels, vec!["B".to_string()]);
    }

    #[test]
    fn test_gauge_forms_have_no_device_mode() {
        let (mut controller, _) = controller();
        controller.open_add_menu().unwrap();
        controller.select_chart_type(ChartType::TemperatureGauge).unwrap();
        assert!(matches!(
            controller.begin_fetch("http://device.local"),
            Err(DashboardError::InvalidState(_))
        ));
    }

    #[test]
    fn test_dialogs_block_other_actions() {
        let (mut controller, _) = controller();
        let id = add_library(&mut controller, ChartType::KpiCard);
        controller.open_add_menu().unwrap();

        assert!(matches!(controller.open_add_menu(), Err(DashboardError::InvalidState(_))));
        assert!(matches!(controller.request_remove(&id), Err(DashboardError::InvalidState(_))));
        assert!(matches!(controller.reset(), Err(DashboardError::InvalidState(_))));

        controller.close_add_menu().unwrap();
        assert!(matches!(controller.state(), UiState::Idle));
    }

    #[test]
    fn test_pie_widget_points() {
        let (mut controller, _) = controller();
        let id = add_chart(&mut controller, ChartFields::Pie(series("Share", "A,B", "1,2")));
        let description = controller.widgets().get(&id).unwrap().chart_description.clone();
        assert_eq!(
            description.unwrap().first_series().unwrap().data,
            SeriesData::Named(vec![NamedValue::new("A", 1.0), NamedValue::new("B", 2.0)])
        );
    }
}
