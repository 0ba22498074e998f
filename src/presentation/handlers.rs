// HTTP request handlers
use crate::application::chart_builder::{ChartFields, DevicePrefill};
use crate::application::controller::{ClickOutcome, DashboardController, DashboardView, Modes};
use crate::application::conversion::ConversionFields;
use crate::domain::dashboard::LayoutMap;
use crate::domain::error::DashboardResult;
use crate::domain::widget::{ChartType, WidgetId};
use crate::infrastructure::http_response::{ApiJson, ApiResult};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Outcome of an action together with the dashboard as it stands afterwards
#[derive(Debug, Serialize)]
pub struct ActionResponse<T> {
    pub result: T,
    pub dashboard: DashboardView,
}

#[derive(Deserialize)]
pub struct SelectTypeRequest {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
}

#[derive(Deserialize)]
pub struct LockRequest {
    pub locked: bool,
}

#[derive(Deserialize)]
pub struct FetchRequest {
    pub url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeysRequest {
    pub labels_path: String,
    pub values_path: String,
}

/// Runs one action and snapshots the view in the same controller turn
async fn act<T, F>(state: &AppState, action: F) -> ApiResult<ActionResponse<T>>
where
    T: Serialize + Send + 'static,
    F: FnOnce(&mut DashboardController) -> DashboardResult<T> + Send + 'static,
{
    let response = state
        .dashboard
        .run(move |c| {
            action(&mut *c).map(|result| ActionResponse {
                result,
                dashboard: c.view(),
            })
        })
        .await??;
    Ok(Json(response))
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> ApiResult<DashboardView> {
    let view = state.dashboard.run(|c| c.view()).await?;
    Ok(Json(view))
}

pub async fn open_add_menu(State(state): State<Arc<AppState>>) -> ApiResult<ActionResponse<()>> {
    act(&state, |c| c.open_add_menu()).await
}

pub async fn close_add_menu(State(state): State<Arc<AppState>>) -> ApiResult<ActionResponse<()>> {
    act(&state, |c| c.close_add_menu()).await
}

pub async fn select_chart_type(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<SelectTypeRequest>,
) -> ApiResult<ActionResponse<Option<WidgetId>>> {
    act(&state, move |c| c.select_chart_type(request.chart_type)).await
}

pub async fn set_modes(
    State(state): State<Arc<AppState>>,
    ApiJson(modes): ApiJson<Modes>,
) -> ApiResult<ActionResponse<()>> {
    act(&state, move |c| {
        c.set_modes(modes);
        Ok(())
    })
    .await
}

pub async fn set_lock(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<LockRequest>,
) -> ApiResult<ActionResponse<()>> {
    act(&state, move |c| {
        c.set_locked(request.locked);
        Ok(())
    })
    .await
}

pub async fn click_widget(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<ActionResponse<ClickOutcome>> {
    act(&state, move |c| c.click_widget(&WidgetId::new(id))).await
}

pub async fn request_remove(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<ActionResponse<()>> {
    act(&state, move |c| c.request_remove(&WidgetId::new(id))).await
}

pub async fn confirm_remove(State(state): State<Arc<AppState>>) -> ApiResult<ActionResponse<WidgetId>> {
    act(&state, |c| c.confirm_remove()).await
}

pub async fn cancel_remove(State(state): State<Arc<AppState>>) -> ApiResult<ActionResponse<()>> {
    act(&state, |c| c.cancel_remove()).await
}

pub async fn submit_form(
    State(state): State<Arc<AppState>>,
    ApiJson(fields): ApiJson<ChartFields>,
) -> ApiResult<ActionResponse<WidgetId>> {
    act(&state, move |c| c.submit_form(fields)).await
}

pub async fn submit_conversion(
    State(state): State<Arc<AppState>>,
    ApiJson(fields): ApiJson<ConversionFields>,
) -> ApiResult<ActionResponse<WidgetId>> {
    act(&state, move |c| c.submit_conversion(fields)).await
}

pub async fn cancel_form(State(state): State<Arc<AppState>>) -> ApiResult<ActionResponse<()>> {
    act(&state, |c| c.cancel_form()).await
}

/// Fetch a device document for the open form (device mode)
pub async fn fetch_document(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<FetchRequest>,
) -> ApiResult<ActionResponse<()>> {
    state.dashboard.fetch_document(request.url).await??;
    act(&state, |_| Ok(())).await
}

pub async fn apply_device_keys(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<KeysRequest>,
) -> ApiResult<ActionResponse<DevicePrefill>> {
    act(&state, move |c| {
        c.apply_device_keys(&request.labels_path, &request.values_path)
    })
    .await
}

/// Rearrangement reported by the grid layout engine
pub async fn replace_layouts(
    State(state): State<Arc<AppState>>,
    ApiJson(layouts): ApiJson<LayoutMap>,
) -> ApiResult<ActionResponse<()>> {
    act(&state, move |c| c.replace_layouts(layouts)).await
}

pub async fn reset_dashboard(State(state): State<Arc<AppState>>) -> ApiResult<ActionResponse<()>> {
    act(&state, |c| c.reset()).await
}
