//! Read and evict stored bundles under /api/v1/analytics/{file_id}.
//!
//! Section views return `null` data when that section could not be
//! extracted; callers must not read that as zero.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;
use wrapped_core::{AnalyticsBundle, DemographicsRecord, DiscoveryRecord, TopPostRecord};

use crate::middleware::RequestId;
use crate::store::BundleStore;

use super::{parse_file_id, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct EngagementView {
    pub discovery_data: Option<DiscoveryRecord>,
    pub top_posts: Option<Vec<TopPostRecord>>,
}

fn load_bundle(
    state: &AppState,
    request_id: &str,
    raw_id: &str,
) -> Result<Arc<AnalyticsBundle>, ApiError> {
    let file_id = parse_file_id(request_id, raw_id)?;
    state.store.get(file_id).ok_or_else(|| {
        ApiError::new(
            request_id,
            "not_found",
            format!("no analytics stored for file {file_id}"),
        )
    })
}

pub(super) async fn get_bundle(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(file_id): Path<String>,
) -> Result<Json<ApiResponse<AnalyticsBundle>>, ApiError> {
    let bundle = load_bundle(&state, &req_id.0, &file_id)?;
    Ok(Json(ApiResponse::new(req_id.0, (*bundle).clone())))
}

pub(super) async fn get_discovery(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(file_id): Path<String>,
) -> Result<Json<ApiResponse<Option<DiscoveryRecord>>>, ApiError> {
    let bundle = load_bundle(&state, &req_id.0, &file_id)?;
    Ok(Json(ApiResponse::new(req_id.0, bundle.discovery.clone())))
}

pub(super) async fn get_top_posts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(file_id): Path<String>,
) -> Result<Json<ApiResponse<Option<Vec<TopPostRecord>>>>, ApiError> {
    let bundle = load_bundle(&state, &req_id.0, &file_id)?;
    Ok(Json(ApiResponse::new(req_id.0, bundle.top_posts.clone())))
}

pub(super) async fn get_demographics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(file_id): Path<String>,
) -> Result<Json<ApiResponse<Option<DemographicsRecord>>>, ApiError> {
    let bundle = load_bundle(&state, &req_id.0, &file_id)?;
    Ok(Json(ApiResponse::new(req_id.0, bundle.demographics.clone())))
}

pub(super) async fn get_engagement(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(file_id): Path<String>,
) -> Result<Json<ApiResponse<EngagementView>>, ApiError> {
    let bundle = load_bundle(&state, &req_id.0, &file_id)?;
    let view = EngagementView {
        discovery_data: bundle.discovery.clone(),
        top_posts: bundle.top_posts.clone(),
    };
    Ok(Json(ApiResponse::new(req_id.0, view)))
}

pub(super) async fn delete_bundle(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(file_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_file_id(&req_id.0, &file_id)?;
    if state.store.remove(id) {
        tracing::info!(file_id = %id, "evicted bundle on request");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("no analytics stored for file {id}"),
        ))
    }
}
