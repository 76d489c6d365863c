//! POST /api/v1/files/upload: accept an export, extract it, store the bundle.

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;
use uuid::Uuid;
use wrapped_extract::{extract_bundle, ExtractError, FileKind};

use crate::middleware::RequestId;
use crate::store::BundleStore;

use super::{ApiError, ApiResponse, AppState};

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub(super) struct UploadResponse {
    pub file_id: Uuid,
    pub file_name: String,
    pub has_discovery: bool,
    pub has_top_posts: bool,
    pub has_demographics: bool,
}

pub(super) async fn upload_file(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadResponse>>, ApiError> {
    let (file_name, bytes) = read_file_field(&req_id.0, &mut multipart).await?;

    if FileKind::from_file_name(&file_name).is_none() {
        return Err(ApiError::new(
            req_id.0,
            "unsupported_file_type",
            "only .xlsx and .csv files are accepted",
        ));
    }
    if bytes.len() > state.max_upload_bytes {
        return Err(payload_too_large(req_id.0, state.max_upload_bytes));
    }

    let file_id = Uuid::new_v4();
    let size = bytes.len();
    let bundle = tokio::task::spawn_blocking(move || extract_bundle(&bytes, file_id))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, %file_id, "extraction task failed");
            ApiError::new(req_id.0.clone(), "internal_error", "extraction failed")
        })?
        .map_err(|e| match e {
            ExtractError::UnreadableFile(reason) => {
                tracing::warn!(%file_id, file_name = %file_name, %reason, "rejected unreadable upload");
                ApiError::new(req_id.0.clone(), "unreadable_file", reason)
            }
            other => {
                tracing::error!(error = %other, %file_id, "unexpected extraction error");
                ApiError::new(req_id.0.clone(), "internal_error", "extraction failed")
            }
        })?;

    let response = UploadResponse {
        file_id,
        file_name,
        has_discovery: bundle.discovery.is_some(),
        has_top_posts: bundle.top_posts.is_some(),
        has_demographics: bundle.demographics.is_some(),
    };
    state.store.put(file_id, bundle);

    tracing::info!(
        %file_id,
        file_name = %response.file_name,
        size,
        stored_bundles = state.store.len(),
        "stored uploaded export"
    );

    Ok(Json(ApiResponse::new(req_id.0, response)))
}

/// Finds the `file` field and buffers it, skipping any other fields.
async fn read_file_field(
    request_id: &str,
    multipart: &mut Multipart,
) -> Result<(String, Bytes), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(request_id, &e))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(request_id, &e))?;
        return Ok((file_name, bytes));
    }

    Err(ApiError::new(
        request_id,
        "bad_request",
        "multipart body has no \"file\" field",
    ))
}

fn multipart_error(request_id: &str, error: &MultipartError) -> ApiError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new(request_id, "payload_too_large", "upload exceeds the size limit")
    } else {
        ApiError::new(request_id, "bad_request", error.body_text())
    }
}

fn payload_too_large(request_id: String, limit: usize) -> ApiError {
    ApiError::new(
        request_id,
        "payload_too_large",
        format!("upload exceeds the {limit} byte limit"),
    )
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use super::super::test_support::{
        app, app_with_limit, discovery_only_xlsx, json_body, multipart_request,
    };
    use crate::store::BundleStore;

    #[tokio::test]
    async fn upload_xlsx_stores_bundle() {
        let (app, store) = app();
        let response = app
            .oneshot(multipart_request("export.xlsx", &discovery_only_xlsx()))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        let data = &json["data"];
        assert_eq!(data["file_name"].as_str(), Some("export.xlsx"));
        assert_eq!(data["has_discovery"].as_bool(), Some(true));
        assert_eq!(data["has_top_posts"].as_bool(), Some(false));
        assert_eq!(data["has_demographics"].as_bool(), Some(false));

        let file_id: uuid::Uuid = data["file_id"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .expect("file id");
        let stored = store.get(file_id).expect("bundle stored");
        assert_eq!(
            stored.discovery.as_ref().map(|d| d.total_impressions),
            Some(857_000)
        );
    }

    #[tokio::test]
    async fn upload_rejects_unsupported_extension() {
        let (app, store) = app();
        let response = app
            .oneshot(multipart_request("export.pdf", b"%PDF-1.7"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"].as_str(), Some("unsupported_file_type"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn upload_rejects_unreadable_content() {
        let (app, store) = app();
        let response = app
            .oneshot(multipart_request("export.xlsx", &[0x00, 0x9f, 0x92, 0x96, 0xff]))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"].as_str(), Some("unreadable_file"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn upload_rejects_oversized_file() {
        let (app, _) = app_with_limit(16);
        let response = app
            .oneshot(multipart_request("export.csv", &[b'a'; 100]))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn csv_upload_succeeds_with_every_section_absent() {
        let (app, store) = app();
        let response = app
            .oneshot(multipart_request("export.csv", b"Date,Impressions\n11/11/2024,120\n"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["data"]["has_discovery"].as_bool(), Some(false));
        assert_eq!(store.len(), 1);
    }
}
