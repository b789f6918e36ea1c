use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use fragments_core::{Fragment, negotiate_and_convert};
use tracing::instrument;

use crate::error::{AppError, ErrorResponse};
use crate::extractors::auth::AuthUser;
use crate::models::fragment::{FragmentListResponse, FragmentResponse, ListQuery, StatusResponse};
use crate::state::AppState;

pub fn fragment_body_limit(max_blob_size: u64) -> DefaultBodyLimit {
    DefaultBodyLimit::max(usize::try_from(max_blob_size).unwrap_or(usize::MAX))
}

/// Split `{id}.{ext}` at the last dot.
fn split_extension(segment: &str) -> (&str, Option<&str>) {
    match segment.rsplit_once('.') {
        Some((id, ext)) => (id, Some(ext)),
        None => (segment, None),
    }
}

fn content_type(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::UnsupportedMediaType("Content-Type header is required".into()))
}

fn payload(body: Result<Bytes, BytesRejection>) -> Result<Bytes, AppError> {
    let body = body.map_err(|rejection| match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(rejection.body_text()),
        _ => AppError::Validation(rejection.body_text()),
    })?;
    if body.is_empty() {
        return Err(AppError::Validation("Fragment data must not be empty".into()));
    }
    Ok(body)
}

fn location(headers: &HeaderMap, id: &str) -> String {
    match headers.get(header::HOST).and_then(|v| v.to_str().ok()) {
        Some(host) => format!("http://{host}/v1/fragments/{id}"),
        None => format!("/v1/fragments/{id}"),
    }
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Fragments",
    operation_id = "listFragments",
    summary = "List the caller's fragments",
    description = "Returns fragment ids ordered by creation time, or full metadata when `expand` is `true` or `1`.",
    params(ListQuery),
    responses(
        (status = 200, description = "Fragments owned by the caller", body = FragmentListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorResponse),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(owner = %auth_user.owner_id))]
pub async fn list_fragments(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<FragmentListResponse>, AppError> {
    let fragments = state.repo.list(&auth_user.owner_id, query.expand()).await?;
    Ok(Json(FragmentListResponse {
        status: "ok",
        fragments,
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Fragments",
    operation_id = "createFragment",
    summary = "Create a fragment",
    description = "Stores the raw request body as a new fragment. The `Content-Type` header \
        becomes the fragment type and must be one of the supported types.",
    request_body(content_type = "application/octet-stream", description = "Raw fragment data"),
    responses(
        (status = 201, description = "Fragment created", body = FragmentResponse,
            headers(("Location" = String, description = "URL of the new fragment"))),
        (status = 400, description = "Empty body (VALIDATION_ERROR)", body = ErrorResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorResponse),
        (status = 413, description = "Body over the size limit (PAYLOAD_TOO_LARGE)", body = ErrorResponse),
        (status = 415, description = "Unsupported type (UNSUPPORTED_MEDIA_TYPE)", body = ErrorResponse),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, headers, body), fields(owner = %auth_user.owner_id))]
pub async fn create_fragment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, AppError> {
    let content_type = content_type(&headers)?;
    if !Fragment::is_supported_type(content_type) {
        return Err(AppError::UnsupportedMediaType(format!(
            "Unsupported fragment type: {content_type}"
        )));
    }
    let body = payload(body)?;

    let fragment = state
        .repo
        .create(&auth_user.owner_id, content_type, &body)
        .await?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location(&headers, fragment.id()))],
        Json(FragmentResponse::ok(fragment)),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Fragments",
    operation_id = "getFragment",
    summary = "Fetch fragment data",
    description = "Returns the stored bytes with the stored `Content-Type`. Appending an \
        extension (`/{id}.html`, `/{id}.webp`) converts the data to that type when the \
        fragment's type allows it.",
    params(("id" = String, Path, description = "Fragment id, optionally followed by `.ext`")),
    responses(
        (status = 200, description = "Fragment data in the requested representation"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorResponse),
        (status = 404, description = "Fragment not found (NOT_FOUND)", body = ErrorResponse),
        (status = 415, description = "Conversion not allowed (UNSUPPORTED_MEDIA_TYPE)", body = ErrorResponse),
        (status = 422, description = "Data could not be converted (CONVERSION_FAILED)", body = ErrorResponse),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(owner = %auth_user.owner_id))]
pub async fn get_fragment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(segment): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (id, extension) = split_extension(&segment);
    let fragment = state.repo.get(&auth_user.owner_id, id).await?;
    let data = state.repo.load_data(&fragment).await?;
    let rendition = negotiate_and_convert(&fragment, data, extension).await?;

    Ok((
        [(header::CONTENT_TYPE, rendition.content_type)],
        rendition.data,
    ))
}

#[utoipa::path(
    get,
    path = "/{id}/info",
    tag = "Fragments",
    operation_id = "getFragmentInfo",
    summary = "Fetch fragment metadata",
    params(("id" = String, Path, description = "Fragment id")),
    responses(
        (status = 200, description = "Fragment metadata", body = FragmentResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorResponse),
        (status = 404, description = "Fragment not found (NOT_FOUND)", body = ErrorResponse),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(owner = %auth_user.owner_id))]
pub async fn get_fragment_info(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FragmentResponse>, AppError> {
    let fragment = state.repo.get(&auth_user.owner_id, &id).await?;
    Ok(Json(FragmentResponse::ok(fragment)))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Fragments",
    operation_id = "updateFragment",
    summary = "Replace fragment data",
    description = "Replaces the data of an existing fragment. The `Content-Type` must have the \
        same base type as the fragment; a fragment's type never changes.",
    params(("id" = String, Path, description = "Fragment id")),
    request_body(content_type = "application/octet-stream", description = "Replacement data"),
    responses(
        (status = 200, description = "Fragment updated", body = FragmentResponse),
        (status = 400, description = "Empty body (VALIDATION_ERROR) or type change (TYPE_MISMATCH)", body = ErrorResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorResponse),
        (status = 404, description = "Fragment not found (NOT_FOUND)", body = ErrorResponse),
        (status = 413, description = "Body over the size limit (PAYLOAD_TOO_LARGE)", body = ErrorResponse),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, headers, body), fields(owner = %auth_user.owner_id))]
pub async fn update_fragment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<FragmentResponse>, AppError> {
    let content_type = content_type(&headers)?;
    let body = payload(body)?;

    let fragment = state
        .repo
        .replace_data(&auth_user.owner_id, &id, &body, content_type)
        .await?;

    Ok(Json(FragmentResponse::ok(fragment)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Fragments",
    operation_id = "deleteFragment",
    summary = "Delete a fragment",
    params(("id" = String, Path, description = "Fragment id")),
    responses(
        (status = 200, description = "Fragment deleted", body = StatusResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorResponse),
        (status = 404, description = "Fragment not found (NOT_FOUND)", body = ErrorResponse),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(owner = %auth_user.owner_id))]
pub async fn delete_fragment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, AppError> {
    state.repo.delete(&auth_user.owner_id, &id).await?;
    Ok(Json(StatusResponse { status: "ok" }))
}
