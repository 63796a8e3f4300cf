//! HTTP handlers.
//!
//! | route                         | purpose                                  |
//! |-------------------------------|------------------------------------------|
//! | `GET /status`                 | liveness text                            |
//! | `GET /health`                 | heartbeat with version                   |
//! | `GET /conversions`            | the dispatch table                       |
//! | `POST /process`               | multipart or JSON upload, default `link` |
//! | `POST /convert/{tag}`         | multipart upload, default `stream`       |
//! | `GET /download/{file_name}`   | stream a stored result                   |
//! | `DELETE /download/{file_name}`| delete a stored result                   |

use super::state::AppState;
use crate::convert::convert_tag;
use crate::error::ConvertError;
use crate::kind::CONVERSIONS;
use crate::materialize::{materialize, Materialized, OutputMode};
use crate::pipeline::encode::from_base64;
use crate::pipeline::input::{fetch_remote, is_url, InputFile};
use crate::stream::file_stream;
use axum::body::Body;
use axum::extract::{FromRequest, Multipart, Path, Query, Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Register every route.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/status", get(get_status))
        .route("/health", get(get_health))
        .route("/conversions", get(list_conversions))
        .route("/process", post(process))
        .route("/process/", post(process))
        .route("/convert/{tag}", post(convert_tagged))
        .route("/convert/{tag}/", post(convert_tagged))
        .route(
            "/download/{file_name}",
            get(download_file).delete(delete_file),
        )
}

pub async fn get_status() -> Json<Value> {
    Json(json!({ "status": "File Conversion API is running." }))
}

/// Heartbeat endpoint: `{"status": "ok", "version": "..."}`.
pub async fn get_health() -> Json<Value> {
    Json(json!({
        "status":  "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// The dispatch table: tag, label, accepted MIME types, output format.
pub async fn list_conversions() -> Json<Value> {
    let conversions: Vec<Value> = CONVERSIONS
        .iter()
        .map(|spec| {
            json!({
                "tag": spec.tag,
                "label": spec.label,
                "accepts": spec.accepts,
                "output_extension": spec.output.extension(),
                "output_content_type": spec.output.content_type(),
            })
        })
        .collect();
    Json(json!({ "conversions": conversions }))
}

/// JSON body accepted by `POST /process`.
#[derive(Debug, Deserialize)]
pub struct ProcessJson {
    pub file_type: String,
    pub file_name: Option<String>,
    /// Base64 payload, optionally as a `data:` URI.
    pub data: Option<String>,
    /// Remote file to download instead of `data`.
    pub url: Option<String>,
    pub content_type: Option<String>,
    pub output: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OutputQuery {
    pub output: Option<String>,
}

/// Fields collected from a multipart upload.
#[derive(Debug, Default)]
struct UploadForm {
    file_type: Option<String>,
    output: Option<String>,
    file: Option<InputFile>,
}

/// `POST /process`: convert a multipart or JSON upload.
pub async fn process(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
) -> Result<Response, ConvertError> {
    let limit = state.server.max_upload_bytes;

    let (tag, input, output) = if is_multipart(&headers) {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| rejection(e.status(), e.body_text(), limit))?;
        let form = read_form(multipart, limit).await?;
        let tag = form
            .file_type
            .ok_or_else(|| ConvertError::InvalidRequest("missing field 'file_type'".into()))?;
        let input = form
            .file
            .ok_or_else(|| ConvertError::InvalidRequest("missing field 'file'".into()))?;
        (tag, input, form.output)
    } else {
        let Json(body) = Json::<ProcessJson>::from_request(request, &state)
            .await
            .map_err(|e| rejection(e.status(), e.body_text(), limit))?;
        let input = json_input(&body, &state, limit).await?;
        (body.file_type, input, body.output)
    };

    let mode = match output {
        Some(m) => m.parse()?,
        None => state.server.default_output,
    };
    run(&state, &tag, input, mode).await
}

/// `POST /convert/{tag}`: convert a multipart upload; streams by default.
pub async fn convert_tagged(
    State(state): State<Arc<AppState>>,
    Path(tag): Path<String>,
    Query(query): Query<OutputQuery>,
    request: Request,
) -> Result<Response, ConvertError> {
    let limit = state.server.max_upload_bytes;
    let multipart = Multipart::from_request(request, &state)
        .await
        .map_err(|e| rejection(e.status(), e.body_text(), limit))?;
    let form = read_form(multipart, limit).await?;
    let input = form
        .file
        .ok_or_else(|| ConvertError::InvalidRequest("missing field 'file'".into()))?;
    let mode = match query.output.or(form.output) {
        Some(m) => m.parse()?,
        None => OutputMode::Stream,
    };
    run(&state, &tag, input, mode).await
}

/// `GET /download/{file_name}`: stream a stored file.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(file_name): Path<String>,
) -> Result<Response, ConvertError> {
    let path = state.store.resolve(&file_name).await?;
    let (len, stream) = file_stream(&path).await?;
    let content_type = mime_guess::from_path(&file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    let mut response = Body::from_stream(stream).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, header_value(&content_type)?);
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    headers.insert(
        header::CONTENT_DISPOSITION,
        header_value(&attachment(&file_name))?,
    );
    Ok(response)
}

/// `DELETE /download/{file_name}`.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(file_name): Path<String>,
) -> Result<Json<Value>, ConvertError> {
    state.store.remove(&file_name).await?;
    Ok(Json(json!({ "deleted": file_name })))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Dispatch, convert, then materialise in `mode`.
async fn run(
    state: &AppState,
    tag: &str,
    input: InputFile,
    mode: OutputMode,
) -> Result<Response, ConvertError> {
    let stem = input.stem();
    let output = convert_tag(tag, input, &state.conversion).await?;
    let materialized = materialize(
        mode,
        output,
        &stem,
        &state.store,
        &state.server.public_base_url,
    )
    .await?;

    Ok(match materialized {
        Materialized::Link(body) => Json(body).into_response(),
        Materialized::Base64(body) => Json(body).into_response(),
        Materialized::Stream(artifact) => {
            let disposition = header_value(&attachment(&artifact.file_name))?;
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, HeaderValue::from_static(artifact.content_type)),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                artifact.bytes,
            )
                .into_response()
        }
    })
}

async fn read_form(mut multipart: Multipart, limit: usize) -> Result<UploadForm, ConvertError> {
    let mut form = UploadForm::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| rejection(e.status(), e.body_text(), limit))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);

                let mut bytes = Vec::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| rejection(e.status(), e.body_text(), limit))?
                {
                    bytes.extend_from_slice(&chunk);
                    if bytes.len() > limit {
                        return Err(ConvertError::PayloadTooLarge {
                            size: bytes.len(),
                            limit,
                        });
                    }
                }
                debug!(
                    file_name = %file_name,
                    content_type = ?content_type,
                    size_bytes = bytes.len(),
                    "received file upload"
                );
                form.file = Some(InputFile::new(&file_name, content_type, bytes));
            }
            "file_type" | "output" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| rejection(e.status(), e.body_text(), limit))?;
                if name == "file_type" {
                    form.file_type = Some(value);
                } else {
                    form.output = Some(value);
                }
            }
            other => debug!(field = other, "ignoring unknown multipart field"),
        }
    }
    Ok(form)
}

/// Build the input for a JSON request from `data` or `url`.
async fn json_input(
    body: &ProcessJson,
    state: &AppState,
    limit: usize,
) -> Result<InputFile, ConvertError> {
    let input = match (&body.data, &body.url) {
        (Some(data), _) => {
            let bytes = from_base64(data).map_err(|e| ConvertError::InvalidBase64(e.to_string()))?;
            let name = body.file_name.as_deref().unwrap_or("upload");
            InputFile::new(name, body.content_type.clone(), bytes)
        }
        (None, Some(url)) if is_url(url) => {
            let mut input =
                fetch_remote(url, state.conversion.download_timeout_secs, limit).await?;
            if let Some(name) = &body.file_name {
                input = InputFile::new(name, input.content_type.take(), input.bytes);
            }
            if body.content_type.is_some() {
                input.content_type = body.content_type.clone();
            }
            input
        }
        (None, Some(url)) => {
            return Err(ConvertError::InvalidRequest(format!(
                "'url' must start with http:// or https://, got '{url}'"
            )))
        }
        (None, None) => {
            return Err(ConvertError::InvalidRequest(
                "either 'data' or 'url' is required".into(),
            ))
        }
    };

    if input.bytes.len() > limit {
        return Err(ConvertError::PayloadTooLarge {
            size: input.bytes.len(),
            limit,
        });
    }
    Ok(input)
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("multipart/form-data"))
}

/// Map an extractor rejection to our error type.
///
/// When the body limit trips the exact size is unknown; it is reported as
/// one byte over the limit.
fn rejection(status: StatusCode, text: String, limit: usize) -> ConvertError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ConvertError::PayloadTooLarge {
            size: limit.saturating_add(1),
            limit,
        }
    } else {
        ConvertError::InvalidRequest(text)
    }
}

fn attachment(file_name: &str) -> String {
    format!("attachment; filename=\"{}\"", file_name.replace('"', ""))
}

fn header_value(s: &str) -> Result<HeaderValue, ConvertError> {
    HeaderValue::from_str(s).map_err(|e| ConvertError::Internal(format!("bad header value: {e}")))
}
