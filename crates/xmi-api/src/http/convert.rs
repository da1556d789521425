//! `POST /v1/xmi`: multipart form in, XMI or IR artifact out.

use axum::{
    body::Body,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::Response,
};
use tracing::{error, info};
use xmi_core::Artifact;

use crate::http::errors::ApiError;
use crate::http::multipart::read_conversion_form;
use crate::state::ApiState;

pub(crate) async fn convert(
    State(state): State<ApiState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let multipart = multipart.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let request = read_conversion_form(multipart, state.limits.max_field_bytes).await?;
    let artifact = state.workflow.convert(request).await?;
    info!(
        format = artifact.format.as_str(),
        bytes = artifact.body.len(),
        "conversion succeeded"
    );
    artifact_response(artifact)
}

fn artifact_response(artifact: Artifact) -> Result<Response, ApiError> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, artifact.content_type());
    if let Some(name) = artifact.attachment_name() {
        builder = builder.header(CONTENT_DISPOSITION, format!("attachment; filename=\"{name}\""));
    }
    builder.body(Body::from(artifact.body)).map_err(|err| {
        error!(error = %err, "failed to build artifact response");
        ApiError::internal("failed to build artifact response")
    })
}
