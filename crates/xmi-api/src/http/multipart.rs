//! Decoding the conversion form into a [`ConversionRequest`].
//!
//! Every field is read chunk by chunk and rejected as soon as it passes the
//! per-field cap. Scalar text fields keep their last value, file fields may
//! appear at most once, and blank `exclude` values are dropped.

use axum::extract::Multipart;
use axum::extract::multipart::{Field, MultipartError};
use tracing::debug;
use xmi_core::ConversionRequest;

use crate::http::constants::{
    FIELD_ASSOCIATIONS, FIELD_DEPS, FIELD_EXCLUDE, FIELD_FAIL_ON_UNRESOLVED,
    FIELD_INCLUDE_ACCESSORS, FIELD_INCLUDE_CONSTRUCTORS, FIELD_INPUT_ZIP, FIELD_IR_FILE,
    FIELD_IR_JSON, FIELD_LANGUAGE, FIELD_NAME, FIELD_NESTED_TYPES, FIELD_NO_STEREOTYPES,
    FIELD_REPO_URL, FIELD_RESULT_FORMAT,
};
use crate::http::errors::ApiError;

fn malformed(err: &MultipartError) -> ApiError {
    ApiError::bad_request(format!("Malformed multipart body: {}", err.body_text()))
}

async fn read_bytes(
    field: &mut Field<'_>,
    name: &str,
    max_field_bytes: usize,
) -> Result<Vec<u8>, ApiError> {
    let mut buffer = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(|err| malformed(&err))? {
        if buffer.len().saturating_add(chunk.len()) > max_field_bytes {
            return Err(ApiError::bad_request(format!(
                "Field {name} exceeds the {max_field_bytes} byte limit"
            )));
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer)
}

async fn read_text(
    field: &mut Field<'_>,
    name: &str,
    max_field_bytes: usize,
) -> Result<String, ApiError> {
    let bytes = read_bytes(field, name, max_field_bytes).await?;
    String::from_utf8(bytes)
        .map_err(|_| ApiError::bad_request(format!("Field {name} must be UTF-8 text")))
}

fn store_file(slot: &mut Option<Vec<u8>>, name: &str, bytes: Vec<u8>) -> Result<(), ApiError> {
    if slot.is_some() {
        return Err(ApiError::bad_request(format!(
            "Field {name} may only be supplied once"
        )));
    }
    *slot = Some(bytes);
    Ok(())
}

fn text_slot<'a>(request: &'a mut ConversionRequest, name: &str) -> Option<&'a mut Option<String>> {
    let extraction = &mut request.extraction;
    let slot = match name {
        FIELD_IR_JSON => &mut request.ir_json,
        FIELD_LANGUAGE => &mut request.language,
        FIELD_RESULT_FORMAT => &mut request.result_format,
        FIELD_REPO_URL => &mut request.repo_url,
        FIELD_NAME => &mut extraction.name,
        FIELD_ASSOCIATIONS => &mut extraction.associations,
        FIELD_DEPS => &mut extraction.deps,
        FIELD_NESTED_TYPES => &mut extraction.nested_types,
        FIELD_INCLUDE_ACCESSORS => &mut extraction.include_accessors,
        FIELD_INCLUDE_CONSTRUCTORS => &mut extraction.include_constructors,
        FIELD_FAIL_ON_UNRESOLVED => &mut extraction.fail_on_unresolved,
        FIELD_NO_STEREOTYPES => &mut extraction.no_stereotypes,
        _ => return None,
    };
    Some(slot)
}

/// Read the whole conversion form.
pub(crate) async fn read_conversion_form(
    mut multipart: Multipart,
    max_field_bytes: usize,
) -> Result<ConversionRequest, ApiError> {
    let mut request = ConversionRequest::default();
    while let Some(mut field) = multipart.next_field().await.map_err(|err| malformed(&err))? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FIELD_INPUT_ZIP => {
                let bytes = read_bytes(&mut field, &name, max_field_bytes).await?;
                store_file(&mut request.input_zip, &name, bytes)?;
            }
            FIELD_IR_FILE => {
                let bytes = read_bytes(&mut field, &name, max_field_bytes).await?;
                store_file(&mut request.ir_file, &name, bytes)?;
            }
            FIELD_EXCLUDE => {
                let pattern = read_text(&mut field, &name, max_field_bytes).await?;
                if !pattern.trim().is_empty() {
                    request.extraction.exclude.push(pattern);
                }
            }
            _ if text_slot(&mut request, &name).is_some() => {
                let text = read_text(&mut field, &name, max_field_bytes).await?;
                if let Some(slot) = text_slot(&mut request, &name) {
                    *slot = Some(text);
                }
            }
            _ => {
                read_bytes(&mut field, &name, max_field_bytes).await?;
                debug!(field = %name, "ignoring unknown form field");
            }
        }
    }
    Ok(request)
}
