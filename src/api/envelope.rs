//! Uniform response envelope and storage-error classification. Every
//! handler outcome, success or failure, funnels through this module so the
//! wire shape is always `{status, message, data?, count?, errors?}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::store::DuplicateKeyError;

#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}

impl<T: Serialize> Envelope<T> {
    fn success(message: &str, count: Option<usize>, data: Option<T>) -> Self {
        Self {
            status: "success",
            message: message.to_string(),
            count,
            data,
            errors: None,
        }
    }
}

pub type ApiResult<T> = Result<(StatusCode, Json<Envelope<T>>), ApiError>;

/// 200 with a single payload
pub fn success<T: Serialize>(data: T, message: &str) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::OK, Json(Envelope::success(message, None, Some(data))))
}

/// 200 with an array payload; arrays always carry an explicit count
pub fn success_list<T: Serialize>(
    items: Vec<T>,
    message: &str,
) -> (StatusCode, Json<Envelope<Vec<T>>>) {
    let count = items.len();
    (
        StatusCode::OK,
        Json(Envelope::success(message, Some(count), Some(items))),
    )
}

/// 201 for freshly created resources
pub fn created<T: Serialize>(data: T, message: &str) -> (StatusCode, Json<Envelope<T>>) {
    (
        StatusCode::CREATED,
        Json(Envelope::success(message, None, Some(data))),
    )
}

/// Updates share the success shape
pub fn updated<T: Serialize>(data: T, message: &str) -> (StatusCode, Json<Envelope<T>>) {
    success(data, message)
}

/// 200 without a payload
pub fn deleted(message: &str) -> (StatusCode, Json<Envelope<serde_json::Value>>) {
    (StatusCode::OK, Json(Envelope::success(message, None, None)))
}

/// Domain error taxonomy; converted to the error envelope at the handler
/// boundary, never propagated further out
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        errors: Option<BTreeMap<String, String>>,
    },
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    External(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            errors: None,
        }
    }

    pub fn validation_fields(
        message: impl Into<String>,
        errors: BTreeMap<String, String>,
    ) -> Self {
        ApiError::Validation {
            message: message.into(),
            errors: Some(errors),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::External(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let errors = match &self {
            ApiError::Validation { errors, .. } => errors.clone(),
            _ => None,
        };
        let body = Envelope::<serde_json::Value> {
            status: "error",
            message: self.to_string(),
            count: None,
            data: None,
            errors,
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Rejects identifiers that are not UUID-shaped before they hit the store,
/// mirroring a cast error on a malformed document id. The message is
/// entity-specific at call sites ("Invalid app ID", ...).
pub fn ensure_valid_id(id: &str, message: &str) -> Result<(), ApiError> {
    Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| ApiError::validation(message))
}

fn field_for_constraint(constraint: &str) -> &'static str {
    match constraint {
        "apps_name_key" => "name",
        "component_types_type_key" => "type",
        "images_cloudinary_public_id_key" => "cloudinaryPublicId",
        _ => "field",
    }
}

/// Total classification of storage-layer failures into the envelope
/// taxonomy: duplicate keys and schema decode problems become validation
/// errors, everything else falls through to a generic error carrying the
/// caller-supplied default message context.
pub fn classify_storage_error(err: anyhow::Error, default_message: &str) -> ApiError {
    if let Some(dup) = err.downcast_ref::<DuplicateKeyError>() {
        return ApiError::validation(format!("{} already exists", dup.field));
    }

    if let Some(sqlx_err) = err.downcast_ref::<sqlx::Error>() {
        if let sqlx::Error::Database(db_err) = sqlx_err {
            if db_err.code().as_deref() == Some("23505") {
                let field = db_err
                    .constraint()
                    .map(field_for_constraint)
                    .unwrap_or("field");
                return ApiError::validation(format!("{} already exists", field));
            }
        }
    }

    if let Some(decode_err) = err.downcast_ref::<serde_json::Error>() {
        let mut errors = BTreeMap::new();
        errors.insert("document".to_string(), decode_err.to_string());
        return ApiError::validation_fields("Validation failed", errors);
    }

    log::error!("{}: {:#}", default_message, err);
    ApiError::Internal(format!("{}: {}", default_message, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_success_carries_count() {
        let (status, Json(body)) = success_list(vec![1, 2, 3], "Fetched");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "success");
        assert_eq!(body.count, Some(3));
        assert_eq!(body.data, Some(vec![1, 2, 3]));
    }

    #[test]
    fn deleted_omits_data_and_count() {
        let (status, Json(body)) = deleted("Gone");
        assert_eq!(status, StatusCode::OK);
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value, json!({"status": "success", "message": "Gone"}));
    }

    #[test]
    fn duplicate_key_classifies_to_field_message() {
        let err = anyhow::Error::new(DuplicateKeyError { field: "name" });
        let classified = classify_storage_error(err, "Failed to create app");
        match classified {
            ApiError::Validation { message, .. } => assert_eq!(message, "name already exists"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn decode_failures_classify_to_field_map() {
        let serde_err =
            serde_json::from_str::<crate::model::Styles>("{\"fontSize\": 5}").unwrap_err();
        let classified = classify_storage_error(anyhow::Error::new(serde_err), "Failed");
        match classified {
            ApiError::Validation { errors, .. } => {
                assert!(errors.unwrap().contains_key("document"))
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn unknown_errors_fall_through_to_internal() {
        let classified =
            classify_storage_error(anyhow::anyhow!("connection reset"), "Failed to fetch apps");
        match classified {
            ApiError::Internal(message) => {
                assert!(message.starts_with("Failed to fetch apps"));
                assert!(message.contains("connection reset"));
            }
            other => panic!("expected internal error, got {:?}", other),
        }
    }

    #[test]
    fn malformed_ids_are_rejected_before_the_store() {
        assert!(ensure_valid_id("not-a-uuid", "Invalid app ID").is_err());
        assert!(ensure_valid_id(&crate::model::generate_id(), "Invalid app ID").is_ok());
    }

    #[test]
    fn error_envelope_shape() {
        let err = ApiError::not_found("App not found");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
