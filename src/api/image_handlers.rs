use axum::{
    extract::{Multipart, Path, Query, State},
    Json as RequestJson,
};
use chrono::Utc;

use crate::api::envelope::{
    classify_storage_error, created, deleted, ensure_valid_id, success, success_list, updated,
    ApiError, ApiResult,
};
use crate::api::handlers::AppState;
use crate::model::{
    filename_stem, generate_id, Id, Image, ImageCategory, ImageFilter, ImageUpdate,
};
use crate::store::Store;

/// Uploaded files are capped at 10 MB by the explicit check in
/// [`upload_image`], which produces an enveloped error
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Body limit for the upload route: the file cap plus headroom for the
/// multipart framing and text fields, so a file just under the cap reaches
/// the handler instead of being cut off with a bare 413
pub const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 1024 * 1024;

const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    "image/bmp",
    "image/tiff",
];

#[derive(Debug, Default)]
struct UploadForm {
    file: Option<(String, String, Vec<u8>)>,
    name: Option<String>,
    category: Option<ImageCategory>,
    tags: Vec<String>,
    description: Option<String>,
    alt: Option<String>,
    folder: Option<String>,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Invalid upload payload: {}", e)))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "image" => {
                let original_name = field.file_name().unwrap_or("upload").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(format!("Invalid upload payload: {}", e)))?;
                form.file = Some((original_name, mime_type, bytes.to_vec()));
            }
            "name" => form.name = Some(read_text(field).await?),
            "category" => {
                let raw = read_text(field).await?;
                let category = serde_json::from_value(serde_json::Value::String(raw.clone()))
                    .map_err(|_| {
                        ApiError::validation(format!("Invalid image category: {}", raw))
                    })?;
                form.category = Some(category);
            }
            "tags" => {
                let raw = read_text(field).await?;
                form.tags = raw
                    .split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect();
            }
            "description" => form.description = Some(read_text(field).await?),
            "alt" => form.alt = Some(read_text(field).await?),
            "folder" => form.folder = Some(read_text(field).await?),
            _ => {}
        }
    }

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::validation(format!("Invalid upload payload: {}", e)))
}

pub async fn upload_image<S: Store>(
    State(state): State<AppState<S>>,
    multipart: Multipart,
) -> ApiResult<Image> {
    let form = read_upload_form(multipart).await?;

    let (original_name, mime_type, bytes) = form
        .file
        .ok_or_else(|| ApiError::validation("No image file provided"))?;

    if !ALLOWED_MIME_TYPES.contains(&mime_type.as_str()) {
        return Err(ApiError::validation(
            "Invalid file type. Only image files are allowed.",
        ));
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ApiError::validation("File too large. Maximum size is 10MB."));
    }

    let folder = form.folder.unwrap_or_else(|| state.media_folder.clone());
    let upload = state
        .media
        .upload_image(bytes, &original_name, &folder)
        .await
        .map_err(|e| ApiError::External(format!("Failed to upload image: {}", e)))?;

    let stem = filename_stem(&original_name);
    let now = Utc::now();
    let image = Image {
        id: generate_id(),
        name: form.name.filter(|n| !n.trim().is_empty()).unwrap_or_else(|| stem.clone()),
        original_name,
        filename: upload.public_id.clone(),
        url: upload.secure_url.clone(),
        cloudinary_public_id: upload.public_id,
        cloudinary_secure_url: upload.secure_url,
        mime_type,
        size: upload.bytes,
        width: upload.width,
        height: upload.height,
        category: form.category.unwrap_or_default(),
        tags: form.tags,
        description: form.description.unwrap_or_default(),
        alt: form.alt.filter(|a| !a.trim().is_empty()).unwrap_or(stem),
        status: Default::default(),
        created_at: now,
        updated_at: now,
    };

    state
        .store
        .upsert_image(image.clone())
        .await
        .map_err(|e| classify_storage_error(e, "Failed to upload image"))?;

    Ok(created(image, "Image uploaded successfully"))
}

pub async fn list_images<S: Store>(
    State(state): State<AppState<S>>,
    Query(filter): Query<ImageFilter>,
) -> ApiResult<Vec<Image>> {
    let images = state
        .store
        .list_images(&filter)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to fetch images"))?;

    Ok(success_list(images, "Success"))
}

pub async fn get_image<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Image> {
    ensure_valid_id(&id, "Invalid ID format")?;

    let image = state
        .store
        .get_image(&id)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to fetch image"))?
        .ok_or_else(|| ApiError::not_found("Image not found"))?;

    Ok(success(image, "Success"))
}

pub async fn update_image<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    RequestJson(update): RequestJson<ImageUpdate>,
) -> ApiResult<Image> {
    ensure_valid_id(&id, "Invalid ID format")?;

    let mut image = state
        .store
        .get_image(&id)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to update image"))?
        .ok_or_else(|| ApiError::not_found("Image not found"))?;

    if let Some(name) = update.name {
        image.name = name;
    }
    if let Some(category) = update.category {
        image.category = category;
    }
    if let Some(tags) = update.tags {
        image.tags = tags.into_tags();
    }
    if let Some(description) = update.description {
        image.description = description;
    }
    if let Some(alt) = update.alt {
        image.alt = alt;
    }
    if let Some(status) = update.status {
        image.status = status;
    }
    image.updated_at = Utc::now();

    state
        .store
        .upsert_image(image.clone())
        .await
        .map_err(|e| classify_storage_error(e, "Failed to update image"))?;

    Ok(updated(image, "Image updated successfully"))
}

pub async fn delete_image<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<serde_json::Value> {
    ensure_valid_id(&id, "Invalid ID format")?;

    let image = state
        .store
        .get_image(&id)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to delete image"))?
        .ok_or_else(|| ApiError::not_found("Image not found"))?;

    // Remote removal is best effort; the library record goes away regardless
    if let Err(e) = state.media.delete_image(&image.cloudinary_public_id).await {
        log::warn!(
            "failed to delete {} from the media host: {}",
            image.cloudinary_public_id,
            e
        );
    }

    state
        .store
        .delete_image(&id)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to delete image"))?;

    Ok(deleted("Image deleted successfully"))
}

#[derive(Debug, serde::Deserialize)]
pub struct BulkDeleteBody {
    pub ids: Option<Vec<Id>>,
}

pub async fn bulk_delete_images<S: Store>(
    State(state): State<AppState<S>>,
    RequestJson(body): RequestJson<BulkDeleteBody>,
) -> ApiResult<serde_json::Value> {
    let ids = match body.ids {
        Some(ids) if !ids.is_empty() => ids,
        _ => return Err(ApiError::validation("Array of image IDs is required")),
    };

    let images = state
        .store
        .find_images_by_ids(&ids)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to delete images"))?;

    for image in &images {
        if let Err(e) = state.media.delete_image(&image.cloudinary_public_id).await {
            log::warn!(
                "failed to delete {} from the media host: {}",
                image.cloudinary_public_id,
                e
            );
        }
    }

    state
        .store
        .delete_images(&ids)
        .await
        .map_err(|e| classify_storage_error(e, "Failed to delete images"))?;

    Ok(deleted(&format!(
        "{} image(s) deleted successfully",
        images.len()
    )))
}
