//! End-to-end tests over the full router backed by the in-memory store and
//! a stubbed media host.

use appcanvas::api::{create_router, AppState};
use appcanvas::config::Environment;
use appcanvas::media::{MediaError, MediaHost, MediaUpload};
use appcanvas::store::MemoryStore;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct StubMediaHost;

#[async_trait::async_trait]
impl MediaHost for StubMediaHost {
    async fn upload_image(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        folder: &str,
    ) -> Result<MediaUpload, MediaError> {
        Ok(MediaUpload {
            public_id: format!("{}/{}", folder, filename),
            secure_url: format!("https://media.test/{}/{}", folder, filename),
            bytes: bytes.len() as i64,
            width: Some(64),
            height: Some(64),
        })
    }

    async fn delete_image(&self, _public_id: &str) -> Result<(), MediaError> {
        Ok(())
    }
}

fn test_app() -> Router {
    let state = AppState {
        store: Arc::new(MemoryStore::new()),
        media: Arc::new(StubMediaHost),
        media_folder: "zero-code-platform".to_string(),
        environment: Environment::Test,
    };
    create_router().with_state(state)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(value) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_app_named(app: &Router, name: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/apps",
        Some(json!({"name": name})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"].clone()
}

async fn create_screen_for(app: &Router, application_id: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/screens",
        Some(json!({"applicationId": application_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"].clone()
}

async fn create_component_on(app: &Router, screen: &Value, extra: Value) -> Value {
    let mut payload = json!({
        "screenId": screen["id"],
        "applicationId": screen["applicationId"],
        "type": "button"
    });
    if let (Some(base), Some(more)) = (payload.as_object_mut(), extra.as_object()) {
        for (k, v) in more {
            base.insert(k.clone(), v.clone());
        }
    }
    let (status, body) = send(app, Method::POST, "/api/components", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"].clone()
}

#[tokio::test]
async fn health_reports_environment() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["environment"], "test");
}

#[tokio::test]
async fn unknown_routes_get_an_enveloped_404() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/api/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Not Found - /api/nope");
}

#[tokio::test]
async fn app_names_are_unique() {
    let app = test_app();
    create_app_named(&app, "Store Front").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/apps",
        Some(json!({"name": "Store Front"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "App name already exists");
}

#[tokio::test]
async fn app_name_is_required_and_capped() {
    let app = test_app();

    let (status, body) = send(&app, Method::POST, "/api/apps", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "App name is required");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/apps",
        Some(json!({"name": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "App name is required");

    let long = "x".repeat(101);
    let (status, body) = send(&app, Method::POST, "/api/apps", Some(json!({"name": long}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "App name cannot exceed 100 characters");
}

#[tokio::test]
async fn created_apps_carry_the_default_theme() {
    let app = test_app();
    let created = create_app_named(&app, "Themed").await;
    assert_eq!(created["theme"]["colors"]["primary"], "#3b82f6");
    assert_eq!(created["theme"]["cornerRadius"]["medium"], "8px");
    assert_eq!(created["theme"]["version"], "1.0.0");
}

#[tokio::test]
async fn malformed_ids_are_rejected_with_400() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/api/apps/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid app ID");
}

#[tokio::test]
async fn list_envelope_carries_count_matching_data() {
    let app = test_app();
    create_app_named(&app, "One").await;
    create_app_named(&app, "Two").await;

    let (status, body) = send(&app, Method::GET, "/api/apps", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn app_search_filters_by_name_fragment() {
    let app = test_app();
    create_app_named(&app, "Shop Admin").await;
    create_app_named(&app, "Blog").await;

    let (status, body) = send(&app, Method::GET, "/api/apps?search=shop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["name"], "Shop Admin");
}

#[tokio::test]
async fn screens_require_an_existing_app() {
    let app = test_app();

    let (status, body) = send(&app, Method::POST, "/api/screens", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Application ID is required");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/screens",
        Some(json!({"applicationId": "9f4c2f64-0000-0000-0000-000000000000"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "App not found");
}

#[tokio::test]
async fn new_screens_get_builder_defaults() {
    let app = test_app();
    let application = create_app_named(&app, "Canvas").await;
    let screen = create_screen_for(&app, application["id"].as_str().unwrap()).await;

    assert_eq!(screen["data"]["label"], "Screen-1");
    assert_eq!(screen["data"]["type"], "screen");
    assert_eq!(screen["position"], json!({"x": 0.0, "y": 0.0}));
    assert_eq!(screen["hidden"], false);
    assert_eq!(screen["components"], json!([]));
    assert_eq!(screen["status"], "draft");
}

#[tokio::test]
async fn screen_position_patch_is_partial() {
    let app = test_app();
    let application = create_app_named(&app, "Canvas").await;
    let screen = create_screen_for(&app, application["id"].as_str().unwrap()).await;
    let screen_id = screen["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/screens/{}", screen_id),
        Some(json!({"position": {"x": 10.0, "y": 20.0}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/screens/{}/position", screen_id),
        Some(json!({"position": {"x": 5.0}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["position"], json!({"x": 5.0, "y": 20.0}));
}

#[tokio::test]
async fn screen_data_merges_key_wise_on_update() {
    let app = test_app();
    let application = create_app_named(&app, "Canvas").await;
    let screen = create_screen_for(&app, application["id"].as_str().unwrap()).await;
    let screen_id = screen["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/screens/{}", screen_id),
        Some(json!({"data": {"label": "Home"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["data"]["label"], "Home");
    // untouched keys survive the merge
    assert_eq!(body["data"]["data"]["type"], "screen");
}

#[tokio::test]
async fn component_creation_requires_the_chain_of_references() {
    let app = test_app();

    let (status, body) = send(&app, Method::POST, "/api/components", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Screen ID is required");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/components",
        Some(json!({"screenId": "s", "applicationId": "a"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Component type is required");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/components",
        Some(json!({"screenId": "missing", "applicationId": "a", "type": "button"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Screen not found");
}

#[tokio::test]
async fn component_parents_must_exist_at_creation() {
    let app = test_app();
    let application = create_app_named(&app, "Canvas").await;
    let screen = create_screen_for(&app, application["id"].as_str().unwrap()).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/components",
        Some(json!({
            "screenId": screen["id"],
            "applicationId": screen["applicationId"],
            "type": "button",
            "parentId": "9f4c2f64-0000-0000-0000-000000000000"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Parent component not found");
}

#[tokio::test]
async fn components_merge_type_template_under_caller_styles() {
    let app = test_app();
    let application = create_app_named(&app, "Canvas").await;
    let screen = create_screen_for(&app, application["id"].as_str().unwrap()).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/component-types",
        Some(json!({
            "type": "button",
            "name": "Button",
            "defaultStyles": {"color": "#0000ff", "padding": "8px"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let component =
        create_component_on(&app, &screen, json!({"styles": {"padding": "12px"}})).await;

    assert_eq!(component["styles"]["color"], "#0000ff"); // template
    assert_eq!(component["styles"]["padding"], "12px"); // caller wins
    assert_eq!(component["styles"]["fontSize"], "16px"); // static default
    assert_eq!(component["hidden"], true);
    assert_eq!(component["status"], "draft");
}

#[tokio::test]
async fn component_style_overlays_are_validated_field_by_field() {
    let app = test_app();
    let application = create_app_named(&app, "Canvas").await;
    let screen = create_screen_for(&app, application["id"].as_str().unwrap()).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/components",
        Some(json!({
            "screenId": screen["id"],
            "applicationId": screen["applicationId"],
            "type": "button",
            "styles": {"fontSize": 16, "custom": "nope"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    assert!(body["errors"]["fontSize"].is_string());
    assert!(body["errors"]["custom"].is_string());
}

#[tokio::test]
async fn component_styles_patch_merges_and_keeps_the_rest() {
    let app = test_app();
    let application = create_app_named(&app, "Canvas").await;
    let screen = create_screen_for(&app, application["id"].as_str().unwrap()).await;
    let component = create_component_on(&app, &screen, json!({})).await;
    let component_id = component["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/components/{}/styles", component_id),
        Some(json!({"styles": {"color": "#ff0000"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["styles"]["color"], "#ff0000");
    assert_eq!(body["data"]["styles"]["fontSize"], "16px");

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/components/{}/styles", component_id),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Styles object is required");
}

#[tokio::test]
async fn detaching_a_component_takes_an_explicit_null_parent() {
    let app = test_app();
    let application = create_app_named(&app, "Canvas").await;
    let screen = create_screen_for(&app, application["id"].as_str().unwrap()).await;
    let parent = create_component_on(&app, &screen, json!({})).await;
    let child =
        create_component_on(&app, &screen, json!({"parentId": parent["id"]})).await;
    let child_id = child["id"].as_str().unwrap();

    // absent parentId leaves the attachment alone
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/components/{}", child_id),
        Some(json!({"order": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["parentId"], parent["id"]);
    assert_eq!(body["data"]["order"], 3);

    // explicit null detaches
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/components/{}", child_id),
        Some(json!({"parentId": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["parentId"], Value::Null);
}

#[tokio::test]
async fn deleting_a_component_cascades_exactly_one_level() {
    let app = test_app();
    let application = create_app_named(&app, "Canvas").await;
    let screen = create_screen_for(&app, application["id"].as_str().unwrap()).await;
    let parent = create_component_on(&app, &screen, json!({})).await;
    let child =
        create_component_on(&app, &screen, json!({"parentId": parent["id"]})).await;
    let grandchild =
        create_component_on(&app, &screen, json!({"parentId": child["id"]})).await;

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/components/{}", parent["id"].as_str().unwrap()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/components/{}", child["id"].as_str().unwrap()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // the grandchild survives as an orphan with a dangling parent reference
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/components/{}", grandchild["id"].as_str().unwrap()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["parentId"], child["id"]);
    assert!(body["data"]["parent"].is_null());
}

#[tokio::test]
async fn screen_reads_list_components_in_order() {
    let app = test_app();
    let application = create_app_named(&app, "Canvas").await;
    let screen = create_screen_for(&app, application["id"].as_str().unwrap()).await;
    create_component_on(&app, &screen, json!({"order": 2})).await;
    create_component_on(&app, &screen, json!({"order": 1})).await;

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/components/screen/{}", screen["id"].as_str().unwrap()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"][0]["order"], 1);
    assert_eq!(body["data"][1]["order"], 2);
}

#[tokio::test]
async fn palette_initialization_is_idempotent() {
    let app = test_app();

    let (status, body) = send(&app, Method::POST, "/api/component-types/initialize", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["created"], 28);
    assert_eq!(body["data"]["existing"], 0);

    let (status, body) = send(&app, Method::POST, "/api/component-types/initialize", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["created"], 0);
    assert_eq!(body["data"]["existing"], 28);
    assert_eq!(
        body["data"]["message"],
        "Initialized 0 new component types. 28 already existed."
    );

    let (status, body) = send(&app, Method::GET, "/api/component-types", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 28);
}

#[tokio::test]
async fn component_types_are_unique_per_kind_and_readable_by_kind() {
    let app = test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/component-types",
        Some(json!({"type": "button"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Component name is required");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/component-types",
        Some(json!({"type": "button", "name": "Button"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/component-types",
        Some(json!({"type": "button", "name": "Other Button"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Component type already exists");

    let (status, body) = send(&app, Method::GET, "/api/component-types/button", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Button");

    let (status, body) = send(&app, Method::GET, "/api/component-types/carousel", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Component type not found");
}

fn multipart_body(
    boundary: &str,
    filename: &str,
    content_type: &str,
    file_bytes: &[u8],
    fields: &[(&str, &str)],
) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{f}\"\r\nContent-Type: {c}\r\n\r\n",
            b = boundary,
            f = filename,
            c = content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(file_bytes);
    body.extend_from_slice(b"\r\n");
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"{n}\"\r\n\r\n{v}\r\n",
                b = boundary,
                n = name,
                v = value
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}

async fn send_upload(
    app: &Router,
    filename: &str,
    content_type: &str,
    fields: &[(&str, &str)],
) -> (StatusCode, Value) {
    let boundary = "canvas-test-boundary";
    let body = multipart_body(boundary, filename, content_type, b"fake image bytes", fields);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/images/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn image_upload_stores_the_media_host_locators() {
    let app = test_app();
    let (status, body) = send_upload(
        &app,
        "logo.png",
        "image/png",
        &[("tags", "hero, banner"), ("category", "logo")],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let image = &body["data"];
    assert_eq!(image["name"], "logo");
    assert_eq!(image["alt"], "logo");
    assert_eq!(image["originalName"], "logo.png");
    assert_eq!(image["category"], "logo");
    assert_eq!(image["tags"], json!(["hero", "banner"]));
    assert_eq!(image["status"], "active");
    assert_eq!(image["cloudinaryPublicId"], "zero-code-platform/logo.png");
    assert_eq!(
        image["url"],
        "https://media.test/zero-code-platform/logo.png"
    );
}

#[tokio::test]
async fn oversized_uploads_get_an_enveloped_rejection() {
    let app = test_app();
    let boundary = "canvas-test-boundary";
    // one byte past the 10 MB file cap, still inside the route body limit
    let oversized = vec![0u8; 10 * 1024 * 1024 + 1];
    let body = multipart_body(boundary, "huge.png", "image/png", &oversized, &[]);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/images/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["status"], "error");
    assert_eq!(value["message"], "File too large. Maximum size is 10MB.");
}

#[tokio::test]
async fn non_image_uploads_are_rejected() {
    let app = test_app();
    let (status, body) = send_upload(&app, "notes.txt", "text/plain", &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Invalid file type. Only image files are allowed."
    );
}

#[tokio::test]
async fn bulk_delete_requires_a_non_empty_id_array() {
    let app = test_app();

    let (status, body) = send(
        &app,
        Method::DELETE,
        "/api/images/bulk",
        Some(json!({"ids": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Array of image IDs is required");

    let (status, body) = send(&app, Method::DELETE, "/api/images/bulk", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Array of image IDs is required");
}

#[tokio::test]
async fn bulk_delete_reports_how_many_records_existed() {
    let app = test_app();
    let (_, body) = send_upload(&app, "one.png", "image/png", &[]).await;
    let first = body["data"]["id"].as_str().unwrap().to_string();
    let (_, body) = send_upload(&app, "two.png", "image/png", &[]).await;
    let second = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::DELETE,
        "/api/images/bulk",
        Some(json!({"ids": [first, second, "9f4c2f64-0000-0000-0000-000000000000"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "2 image(s) deleted successfully");

    let (status, body) = send(&app, Method::GET, "/api/images", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
}
