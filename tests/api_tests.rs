use arenda::config::Config;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use base64::{Engine as _, engine::general_purpose};
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Router over an in-memory database and a throwaway images directory.
/// The `TempDir` must stay alive for the duration of the test.
async fn spawn_app() -> (Router, tempfile::TempDir) {
    let images_root = tempfile::tempdir().expect("Failed to create temp dir");

    let mut config = Config::default();
    config.general.database_url = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.storage.listing_images_path = images_root
        .path()
        .join("listings")
        .to_string_lossy()
        .into_owned();
    config.storage.user_images_path = images_root
        .path()
        .join("users")
        .to_string_lossy()
        .into_owned();
    // Keep registration fast; production params are irrelevant here.
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = arenda::api::create_app_state(config)
        .await
        .expect("Failed to create app state");

    (arenda::api::router(state), images_root)
}

async fn request_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_string(&json).unwrap())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

async fn register_user(app: &Router, name: &str, email: &str) -> i32 {
    let (status, body) = request_json(
        app,
        "POST",
        "/register",
        Some(serde_json::json!({
            "name": name,
            "email": email,
            "password": "secret",
            "phone": "+7 900 000-00-00"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    i32::try_from(body["data"]["id"].as_i64().unwrap()).unwrap()
}

fn listing_body(city: &str, price: i64, user_id: Option<i32>) -> serde_json::Value {
    serde_json::json!({
        "price": price,
        "rooms": 2,
        "total_area": 54.5,
        "kitchen_area": 10.0,
        "floor": 3,
        "total_floors": 9,
        "deposit": 30000,
        "commission_percent": 50.0,
        "address_city": city,
        "address_street": "Lenina",
        "address_house": "12",
        "type": "apartment",
        "description": "Bright two-room apartment",
        "user_id": user_id
    })
}

async fn create_listing(app: &Router, city: &str, price: i64, user_id: Option<i32>) -> i32 {
    let (status, body) = request_json(
        app,
        "POST",
        "/listings/",
        Some(listing_body(city, price, user_id)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    i32::try_from(body["data"]["id"].as_i64().unwrap()).unwrap()
}

#[tokio::test]
async fn test_register_and_login() {
    let (app, _images) = spawn_app().await;

    let user_id = register_user(&app, "alice", "alice@example.com").await;
    assert!(user_id > 0);

    // Same email again is a conflict and must not create a second account.
    let (status, body) = request_json(
        &app,
        "POST",
        "/register",
        Some(serde_json::json!({
            "name": "alice2",
            "email": "alice@example.com",
            "password": "other"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (status, body) = request_json(
        &app,
        "POST",
        "/login",
        Some(serde_json::json!({
            "email": "alice@example.com",
            "password": "secret"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "alice");
    assert_eq!(body["data"]["photo_base64"], serde_json::Value::Null);

    let (status, body) = request_json(
        &app,
        "POST",
        "/login",
        Some(serde_json::json!({
            "email": "alice@example.com",
            "password": "wrong"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    // Unknown email gets the same generic message as a wrong password.
    let (status, body) = request_json(
        &app,
        "POST",
        "/login",
        Some(serde_json::json!({
            "email": "nobody@example.com",
            "password": "secret"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_create_and_fetch_listing() {
    let (app, _images) = spawn_app().await;

    let owner_id = register_user(&app, "bob", "bob@example.com").await;
    let listing_id = create_listing(&app, "Moscow", 45000, Some(owner_id)).await;

    let (status, body) = request_json(&app, "GET", &format!("/listing/{listing_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "2-к. квартира, 54.5 м², 3/9 эт.");
    assert_eq!(body["data"]["price"], 45000);
    assert_eq!(body["data"]["owner_name"], "bob");
    assert_eq!(body["data"]["owner_email"], "bob@example.com");
    assert_eq!(body["data"]["type"], "apartment");
    assert_eq!(body["data"]["image_base64"], serde_json::Value::Null);

    let (status, body) = request_json(&app, "GET", "/listings/", None).await;
    assert_eq!(status, StatusCode::OK);
    let previews = body["data"].as_array().unwrap();
    assert_eq!(previews.len(), 1);
    assert_eq!(previews[0]["owner_name"], "bob");
    assert_eq!(previews[0]["liked_by_users"], serde_json::json!([]));

    let (status, _) = request_json(&app, "GET", "/listing/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_my_listings_filters_by_owner() {
    let (app, _images) = spawn_app().await;

    let alice = register_user(&app, "alice", "alice@example.com").await;
    let bob = register_user(&app, "bob", "bob@example.com").await;

    create_listing(&app, "Moscow", 40000, Some(alice)).await;
    create_listing(&app, "Moscow", 50000, Some(bob)).await;
    create_listing(&app, "Kazan", 30000, Some(bob)).await;

    let (status, body) =
        request_json(&app, "GET", &format!("/my-listings/?user_id={bob}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, body) =
        request_json(&app, "GET", &format!("/my-listings/?user_id={alice}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_pagination_skip_limit() {
    let (app, _images) = spawn_app().await;

    for i in 0..5 {
        create_listing(&app, "Moscow", 10000 + i, None).await;
    }

    let (status, body) = request_json(&app, "GET", "/listings/?skip=1&limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    let previews = body["data"].as_array().unwrap();
    assert_eq!(previews.len(), 2);
    // Insertion order, id ascending.
    assert_eq!(previews[0]["price"], 10001);
    assert_eq!(previews[1]["price"], 10002);
}

#[tokio::test]
async fn test_delete_listing_is_not_repeatable() {
    let (app, _images) = spawn_app().await;

    let listing_id = create_listing(&app, "Moscow", 45000, None).await;

    let (status, body) =
        request_json(&app, "DELETE", &format!("/listing/{listing_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    // Second attempt is a clean not-found, not an internal error.
    let (status, _) = request_json(&app, "DELETE", &format!("/listing/{listing_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request_json(&app, "GET", &format!("/listing/{listing_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_like_unlike_flow() {
    let (app, _images) = spawn_app().await;

    let user_id = register_user(&app, "alice", "alice@example.com").await;
    let listing_id = create_listing(&app, "Moscow", 45000, None).await;

    let like_uri = format!("/listing-like?listing_id={listing_id}&user_id={user_id}");
    let unlike_uri = format!("/listing-unlike?listing_id={listing_id}&user_id={user_id}");

    let (status, body) = request_json(&app, "POST", &like_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Like added");

    // Repeat like is a soft no-op and leaves a single like behind.
    let (status, body) = request_json(&app, "POST", &like_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Like already exists");

    let (_, body) = request_json(&app, "GET", "/listings/", None).await;
    assert_eq!(
        body["data"][0]["liked_by_users"],
        serde_json::json!([user_id])
    );

    let (_, body) = request_json(
        &app,
        "GET",
        &format!("/liked-listings/?user_id={user_id}"),
        None,
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = request_json(&app, "DELETE", &unlike_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Like removed");

    let (status, body) = request_json(&app, "DELETE", &unlike_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Like does not exist");

    let (_, body) = request_json(&app, "GET", "/listings/", None).await;
    assert_eq!(body["data"][0]["liked_by_users"], serde_json::json!([]));

    // Referencing a missing listing or user is a bad request.
    let (status, _) = request_json(
        &app,
        "POST",
        &format!("/listing-like?listing_id=9999&user_id={user_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request_json(
        &app,
        "POST",
        &format!("/listing-like?listing_id={listing_id}&user_id=9999"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_filtered_listings() {
    let (app, _images) = spawn_app().await;

    let alice = register_user(&app, "Alice", "alice@example.com").await;
    create_listing(&app, "Moscow", 40000, Some(alice)).await;
    create_listing(&app, "Kazan", 25000, None).await;

    let (status, body) =
        request_json(&app, "GET", "/filtered-listings/?query=city&value=mosc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) =
        request_json(&app, "GET", "/filtered-listings/?query=user&value=ali", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["owner_name"], "Alice");

    let (status, body) = request_json(
        &app,
        "GET",
        "/filtered-listings/?query=price&value=30000",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["price"], 25000);

    // Unparseable price is an error, not a silent empty result.
    let (status, body) =
        request_json(&app, "GET", "/filtered-listings/?query=price&value=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    // An unknown selector is a defined no-match.
    let (status, body) =
        request_json(&app, "GET", "/filtered-listings/?query=bogus&value=x", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], serde_json::json!([]));
}

#[tokio::test]
async fn test_listing_photo_roundtrip() {
    let (app, _images) = spawn_app().await;

    let listing_id = create_listing(&app, "Moscow", 45000, None).await;

    let original: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3, 4];
    let encoded = general_purpose::STANDARD.encode(original);

    let (status, body) = request_json(
        &app,
        "POST",
        &format!("/listing-photo/{listing_id}"),
        Some(serde_json::json!({
            "image_base64": format!("data:image/png;base64,{encoded}"),
            "extension": "png"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let photo_id = body["data"]["photo_id"].as_i64().unwrap();

    // The raw photo endpoint serves the original bytes back.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/listing-photo/{photo_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "image/png"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], original);

    // The preview embeds the same bytes as base64.
    let (_, body) = request_json(&app, "GET", "/listings/", None).await;
    let embedded = body["data"][0]["image_base64"].as_str().unwrap();
    assert_eq!(
        general_purpose::STANDARD.decode(embedded).unwrap(),
        original
    );

    // Malformed payload is a bad request.
    let (status, _) = request_json(
        &app,
        "POST",
        &format!("/listing-photo/{listing_id}"),
        Some(serde_json::json!({
            "image_base64": "!!!not-base64!!!",
            "extension": "png"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // So is uploading for a listing that does not exist.
    let (status, _) = request_json(
        &app,
        "POST",
        "/listing-photo/9999",
        Some(serde_json::json!({
            "image_base64": encoded,
            "extension": "png"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request_json(&app, "GET", "/listing-photo/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_preview_with_missing_photo_file() {
    let (app, _images) = spawn_app().await;

    // The photo row points at a path that never existed on disk.
    let (status, body) = request_json(
        &app,
        "POST",
        "/listings/",
        Some({
            let mut body = listing_body("Moscow", 45000, None);
            body["image_paths"] = serde_json::json!(["no/such/file.jpg"]);
            body
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["image_base64"], serde_json::Value::Null);

    let (status, body) = request_json(&app, "GET", "/listings/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["image_base64"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_user_photo_upload_and_fetch() {
    let (app, _images) = spawn_app().await;

    let user_id = register_user(&app, "alice", "alice@example.com").await;

    // No photo uploaded yet.
    let (status, _) = request_json(&app, "GET", &format!("/user-photo/{user_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let original: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 9, 8, 7];
    let boundary = "XARENDABOUNDARY";
    let mut multipart_body = Vec::new();
    multipart_body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    multipart_body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"file\"; filename=\"avatar.jpg\"\r\n",
    );
    multipart_body.extend_from_slice(b"Content-Type: image/jpeg\r\n\r\n");
    multipart_body.extend_from_slice(original);
    multipart_body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/user-photo/{user_id}"))
                .header(
                    "Content-Type",
                    format!("{}; boundary={boundary}", mime::MULTIPART_FORM_DATA),
                )
                .body(Body::from(multipart_body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/user-photo/{user_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], original);

    // Login now carries the photo inline.
    let (status, body) = request_json(
        &app,
        "POST",
        "/login",
        Some(serde_json::json!({
            "email": "alice@example.com",
            "password": "secret"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let embedded = body["data"]["photo_base64"].as_str().unwrap();
    assert_eq!(
        general_purpose::STANDARD.decode(embedded).unwrap(),
        original
    );

    // Uploading for an unknown user is a bad request.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/user-photo/9999")
                .header(
                    "Content-Type",
                    format!("{}; boundary={boundary}", mime::MULTIPART_FORM_DATA),
                )
                .body(Body::from("irrelevant"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_listing_created_with_photo_paths_serves_first_photo() {
    let (app, images) = spawn_app().await;

    // Pre-stage two files the way a client that already uploaded them would.
    let listings_dir = images.path().join("listings");
    std::fs::create_dir_all(&listings_dir).unwrap();
    let first = listings_dir.join("first.png");
    let second = listings_dir.join("second.png");
    std::fs::write(&first, [1u8, 1, 1]).unwrap();
    std::fs::write(&second, [2u8, 2, 2]).unwrap();

    let (status, body) = request_json(
        &app,
        "POST",
        "/listings/",
        Some({
            let mut body = listing_body("Moscow", 45000, None);
            body["image_paths"] = serde_json::json!([
                first.to_string_lossy(),
                second.to_string_lossy()
            ]);
            body
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The preview picks the first attached photo.
    let embedded = body["data"]["image_base64"].as_str().unwrap();
    assert_eq!(
        general_purpose::STANDARD.decode(embedded).unwrap(),
        vec![1u8, 1, 1]
    );
}
