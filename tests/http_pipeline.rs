use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};

use doctrans::{HttpDocumentApi, LogNotifier, SourceFile, WorkflowDriver, WorkflowState};

const EXTRACT_ROUTE: &str = "/api/automatic_translation/ocr/extract";
const TRANSLATE_ROUTE: &str = "/api/automatic_translation/translate";

async fn spawn_gateway(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{}", addr)
}

fn png_file() -> SourceFile {
    SourceFile {
        bytes: vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A],
        mime: "image/png".to_string(),
        name: "photo.png".to_string(),
    }
}

async fn driver_for(app: Router) -> WorkflowDriver<HttpDocumentApi, LogNotifier> {
    let base = spawn_gateway(app).await;
    let api = HttpDocumentApi::new(&base).expect("api");
    WorkflowDriver::new(api, LogNotifier)
}

#[tokio::test]
async fn pipeline_extracts_and_translates_over_http() {
    let app = Router::new()
        .route(
            EXTRACT_ROUTE,
            post(|mut multipart: Multipart| async move {
                let field = multipart
                    .next_field()
                    .await
                    .expect("field")
                    .expect("file field");
                assert_eq!(field.name(), Some("file"));
                assert_eq!(field.file_name(), Some("photo.png"));
                assert_eq!(field.content_type(), Some("image/png"));
                let bytes = field.bytes().await.expect("bytes");
                assert!(!bytes.is_empty());
                Json(json!({ "text": "مرحبا" }))
            }),
        )
        .route(
            TRANSLATE_ROUTE,
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["text"], "مرحبا");
                Json(json!({ "translation": "Bonjour" }))
            }),
        );
    let driver = driver_for(app).await;

    driver.submit_file(png_file()).await.expect("pipeline");

    assert_eq!(driver.state(), WorkflowState::Complete);
    assert_eq!(driver.extracted_text(), "مرحبا");
    assert_eq!(driver.translated_text(), "Bonjour");
}

#[tokio::test]
async fn server_detail_is_surfaced_on_ocr_failure() {
    let app = Router::new().route(
        EXTRACT_ROUTE,
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": "engine overloaded" })),
            )
        }),
    );
    let driver = driver_for(app).await;

    let err = driver.submit_file(png_file()).await.expect_err("ocr fails");
    assert_eq!(err.to_string(), "engine overloaded");
    assert_eq!(driver.state(), WorkflowState::Failed);
    assert!(driver.source_file_name().is_none());
}

#[tokio::test]
async fn generic_message_applies_without_detail_body() {
    let app = Router::new().route(
        EXTRACT_ROUTE,
        post(|| async { (StatusCode::BAD_GATEWAY, "boom") }),
    );
    let driver = driver_for(app).await;

    let err = driver.submit_file(png_file()).await.expect_err("ocr fails");
    assert_eq!(err.to_string(), "OCR extraction failed");
}

#[tokio::test]
async fn translation_failure_keeps_extracted_text() {
    let app = Router::new()
        .route(
            EXTRACT_ROUTE,
            post(|| async { Json(json!({ "text": "مرحبا" })) }),
        )
        .route(
            TRANSLATE_ROUTE,
            post(|| async {
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "detail": "upstream unavailable" })),
                )
            }),
        );
    let driver = driver_for(app).await;

    let err = driver
        .submit_file(png_file())
        .await
        .expect_err("translation fails");
    assert_eq!(err.to_string(), "upstream unavailable");
    assert_eq!(driver.state(), WorkflowState::Failed);
    assert_eq!(driver.source_file_name().as_deref(), Some("photo.png"));
    assert_eq!(driver.extracted_text(), "مرحبا");
    assert_eq!(driver.translated_text(), "");
}

#[tokio::test]
async fn translation_failure_still_exports_extracted_text() {
    let app = Router::new()
        .route(
            EXTRACT_ROUTE,
            post(|| async { Json(json!({ "text": "مرحبا" })) }),
        )
        .route(
            TRANSLATE_ROUTE,
            post(|| async {
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "detail": "upstream unavailable" })),
                )
            }),
        );
    let base = spawn_gateway(app).await;

    let dir = tempfile::tempdir().expect("tempdir");
    let image = dir.path().join("photo.png");
    std::fs::write(&image, [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]).expect("write");
    let out_dir = dir.path().join("out");

    let output = doctrans::run(doctrans::Config {
        image: Some(image),
        api_base: Some(base),
        output_dir: Some(out_dir.clone()),
        export: true,
        ..doctrans::Config::default()
    })
    .await
    .expect("run keeps the surviving artifact");

    assert_eq!(output.extracted, "مرحبا");
    assert_eq!(output.translated, "");
    let err = output.translation_error.expect("translation failure reported");
    assert_eq!(err.to_string(), "upstream unavailable");
    assert_eq!(output.exported.len(), 1);
    let exported = std::fs::read_to_string(out_dir.join("document_arabic.txt")).expect("read");
    assert_eq!(exported, "مرحبا");
}

#[tokio::test]
async fn missing_text_field_defaults_to_empty_extraction() {
    let app = Router::new().route(EXTRACT_ROUTE, post(|| async { Json(json!({})) }));
    let driver = driver_for(app).await;

    driver.submit_file(png_file()).await.expect("pipeline");

    assert_eq!(driver.state(), WorkflowState::Extracted);
    assert_eq!(driver.extracted_text(), "");
    assert_eq!(driver.translated_text(), "");
}
