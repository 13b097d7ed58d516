use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::media::SourceFile;

pub const OCR_EXTRACT_PATH: &str = "/api/automatic_translation/ocr/extract";
pub const TRANSLATE_PATH: &str = "/api/automatic_translation/translate";

const GENERIC_OCR_ERROR: &str = "OCR extraction failed";
const GENERIC_TRANSLATE_ERROR: &str = "Translation failed";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Failure from either remote endpoint. `message` carries the server's
/// `detail` field when the response body had one, otherwise a generic
/// fallback for that endpoint.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
}

pub type ApiFuture<T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send>>;

/// Seam over the two remote endpoints so the workflow can run against a
/// fake in tests.
pub trait DocumentApi: Send + Sync {
    fn extract(&self, file: &SourceFile) -> ApiFuture<String>;
    fn translate(&self, text: &str) -> ApiFuture<String>;
}

#[derive(Debug, Default, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Default, Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    translation: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// reqwest-backed client for the OCR/translation gateway. No automatic
/// retries: a failed call requires a fresh user-initiated action.
#[derive(Debug, Clone)]
pub struct HttpDocumentApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDocumentApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .with_context(|| "failed to build HTTP client")?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    async fn extract_inner(&self, file: SourceFile) -> Result<String, ApiError> {
        let url = format!("{}{}", self.base_url, OCR_EXTRACT_PATH);
        debug!("POST {} ({}, {} bytes)", url, file.mime, file.bytes.len());
        let part = reqwest::multipart::Part::bytes(file.bytes)
            .file_name(file.name)
            .mime_str(&file.mime)
            .map_err(|err| ApiError {
                message: format!("{}: {}", GENERIC_OCR_ERROR, err),
            })?;
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| transport_error(GENERIC_OCR_ERROR, err))?;
        let body: ExtractResponse = read_json(response, GENERIC_OCR_ERROR).await?;
        Ok(body.text)
    }

    async fn translate_inner(&self, text: String) -> Result<String, ApiError> {
        let url = format!("{}{}", self.base_url, TRANSLATE_PATH);
        debug!("POST {} ({} chars)", url, text.chars().count());
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|err| transport_error(GENERIC_TRANSLATE_ERROR, err))?;
        let body: TranslateResponse = read_json(response, GENERIC_TRANSLATE_ERROR).await?;
        Ok(body.translation)
    }
}

impl DocumentApi for HttpDocumentApi {
    fn extract(&self, file: &SourceFile) -> ApiFuture<String> {
        let api = self.clone();
        let file = file.clone();
        Box::pin(async move { api.extract_inner(file).await })
    }

    fn translate(&self, text: &str) -> ApiFuture<String> {
        let api = self.clone();
        let text = text.to_string();
        Box::pin(async move { api.translate_inner(text).await })
    }
}

fn transport_error(generic: &str, err: reqwest::Error) -> ApiError {
    ApiError {
        message: format!("{}: {}", generic, err),
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    generic: &str,
) -> Result<T, ApiError> {
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|err| transport_error(generic, err))?;
    if !status.is_success() {
        let detail = serde_json::from_slice::<ErrorBody>(&bytes)
            .ok()
            .and_then(|body| body.detail)
            .filter(|detail| !detail.trim().is_empty());
        return Err(ApiError {
            message: detail.unwrap_or_else(|| generic.to_string()),
        });
    }
    serde_json::from_slice(&bytes).map_err(|err| ApiError {
        message: format!("{}: invalid response body: {}", generic, err),
    })
}
