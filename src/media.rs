use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::Path;

pub const JPEG_MIME: &str = "image/jpeg";
pub const JPG_MIME: &str = "image/jpg";
pub const PNG_MIME: &str = "image/png";
pub const WEBP_MIME: &str = "image/webp";

/// Media types the OCR endpoint accepts. `image/jpg` is not a registered
/// type but browser uploads declare it, so it stays on the list.
pub const ALLOWED_IMAGE_MIMES: [&str; 4] = [JPEG_MIME, PNG_MIME, JPG_MIME, WEBP_MIME];

/// One candidate upload: the raw bytes plus the declared media type and a
/// display name used for the multipart filename and progress messages.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub name: String,
}

impl SourceFile {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

pub fn is_supported_image(mime: &str) -> bool {
    let mime = mime.trim();
    ALLOWED_IMAGE_MIMES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(mime))
}

pub fn human_size(bytes: usize) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}

/// Reads an image from disk and resolves its media type. Unlike a browser
/// upload, a path carries no declared type, so the type comes from the hint,
/// content sniffing, or the file extension, in that order.
pub fn load_source_file(path: &Path, mime_hint: Option<&str>) -> Result<SourceFile> {
    let bytes = fs::read(path).with_context(|| format!("failed to read image: {}", path.display()))?;
    let mime = resolve_mime(mime_hint.unwrap_or("auto"), &bytes, Some(path))?;
    let name = path
        .file_name()
        .and_then(|value| value.to_str())
        .map(|value| value.to_string())
        .unwrap_or_else(|| "document".to_string());
    Ok(SourceFile { bytes, mime, name })
}

fn resolve_mime(input: &str, bytes: &[u8], path: Option<&Path>) -> Result<String> {
    let raw = input.trim();
    if raw.is_empty() {
        return Err(anyhow!("mime hint is empty"));
    }
    let lower = raw.to_lowercase();
    match lower.as_str() {
        "auto" | "image" | "image/*" => return detect_mime(bytes, path),
        "png" => return Ok(PNG_MIME.to_string()),
        "jpg" | "jpeg" => return Ok(JPEG_MIME.to_string()),
        "webp" => return Ok(WEBP_MIME.to_string()),
        _ => {}
    }
    if lower.starts_with("image/") {
        return Ok(lower);
    }
    Err(anyhow!(
        "unsupported mime '{}' (expected auto, png, jpg, jpeg, webp or an image/* type)",
        raw
    ))
}

fn detect_mime(bytes: &[u8], path: Option<&Path>) -> Result<String> {
    if let Some(kind) = infer::get(bytes) {
        let detected = kind.mime_type();
        if detected.starts_with("image/") {
            return Ok(detected.to_string());
        }
        return Err(anyhow!("expected an image, detected '{}'", detected));
    }
    if let Some(ext) = extension_lower(path)
        && let Some(mime) = mime_from_extension(&ext)
    {
        return Ok(mime.to_string());
    }
    Err(anyhow!(
        "unable to detect image type for '{}'",
        path.map(|value| value.display().to_string())
            .unwrap_or_else(|| "input".to_string())
    ))
}

fn extension_lower(path: Option<&Path>) -> Option<String> {
    path?
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_lowercase())
}

fn mime_from_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "png" => Some(PNG_MIME),
        "jpg" | "jpeg" => Some(JPEG_MIME),
        "webp" => Some(WEBP_MIME),
        _ => None,
    }
}
