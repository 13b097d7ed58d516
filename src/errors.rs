use thiserror::Error;

/// Failures surfaced at the workflow boundary. None of these are fatal to
/// the process: each is reported through the notifier and leaves the
/// workflow in a state the user can act on.
#[derive(Debug, Clone, Error)]
pub enum WorkflowError {
    /// Local validation failure; no network request was made.
    #[error("invalid file type '{mime}' (expected JPEG, PNG or WebP)")]
    InvalidFileType { mime: String },

    /// The OCR endpoint failed (transport error or non-2xx response). The
    /// uploaded file is dropped and must be re-uploaded.
    #[error("{message}")]
    OcrRequestFailed { message: String },

    /// The translation endpoint failed. The uploaded file and the extracted
    /// text survive so translation can be retried without a new OCR pass.
    #[error("{message}")]
    TranslationRequestFailed { message: String },
}
