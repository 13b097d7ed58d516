use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::api::{ApiError, DocumentApi};
use crate::errors::WorkflowError;
use crate::export::ArtifactKind;
use crate::media::{self, SourceFile};
use crate::notify::Notifier;

/// Explicit workflow phases. A single tagged state cannot represent
/// impossible combinations like "extracting and translating" or
/// "translating with no file", which independent boolean flags would
/// permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Validating,
    Extracting,
    Extracted,
    Translating,
    Complete,
    Failed,
}

/// Generation token attached to every outstanding request. A response is
/// applied only while its token matches the current generation, so a
/// response that lands after `clear()` or a newer upload is discarded
/// instead of resurrecting stale artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// The state machine proper: one upload, two text artifacts, no I/O.
/// Network calls happen outside; their results come back through the
/// `apply_*` methods together with the token issued when the request began.
pub struct DocumentWorkflow<N: Notifier> {
    notifier: N,
    state: WorkflowState,
    file: Option<SourceFile>,
    extracted: String,
    translated: String,
    generation: u64,
}

impl<N: Notifier> DocumentWorkflow<N> {
    pub fn new(notifier: N) -> Self {
        Self {
            notifier,
            state: WorkflowState::Idle,
            file: None,
            extracted: String::new(),
            translated: String::new(),
            generation: 0,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn source_file(&self) -> Option<&SourceFile> {
        self.file.as_ref()
    }

    pub fn extracted_text(&self) -> &str {
        &self.extracted
    }

    pub fn translated_text(&self) -> &str {
        &self.translated
    }

    fn current_token(&self) -> RequestToken {
        RequestToken(self.generation)
    }

    fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.generation
    }

    /// Validates and accepts a new upload. On success all prior artifacts
    /// are dropped, the generation advances, and the workflow moves to
    /// Extracting; the returned token must accompany the OCR response. An
    /// unsupported media type restores the pre-upload state so a failed
    /// drop does not disturb earlier results.
    pub fn accept_file(&mut self, file: SourceFile) -> Result<RequestToken, WorkflowError> {
        let previous = self.state;
        self.state = WorkflowState::Validating;
        if !media::is_supported_image(&file.mime) {
            self.state = previous;
            self.notifier.error(
                "Invalid file type",
                "Please upload an image file (JPG, PNG, WebP)",
            );
            return Err(WorkflowError::InvalidFileType { mime: file.mime });
        }
        self.file = Some(file);
        self.extracted.clear();
        self.translated.clear();
        self.generation += 1;
        self.state = WorkflowState::Extracting;
        Ok(self.current_token())
    }

    /// Applies the OCR response for `token`. A stale token means the upload
    /// was superseded or cleared while the request was in flight; the
    /// response is discarded without touching state.
    pub fn apply_extraction(
        &mut self,
        token: RequestToken,
        result: Result<String, ApiError>,
    ) -> Result<(), WorkflowError> {
        if !self.is_current(token) {
            debug!("discarding stale OCR response");
            return Ok(());
        }
        match result {
            Ok(text) => {
                self.extracted = text;
                self.state = WorkflowState::Extracted;
                self.notifier
                    .success("Success", "Text extracted successfully from the image");
                Ok(())
            }
            Err(err) => {
                // OCR failure means the upload was unusable: drop the file
                // so the user re-uploads.
                self.file = None;
                self.state = WorkflowState::Failed;
                self.notifier.error("Error", &err.message);
                Err(WorkflowError::OcrRequestFailed {
                    message: err.message,
                })
            }
        }
    }

    /// Moves to Translating for the current generation and returns the text
    /// to send. `None` when the token is stale or when the extraction is
    /// whitespace-only (a no-op, not an error: no request, no transition).
    pub fn begin_translation(&mut self, token: RequestToken) -> Option<String> {
        if !self.is_current(token) {
            debug!("skipping translation for superseded upload");
            return None;
        }
        if self.extracted.trim().is_empty() {
            return None;
        }
        self.state = WorkflowState::Translating;
        Some(self.extracted.clone())
    }

    /// Manual re-translate entry: reuses the current extracted text under
    /// the current generation, so it works after a translation failure
    /// without a new upload or OCR pass.
    pub fn begin_retranslation(&mut self) -> Option<(RequestToken, String)> {
        let token = self.current_token();
        let text = self.begin_translation(token)?;
        Some((token, text))
    }

    pub fn apply_translation(
        &mut self,
        token: RequestToken,
        result: Result<String, ApiError>,
    ) -> Result<(), WorkflowError> {
        if !self.is_current(token) {
            debug!("discarding stale translation response");
            return Ok(());
        }
        match result {
            Ok(translation) => {
                self.translated = translation;
                self.state = WorkflowState::Complete;
                self.notifier
                    .success("Success", "Text translated successfully");
                Ok(())
            }
            Err(err) => {
                // Unlike an OCR failure, the upload and extracted text
                // survive: the input was fine, only the second step failed.
                self.state = WorkflowState::Failed;
                self.notifier.error("Translation Error", &err.message);
                Err(WorkflowError::TranslationRequestFailed {
                    message: err.message,
                })
            }
        }
    }

    /// Seeds the extracted artifact without an OCR pass, for the manual
    /// translate-a-text-file entry point.
    pub fn load_extracted(&mut self, text: impl Into<String>) {
        self.extracted = text.into();
        self.translated.clear();
        self.state = WorkflowState::Extracted;
    }

    /// Direct user edit of the translated artifact. Never re-translates and
    /// never touches the extracted text.
    pub fn edit_translation(&mut self, text: impl Into<String>) {
        self.translated = text.into();
    }

    /// Unconditional reset from any state. Bumps the generation so
    /// responses still in flight for the old upload are discarded instead
    /// of repopulating cleared state.
    pub fn clear(&mut self) {
        self.file = None;
        self.extracted.clear();
        self.translated.clear();
        self.generation += 1;
        self.state = WorkflowState::Idle;
    }
}

/// Sequences the two remote calls around the state machine: upload →
/// extract → auto-translate, exactly one OCR and one translation request
/// outstanding at a time. The mutex is held only for synchronous
/// transitions, never across an await, so a concurrent `clear()` can land
/// between a request going out and its response being applied — which is
/// what the generation token protects against.
pub struct WorkflowDriver<A: DocumentApi, N: Notifier> {
    api: A,
    core: Mutex<DocumentWorkflow<N>>,
}

impl<A: DocumentApi, N: Notifier> WorkflowDriver<A, N> {
    pub fn new(api: A, notifier: N) -> Self {
        Self {
            api,
            core: Mutex::new(DocumentWorkflow::new(notifier)),
        }
    }

    /// The full upload pipeline: validate, OCR, then auto-translate when
    /// the extraction produced usable text. Translation is only issued
    /// after the OCR response has been received and applied.
    pub async fn submit_file(&self, file: SourceFile) -> Result<(), WorkflowError> {
        let token = self.lock().accept_file(file.clone())?;
        let result = self.api.extract(&file).await;
        self.lock().apply_extraction(token, result)?;
        let pending = self.lock().begin_translation(token);
        if let Some(text) = pending {
            let result = self.api.translate(&text).await;
            self.lock().apply_translation(token, result)?;
        }
        Ok(())
    }

    /// Manual translation entry for already-extracted text; no OCR pass.
    pub async fn submit_text(&self, text: impl Into<String>) -> Result<(), WorkflowError> {
        {
            let mut core = self.lock();
            core.clear();
            core.load_extracted(text);
        }
        self.retranslate().await.map(|_| ())
    }

    /// Re-runs translation on the current extracted text. Returns `false`
    /// when there is nothing to translate.
    pub async fn retranslate(&self) -> Result<bool, WorkflowError> {
        let Some((token, text)) = self.lock().begin_retranslation() else {
            return Ok(false);
        };
        let result = self.api.translate(&text).await;
        self.lock().apply_translation(token, result)?;
        Ok(true)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn edit_translation(&self, text: impl Into<String>) {
        self.lock().edit_translation(text);
    }

    pub fn state(&self) -> WorkflowState {
        self.lock().state()
    }

    pub fn source_file_name(&self) -> Option<String> {
        self.lock().source_file().map(|file| file.name.clone())
    }

    pub fn extracted_text(&self) -> String {
        self.lock().extracted_text().to_string()
    }

    pub fn translated_text(&self) -> String {
        self.lock().translated_text().to_string()
    }

    pub fn artifact(&self, kind: ArtifactKind) -> String {
        let core = self.lock();
        match kind {
            ArtifactKind::Source => core.extracted_text().to_string(),
            ArtifactKind::Translation => core.translated_text().to_string(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DocumentWorkflow<N>> {
        self.core.lock().unwrap_or_else(|err| err.into_inner())
    }
}
