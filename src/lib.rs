use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::info;

pub mod api;
pub mod errors;
pub mod export;
pub mod logging;
pub mod media;
pub mod notify;
pub mod settings;
#[cfg(test)]
mod test_util;
pub mod workflow;

pub use api::{ApiError, DocumentApi, HttpDocumentApi};
pub use errors::WorkflowError;
pub use export::ArtifactKind;
pub use media::SourceFile;
pub use notify::{LogNotifier, Notifier};
pub use workflow::{DocumentWorkflow, RequestToken, WorkflowDriver, WorkflowState};

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Scanned document image to run through OCR and translation.
    pub image: Option<PathBuf>,
    /// Already-extracted text file: translation only, no OCR pass.
    pub text: Option<PathBuf>,
    pub mime: Option<String>,
    pub api_base: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub export: bool,
    pub settings_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub extracted: String,
    pub translated: String,
    pub exported: Vec<PathBuf>,
    /// Set when translation failed but the extracted text survived; the
    /// surviving artifact is still returned and exported.
    pub translation_error: Option<WorkflowError>,
}

pub async fn run(config: Config) -> Result<RunOutput> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let mut settings = settings::load_settings(settings_path)?;
    if let Some(base) = config.api_base {
        settings.api_base = base;
    }
    if let Some(dir) = config.output_dir {
        settings.output_dir = Some(dir);
    }

    let api = HttpDocumentApi::with_timeout(&settings.api_base, settings.request_timeout)?;
    let notifier = LogNotifier;
    let driver = WorkflowDriver::new(api, notifier);

    let outcome = match (&config.image, &config.text) {
        (Some(path), None) => {
            let file = media::load_source_file(path, config.mime.as_deref())?;
            info!("processing {} ({})", file.name, media::human_size(file.size()));
            driver.submit_file(file).await
        }
        (None, Some(path)) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read text file: {}", path.display()))?;
            driver.submit_text(text).await
        }
        (Some(_), Some(_)) => {
            return Err(anyhow!("pass either an image or --translate-text, not both"));
        }
        (None, None) => {
            return Err(anyhow!("nothing to do: pass an image path or --translate-text"));
        }
    };

    // A translation failure keeps the upload and the extracted text, so the
    // run still surfaces and exports the surviving artifact. Every other
    // failure leaves nothing worth salvaging.
    let translation_error = match outcome {
        Ok(()) => None,
        Err(err @ WorkflowError::TranslationRequestFailed { .. }) => Some(err),
        Err(err) => return Err(err.into()),
    };

    let extracted = driver.artifact(ArtifactKind::Source);
    let translated = driver.artifact(ArtifactKind::Translation);
    let exported = if config.export {
        export_artifacts(&extracted, &translated, &settings, &notifier)?
    } else {
        Vec::new()
    };

    Ok(RunOutput {
        extracted,
        translated,
        exported,
        translation_error,
    })
}

fn export_artifacts<N: Notifier>(
    extracted: &str,
    translated: &str,
    settings: &settings::Settings,
    notifier: &N,
) -> Result<Vec<PathBuf>> {
    let dir = settings
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    let mut exported = Vec::new();
    for kind in [ArtifactKind::Source, ArtifactKind::Translation] {
        let (content, label) = match kind {
            ArtifactKind::Source => (extracted, settings.source_label.as_str()),
            ArtifactKind::Translation => (translated, settings.target_label.as_str()),
        };
        if let Some(path) = export::export_artifact(content, label, &dir)? {
            notifier.success(
                "Downloaded",
                &format!("{} file downloaded successfully", label),
            );
            exported.push(path);
        }
    }
    Ok(exported)
}
