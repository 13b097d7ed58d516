use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Which artifact is being exported: the extracted source-script text or
/// the translated target-script text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Source,
    Translation,
}

impl ArtifactKind {
    /// Default filename discriminator (Arabic source script, French
    /// target). Overridable via settings.
    pub fn default_label(&self) -> &'static str {
        match self {
            ArtifactKind::Source => "arabic",
            ArtifactKind::Translation => "french",
        }
    }
}

/// Writes `content` to `document_<label>.txt` under `dir` as UTF-8 plain
/// text. Empty content is a no-op returning `None`. Repeatable: each call
/// rewrites the same file, no workflow state is involved.
pub fn export_artifact(content: &str, label: &str, dir: &Path) -> Result<Option<PathBuf>> {
    if content.is_empty() {
        return Ok(None);
    }
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output dir: {}", dir.display()))?;
    let path = dir.join(format!("document_{}.txt", label));
    fs::write(&path, content.as_bytes())
        .with_context(|| format!("failed to write artifact: {}", path.display()))?;
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_content_is_a_noop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = export_artifact("", "arabic", dir.path()).expect("export");
        assert!(result.is_none());
        assert!(fs::read_dir(dir.path()).expect("dir").next().is_none());
    }

    #[test]
    fn export_is_repeatable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = export_artifact("مرحبا", "arabic", dir.path())
            .expect("export")
            .expect("path");
        let second = export_artifact("مرحبا", "arabic", dir.path())
            .expect("export")
            .expect("path");
        assert_eq!(first, second);
        assert_eq!(first.file_name().and_then(|n| n.to_str()), Some("document_arabic.txt"));
        assert_eq!(fs::read_to_string(&second).expect("read"), "مرحبا");
    }

    #[test]
    fn labels_name_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = export_artifact("Bonjour", ArtifactKind::Translation.default_label(), dir.path())
            .expect("export")
            .expect("path");
        assert!(path.ends_with("document_french.txt"));
    }
}
