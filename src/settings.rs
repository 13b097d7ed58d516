use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::export::ArtifactKind;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the gateway hosting the OCR and translation endpoints.
    pub api_base: String,
    pub request_timeout: Duration,
    /// Filename discriminators for exported artifacts
    /// (`document_<label>.txt`).
    pub source_label: String,
    pub target_label: String,
    pub output_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            source_label: ArtifactKind::Source.default_label().to_string(),
            target_label: ArtifactKind::Translation.default_label().to_string(),
            output_dir: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    server: Option<ServerSettings>,
    export: Option<ExportSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    api_base: Option<String>,
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ExportSettings {
    source_label: Option<String>,
    target_label: Option<String>,
    output_dir: Option<String>,
}

/// Loads settings in layers: crate defaults, `settings.toml` and
/// `settings.local.toml` in the working directory, the per-user files under
/// `~/.doctrans/`, then an explicit extra path. Later layers win.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(server) = incoming.server {
            if let Some(base) = server.api_base
                && !base.trim().is_empty()
            {
                self.api_base = base;
            }
            if let Some(secs) = server.request_timeout_secs
                && secs > 0
            {
                self.request_timeout = Duration::from_secs(secs);
            }
        }
        if let Some(export) = incoming.export {
            if let Some(label) = export.source_label
                && !label.trim().is_empty()
            {
                self.source_label = label;
            }
            if let Some(label) = export.target_label
                && !label.trim().is_empty()
            {
                self.target_label = label;
            }
            if let Some(dir) = export.output_dir
                && !dir.trim().is_empty()
            {
                self.output_dir = Some(PathBuf::from(dir));
            }
        }
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".doctrans"))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::with_temp_home;

    #[test]
    fn defaults_apply_without_extra_files() {
        with_temp_home(|_home| {
            let settings = load_settings(None).expect("settings");
            assert_eq!(settings.api_base, DEFAULT_API_BASE);
            assert_eq!(settings.request_timeout, Duration::from_secs(120));
            assert_eq!(settings.source_label, "arabic");
            assert_eq!(settings.target_label, "french");
            assert!(settings.output_dir.is_none());
        });
    }

    #[test]
    fn explicit_file_overrides_defaults() {
        with_temp_home(|home| {
            let path = home.join("extra.toml");
            fs::write(
                &path,
                "[server]\napi_base = \"http://gateway:9000\"\nrequest_timeout_secs = 5\n\n[export]\ntarget_label = \"english\"\noutput_dir = \"/tmp/out\"\n",
            )
            .expect("write");
            let settings = load_settings(Some(&path)).expect("settings");
            assert_eq!(settings.api_base, "http://gateway:9000");
            assert_eq!(settings.request_timeout, Duration::from_secs(5));
            assert_eq!(settings.source_label, "arabic");
            assert_eq!(settings.target_label, "english");
            assert_eq!(settings.output_dir.as_deref(), Some(Path::new("/tmp/out")));
        });
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        with_temp_home(|home| {
            let missing = home.join("nope.toml");
            assert!(load_settings(Some(&missing)).is_err());
        });
    }

    #[test]
    fn blank_values_do_not_override() {
        with_temp_home(|home| {
            let path = home.join("extra.toml");
            fs::write(&path, "[server]\napi_base = \"  \"\nrequest_timeout_secs = 0\n").expect("write");
            let settings = load_settings(Some(&path)).expect("settings");
            assert_eq!(settings.api_base, DEFAULT_API_BASE);
            assert_eq!(settings.request_timeout, Duration::from_secs(120));
        });
    }
}
