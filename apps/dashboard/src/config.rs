use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use shared::domain::{AlgorithmId, Semester};

pub const CONFIG_FILE: &str = "dashboard.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub backend_url: String,
    pub default_semester: Semester,
    pub default_algorithm: AlgorithmId,
    pub request_timeout_secs: u64,
    pub log_filter: String,
    pub export_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8080".into(),
            default_semester: Semester::WS2017,
            default_algorithm: AlgorithmId::CrowdTruth,
            request_timeout_secs: 30,
            log_filter: "info".into(),
            export_dir: None,
        }
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(CONFIG_FILE), |key| env::var(key).ok())
}

/// File values first, then environment overrides. Unparsable values keep the
/// previous setting.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        if let Ok(file_cfg) = toml::from_str::<toml::Table>(&raw) {
            let get = |key: &str| file_cfg.get(key).and_then(scalar);
            if let Some(v) = get("backend_url") {
                settings.backend_url = v;
            }
            if let Some(v) = get("semester") {
                apply_semester(&mut settings, &v);
            }
            if let Some(v) = get("algorithm") {
                apply_algorithm(&mut settings, &v);
            }
            if let Some(v) = get("request_timeout_secs") {
                apply_timeout(&mut settings, &v);
            }
            if let Some(v) = get("log_filter") {
                settings.log_filter = v;
            }
            if let Some(v) = get("export_dir") {
                settings.export_dir = Some(PathBuf::from(v));
            }
        }
    }

    if let Some(v) = env("DASHBOARD_BACKEND_URL") {
        settings.backend_url = v;
    }
    if let Some(v) = env("APP__BACKEND_URL") {
        settings.backend_url = v;
    }

    if let Some(v) = env("APP__SEMESTER") {
        apply_semester(&mut settings, &v);
    }
    if let Some(v) = env("APP__ALGORITHM") {
        apply_algorithm(&mut settings, &v);
    }
    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        apply_timeout(&mut settings, &v);
    }
    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
    if let Some(v) = env("APP__EXPORT_DIR") {
        settings.export_dir = Some(PathBuf::from(v));
    }

    settings
}

fn scalar(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(text) => Some(text.clone()),
        toml::Value::Integer(number) => Some(number.to_string()),
        _ => None,
    }
}

fn apply_semester(settings: &mut Settings, raw: &str) {
    if let Ok(parsed) = raw.parse() {
        settings.default_semester = parsed;
    }
}

fn apply_algorithm(settings: &mut Settings, raw: &str) {
    if let Ok(parsed) = raw.parse() {
        settings.default_algorithm = parsed;
    }
}

fn apply_timeout(settings: &mut Settings, raw: &str) {
    if let Ok(parsed) = raw.trim().parse::<u64>() {
        if parsed > 0 {
            settings.request_timeout_secs = parsed;
        }
    }
}

pub fn prepare_export_dir(export_dir: &Path) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(export_dir).with_context(|| {
        format!(
            "failed to create export directory '{}'",
            export_dir.display()
        )
    })?;
    Ok(export_dir.to_path_buf())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
