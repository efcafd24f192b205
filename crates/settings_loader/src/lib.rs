//! # Settings Loader
//!
//! Centralized settings loading for the planner. Reads `settings.json`, which
//! holds the server bind address, the worksheet store location and the optional
//! assistant tuning, then layers environment variables on top.
//!
//! ## Features
//!
//! - Load settings from specified file paths
//! - Load settings from default location (`settings.json`)
//! - Handle optional settings gracefully
//! - Fall back to built-in defaults when no settings file exists
//! - Apply `HOST`, `PORT`, `STORE_PATH` and `GEMINI_API_URL` overrides
//!
//! ## Usage Examples
//!
//! ```rust,no_run
//! use settings_loader;
//! use std::path::PathBuf;
//!
//! // Load settings from a specific path
//! let settings = settings_loader::load_settings("config/my_settings.json")?;
//!
//! // Everything the server needs: .env, settings file, env overrides
//! let path = Some(PathBuf::from("settings.json"));
//! let settings = settings_loader::resolve_settings(path.as_ref())?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use models::{AssistantSettings, Settings};

/// Loads settings from a JSON file
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Reading settings file: {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&raw)
        .with_context(|| format!("Parsing settings JSON in {}", path.display()))?;
    Ok(settings)
}

/// Loads settings from a default location (settings.json in the current directory)
pub fn load_default_settings() -> Result<Settings> {
    load_settings("settings.json")
}

/// Loads settings from an optional path, returning None if no path is provided
pub fn load_optional_settings(path: Option<&PathBuf>) -> Result<Option<Settings>> {
    match path {
        Some(settings_path) => Ok(Some(load_settings(settings_path)?)),
        None => Ok(None),
    }
}

/// Tries to load settings from the provided path, falling back to default location if the path is None
/// or if the file doesn't exist. Returns None only if no settings file is found anywhere.
pub fn load_settings_with_fallback(path: Option<&PathBuf>) -> Result<Option<Settings>> {
    if let Some(settings_path) = path {
        match load_settings(settings_path) {
            Ok(settings) => return Ok(Some(settings)),
            Err(e) => {
                tracing::warn!("Could not load {}: {:#}", settings_path.display(), e);
            }
        }
    }

    match load_default_settings() {
        Ok(settings) => Ok(Some(settings)),
        Err(_) => Ok(None),
    }
}

/// Overrides file settings with values from `lookup`, usually the process environment.
///
/// An unparsable `PORT` is an error rather than a silent fallback.
pub fn apply_env_overrides<F>(mut settings: Settings, lookup: F) -> Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("HOST") {
        settings.server.host = host;
    }
    if let Some(port) = lookup("PORT") {
        settings.server.port = port
            .trim()
            .parse()
            .with_context(|| format!("Invalid PORT value: {port}"))?;
    }
    if let Some(store_path) = lookup("STORE_PATH") {
        settings.store_path = store_path;
    }
    if let Some(api_url) = lookup("GEMINI_API_URL") {
        settings
            .assistant
            .get_or_insert_with(AssistantSettings::default)
            .api_url = Some(api_url);
    }
    Ok(settings)
}

/// Loads `.env`, then the settings file (or defaults), then environment overrides.
pub fn resolve_settings(path: Option<&PathBuf>) -> Result<Settings> {
    if let Ok(env_file) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", env_file.display());
    }

    let settings = load_settings_with_fallback(path)?.unwrap_or_else(|| {
        tracing::info!("No settings.json found, using defaults");
        Settings::default()
    });

    apply_env_overrides(settings, |key| {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    })
}

/// Checks if a settings file exists at the given path
pub fn settings_file_exists<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().exists() && path.as_ref().is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_load_settings_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"settings_version": 2, "server": {"port": 8080}}"#).unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.settings_version, 2);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.store_path, "database/planner.json");
        assert!(settings.assistant.is_none());
    }

    #[test]
    fn test_load_settings_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_settings(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Parsing settings JSON"));
    }

    #[test]
    fn test_load_optional_settings_without_path() {
        assert!(load_optional_settings(None).unwrap().is_none());
    }

    #[test]
    fn test_env_overrides_win() {
        let settings = apply_env_overrides(
            Settings::default(),
            env(&[
                ("HOST", "0.0.0.0"),
                ("PORT", "9000"),
                ("STORE_PATH", "/tmp/planner.json"),
                ("GEMINI_API_URL", "http://localhost:8081/generate"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.store_path, "/tmp/planner.json");
        assert_eq!(
            settings.assistant.and_then(|a| a.api_url).as_deref(),
            Some("http://localhost:8081/generate")
        );
    }

    #[test]
    fn test_env_overrides_reject_bad_port() {
        let err = apply_env_overrides(Settings::default(), env(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("Invalid PORT"));
    }

    #[test]
    fn test_no_env_leaves_settings() {
        let settings = apply_env_overrides(Settings::default(), env(&[])).unwrap();
        assert_eq!(settings.server.port, 3000);
    }
}
