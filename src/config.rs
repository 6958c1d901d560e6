// SPDX-License-Identifier: MIT

//! Settings for the college-db service
//!
//! Settings come from an optional YAML file (`college-db.yaml` by default),
//! overlaid with environment variables. A `.env` file is loaded first so it
//! can supply those variables.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default settings file looked up in the working directory
pub const DEFAULT_SETTINGS_FILE: &str = "college-db.yaml";

const AMAP_GEOCODE_URL: &str = "https://restapi.amap.com/v3/geocode/geo";
const AMAP_TRANSIT_URL: &str = "https://restapi.amap.com/v3/direction/transit/integrated";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub model: ModelSettings,
    pub amap: AmapSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
    pub port: u16,
    /// Seconds a chat reply may go without progress before it is cut off
    pub chat_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8080,
            chat_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: PathBuf,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("college-db.sqlite3"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub name: String,
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
    pub max_turns: u32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            temperature: Some(0.3),
            max_turns: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AmapSettings {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub geocode_url: String,
    pub transit_url: String,
}

impl Default for AmapSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            geocode_url: AMAP_GEOCODE_URL.to_string(),
            transit_url: AMAP_TRANSIT_URL.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from `college-db.yaml` when it exists,
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        dotenv::dotenv().ok();

        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_SETTINGS_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    log::info!("No {} found, using defaults", DEFAULT_SETTINGS_FILE);
                    Self::default()
                }
            }
        };

        settings.apply_env(|key| env::var(key).ok());
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, AppError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Apply overrides from a variable lookup. Tests pass a closure instead of
    /// mutating the process environment.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(bind) = lookup("COLLEGE_DB_BIND") {
            self.server.bind = bind;
        }
        if let Some(port) = lookup("COLLEGE_DB_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(path) = lookup("COLLEGE_DB_DATABASE") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(secret) = lookup("COLLEGE_DB_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(model) = lookup("COLLEGE_DB_MODEL") {
            self.model.name = model;
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.model.api_key = Some(key);
        }
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            self.model.base_url = url;
        }
        if let Some(key) = lookup("AMAP_API_KEY") {
            self.amap.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(AppError::config(
                "auth.jwt_secret is empty (set COLLEGE_DB_JWT_SECRET)",
            ));
        }
        if self.server.port == 0 {
            return Err(AppError::config("server.port must be non-zero"));
        }
        if self.server.chat_timeout_secs == 0 {
            return Err(AppError::config(
                "server.chat_timeout_secs must be non-zero",
            ));
        }
        if self.model.max_turns == 0 {
            return Err(AppError::config("model.max_turns must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_yaml_is_partial() {
        let settings = Settings::from_yaml("server:\n  port: 9000\n").unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.bind, "127.0.0.1");
        assert_eq!(settings.model.max_turns, 10);
        assert_eq!(settings.amap.geocode_url, AMAP_GEOCODE_URL);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("COLLEGE_DB_PORT", "7000"),
            ("COLLEGE_DB_JWT_SECRET", "s3cret"),
            ("AMAP_API_KEY", "amap-key"),
            ("OPENAI_BASE_URL", "http://localhost:11434/v1"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.apply_env(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(settings.server.port, 7000);
        assert_eq!(settings.auth.jwt_secret, "s3cret");
        assert_eq!(settings.amap.api_key.as_deref(), Some("amap-key"));
        assert_eq!(settings.model.base_url, "http://localhost:11434/v1");
    }

    #[test]
    fn test_unparseable_port_is_ignored() {
        let mut settings = Settings::default();
        settings.apply_env(|key| (key == "COLLEGE_DB_PORT").then(|| "abc".to_string()));
        assert_eq!(settings.server.port, 8080);
    }

    #[test]
    fn test_validate() {
        let mut settings = Settings::default();
        assert!(matches!(settings.validate(), Err(AppError::Config(_))));

        settings.auth.jwt_secret = "secret".to_string();
        assert!(settings.validate().is_ok());

        settings.server.chat_timeout_secs = 0;
        assert!(matches!(settings.validate(), Err(AppError::Config(_))));

        settings.server.chat_timeout_secs = 30;
        settings.model.max_turns = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        fs::write(&path, "database:\n  path: /tmp/colleges.db\nauth:\n  jwt_secret: abc\n")
            .unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.database.path, PathBuf::from("/tmp/colleges.db"));
        assert_eq!(settings.auth.jwt_secret, "abc");
        assert!(Settings::from_file(&dir.path().join("missing.yaml")).is_err());
    }
}
