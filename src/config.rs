// Configuration - TOML file, then environment overrides
//
// Every field has a default, so an absent file (or an empty one) gives a
// working local setup.

use crate::auth::AdminCredentials;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Local,
    Remote,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Backend::Local),
            "remote" | "supabase" => Ok(Backend::Remote),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    Static,
    Hosted,
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "static" => Ok(AuthMode::Static),
            "hosted" | "supabase" => Ok(AuthMode::Hosted),
            other => Err(format!("unknown auth mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: Backend,
    pub database_path: PathBuf,
    pub bind_addr: String,
    pub auth: AuthMode,
    /// Seed empty local collections with example rows.
    pub seed: bool,
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub admin: AdminCredentials,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            backend: Backend::Local,
            database_path: PathBuf::from("church.db"),
            bind_addr: "0.0.0.0:3000".to_string(),
            auth: AuthMode::Static,
            seed: true,
            supabase_url: None,
            supabase_anon_key: None,
            admin: AdminCredentials::default(),
        }
    }
}

impl AppConfig {
    /// Load `path` (if given) and apply the process environment on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => AppConfig::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.check()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CHURCH_BACKEND") {
            self.backend = parse_value("CHURCH_BACKEND", &v)?;
        }
        if let Some(v) = lookup("CHURCH_DB_PATH") {
            self.database_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("CHURCH_BIND") {
            self.bind_addr = v;
        }
        if let Some(v) = lookup("CHURCH_AUTH") {
            self.auth = parse_value("CHURCH_AUTH", &v)?;
        }
        if let Some(v) = lookup("CHURCH_SEED") {
            self.seed = parse_bool("CHURCH_SEED", &v)?;
        }
        if let Some(v) = lookup("CHURCH_ADMIN_USERNAME") {
            self.admin.username = v;
        }
        if let Some(v) = lookup("CHURCH_ADMIN_PASSWORD") {
            self.admin.password = v;
        }
        if let Some(v) = lookup("SUPABASE_URL") {
            self.supabase_url = Some(v);
        }
        if let Some(v) = lookup("SUPABASE_ANON_KEY") {
            self.supabase_anon_key = Some(v);
        }
        Ok(())
    }

    /// Reject combinations that cannot start.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.backend == Backend::Remote || self.auth == AuthMode::Hosted {
            self.hosted_project()?;
        }
        Ok(())
    }

    /// URL and key of the hosted project.
    pub fn hosted_project(&self) -> Result<(&str, &str), ConfigError> {
        let url = non_blank(&self.supabase_url).ok_or(ConfigError::Missing("SUPABASE_URL"))?;
        let key =
            non_blank(&self.supabase_anon_key).ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?;
        Ok((url, key))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
