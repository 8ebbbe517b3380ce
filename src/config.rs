use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::context::{ErrorContext, DEFAULT_CONTEXT_NAME, DEFAULT_EOL};
use crate::files::{Files, Mode, DEFAULT_MODE};
use crate::kind::ErrorKind;
use crate::logger::Logger;
use crate::message::{Catalog, MessageError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
    #[error("Config {}: {message}", .path.display())]
    Invalid { path: PathBuf, message: String },
}

/// Permission bits for new directories, written in octal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirMode(Mode);

impl DirMode {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        let digits = trimmed.strip_prefix("0o").unwrap_or(trimmed);
        let value = Mode::from_str_radix(digits, 8)
            .map_err(|_| format!("must be an octal mode (got {:?})", raw))?;
        Self::new(value)
    }

    pub fn new(value: Mode) -> Result<Self, String> {
        if value > 0o7777 {
            return Err(format!("must not exceed 7777 (got {:o})", value));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> Mode {
        self.0
    }
}

impl Default for DirMode {
    fn default() -> Self {
        Self(DEFAULT_MODE)
    }
}

impl<'de> Deserialize<'de> for DirMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(u32),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Int(value) => DirMode::new(value),
            Raw::Text(text) => DirMode::parse(&text),
        }
        .map_err(D::Error::custom)
    }
}

impl fmt::Display for DirMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:o}", self.0)
    }
}

fn default_context_name() -> String {
    DEFAULT_CONTEXT_NAME.to_string()
}

fn default_eol() -> String {
    DEFAULT_EOL.to_string()
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_context_name")]
    pub context_name: String,
    #[serde(default = "default_eol")]
    pub eol: String,
    #[serde(default)]
    pub default_mode: DirMode,
    #[serde(default)]
    pub log_path: Option<PathBuf>,
    #[serde(default)]
    pub templates: BTreeMap<ErrorKind, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            context_name: default_context_name(),
            eol: default_eol(),
            default_mode: DirMode::default(),
            log_path: None,
            templates: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn error_context(&self) -> ErrorContext {
        ErrorContext::new(self.context_name.clone()).with_eol(self.eol.clone())
    }

    pub fn files(&self) -> Files {
        Files::new(self.error_context()).with_logger(Logger::new(self.log_path.clone()))
    }

    /// A catalog holding this config's context and its template overrides.
    pub fn catalog(&self) -> Result<Catalog, MessageError> {
        let mut catalog = Catalog::new();
        catalog.register(Box::new(self.error_context()))?;
        for (kind, sentence) in &self.templates {
            catalog.localize(&self.context_name, *kind, sentence.clone());
        }
        Ok(catalog)
    }
}

#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    pub warnings: Vec<String>,
}

pub fn load_config(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_yaml::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    let mapping = match value {
        Value::Mapping(mapping) => mapping,
        // An empty file means "all defaults".
        Value::Null => Mapping::new(),
        _ => {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                message: "must be a YAML mapping".to_string(),
            })
        }
    };

    let warnings = unknown_top_level_keys(&mapping);
    validate_fields(&mapping).map_err(|message| ConfigError::Invalid {
        path: path.to_path_buf(),
        message,
    })?;

    let config: Config =
        serde_path_to_error::deserialize(Value::Mapping(mapping)).map_err(|err| {
            ConfigError::Parse {
                path: path.to_path_buf(),
                message: err.to_string(),
            }
        })?;

    Ok(LoadedConfig { config, warnings })
}

fn unknown_top_level_keys(mapping: &Mapping) -> Vec<String> {
    let allowed = ["context_name", "eol", "default_mode", "log_path", "templates"];

    mapping
        .keys()
        .filter_map(|key| key.as_str().map(|value| value.to_string()))
        .filter(|key| !allowed.contains(&key.as_str()))
        .collect()
}

fn validate_fields(mapping: &Mapping) -> Result<(), String> {
    optional_non_empty_string(mapping, "context_name")?;
    optional_non_empty_string(mapping, "eol")?;
    optional_non_empty_string(mapping, "log_path")?;

    if let Some(templates) = optional_mapping(mapping, "templates")? {
        for (key, value) in templates {
            let Some(name) = key.as_str() else {
                return Err("templates keys must be strings".to_string());
            };
            if ErrorKind::parse(name).is_none() {
                return Err(format!("templates.{} is not a known error kind", name));
            }
            match value {
                Value::String(text) if !text.trim().is_empty() => {}
                Value::String(_) => return Err(format!("templates.{} must not be empty", name)),
                _ => return Err(format!("templates.{} must be a string", name)),
            }
        }
    }

    Ok(())
}

fn optional_mapping<'a>(mapping: &'a Mapping, key_name: &str) -> Result<Option<&'a Mapping>, String> {
    let key = Value::String(key_name.to_string());
    match mapping.get(&key) {
        None => Ok(None),
        Some(Value::Null) => Err(format!("{} must not be null", key_name)),
        Some(Value::Mapping(value)) => Ok(Some(value)),
        Some(_) => Err(format!("{} must be a mapping", key_name)),
    }
}

fn optional_non_empty_string(mapping: &Mapping, key_name: &str) -> Result<(), String> {
    let key = Value::String(key_name.to_string());
    match mapping.get(&key) {
        None => Ok(()),
        Some(Value::Null) => Err(format!("{} must not be null", key_name)),
        Some(Value::String(value)) => {
            if value.is_empty() {
                Err(format!("{} must not be empty", key_name))
            } else {
                Ok(())
            }
        }
        Some(_) => Err(format!("{} must be a string", key_name)),
    }
}
