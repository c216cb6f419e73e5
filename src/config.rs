// src/config.rs
//! Configuration file parsing
//!
//! Supports an optional TOML configuration file with the following sections:
//! - [signing] - GPG key, signing program and timeout
//! - [upload] - Default component
//! - [fields.release], [fields.binary], [fields.source] - Extra field types
//!
//! Example:
//!
//! ```toml
//! [signing]
//! key_id = "0123456789ABCDEF"
//! timeout_secs = 120
//!
//! [upload]
//! component = "contrib"
//!
//! [fields.binary]
//! Built-Using = "folded"
//! ```

use crate::control::{validate_field_name, FieldProfiles, FieldType, FieldTypes};
use crate::repository::DEFAULT_COMPONENT;
use crate::signing::{GpgSigner, DEFAULT_TIMEOUT};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "APTBLOB_CONFIG";

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Release signing
    #[serde(default)]
    pub signing: SigningSection,

    /// Package upload defaults
    #[serde(default)]
    pub upload: UploadSection,

    /// Additional field types
    #[serde(default)]
    pub fields: FieldsSection,
}

/// Signing configuration section
#[derive(Debug, Deserialize)]
pub struct SigningSection {
    /// Key to sign Release files with; unsigned when absent
    pub key_id: Option<String>,

    /// gpg-compatible executable
    #[serde(default = "default_program")]
    pub program: String,

    /// Seconds allowed for each signing invocation
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SigningSection {
    fn default() -> Self {
        Self {
            key_id: None,
            program: default_program(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_program() -> String {
    "gpg".to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

/// Upload configuration section
#[derive(Debug, Deserialize)]
pub struct UploadSection {
    #[serde(default = "default_component")]
    pub component: String,
}

impl Default for UploadSection {
    fn default() -> Self {
        Self {
            component: default_component(),
        }
    }
}

fn default_component() -> String {
    DEFAULT_COMPONENT.to_string()
}

/// Field types merged over the built-in mappings
#[derive(Debug, Default, Deserialize)]
pub struct FieldsSection {
    #[serde(default)]
    pub release: HashMap<String, FieldType>,

    #[serde(default)]
    pub binary: HashMap<String, FieldType>,

    #[serde(default)]
    pub source: HashMap<String, FieldType>,
}

impl Config {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load the configuration file if there is one.
    ///
    /// `explicit` comes from the command line and must exist. Otherwise
    /// `$APTBLOB_CONFIG`, then `<config dir>/aptblob/config.toml` are tried.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        let path = locate(
            explicit,
            std::env::var_os(CONFIG_ENV),
            dirs::config_dir(),
        );
        match path {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.signing.timeout_secs == 0 {
            anyhow::bail!("signing.timeout_secs must be greater than 0");
        }
        if self.signing.program.is_empty() {
            anyhow::bail!("signing.program must not be empty");
        }
        crate::storage::validate_key(&self.upload.component)
            .with_context(|| format!("Invalid upload.component: {:?}", self.upload.component))?;

        let tables = [
            ("release", &self.fields.release),
            ("binary", &self.fields.binary),
            ("source", &self.fields.source),
        ];
        for (table, fields) in tables {
            for name in fields.keys() {
                validate_field_name(name)
                    .with_context(|| format!("Invalid field in [fields.{}]", table))?;
            }
        }
        Ok(())
    }

    /// Built-in field types with the configured extras applied
    pub fn field_profiles(&self) -> FieldProfiles {
        let merge = |mut types: FieldTypes, extra: &HashMap<String, FieldType>| {
            types.extend(extra.iter().map(|(name, t)| (name.as_str(), *t)));
            types
        };
        let defaults = FieldProfiles::default();
        FieldProfiles {
            release: merge(defaults.release, &self.fields.release),
            binary: merge(defaults.binary, &self.fields.binary),
            source: merge(defaults.source, &self.fields.source),
        }
    }

    /// Signer for the configured key, or `key_override` when given
    pub fn signer(&self, key_override: Option<&str>) -> Option<GpgSigner> {
        let key_id = key_override
            .or(self.signing.key_id.as_deref())
            .filter(|key| !key.is_empty())?;
        Some(
            GpgSigner::new(key_id)
                .with_program(self.signing.program.clone())
                .with_timeout(Duration::from_secs(self.signing.timeout_secs)),
        )
    }
}

fn locate(
    explicit: Option<&Path>,
    env: Option<OsString>,
    config_dir: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env.filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    config_dir
        .map(|dir| dir.join("aptblob").join("config.toml"))
        .filter(|path| path.exists())
}
