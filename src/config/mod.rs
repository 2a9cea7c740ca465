//! Subtree configuration shared by the tree reader and the change watcher.
//!
//! A [`ProviderConfig`] is built once, either in code or through the layered
//! loader below, and is read-only afterwards:
//! 1. Default values from code implementation
//! 2. Configuration file specified by `WINREG_CONFIG_PATH`
//! 3. Environment variables with `WINREG__` prefix (highest priority)
mod root;
mod view;

pub use root::*;
pub use view::*;


use std::env;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;
use crate::CONFIG_ENV_PREFIX;
use crate::KEY_NOTIFY;
use crate::KEY_READ;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Predefined root the subtree lives under
    #[serde(default)]
    pub root: RootKey,

    /// Backslash-separated path below `root`
    #[serde(default)]
    pub path: String,

    /// Name the unnamed (default) value of a key is stored under.
    /// Empty drops unnamed values.
    #[serde(default)]
    pub default_value: String,

    /// Maximum subkey depth, root key counts as level 1.
    /// 0 reads the whole subtree.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// 32/64-bit registry view
    #[serde(default)]
    pub view: RegistryView,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            root: RootKey::default(),
            path: String::new(),
            default_value: String::new(),
            max_depth: default_max_depth(),
            view: RegistryView::default(),
        }
    }
}

impl ProviderConfig {
    pub fn new(
        root: RootKey,
        path: impl Into<String>,
    ) -> Self {
        Self {
            root,
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_default_value(
        mut self,
        name: impl Into<String>,
    ) -> Self {
        self.default_value = name.into();
        self
    }

    pub fn with_max_depth(
        mut self,
        max_depth: u32,
    ) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_view(
        mut self,
        view: RegistryView,
    ) -> Self {
        self.view = view;
        self
    }

    /// Loads configuration from hierarchical sources without validation.
    ///
    /// # Example
    /// ```ignore
    /// std::env::set_var("WINREG__ROOT", "HKLM");
    /// std::env::set_var("WINREG__PATH", "SOFTWARE\\Vendor\\App");
    /// let cfg = ProviderConfig::load()?;
    /// cfg.validate()?;
    /// ```
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("WINREG_CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(environment());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies overrides from a configuration file on top of `self`.
    /// Environment variables still take precedence.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(environment())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.path.starts_with('\\') {
            return Err(Error::Config(ConfigError::Message(format!(
                "path {:?} must be relative to the root key",
                self.path
            ))));
        }

        if self.default_value.contains('\\') {
            return Err(Error::Config(ConfigError::Message(format!(
                "default_value {:?} must not contain a backslash",
                self.default_value
            ))));
        }

        Ok(())
    }

    /// Access rights used to open keys for reading.
    pub fn read_access(&self) -> u32 {
        self.view.access(KEY_READ)
    }

    /// Access rights used to open the watched key.
    pub fn notify_access(&self) -> u32 {
        self.view.access(KEY_NOTIFY)
    }

    /// Change notifications cover only the top-level key when the read depth is
    /// exactly one; any other setting watches the whole subtree.
    pub fn watch_subtree(&self) -> bool {
        self.max_depth != 1
    }

    pub fn qualified_name(&self) -> String {
        self.root.qualify(&self.path)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(CONFIG_ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}

fn default_max_depth() -> u32 {
    0
}
