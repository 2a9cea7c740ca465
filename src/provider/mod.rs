//! Registry subtree as a `config` source.
//!
//! ```ignore
//! let provider = RegistryProvider::native(
//!     ProviderConfig::new(RootKey::CurrentUser, "SOFTWARE\\Vendor\\App").with_default_value("Default"),
//! );
//! let settings = config::Config::builder().add_source(provider.clone()).build()?;
//! provider.watch(move |event| { /* rebuild `settings` */ })?;
//! ```

#[cfg(test)]
mod provider_test;

use config::ConfigError;
use config::Map;
use config::Source;
use config::ValueKind;
use tokio::sync::mpsc;

use crate::ChangeWatcher;
use crate::Node;
use crate::ProviderConfig;
use crate::Registry;
use crate::Result;
use crate::TreeReader;
use crate::Value;
use crate::WatchHandle;

#[derive(Debug, Clone)]
pub struct RegistryProvider<R: Registry> {
    reader: TreeReader<R>,
    watcher: ChangeWatcher<R>,
}

#[cfg(windows)]
impl RegistryProvider<crate::NativeRegistry> {
    /// Provider backed by the machine registry.
    pub fn native(config: ProviderConfig) -> Self {
        Self::with_registry(crate::NativeRegistry, config)
    }
}

impl<R: Registry> RegistryProvider<R> {
    pub fn with_registry(
        registry: R,
        config: ProviderConfig,
    ) -> Self {
        Self {
            reader: TreeReader::new(registry.clone(), config.clone()),
            watcher: ChangeWatcher::new(registry, config),
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        self.reader.config()
    }

    pub fn reader(&self) -> &TreeReader<R> {
        &self.reader
    }

    pub fn watcher(&self) -> &ChangeWatcher<R> {
        &self.watcher
    }

    pub fn read(&self) -> Result<Node> {
        self.reader.read()
    }

    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        self.reader.read_bytes()
    }

    pub fn watch<F>(
        &self,
        callback: F,
    ) -> Result<WatchHandle>
    where
        F: FnMut(Result<()>) + Send + 'static,
    {
        self.watcher.watch(callback)
    }

    pub fn watch_channel(&self) -> Result<(WatchHandle, mpsc::UnboundedReceiver<Result<()>>)> {
        self.watcher.watch_channel()
    }
}

impl<R: Registry> Source for RegistryProvider<R> {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> std::result::Result<Map<String, config::Value>, ConfigError> {
        let node = self.read().map_err(|e| ConfigError::Foreign(Box::new(e)))?;
        let origin = self.config().qualified_name();
        Ok(to_table(&node, &origin))
    }
}

fn to_table(
    node: &Node,
    origin: &String,
) -> Map<String, config::Value> {
    node.iter()
        .map(|(name, value)| (name.clone(), to_config_value(value, origin)))
        .collect()
}

fn to_config_value(
    value: &Value,
    origin: &String,
) -> config::Value {
    let kind = match value {
        Value::String(s) => ValueKind::String(s.clone()),
        Value::Integer(i) => ValueKind::U64(*i),
        Value::Strings(items) => ValueKind::Array(
            items
                .iter()
                .map(|s| config::Value::new(Some(origin), ValueKind::String(s.clone())))
                .collect(),
        ),
        Value::Bytes(bytes) => ValueKind::Array(
            bytes
                .iter()
                .map(|b| config::Value::new(Some(origin), ValueKind::U64(*b as u64)))
                .collect(),
        ),
        Value::Node(child) => ValueKind::Table(to_table(child, origin)),
    };
    config::Value::new(Some(origin), kind)
}
