//! Depth-bounded, type-aware materialization of a registry subtree.
//!
//! Reads are all-or-nothing: the first key or value that cannot be read
//! aborts the whole read and no partial node is returned.
mod value;

pub use value::*;


use std::io;

use tracing::debug;
use tracing::trace;

use crate::convert;
use crate::Error;
use crate::ProviderConfig;
use crate::RawValue;
use crate::Registry;
use crate::RegistryKey;
use crate::Result;
use crate::ValueType;

/// Point-in-time reader of the configured subtree.
#[derive(Debug, Clone)]
pub struct TreeReader<R: Registry> {
    registry: R,
    config: ProviderConfig,
    access: u32,
}

impl<R: Registry> TreeReader<R> {
    pub fn new(
        registry: R,
        config: ProviderConfig,
    ) -> Self {
        let access = config.read_access();
        Self {
            registry,
            config,
            access,
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Reads a fresh snapshot of the whole configured subtree.
    pub fn read(&self) -> Result<Node> {
        self.read_subtree(&self.config.path, 1)
    }

    /// The registry is only ever exposed as a map; there is no raw byte form.
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        Err(Error::Unsupported("read_bytes"))
    }

    /// `level` is 1 for the configured key itself.
    fn read_subtree(
        &self,
        path: &str,
        level: u32,
    ) -> Result<Node> {
        let key_name = self.config.root.qualify(path);
        let key = self
            .registry
            .open_key(self.config.root, path, self.access)
            .map_err(|source| {
                debug!("open {} failed: {}", key_name, source);
                Error::KeyOpenFailed {
                    key: key_name.clone(),
                    source,
                }
            })?;

        let mut node = Node::new();

        let names = key.value_names().map_err(|source| Error::EnumerationFailed {
            key: key_name.clone(),
            source,
        })?;
        for name in names {
            let raw = key.value(&name).map_err(|source| Error::ValueReadFailed {
                key: key_name.clone(),
                value: name.clone(),
                source,
            })?;
            if let Some((entry, value)) = self.convert_value(&key_name, &name, raw)? {
                node.insert(entry, value);
            }
        }

        if self.config.max_depth == 0 || level < self.config.max_depth {
            let subkeys = key.subkey_names().map_err(|source| Error::EnumerationFailed {
                key: key_name.clone(),
                source,
            })?;
            for subkey in subkeys {
                let child = child_path(path, &subkey);
                let subtree = self.read_subtree(&child, level + 1)?;
                // A value with the same name is overwritten here.
                node.insert(subkey, Value::Node(subtree));
            }
        }

        Ok(node)
    }

    /// Converts one raw value. `None` means the value is skipped: an unnamed
    /// value without an alias, or a type tag that has no mapping.
    fn convert_value(
        &self,
        key_name: &str,
        name: &str,
        raw: RawValue,
    ) -> Result<Option<(String, Value)>> {
        let entry = if name.is_empty() {
            if self.config.default_value.is_empty() {
                trace!("{}: unnamed value dropped, no alias configured", key_name);
                return Ok(None);
            }
            self.config.default_value.clone()
        } else {
            name.to_string()
        };

        let read_failed = |source: io::Error| Error::ValueReadFailed {
            key: key_name.to_string(),
            value: name.to_string(),
            source,
        };

        let value = match raw.value_type() {
            Some(ValueType::Sz) => Value::String(convert::decode_string(&raw.data).map_err(read_failed)?),
            Some(ValueType::ExpandSz) => {
                let unexpanded = convert::decode_string(&raw.data).map_err(read_failed)?;
                let expanded = self.registry.expand_environment(&unexpanded).map_err(|source| {
                    Error::ExpansionFailed {
                        key: key_name.to_string(),
                        value: name.to_string(),
                        source,
                    }
                })?;
                Value::String(expanded)
            }
            Some(ValueType::MultiSz) => Value::Strings(convert::decode_multi_string(&raw.data).map_err(read_failed)?),
            Some(ValueType::Dword) => Value::Integer(convert::decode_dword(&raw.data).map_err(read_failed)?),
            Some(ValueType::Qword) => Value::Integer(convert::decode_qword(&raw.data).map_err(read_failed)?),
            Some(ValueType::DwordBigEndian) => {
                Value::Integer(convert::decode_dword_big_endian(&raw.data).map_err(read_failed)?)
            }
            Some(ValueType::Binary) => Value::Bytes(raw.data),
            Some(
                ValueType::None
                | ValueType::Link
                | ValueType::ResourceList
                | ValueType::FullResourceDescriptor
                | ValueType::ResourceRequirementsList,
            )
            | None => {
                trace!("{}: skip value {:?} of type {}", key_name, name, raw.kind);
                return Ok(None);
            }
        };

        Ok(Some((entry, value)))
    }
}

fn child_path(
    parent: &str,
    child: &str,
) -> String {
    let parent = parent.trim_end_matches('\\');
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}\\{child}")
    }
}
