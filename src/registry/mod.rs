//! Registry access seam.
//!
//! The tree reader and the change watcher only ever talk to the registry
//! through [`Registry`], [`RegistryKey`] and [`ChangeNotifier`]. The native
//! Windows backend lives behind `cfg(windows)`; [`MemoryRegistry`] implements
//! the same contract in process so the read and watch logic runs everywhere.
mod memory;
#[cfg(windows)]
mod native;
mod value_type;

pub use memory::*;
#[cfg(windows)]
pub use native::*;
pub use value_type::*;


use std::fmt::Debug;
use std::io;

#[cfg(test)]
use mockall::automock;

use crate::convert;
use crate::RootKey;

/// Value data exactly as the registry stores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawValue {
    /// Raw type tag, see [`ValueType`]
    pub kind: u32,
    pub data: Vec<u8>,
}

impl RawValue {
    pub fn new(
        kind: u32,
        data: Vec<u8>,
    ) -> Self {
        Self { kind, data }
    }

    pub fn value_type(&self) -> Option<ValueType> {
        ValueType::from_raw(self.kind)
    }

    pub fn string(value: &str) -> Self {
        Self::new(ValueType::Sz.raw(), convert::encode_string(value))
    }

    pub fn expand_string(value: &str) -> Self {
        Self::new(ValueType::ExpandSz.raw(), convert::encode_string(value))
    }

    pub fn multi_string<S: AsRef<str>>(values: &[S]) -> Self {
        Self::new(ValueType::MultiSz.raw(), convert::encode_multi_string(values))
    }

    pub fn dword(value: u32) -> Self {
        Self::new(ValueType::Dword.raw(), value.to_le_bytes().to_vec())
    }

    pub fn dword_big_endian(value: u32) -> Self {
        Self::new(ValueType::DwordBigEndian.raw(), value.to_be_bytes().to_vec())
    }

    pub fn qword(value: u64) -> Self {
        Self::new(ValueType::Qword.raw(), value.to_le_bytes().to_vec())
    }

    pub fn binary(value: impl Into<Vec<u8>>) -> Self {
        Self::new(ValueType::Binary.raw(), value.into())
    }
}

/// Result of blocking on a change notification event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The watched subtree changed
    Signaled,
    /// The wait object was torn down underneath the waiter
    Abandoned,
}

pub trait Registry: Clone + Debug + Send + Sync + 'static {
    type Key: RegistryKey;
    type Notifier: ChangeNotifier;

    /// Opens `path` below `root`. Dropping the returned key closes it.
    fn open_key(
        &self,
        root: RootKey,
        path: &str,
        access: u32,
    ) -> io::Result<Self::Key>;

    /// Opens `path` for notification together with a manual-reset,
    /// initially unsignaled wait object. Nothing is registered yet.
    fn open_notifier(
        &self,
        root: RootKey,
        path: &str,
        access: u32,
        watch_subtree: bool,
    ) -> io::Result<Self::Notifier>;

    /// Replaces `%NAME%` references with the current environment.
    fn expand_environment(
        &self,
        raw: &str,
    ) -> io::Result<String>;
}

pub trait RegistryKey {
    /// Names of the values stored directly under this key. The unnamed
    /// value, when present, is reported as an empty string.
    fn value_names(&self) -> io::Result<Vec<String>>;

    fn value(
        &self,
        name: &str,
    ) -> io::Result<RawValue>;

    fn subkey_names(&self) -> io::Result<Vec<String>>;
}

/// One-shot change registration against an open key and its wait object.
///
/// Every successful [`arm`](ChangeNotifier::arm) produces at most one signal;
/// changes between a signal and the next `arm` are not replayed.
/// The key handle and the wait object are released on drop.
#[cfg_attr(test, automock)]
pub trait ChangeNotifier: Send + 'static {
    /// Registers for the next name or last-write change.
    fn arm(&mut self) -> io::Result<()>;

    /// Blocks until the wait object is signaled.
    fn wait(&mut self) -> io::Result<WaitOutcome>;

    /// Returns the wait object to the unsignaled state.
    fn reset(&mut self) -> io::Result<()>;
}
