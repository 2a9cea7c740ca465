//! Windows registry subtree as a nested configuration map.
//!
//! [`TreeReader`] materializes a subtree into a [`Node`]; [`ChangeWatcher`]
//! runs a background loop that calls back whenever the subtree changes, the
//! cue to read a fresh snapshot. [`RegistryProvider`] bundles both and plugs
//! into the `config` crate as a `config::Source`.
mod config;
mod constants;
mod errors;
mod provider;
mod registry;
mod tree;
mod watch;
pub mod utils;

pub use self::config::*;
pub use constants::*;
pub use errors::*;
pub use provider::*;
pub use registry::*;
pub use tree::*;
pub use utils::*;
pub use watch::*;
