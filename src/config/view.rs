use serde::Deserialize;
use serde::Serialize;

use crate::KEY_WOW64_32KEY;
use crate::KEY_WOW64_64KEY;

/// Which registry reflection a 32-bit or 64-bit process sees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RegistryView {
    /// Whatever the calling process would see natively
    #[default]
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "32bit", alias = "force32")]
    Force32,
    #[serde(rename = "64bit", alias = "force64")]
    Force64,
}

impl RegistryView {
    /// Adds the WOW64 view flag, if any, to `base` access rights.
    pub fn access(
        self,
        base: u32,
    ) -> u32 {
        match self {
            RegistryView::Auto => base,
            RegistryView::Force32 => base | KEY_WOW64_32KEY,
            RegistryView::Force64 => base | KEY_WOW64_64KEY,
        }
    }
}
