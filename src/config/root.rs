use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// One of the six predefined registry roots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RootKey {
    #[serde(rename = "HKCR", alias = "classes_root", alias = "HKEY_CLASSES_ROOT")]
    ClassesRoot,
    #[default]
    #[serde(rename = "HKCU", alias = "current_user", alias = "HKEY_CURRENT_USER")]
    CurrentUser,
    #[serde(rename = "HKLM", alias = "local_machine", alias = "HKEY_LOCAL_MACHINE")]
    LocalMachine,
    #[serde(rename = "HKU", alias = "users", alias = "HKEY_USERS")]
    Users,
    #[serde(rename = "HKCC", alias = "current_config", alias = "HKEY_CURRENT_CONFIG")]
    CurrentConfig,
    #[serde(rename = "HKPD", alias = "performance_data", alias = "HKEY_PERFORMANCE_DATA")]
    PerformanceData,
}

impl RootKey {
    pub const ALL: [RootKey; 6] = [
        RootKey::ClassesRoot,
        RootKey::CurrentUser,
        RootKey::LocalMachine,
        RootKey::Users,
        RootKey::CurrentConfig,
        RootKey::PerformanceData,
    ];

    pub fn abbreviation(self) -> &'static str {
        match self {
            RootKey::ClassesRoot => "HKCR",
            RootKey::CurrentUser => "HKCU",
            RootKey::LocalMachine => "HKLM",
            RootKey::Users => "HKU",
            RootKey::CurrentConfig => "HKCC",
            RootKey::PerformanceData => "HKPD",
        }
    }

    /// Fully-qualified key name used in error messages, e.g. `HKCU\SOFTWARE\Vendor`.
    pub fn qualify(
        self,
        path: &str,
    ) -> String {
        if path.is_empty() {
            self.abbreviation().to_string()
        } else {
            format!("{}\\{}", self.abbreviation(), path)
        }
    }
}

impl fmt::Display for RootKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}
