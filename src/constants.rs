// -
// Registry access rights (REGSAM)

/// STANDARD_RIGHTS_READ | KEY_QUERY_VALUE | KEY_ENUMERATE_SUB_KEYS | KEY_NOTIFY
pub const KEY_READ: u32 = 0x0002_0019;
pub const KEY_NOTIFY: u32 = 0x0010;
pub const KEY_WOW64_64KEY: u32 = 0x0100;
pub const KEY_WOW64_32KEY: u32 = 0x0200;

// -
// Change notification filter

pub const REG_NOTIFY_CHANGE_NAME: u32 = 0x0001;
pub const REG_NOTIFY_CHANGE_LAST_SET: u32 = 0x0004;
/// Keeps the registration alive when the thread that issued it exits.
pub const REG_NOTIFY_THREAD_AGNOSTIC: u32 = 0x1000_0000;

/// Subkey added or deleted, or a value added, deleted or modified.
pub const WATCH_FILTER: u32 = REG_NOTIFY_CHANGE_NAME | REG_NOTIFY_CHANGE_LAST_SET;

// -
// Win32 error texts mirrored by the in-memory backend

pub(crate) const FILE_NOT_FOUND_MESSAGE: &str = "The system cannot find the file specified.";
pub(crate) const KEY_DELETED_MESSAGE: &str =
    "Illegal operation attempted on a registry key that has been marked for deletion.";

/// Environment variable prefix used by `ProviderConfig::load`
pub(crate) const CONFIG_ENV_PREFIX: &str = "WINREG";
