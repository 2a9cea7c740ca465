//! Win32 registry backend.
use std::io;
use std::ptr;

use tracing::trace;
use windows_sys::Win32::Foundation::CloseHandle;
use windows_sys::Win32::Foundation::ERROR_MORE_DATA;
use windows_sys::Win32::Foundation::ERROR_NO_MORE_ITEMS;
use windows_sys::Win32::Foundation::ERROR_SUCCESS;
use windows_sys::Win32::Foundation::HANDLE;
use windows_sys::Win32::Foundation::WAIT_ABANDONED;
use windows_sys::Win32::Foundation::WAIT_FAILED;
use windows_sys::Win32::Foundation::WAIT_OBJECT_0;
use windows_sys::Win32::System::Environment::ExpandEnvironmentStringsW;
use windows_sys::Win32::System::Registry::RegCloseKey;
use windows_sys::Win32::System::Registry::RegEnumKeyExW;
use windows_sys::Win32::System::Registry::RegEnumValueW;
use windows_sys::Win32::System::Registry::RegNotifyChangeKeyValue;
use windows_sys::Win32::System::Registry::RegOpenKeyExW;
use windows_sys::Win32::System::Registry::RegQueryInfoKeyW;
use windows_sys::Win32::System::Registry::RegQueryValueExW;
use windows_sys::Win32::System::Registry::HKEY;
use windows_sys::Win32::System::Registry::HKEY_CLASSES_ROOT;
use windows_sys::Win32::System::Registry::HKEY_CURRENT_CONFIG;
use windows_sys::Win32::System::Registry::HKEY_CURRENT_USER;
use windows_sys::Win32::System::Registry::HKEY_LOCAL_MACHINE;
use windows_sys::Win32::System::Registry::HKEY_PERFORMANCE_DATA;
use windows_sys::Win32::System::Registry::HKEY_USERS;
use windows_sys::Win32::System::Threading::CreateEventW;
use windows_sys::Win32::System::Threading::ResetEvent;
use windows_sys::Win32::System::Threading::WaitForSingleObject;
use windows_sys::Win32::System::Threading::INFINITE;

use super::ChangeNotifier;
use super::RawValue;
use super::Registry;
use super::RegistryKey;
use super::WaitOutcome;
use crate::convert::to_wide;
use crate::RootKey;
use crate::REG_NOTIFY_THREAD_AGNOSTIC;
use crate::WATCH_FILTER;

fn check(code: u32) -> io::Result<()> {
    if code == ERROR_SUCCESS {
        Ok(())
    } else {
        Err(io::Error::from_raw_os_error(code as i32))
    }
}

fn predefined(root: RootKey) -> HKEY {
    match root {
        RootKey::ClassesRoot => HKEY_CLASSES_ROOT,
        RootKey::CurrentUser => HKEY_CURRENT_USER,
        RootKey::LocalMachine => HKEY_LOCAL_MACHINE,
        RootKey::Users => HKEY_USERS,
        RootKey::CurrentConfig => HKEY_CURRENT_CONFIG,
        RootKey::PerformanceData => HKEY_PERFORMANCE_DATA,
    }
}

fn wide_to_string(units: &[u16]) -> io::Result<String> {
    String::from_utf16(units).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Registry key handle closed on drop.
#[derive(Debug)]
struct OwnedKey(HKEY);

// A registry handle may be used and closed from any thread.
unsafe impl Send for OwnedKey {}
unsafe impl Sync for OwnedKey {}

impl OwnedKey {
    fn open(
        root: RootKey,
        path: &str,
        access: u32,
    ) -> io::Result<Self> {
        let wide = to_wide(path);
        let mut hkey: HKEY = ptr::null_mut();
        check(unsafe { RegOpenKeyExW(predefined(root), wide.as_ptr(), 0, access, &mut hkey) })?;
        Ok(OwnedKey(hkey))
    }

    /// (longest subkey name, longest value name) in UTF-16 units
    fn name_limits(&self) -> io::Result<(u32, u32)> {
        let mut max_subkey_len = 0u32;
        let mut max_value_name_len = 0u32;
        check(unsafe {
            RegQueryInfoKeyW(
                self.0,
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null(),
                ptr::null_mut(),
                &mut max_subkey_len,
                ptr::null_mut(),
                ptr::null_mut(),
                &mut max_value_name_len,
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
            )
        })?;
        Ok((max_subkey_len, max_value_name_len))
    }

    /// Enumerates names with `enum_fn` until ERROR_NO_MORE_ITEMS, growing the
    /// buffer whenever the key changed underneath and a name no longer fits.
    fn enumerate(
        &self,
        initial_len: u32,
        enum_fn: impl Fn(u32, *mut u16, *mut u32) -> u32,
    ) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        let mut buf = vec![0u16; initial_len as usize + 1];
        let mut index = 0;
        loop {
            let mut len = buf.len() as u32;
            match enum_fn(index, buf.as_mut_ptr(), &mut len) {
                ERROR_SUCCESS => {
                    names.push(wide_to_string(&buf[..len as usize])?);
                    index += 1;
                }
                ERROR_NO_MORE_ITEMS => return Ok(names),
                ERROR_MORE_DATA => buf.resize(buf.len() * 2, 0),
                code => return Err(io::Error::from_raw_os_error(code as i32)),
            }
        }
    }
}

impl Drop for OwnedKey {
    fn drop(&mut self) {
        unsafe {
            RegCloseKey(self.0);
        }
    }
}

/// Event handle closed on drop.
#[derive(Debug)]
struct OwnedEvent(HANDLE);

unsafe impl Send for OwnedEvent {}

impl OwnedEvent {
    /// Manual-reset, initially unsignaled, unnamed.
    fn manual_reset() -> io::Result<Self> {
        let handle = unsafe { CreateEventW(ptr::null(), 1, 0, ptr::null()) };
        if handle.is_null() {
            return Err(io::Error::last_os_error());
        }
        Ok(OwnedEvent(handle))
    }
}

impl Drop for OwnedEvent {
    fn drop(&mut self) {
        unsafe {
            CloseHandle(self.0);
        }
    }
}

/// The machine registry, reached through the Win32 API.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRegistry;

impl Registry for NativeRegistry {
    type Key = NativeKey;
    type Notifier = NativeNotifier;

    fn open_key(
        &self,
        root: RootKey,
        path: &str,
        access: u32,
    ) -> io::Result<NativeKey> {
        Ok(NativeKey {
            key: OwnedKey::open(root, path, access)?,
        })
    }

    fn open_notifier(
        &self,
        root: RootKey,
        path: &str,
        access: u32,
        watch_subtree: bool,
    ) -> io::Result<NativeNotifier> {
        let key = OwnedKey::open(root, path, access)?;
        let event = OwnedEvent::manual_reset()?;
        Ok(NativeNotifier {
            key,
            event,
            watch_subtree,
        })
    }

    fn expand_environment(
        &self,
        raw: &str,
    ) -> io::Result<String> {
        let src = to_wide(raw);
        let mut buf = vec![0u16; src.len()];
        loop {
            let needed = unsafe { ExpandEnvironmentStringsW(src.as_ptr(), buf.as_mut_ptr(), buf.len() as u32) };
            if needed == 0 {
                return Err(io::Error::last_os_error());
            }
            // `needed` counts the terminating NUL
            if needed as usize <= buf.len() {
                return wide_to_string(&buf[..needed as usize - 1]);
            }
            buf.resize(needed as usize, 0);
        }
    }
}

#[derive(Debug)]
pub struct NativeKey {
    key: OwnedKey,
}

impl RegistryKey for NativeKey {
    fn value_names(&self) -> io::Result<Vec<String>> {
        let (_, max_value_name_len) = self.key.name_limits()?;
        let hkey = self.key.0;
        self.key.enumerate(max_value_name_len, |index, name, len| unsafe {
            RegEnumValueW(
                hkey,
                index,
                name,
                len,
                ptr::null(),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
            )
        })
    }

    fn value(
        &self,
        name: &str,
    ) -> io::Result<RawValue> {
        let wide = to_wide(name);
        let mut kind = 0u32;
        let mut size = 0u32;
        check(unsafe {
            RegQueryValueExW(
                self.key.0,
                wide.as_ptr(),
                ptr::null(),
                &mut kind,
                ptr::null_mut(),
                &mut size,
            )
        })?;

        let mut data = vec![0u8; size as usize];
        loop {
            let mut len = data.len() as u32;
            let code = unsafe {
                RegQueryValueExW(
                    self.key.0,
                    wide.as_ptr(),
                    ptr::null(),
                    &mut kind,
                    data.as_mut_ptr(),
                    &mut len,
                )
            };
            match code {
                ERROR_SUCCESS => {
                    data.truncate(len as usize);
                    return Ok(RawValue::new(kind, data));
                }
                // The value grew between the two calls
                ERROR_MORE_DATA => data.resize(len as usize, 0),
                code => return Err(io::Error::from_raw_os_error(code as i32)),
            }
        }
    }

    fn subkey_names(&self) -> io::Result<Vec<String>> {
        let (max_subkey_len, _) = self.key.name_limits()?;
        let hkey = self.key.0;
        self.key.enumerate(max_subkey_len, |index, name, len| unsafe {
            RegEnumKeyExW(
                hkey,
                index,
                name,
                len,
                ptr::null(),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
            )
        })
    }
}

/// Key opened for KEY_NOTIFY plus its manual-reset event.
#[derive(Debug)]
pub struct NativeNotifier {
    key: OwnedKey,
    event: OwnedEvent,
    watch_subtree: bool,
}

impl ChangeNotifier for NativeNotifier {
    fn arm(&mut self) -> io::Result<()> {
        trace!("RegNotifyChangeKeyValue(subtree: {})", self.watch_subtree);
        check(unsafe {
            RegNotifyChangeKeyValue(
                self.key.0,
                self.watch_subtree as i32,
                WATCH_FILTER | REG_NOTIFY_THREAD_AGNOSTIC,
                self.event.0,
                1,
            )
        })
    }

    fn wait(&mut self) -> io::Result<WaitOutcome> {
        match unsafe { WaitForSingleObject(self.event.0, INFINITE) } {
            WAIT_OBJECT_0 => Ok(WaitOutcome::Signaled),
            WAIT_ABANDONED => Ok(WaitOutcome::Abandoned),
            WAIT_FAILED => Err(io::Error::last_os_error()),
            other => Err(io::Error::other(format!("unexpected wait result {other:#x}"))),
        }
    }

    fn reset(&mut self) -> io::Result<()> {
        if unsafe { ResetEvent(self.event.0) } == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}
