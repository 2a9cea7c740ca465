//! In-memory registry backend.
//!
//! Keys are identified by a generation id, so a key that is deleted and
//! recreated under the same name is a different key: open handles and
//! notification registrations on the old one go stale, like on Windows.
//! Access masks and registry views are accepted but not modelled.
use std::io;
use std::sync::Arc;
use std::sync::Weak;

use parking_lot::Condvar;
use parking_lot::Mutex;
use parking_lot::RwLock;
use tracing::debug;
use tracing::trace;

use super::ChangeNotifier;
use super::RawValue;
use super::Registry;
use super::RegistryKey;
use super::WaitOutcome;
use crate::expand_environment_strings;
use crate::RootKey;
use crate::FILE_NOT_FOUND_MESSAGE;
use crate::KEY_DELETED_MESSAGE;

fn not_found() -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, FILE_NOT_FOUND_MESSAGE)
}

fn key_deleted() -> io::Error {
    io::Error::other(KEY_DELETED_MESSAGE)
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('\\').filter(|s| !s.is_empty())
}

#[derive(Debug)]
struct MemKey {
    id: u64,
    name: String,
    values: Vec<(String, RawValue)>,
    subkeys: Vec<MemKey>,
}

impl MemKey {
    fn new(
        id: u64,
        name: &str,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            values: Vec::new(),
            subkeys: Vec::new(),
        }
    }

    fn child(
        &self,
        name: &str,
    ) -> Option<&MemKey> {
        self.subkeys.iter().find(|k| k.name.eq_ignore_ascii_case(name))
    }

    fn child_mut(
        &mut self,
        name: &str,
    ) -> Option<&mut MemKey> {
        self.subkeys.iter_mut().find(|k| k.name.eq_ignore_ascii_case(name))
    }

    fn value_index(
        &self,
        name: &str,
    ) -> Option<usize> {
        self.values.iter().position(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    /// Ids of this key and every key below it.
    fn collect_ids(
        &self,
        ids: &mut Vec<u64>,
    ) {
        ids.push(self.id);
        for sub in &self.subkeys {
            sub.collect_ids(ids);
        }
    }

    /// Finds a key by id, filling `chain` with the ids from here down to it.
    fn find_by_id(
        &self,
        id: u64,
        chain: &mut Vec<u64>,
    ) -> Option<&MemKey> {
        chain.push(self.id);
        if self.id == id {
            return Some(self);
        }
        for sub in &self.subkeys {
            if let Some(found) = sub.find_by_id(id, chain) {
                return Some(found);
            }
        }
        chain.pop();
        None
    }
}

#[derive(Debug, Default)]
struct EventState {
    signaled: bool,
    abandoned: bool,
}

/// Manual-reset event
#[derive(Debug, Default)]
struct Event {
    state: Mutex<EventState>,
    cond: Condvar,
}

impl Event {
    fn set(&self) {
        self.state.lock().signaled = true;
        self.cond.notify_all();
    }

    fn abandon(&self) {
        self.state.lock().abandoned = true;
        self.cond.notify_all();
    }
}

#[derive(Debug)]
struct Registration {
    key_id: u64,
    watch_subtree: bool,
    event: Arc<Event>,
}

#[derive(Debug)]
struct Hive {
    /// Indexed by [`root_slot`]
    roots: Vec<MemKey>,
    next_id: u64,
    registrations: Vec<Registration>,
    events: Vec<Weak<Event>>,
    abandoned: bool,
}

fn root_slot(root: RootKey) -> usize {
    match root {
        RootKey::ClassesRoot => 0,
        RootKey::CurrentUser => 1,
        RootKey::LocalMachine => 2,
        RootKey::Users => 3,
        RootKey::CurrentConfig => 4,
        RootKey::PerformanceData => 5,
    }
}

impl Hive {
    fn new() -> Self {
        let mut hive = Self {
            roots: Vec::with_capacity(RootKey::ALL.len()),
            next_id: 1,
            registrations: Vec::new(),
            events: Vec::new(),
            abandoned: false,
        };
        for root in RootKey::ALL {
            let id = hive.allocate_id();
            hive.roots.push(MemKey::new(id, root.abbreviation()));
        }
        hive
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Resolves `path`, returning the key and the id chain from the root down to it.
    fn locate(
        &self,
        root: RootKey,
        path: &str,
    ) -> Option<(&MemKey, Vec<u64>)> {
        let mut key = &self.roots[root_slot(root)];
        let mut chain = vec![key.id];
        for segment in segments(path) {
            key = key.child(segment)?;
            chain.push(key.id);
        }
        Some((key, chain))
    }

    fn locate_mut(
        &mut self,
        root: RootKey,
        path: &str,
    ) -> Option<&mut MemKey> {
        let mut key = &mut self.roots[root_slot(root)];
        for segment in segments(path) {
            key = key.child_mut(segment)?;
        }
        Some(key)
    }

    fn find_by_id(
        &self,
        id: u64,
    ) -> Option<(&MemKey, Vec<u64>)> {
        for root in &self.roots {
            let mut chain = Vec::new();
            if let Some(key) = root.find_by_id(id, &mut chain) {
                return Some((key, chain));
            }
        }
        None
    }

    fn is_alive(
        &self,
        id: u64,
    ) -> bool {
        self.find_by_id(id).is_some()
    }

    /// Fires every one-shot registration covering a change to the key at the
    /// end of `chain`, plus registrations on any key in `removed`.
    fn notify(
        &mut self,
        chain: &[u64],
        removed: &[u64],
    ) {
        let changed = chain.last().copied();
        self.registrations.retain(|reg| {
            let fires = Some(reg.key_id) == changed
                || removed.contains(&reg.key_id)
                || (reg.watch_subtree && chain.contains(&reg.key_id));
            if fires {
                trace!("signal change registration on key #{}", reg.key_id);
                reg.event.set();
            }
            !fires
        });
    }
}

/// Registry backend that keeps the whole tree in process memory.
///
/// Clones share the same tree.
#[derive(Debug, Clone)]
pub struct MemoryRegistry {
    hive: Arc<RwLock<Hive>>,
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self {
            hive: Arc::new(RwLock::new(Hive::new())),
        }
    }

    /// Creates `path` and any missing intermediate keys.
    /// Returns `false` when the key already existed.
    pub fn create_key(
        &self,
        root: RootKey,
        path: &str,
    ) -> io::Result<bool> {
        let mut hive = self.hive.write();
        let mut created = false;
        let mut parent_path = String::new();

        for segment in segments(path) {
            let child_path = if parent_path.is_empty() {
                segment.to_string()
            } else {
                format!("{parent_path}\\{segment}")
            };
            if hive.locate(root, &child_path).is_none() {
                let id = hive.allocate_id();
                let parent_chain = hive.locate(root, &parent_path).ok_or_else(not_found)?.1;
                hive.locate_mut(root, &parent_path)
                    .ok_or_else(not_found)?
                    .subkeys
                    .push(MemKey::new(id, segment));
                hive.notify(&parent_chain, &[]);
                created = true;
            }
            parent_path = child_path;
        }

        debug!("create_key {} (created: {})", root.qualify(path), created);
        Ok(created)
    }

    /// Sets a value on an existing key. An empty name sets the unnamed value.
    pub fn set_value(
        &self,
        root: RootKey,
        path: &str,
        name: &str,
        value: RawValue,
    ) -> io::Result<()> {
        let mut hive = self.hive.write();
        let chain = hive.locate(root, path).ok_or_else(not_found)?.1;
        let key = hive.locate_mut(root, path).ok_or_else(not_found)?;
        match key.value_index(name) {
            Some(i) => key.values[i].1 = value,
            None => key.values.push((name.to_string(), value)),
        }
        hive.notify(&chain, &[]);
        Ok(())
    }

    pub fn delete_value(
        &self,
        root: RootKey,
        path: &str,
        name: &str,
    ) -> io::Result<()> {
        let mut hive = self.hive.write();
        let chain = hive.locate(root, path).ok_or_else(not_found)?.1;
        let key = hive.locate_mut(root, path).ok_or_else(not_found)?;
        let index = key.value_index(name).ok_or_else(not_found)?;
        key.values.remove(index);
        hive.notify(&chain, &[]);
        Ok(())
    }

    /// Deletes `path` together with everything below it.
    pub fn delete_key(
        &self,
        root: RootKey,
        path: &str,
    ) -> io::Result<()> {
        let mut parts: Vec<&str> = segments(path).collect();
        let name = parts.pop().ok_or_else(|| {
            io::Error::new(io::ErrorKind::PermissionDenied, "cannot delete a registry root")
        })?;
        let parent_path = parts.join("\\");

        let mut hive = self.hive.write();
        let parent_chain = hive.locate(root, &parent_path).ok_or_else(not_found)?.1;
        let parent = hive.locate_mut(root, &parent_path).ok_or_else(not_found)?;
        let index = parent
            .subkeys
            .iter()
            .position(|k| k.name.eq_ignore_ascii_case(name))
            .ok_or_else(not_found)?;
        let removed = parent.subkeys.remove(index);

        let mut removed_ids = Vec::new();
        removed.collect_ids(&mut removed_ids);
        hive.notify(&parent_chain, &removed_ids);

        debug!("delete_key {}", root.qualify(path));
        Ok(())
    }

    /// Tears down every wait object handed out by this registry: pending
    /// and future waits report [`WaitOutcome::Abandoned`].
    pub fn abandon_watchers(&self) {
        let mut hive = self.hive.write();
        hive.abandoned = true;
        hive.registrations.clear();
        hive.events.retain(|weak| match weak.upgrade() {
            Some(event) => {
                event.abandon();
                true
            }
            None => false,
        });
    }

    /// Number of armed, not yet fired registrations.
    pub fn pending_registrations(&self) -> usize {
        self.hive.read().registrations.len()
    }
}

impl Registry for MemoryRegistry {
    type Key = MemoryKey;
    type Notifier = MemoryNotifier;

    fn open_key(
        &self,
        root: RootKey,
        path: &str,
        _access: u32,
    ) -> io::Result<MemoryKey> {
        let hive = self.hive.read();
        let (key, _) = hive.locate(root, path).ok_or_else(not_found)?;
        Ok(MemoryKey {
            hive: self.hive.clone(),
            id: key.id,
        })
    }

    fn open_notifier(
        &self,
        root: RootKey,
        path: &str,
        _access: u32,
        watch_subtree: bool,
    ) -> io::Result<MemoryNotifier> {
        let mut hive = self.hive.write();
        let (key, _) = hive.locate(root, path).ok_or_else(not_found)?;
        let key_id = key.id;

        let event = Arc::new(Event::default());
        if hive.abandoned {
            event.abandon();
        }
        hive.events.push(Arc::downgrade(&event));

        Ok(MemoryNotifier {
            hive: self.hive.clone(),
            key_id,
            watch_subtree,
            event,
        })
    }

    fn expand_environment(
        &self,
        raw: &str,
    ) -> io::Result<String> {
        Ok(expand_environment_strings(raw))
    }
}

/// Open key handle; reads go to the live tree.
#[derive(Debug)]
pub struct MemoryKey {
    hive: Arc<RwLock<Hive>>,
    id: u64,
}

impl MemoryKey {
    fn with_key<T>(
        &self,
        f: impl FnOnce(&MemKey) -> io::Result<T>,
    ) -> io::Result<T> {
        let hive = self.hive.read();
        let (key, _) = hive.find_by_id(self.id).ok_or_else(key_deleted)?;
        f(key)
    }
}

impl RegistryKey for MemoryKey {
    fn value_names(&self) -> io::Result<Vec<String>> {
        self.with_key(|key| Ok(key.values.iter().map(|(n, _)| n.clone()).collect()))
    }

    fn value(
        &self,
        name: &str,
    ) -> io::Result<RawValue> {
        self.with_key(|key| {
            let index = key.value_index(name).ok_or_else(not_found)?;
            Ok(key.values[index].1.clone())
        })
    }

    fn subkey_names(&self) -> io::Result<Vec<String>> {
        self.with_key(|key| Ok(key.subkeys.iter().map(|k| k.name.clone()).collect()))
    }
}

#[derive(Debug)]
pub struct MemoryNotifier {
    hive: Arc<RwLock<Hive>>,
    key_id: u64,
    watch_subtree: bool,
    event: Arc<Event>,
}

impl ChangeNotifier for MemoryNotifier {
    fn arm(&mut self) -> io::Result<()> {
        let mut hive = self.hive.write();
        if !hive.is_alive(self.key_id) {
            return Err(key_deleted());
        }

        let event = &self.event;
        hive.registrations.retain(|reg| !Arc::ptr_eq(&reg.event, event));
        hive.registrations.push(Registration {
            key_id: self.key_id,
            watch_subtree: self.watch_subtree,
            event: self.event.clone(),
        });
        Ok(())
    }

    fn wait(&mut self) -> io::Result<WaitOutcome> {
        let mut state = self.event.state.lock();
        while !state.signaled && !state.abandoned {
            self.event.cond.wait(&mut state);
        }
        if state.abandoned {
            Ok(WaitOutcome::Abandoned)
        } else {
            Ok(WaitOutcome::Signaled)
        }
    }

    fn reset(&mut self) -> io::Result<()> {
        self.event.state.lock().signaled = false;
        Ok(())
    }
}

impl Drop for MemoryNotifier {
    fn drop(&mut self) {
        let event = &self.event;
        let mut hive = self.hive.write();
        hive.registrations.retain(|reg| !Arc::ptr_eq(&reg.event, event));
        hive.events.retain(|weak| weak.strong_count() > 0 && weak.as_ptr() != Arc::as_ptr(event));
    }
}
