//! Change watching on top of a one-shot notification primitive.
//!
//! `watch()` opens the subtree and starts the background loop in `Idle`. The
//! loop's first step arms the registration and reports the outcome back to
//! the caller, who stays blocked until then: notification is already active
//! when `watch()` returns, and a failed first registration is returned
//! instead of going through the callback. Each later iteration waits, resets
//! the wait object, re-arms and finally runs the callback. Changes landing
//! between the signal and the re-arm are not replayed.
//!
//! There is no way to stop a loop from outside: it ends on a registration or
//! wait failure, when the wait object is abandoned, or with the process.
//! The callback runs on the loop thread, so slow callbacks delay detection of
//! the next change.


use std::io;
use std::sync::mpsc::sync_channel;
use std::sync::mpsc::SyncSender;
use std::thread;
use std::thread::JoinHandle;

use tokio::sync::mpsc;
use tracing::debug;
use tracing::info;
use tracing::trace;
use tracing::warn;

use crate::ChangeNotifier;
use crate::Error;
use crate::ProviderConfig;
use crate::Registry;
use crate::Result;
use crate::WaitOutcome;

/// Why a watch loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Re-arming the notification failed, e.g. the watched key was deleted
    RegistrationFailed,
    /// Waiting on or resetting the event failed
    WaitFailed,
    /// The event was torn down externally; no callback is made
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Key open, nothing registered yet
    Idle,
    Armed,
    Terminated(Termination),
}

/// Handle to a running watch loop. Dropping it detaches the loop.
#[derive(Debug)]
pub struct WatchHandle {
    key: String,
    inner: JoinHandle<Termination>,
}

impl WatchHandle {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    /// Blocks until the loop terminates on its own. `None` if the callback panicked.
    pub fn join(self) -> Option<Termination> {
        self.inner.join().ok()
    }
}

#[derive(Debug, Clone)]
pub struct ChangeWatcher<R: Registry> {
    registry: R,
    config: ProviderConfig,
}

impl<R: Registry> ChangeWatcher<R> {
    pub fn new(
        registry: R,
        config: ProviderConfig,
    ) -> Self {
        Self { registry, config }
    }

    /// Starts watching the configured subtree.
    ///
    /// Fails without ever calling `callback` when the key cannot be opened or
    /// the first registration fails. Every later change calls `callback(Ok(()))`;
    /// a fatal error is passed once as `callback(Err(..))` before the loop ends.
    /// Calling `watch` again creates an independent loop.
    pub fn watch<F>(
        &self,
        callback: F,
    ) -> Result<WatchHandle>
    where
        F: FnMut(Result<()>) + Send + 'static,
    {
        let key = self.config.qualified_name();
        let notifier = self
            .registry
            .open_notifier(
                self.config.root,
                &self.config.path,
                self.config.notify_access(),
                self.config.watch_subtree(),
            )
            .map_err(|source| {
                warn!("open {} for notification failed: {}", key, source);
                Error::KeyOpenFailed {
                    key: key.clone(),
                    source,
                }
            })?;
        debug!("opened {} for notification (subtree: {})", key, self.config.watch_subtree());

        spawn_watch_loop(key, notifier, callback)
    }

    /// Like [`watch`](Self::watch), but delivers notifications through a
    /// channel for callers living on an async runtime. The loop keeps running
    /// after the receiver is dropped; its sends are then discarded.
    pub fn watch_channel(&self) -> Result<(WatchHandle, mpsc::UnboundedReceiver<Result<()>>)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = self.watch(move |event| {
            if tx.send(event).is_err() {
                trace!("watch receiver dropped, notification discarded");
            }
        })?;
        Ok((handle, rx))
    }
}

/// Starts the loop for an unarmed `notifier` on a dedicated thread and blocks
/// until its first registration went through.
pub(crate) fn spawn_watch_loop<N, F>(
    key: String,
    notifier: N,
    callback: F,
) -> Result<WatchHandle>
where
    N: ChangeNotifier,
    F: FnMut(Result<()>) + Send + 'static,
{
    let (armed_tx, armed_rx) = sync_channel(1);
    let loop_key = key.clone();
    let inner = thread::Builder::new()
        .name(format!("winreg-watch {key}"))
        .spawn(move || run_watch_loop(&loop_key, notifier, armed_tx, callback))
        .map_err(|source| Error::TaskSpawnFailed {
            key: key.clone(),
            source,
        })?;

    let armed = armed_rx
        .recv()
        .unwrap_or_else(|_| Err(io::Error::other("watch loop exited before registering")));
    if let Err(source) = armed {
        if inner.join().is_err() {
            warn!("{}: watch loop panicked during registration", key);
        }
        return Err(Error::WatchRegistrationFailed { key, source });
    }

    info!("watching {}", key);
    Ok(WatchHandle { key, inner })
}

/// Drives `notifier` from `Idle` until it terminates. The outcome of the first
/// registration is sent on `armed`; only later failures reach `callback`.
/// `notifier` is dropped, and its handles released, on every exit path.
pub(crate) fn run_watch_loop<N, F>(
    key: &str,
    mut notifier: N,
    armed: SyncSender<io::Result<()>>,
    mut callback: F,
) -> Termination
where
    N: ChangeNotifier,
    F: FnMut(Result<()>),
{
    let mut armed = Some(armed);
    let mut state = WatchState::Idle;
    loop {
        state = match state {
            WatchState::Idle => register(key, &mut notifier, armed.take()),
            WatchState::Armed => step(key, &mut notifier, &mut callback),
            WatchState::Terminated(reason) => {
                info!("stop watching {}: {:?}", key, reason);
                return reason;
            }
        };
    }
}

/// First registration. Its outcome goes to whoever is waiting in `watch()`.
fn register<N>(
    key: &str,
    notifier: &mut N,
    armed: Option<SyncSender<io::Result<()>>>,
) -> WatchState
where
    N: ChangeNotifier,
{
    let outcome = notifier.arm();
    let next = match &outcome {
        Ok(()) => {
            debug!("armed change notification on {}", key);
            WatchState::Armed
        }
        Err(source) => {
            warn!("{}: registering for change notification failed: {}", key, source);
            WatchState::Terminated(Termination::RegistrationFailed)
        }
    };
    if let Some(armed) = armed {
        if armed.send(outcome).is_err() {
            trace!("{}: nobody waiting for the first registration", key);
        }
    }
    next
}

/// One wait / reset / re-arm / notify round.
fn step<N, F>(
    key: &str,
    notifier: &mut N,
    callback: &mut F,
) -> WatchState
where
    N: ChangeNotifier,
    F: FnMut(Result<()>),
{
    match notifier.wait() {
        Ok(WaitOutcome::Signaled) => {
            if let Err(source) = notifier.reset() {
                warn!("{}: reset of change event failed: {}", key, source);
                callback(Err(Error::WaitFailed {
                    key: key.to_string(),
                    source,
                }));
                return WatchState::Terminated(Termination::WaitFailed);
            }

            if let Err(source) = notifier.arm() {
                warn!("{}: re-arming change notification failed: {}", key, source);
                callback(Err(Error::WatchRegistrationFailed {
                    key: key.to_string(),
                    source,
                }));
                return WatchState::Terminated(Termination::RegistrationFailed);
            }

            trace!("{} changed", key);
            callback(Ok(()));
            WatchState::Armed
        }
        Ok(WaitOutcome::Abandoned) => WatchState::Terminated(Termination::Abandoned),
        Err(source) => {
            warn!("{}: wait for change failed: {}", key, source);
            callback(Err(Error::WaitFailed {
                key: key.to_string(),
                source,
            }));
            WatchState::Terminated(Termination::WaitFailed)
        }
    }
}
