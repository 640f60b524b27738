//! Periodic automatic backups.
//!
//! The store exposes [`crate::store::JsonStore::create_backup`] but does not
//! own a timer. [`BackupTimer`] is the application-side timer: a background
//! thread that posts a request through the [`Dispatcher`](crate::dispatch::Dispatcher)
//! every interval, so the backup itself runs on the thread owning the catalog.

use crate::catalog::Catalog;
use crate::dispatch::DispatchSender;
use crate::settings::Settings;
use crate::store::BackupKind;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Interval between automatic backups.
pub const DEFAULT_BACKUP_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Background timer that posts a task every interval until dropped.
#[derive(Debug)]
pub struct BackupTimer {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl BackupTimer {
    /// Post `on_tick` through `sender` every `interval`.
    ///
    /// The thread exits when the timer is dropped or the dispatcher goes away.
    pub fn start<S, F>(interval: Duration, sender: DispatchSender<S>, on_tick: F) -> std::io::Result<Self>
    where
        S: 'static,
        F: Fn(&mut S) + Send + Sync + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let on_tick = Arc::new(on_tick);
        let handle = thread::Builder::new()
            .name("backup-timer".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let tick = Arc::clone(&on_tick);
                        if !sender.post(move |state| tick(state)) {
                            break;
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        Ok(Self {
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Create an automatic catalog backup every `interval`.
    ///
    /// Failures are logged as warnings; they never stop the timer.
    pub fn for_catalog(interval: Duration, sender: DispatchSender<Catalog>) -> std::io::Result<Self> {
        Self::start(interval, sender, |catalog: &mut Catalog| {
            match catalog.backup(BackupKind::Automatic) {
                Ok(Some(path)) => log::debug!("Automatic backup written to {}", path.display()),
                Ok(None) => log::debug!("Skipped automatic backup, nothing saved yet"),
                Err(e) => log::warn!("Automatic backup failed: {}", e.display_chain()),
            }
        })
    }

    /// Automatic catalog backups on the interval configured in `settings`.
    pub fn from_settings(settings: &Settings, sender: DispatchSender<Catalog>) -> std::io::Result<Self> {
        log::info!(
            "Automatic backups every {} minutes",
            settings.backups.interval_minutes
        );
        Self::for_catalog(settings.backup_interval(), sender)
    }

    /// Stop the timer and wait for its thread.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        drop(self.stop.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Backup timer thread panicked");
            }
        }
    }
}

impl Drop for BackupTimer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
