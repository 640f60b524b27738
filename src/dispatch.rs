//! Delivering work from background threads to the owning thread.
//!
//! Worker threads never touch application state directly. They post
//! closures through a [`DispatchSender`]; the thread that owns the state
//! drains the [`Dispatcher`] from its loop and runs each closure with
//! `&mut S`.
//!
//! # Usage
//!
//! ```rust,no_run
//! use laserflix::dispatch::Dispatcher;
//!
//! let dispatcher: Dispatcher<Vec<String>> = Dispatcher::new();
//! let mut state = Vec::new();
//!
//! let _worker = dispatcher.spawn_worker(
//!     "describe",
//!     || "a wooden box".to_string(),
//!     |state: &mut Vec<String>, text| state.push(text),
//! );
//!
//! // In the owning thread's loop
//! dispatcher.run_pending(&mut state);
//! ```

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

type Task<S> = Box<dyn FnOnce(&mut S) + Send + 'static>;

/// Cloneable handle used by worker threads to post work.
pub struct DispatchSender<S> {
    tx: Sender<Task<S>>,
}

impl<S> Clone for DispatchSender<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<S> DispatchSender<S> {
    /// Queue `task` to run on the owning thread.
    ///
    /// Returns false if the dispatcher has been dropped.
    pub fn post<F>(&self, task: F) -> bool
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        self.tx.send(Box::new(task)).is_ok()
    }
}

/// Queue of tasks owned by the thread that owns `S`.
pub struct Dispatcher<S> {
    tx: Sender<Task<S>>,
    rx: Receiver<Task<S>>,
}

impl<S> Default for Dispatcher<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Dispatcher<S> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> DispatchSender<S> {
        DispatchSender {
            tx: self.tx.clone(),
        }
    }

    /// Run every task queued so far. Returns how many ran.
    pub fn run_pending(&self, state: &mut S) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task(state);
            ran += 1;
        }
        ran
    }

    /// Wait up to `timeout` for one task and run it.
    ///
    /// Returns false if nothing arrived in time.
    pub fn run_next(&self, state: &mut S, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(task) => {
                task(state);
                true
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => false,
        }
    }
}

impl<S: 'static> Dispatcher<S> {
    /// Run `job` on a new named thread and deliver its result to `on_done`
    /// on the owning thread.
    ///
    /// Workers are fire-and-forget; the handle is returned for callers that
    /// want to join in tests or at shutdown.
    pub fn spawn_worker<T, J, C>(
        &self,
        name: &str,
        job: J,
        on_done: C,
    ) -> std::io::Result<JoinHandle<()>>
    where
        T: Send + 'static,
        J: FnOnce() -> T + Send + 'static,
        C: FnOnce(&mut S, T) + Send + 'static,
    {
        let sender = self.sender();
        let label = name.to_string();
        thread::Builder::new().name(name.to_string()).spawn(move || {
            let output = job();
            if !sender.post(move |state| on_done(state, output)) {
                log::debug!("Worker {} finished after its dispatcher was dropped", label);
            }
        })
    }
}
