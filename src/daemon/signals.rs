//! Stop handling: a cloneable stop flag whose waits wake up immediately when a
//! stop is requested, plus forwarding of SIGINT/SIGTERM into it.
//!
//! Waking works by disconnection: the only `Sender` of an internal crossbeam
//! channel is dropped on stop, so every pending and future `recv_timeout` on the
//! shared `Receiver` returns at once. Nothing is ever sent on the channel.

#![allow(missing_docs)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};

struct StopInner {
    stopped: AtomicBool,
    waker: Mutex<Option<Sender<()>>>,
    wake_rx: Receiver<()>,
}

/// Shared stop request. Clones observe the same state.
#[derive(Clone)]
pub struct StopSignal {
    inner: Arc<StopInner>,
}

impl StopSignal {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            inner: Arc::new(StopInner {
                stopped: AtomicBool::new(false),
                waker: Mutex::new(Some(tx)),
                wake_rx: rx,
            }),
        }
    }

    /// Request a stop and wake every waiter. Idempotent.
    pub fn request_stop(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        let sender = self
            .inner
            .waker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(sender);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// Block for up to `timeout`. Returns `true` if a stop was requested
    /// before or during the wait.
    pub fn wait(&self, timeout: Duration) -> bool {
        if self.is_stopped() {
            return true;
        }
        match self.inner.wake_rx.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => self.is_stopped(),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }

    /// Forward SIGINT and SIGTERM into this stop signal.
    ///
    /// The first signal requests a graceful stop (the running pass finishes,
    /// then the loop exits). A second one terminates the process immediately.
    /// Registration is best-effort; failures are reported on stderr.
    #[cfg(all(feature = "daemon", unix))]
    pub fn install_os_handlers(&self) {
        use signal_hook::consts::{SIGINT, SIGTERM};
        use signal_hook::flag;
        use signal_hook::iterator::Signals;

        let term_now = Arc::new(AtomicBool::new(false));
        for sig in [SIGINT, SIGTERM] {
            // Order matters: the conditional shutdown must see the flag from
            // the previous delivery, not this one.
            if let Err(e) = flag::register_conditional_shutdown(sig, 1, Arc::clone(&term_now)) {
                eprintln!("[RSY-SIGNAL] failed to arm forced exit for signal {sig}: {e}");
            }
            if let Err(e) = flag::register(sig, Arc::clone(&term_now)) {
                eprintln!("[RSY-SIGNAL] failed to register signal {sig}: {e}");
            }
        }

        let mut signals = match Signals::new([SIGINT, SIGTERM]) {
            Ok(signals) => signals,
            Err(e) => {
                eprintln!("[RSY-SIGNAL] failed to register stop signals: {e}");
                return;
            }
        };
        let stop = self.clone();
        let spawned = std::thread::Builder::new()
            .name("rsy-signals".to_string())
            .spawn(move || {
                if signals.forever().next().is_some() {
                    stop.request_stop();
                }
            });
        if let Err(e) = spawned {
            eprintln!("[RSY-SIGNAL] failed to spawn signal thread: {e}");
        }
    }

    /// Signals are not forwarded on this platform; stops come only from
    /// [`StopSignal::request_stop`].
    #[cfg(not(all(feature = "daemon", unix)))]
    pub fn install_os_handlers(&self) {}
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StopSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopSignal")
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
