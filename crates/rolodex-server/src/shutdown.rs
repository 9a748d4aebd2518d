//! Graceful shutdown coordination.
//!
//! A [`ShutdownSignal`] is triggered once, by an OS signal or by hand, and
//! every clone observes it. The [`ConnectionTracker`] counts open
//! connections so the server can wait for them to drain.
//!
//! # Example
//!
//! ```rust
//! use rolodex_server::shutdown::{ConnectionTracker, ShutdownSignal};
//!
//! let shutdown = ShutdownSignal::new();
//! let tracker = ConnectionTracker::new();
//!
//! let token = tracker.acquire();
//! assert_eq!(tracker.active_connections(), 1);
//!
//! shutdown.trigger();
//! assert!(shutdown.is_shutdown());
//!
//! drop(token);
//! assert_eq!(tracker.active_connections(), 0);
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Notify};

/// A cloneable, trigger-once shutdown signal.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    state: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    /// Creates a signal triggered by SIGINT or SIGTERM.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let trigger = signal.clone();
        tokio::spawn(async move {
            wait_for_os_signal().await;
            trigger.trigger();
        });
        signal
    }

    /// Triggers shutdown. Later calls are no-ops.
    pub fn trigger(&self) {
        let fired = self.state.send_if_modified(|triggered| !std::mem::replace(triggered, true));
        if fired {
            tracing::debug!("shutdown triggered");
        }
    }

    /// Returns `true` once shutdown has been triggered.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.state.borrow()
    }

    /// Returns a future that completes when shutdown is triggered,
    /// immediately if it already was.
    pub fn recv(&self) -> impl Future<Output = ()> + Send + 'static {
        let sender = Arc::clone(&self.state);
        let mut state = sender.subscribe();
        async move {
            // `sender` keeps the channel open, so the wait only ends on a trigger
            let _ = state.wait_for(|triggered| *triggered).await;
            drop(sender);
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

async fn wait_for_os_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
                    _ = sigint.recv() => tracing::info!("received SIGINT, shutting down"),
                }
                return;
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "cannot install unix signal handlers, falling back to ctrl-c");
            }
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received ctrl-c, shutting down"),
        Err(e) => {
            tracing::error!(error = %e, "cannot listen for ctrl-c; shutdown must be triggered explicitly");
            std::future::pending::<()>().await;
        }
    }
}

/// Counts open connections.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl ConnectionTracker {
    /// Creates a tracker with no connections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection; it is released when the token drops.
    #[must_use]
    pub fn acquire(&self) -> ConnectionToken {
        self.active.fetch_add(1, Ordering::SeqCst);
        ConnectionToken {
            active: Arc::clone(&self.active),
            notify: Arc::clone(&self.notify),
        }
    }

    /// Returns the number of open connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Waits until every token has been dropped.
    pub async fn wait_for_drain(&self) {
        loop {
            let notified = self.notify.notified();
            if self.active.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Held for the lifetime of one connection.
#[derive(Debug)]
pub struct ConnectionToken {
    active: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl Drop for ConnectionToken {
    fn drop(&mut self) {
        if self.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.notify.notify_waiters();
        }
    }
}
