//! Idle timeout guard
//!
//! One background countdown per session. When it runs out, the expiry
//! action (a notice to the caller) runs on the timer thread and then the
//! shared [`ShutdownToken`] is cancelled. The session loop checks the token
//! at the top of every iteration and while it waits for keys, so the door
//! winds down on its own thread instead of being killed.
//!
//! ```text
//! Idle --arm--> Armed --disarm--> Idle
//!                 |
//!                 +--timeout--> Expired (final)
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum IdleError {
    #[error("Session already ended by idle timeout")]
    Expired,
}

pub type Result<T> = std::result::Result<T, IdleError>;

/// Cooperative end-of-session signal
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    cancelled: Arc<AtomicBool>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Guard state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleState {
    Idle,
    Armed,
    Expired,
}

/// A single in-flight countdown. Never reused once stopped or fired.
struct IdleTimer {
    cancel: Sender<()>,
    handle: JoinHandle<()>,
}

impl IdleTimer {
    fn start<F>(timeout: Duration, on_expire: F, fired: Arc<AtomicBool>, token: ShutdownToken) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let (cancel, rx) = mpsc::channel::<()>();
        let handle = thread::spawn(move || match rx.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => {
                info!("Idle timeout after {:?}", timeout);
                fired.store(true, Ordering::SeqCst);
                on_expire();
                token.cancel();
            }
            // Explicit stop or guard dropped
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {}
        });
        Self { cancel, handle }
    }

    /// Cancel and wait for the thread. An expiry already running finishes first.
    fn stop(self) {
        let _ = self.cancel.send(());
        if self.handle.join().is_err() {
            warn!("Idle timer thread panicked");
        }
    }
}

/// Cancelable countdown that ends the session when input goes quiet
pub struct IdleGuard {
    timer: Option<IdleTimer>,
    fired: Arc<AtomicBool>,
    token: ShutdownToken,
}

impl IdleGuard {
    pub fn new(token: ShutdownToken) -> Self {
        Self {
            timer: None,
            fired: Arc::new(AtomicBool::new(false)),
            token,
        }
    }

    /// Token cancelled when the countdown fires
    pub fn token(&self) -> &ShutdownToken {
        &self.token
    }

    /// Start a countdown, replacing any pending one
    pub fn arm<F>(&mut self, timeout: Duration, on_expire: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.disarm();
        if self.has_expired() {
            return Err(IdleError::Expired);
        }
        debug!("Idle guard armed for {:?}", timeout);
        self.timer = Some(IdleTimer::start(
            timeout,
            on_expire,
            self.fired.clone(),
            self.token.clone(),
        ));
        Ok(())
    }

    /// Cancel the pending countdown, if any
    pub fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop();
        }
    }

    pub fn has_expired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> IdleState {
        if self.has_expired() {
            IdleState::Expired
        } else if self.timer.is_some() {
            IdleState::Armed
        } else {
            IdleState::Idle
        }
    }
}

impl Drop for IdleGuard {
    fn drop(&mut self) {
        self.disarm();
    }
}
