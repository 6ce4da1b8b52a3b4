//! Request pacing and cancellation
//!
//! This module handles:
//! - The single pacing gate that spaces out every outbound request
//! - The clock abstraction used for every wait (real or manual)
//! - The stop signal that aborts waits when the user interrupts a run

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};

/// Boxed future returned by [`Clock::sleep`]
pub type Sleep<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Source of time for pacing and backoff waits
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;

    fn sleep(&self, duration: Duration) -> Sleep<'_>;
}

/// Clock backed by the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn sleep(&self, duration: Duration) -> Sleep<'_> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Clock that never blocks: sleeping advances virtual time instantly
///
/// Every requested sleep is recorded so tests can assert on pacing and
/// backoff without waiting for them.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: StdMutex<Duration>,
    sleeps: StdMutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: StdMutex::new(Duration::ZERO),
            sleeps: StdMutex::new(Vec::new()),
        }
    }

    /// Moves virtual time forward without recording a sleep
    pub fn advance(&self, duration: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(|e| e.into_inner());
        *elapsed += duration;
    }

    /// All sleeps requested so far, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let elapsed = self.elapsed.lock().unwrap_or_else(|e| e.into_inner());
        self.origin + *elapsed
    }

    fn sleep(&self, duration: Duration) -> Sleep<'_> {
        self.sleeps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(duration);
        self.advance(duration);
        Box::pin(tokio::task::yield_now())
    }
}

/// Global gate enforcing a minimum spacing between successive requests
///
/// The gate keeps the instant at which the next request may leave. Waiters
/// queue on the mutex, so requests pass strictly one at a time no matter how
/// many workers are fetching. The first request passes immediately.
#[derive(Debug)]
pub struct PacingGate {
    interval: Duration,
    next_allowed: Mutex<Option<Instant>>,
    clock: Arc<dyn Clock>,
}

impl PacingGate {
    pub fn new(interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            interval,
            next_allowed: Mutex::new(None),
            clock,
        }
    }

    /// Gate driven by the tokio timer
    pub fn with_tokio_clock(interval: Duration) -> Self {
        Self::new(interval, Arc::new(TokioClock))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Waits until a request may be sent, then reserves the next slot
    ///
    /// Dropping the returned future (e.g. on cancellation) releases the gate
    /// without consuming a slot.
    pub async fn wait(&self) {
        let mut next_allowed = self.next_allowed.lock().await;

        if let Some(at) = *next_allowed {
            let now = self.clock.now();
            if at > now {
                let wait = at - now;
                tracing::trace!("Pacing gate holding request for {:?}", wait);
                self.clock.sleep(wait).await;
            }
        }

        *next_allowed = Some(self.clock.now() + self.interval);
    }
}

/// Sender half of the stop signal
#[derive(Debug)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

impl StopHandle {
    /// Asks the run to stop: no new pages start and pending waits abort
    pub fn stop(&self) {
        // Receivers may all be gone once the run finished; nothing to notify then.
        let _ = self.tx.send(true);
    }
}

/// Receiver half of the stop signal, cheap to clone into every worker
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    /// Creates a connected handle/signal pair
    pub fn channel() -> (StopHandle, StopSignal) {
        let (tx, rx) = watch::channel(false);
        (StopHandle { tx }, StopSignal { rx })
    }

    /// A signal that never fires
    pub fn never() -> Self {
        Self::channel().1
    }

    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once a stop is requested; pends forever if it never is
    pub async fn stopped(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
