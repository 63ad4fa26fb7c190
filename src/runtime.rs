use std::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Identifies one acquisition of a timer. Never reused within a scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    /// a scheduled timer fired
    Timer(TimerId),
    /// nothing happened within the ticker interval
    Tick,
}

/// Source of terminal and timer events
pub trait AppEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Production event source using crossterm. Timers feed the same channel
/// through [`CrosstermEventSource::sender`].
pub struct CrosstermEventSource {
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let key_tx = tx.clone();

        std::thread::spawn(move || loop {
            let sent = match event::read() {
                Ok(CtEvent::Key(key)) => key_tx.send(AppEvent::Key(key)),
                Ok(CtEvent::Resize(_, _)) => key_tx.send(AppEvent::Resize),
                Ok(_) => Ok(()),
                Err(e) => {
                    log::error!("terminal event stream closed: {e}");
                    break;
                }
            };
            if sent.is_err() {
                break;
            }
        });

        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<AppEvent> {
        self.tx.clone()
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AppEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl AppEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event at a time
pub struct Runner<E: AppEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: AppEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> AppEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => AppEvent::Tick,
        }
    }
}

/// Scoped handle to a periodic timer. Dropping it cancels the timer;
/// cancelling more than once is harmless.
#[derive(Debug)]
pub struct TimerGuard {
    id: TimerId,
    cancelled: Arc<AtomicBool>,
}

impl TimerGuard {
    fn new(id: TimerId) -> Self {
        Self {
            id,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Source of periodic timers
pub trait Scheduler {
    fn schedule(&self, period: Duration) -> TimerGuard;
}

/// Runs each timer on its own thread, posting [`AppEvent::Timer`] into the
/// app's event channel until the guard is dropped.
#[derive(Debug)]
pub struct ThreadScheduler {
    tx: Sender<AppEvent>,
    next_id: Cell<u64>,
}

impl ThreadScheduler {
    pub fn new(tx: Sender<AppEvent>) -> Self {
        Self {
            tx,
            next_id: Cell::new(1),
        }
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule(&self, period: Duration) -> TimerGuard {
        let id = TimerId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let guard = TimerGuard::new(id);
        let cancelled = guard.flag();
        let tx = self.tx.clone();
        std::thread::spawn(move || loop {
            std::thread::sleep(period);
            if cancelled.load(Ordering::SeqCst) {
                break;
            }
            if tx.send(AppEvent::Timer(id)).is_err() {
                break;
            }
        });
        guard
    }
}

#[derive(Debug)]
struct ManualTimer {
    id: TimerId,
    period: Duration,
    cancelled: Arc<AtomicBool>,
}

/// Scheduler that never fires on its own: the owner fires timers by passing
/// their ids back into the game. Used by headless runs and tests.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: Cell<u64>,
    timers: RefCell<Vec<ManualTimer>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timers whose guards are still alive, oldest first
    pub fn active(&self) -> Vec<(TimerId, Duration)> {
        self.timers
            .borrow()
            .iter()
            .filter(|t| !t.cancelled.load(Ordering::SeqCst))
            .map(|t| (t.id, t.period))
            .collect()
    }

    /// Number of timers ever scheduled
    pub fn scheduled_count(&self) -> usize {
        self.timers.borrow().len()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, period: Duration) -> TimerGuard {
        let id = TimerId(self.next_id.get() + 1);
        self.next_id.set(id.0);

        let guard = TimerGuard::new(id);
        self.timers.borrow_mut().push(ManualTimer {
            id,
            period,
            cancelled: guard.flag(),
        });
        guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::mpsc;

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let runner = Runner::new(es, ticker);

        // With no events available, step should yield Tick
        assert_matches!(runner.step(), AppEvent::Tick);
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(AppEvent::Resize).unwrap();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(10));
        let runner = Runner::new(es, ticker);

        assert_matches!(runner.step(), AppEvent::Resize);
    }

    #[test]
    fn manual_scheduler_tracks_guard_lifetime() {
        let sched = ManualScheduler::new();
        let a = sched.schedule(Duration::from_millis(50));
        let b = sched.schedule(Duration::from_secs(1));
        assert_ne!(a.id(), b.id());
        assert_eq!(sched.active().len(), 2);

        drop(a);
        assert_eq!(sched.active(), vec![(b.id(), Duration::from_secs(1))]);

        // explicit cancel followed by drop is idempotent
        b.cancel();
        b.cancel();
        drop(b);
        assert!(sched.active().is_empty());
        assert_eq!(sched.scheduled_count(), 2);
    }

    #[test]
    fn thread_scheduler_fires_until_dropped() {
        let (tx, rx) = mpsc::channel();
        let sched = ThreadScheduler::new(tx);
        let guard = sched.schedule(Duration::from_millis(5));
        let id = guard.id();

        assert_matches!(
            rx.recv_timeout(Duration::from_secs(2)),
            Ok(AppEvent::Timer(fired)) if fired == id
        );

        drop(guard);
        // let an in-flight event land, then expect silence
        std::thread::sleep(Duration::from_millis(30));
        while rx.try_recv().is_ok() {}
        std::thread::sleep(Duration::from_millis(30));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn thread_scheduler_ids_are_unique() {
        let (tx, _rx) = mpsc::channel();
        let sched = ThreadScheduler::new(tx);
        let a = sched.schedule(Duration::from_secs(60));
        let b = sched.schedule(Duration::from_secs(60));
        assert_ne!(a.id(), b.id());
    }
}
