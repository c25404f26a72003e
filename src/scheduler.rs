//! Debounced batching of accepted events.
//!
//! The BufferScheduler collects events into a batch and triggers exactly one
//! flush per debounce window. The FlushTimer seam decides where that delayed
//! flush actually runs.

use crate::error::Error;
use crate::event::Event;
use crate::transport::Transport;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Work scheduled to run once after a delay.
pub type FlushTask = Box<dyn FnOnce() + Send + 'static>;

/// Runs a task once after a delay.
///
/// `schedule` must return without running the task; the task runs later,
/// either on another thread or when the host drives the timer. On `Err` the
/// task has been dropped and will never run.
pub trait FlushTimer: Send + Sync {
    fn schedule(&self, delay: Duration, task: FlushTask) -> Result<(), Error>;
}

/// Runs each task on its own sleeping thread.
#[derive(Copy, Clone, Debug, Default)]
pub struct ThreadTimer;

impl FlushTimer for ThreadTimer {
    fn schedule(&self, delay: Duration, task: FlushTask) -> Result<(), Error> {
        thread::Builder::new()
            .name("cloudpelican-flush".to_owned())
            .spawn(move || {
                thread::sleep(delay);
                task();
            })
            .map(drop)
            .map_err(Error::Timer)
    }
}

/// A timer whose clock only moves when [`ManualTimer::advance`] is called.
///
/// Suited to hosts that own their event loop, and to deterministic tests.
///
/// ```
/// # use cloudpelican::{FlushTimer, ManualTimer};
/// # use std::sync::atomic::{AtomicBool, Ordering};
/// # use std::sync::Arc;
/// # use std::time::Duration;
/// let timer = ManualTimer::new();
/// let fired = Arc::new(AtomicBool::new(false));
/// let flag = fired.clone();
/// timer
///     .schedule(Duration::from_millis(200), Box::new(move || flag.store(true, Ordering::SeqCst)))
///     .unwrap();
///
/// timer.advance(Duration::from_millis(199));
/// assert!(!fired.load(Ordering::SeqCst));
/// timer.advance(Duration::from_millis(1));
/// assert!(fired.load(Ordering::SeqCst));
/// ```
#[derive(Default)]
pub struct ManualTimer {
    state: Mutex<ManualState>,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_id: u64,
    pending: Vec<(Duration, u64, FlushTask)>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed since the timer was created, as far as it knows.
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    pub fn pending(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Moves the clock forward by `by`, running every task that falls due in
    /// deadline order. Tasks scheduled by a running task are honoured within
    /// the same call if they fall due before the new time. Returns how many
    /// tasks ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.state.lock().now + by;
        let mut ran = 0;
        loop {
            let task = {
                let mut state = self.state.lock();
                let due = state
                    .pending
                    .iter()
                    .enumerate()
                    .filter(|(_, (deadline, _, _))| *deadline <= target)
                    .min_by_key(|(_, (deadline, id, _))| (*deadline, *id))
                    .map(|(i, _)| i);
                match due {
                    Some(i) => {
                        let (deadline, _, task) = state.pending.swap_remove(i);
                        state.now = deadline;
                        task
                    }
                    None => {
                        state.now = target;
                        break;
                    }
                }
            };
            // Lock released: the task may schedule more work.
            task();
            ran += 1;
        }
        ran
    }
}

impl FlushTimer for ManualTimer {
    fn schedule(&self, delay: Duration, task: FlushTask) -> Result<(), Error> {
        let mut state = self.state.lock();
        let deadline = state.now + delay;
        let id = state.next_id;
        state.next_id += 1;
        state.pending.push((deadline, id, task));
        Ok(())
    }
}

/// Accumulates events and flushes them to the [`Transport`] once per
/// debounce window.
///
/// The first event appended to an empty window schedules the flush; every
/// event appended before it fires joins the same batch. The flush swaps the
/// buffer out in one critical section and only then calls the transport, so
/// an event logged while the batch is being sent (for example from a
/// dispatcher callback) lands in the fresh buffer and schedules the next
/// window.
#[derive(Clone)]
pub struct BufferScheduler {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<BufferState>,
    delay: Duration,
    timer: Arc<dyn FlushTimer>,
    transport: Transport,
}

#[derive(Default)]
struct BufferState {
    buffer: Vec<Event>,
    flush_pending: bool,
    sequence: u64,
}

impl BufferScheduler {
    pub fn new(delay: Duration, timer: Arc<dyn FlushTimer>, transport: Transport) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(BufferState::default()),
                delay,
                timer,
                transport,
            }),
        }
    }

    /// Appends `event` and schedules a flush if none is pending.
    ///
    /// If the timer refuses the flush, the window is reopened so the next
    /// append tries again; the buffered events are kept.
    pub fn enqueue(&self, event: Event) {
        let schedule = {
            let mut state = self.inner.state.lock();
            state.buffer.push(event);
            if state.flush_pending {
                false
            } else {
                state.flush_pending = true;
                true
            }
        };

        if schedule {
            let inner = Arc::clone(&self.inner);
            let scheduled = self
                .inner
                .timer
                .schedule(self.inner.delay, Box::new(move || inner.flush()));
            if let Err(err) = scheduled {
                tracing::error!(%err, "CLOUDPELICAN: flush not scheduled, retrying on next event");
                self.inner.state.lock().flush_pending = false;
            }
        }
    }

    /// Number of flushes performed so far.
    pub fn sequence(&self) -> u64 {
        self.inner.state.lock().sequence
    }

    /// Events waiting for the next flush.
    pub fn buffered(&self) -> usize {
        self.inner.state.lock().buffer.len()
    }

    pub fn is_flush_pending(&self) -> bool {
        self.inner.state.lock().flush_pending
    }
}

impl Inner {
    fn flush(&self) {
        let (batch, sequence) = {
            let mut state = self.state.lock();
            let batch = std::mem::take(&mut state.buffer);
            state.flush_pending = false;
            state.sequence += 1;
            (batch, state.sequence)
        };
        tracing::debug!(sequence, events = batch.len(), "flushing buffer");
        self.transport.send(batch, sequence);
    }
}
