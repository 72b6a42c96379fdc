//! A worker-pool scheduler for immediate, delayed, and repeating tasks.
//!
//! [`Scheduler`] owns a pool of worker threads fed by an MPMC channel and a
//! timer thread holding a deadline-ordered heap. Every spawn returns a
//! [`TaskHandle`] that can cancel the task, observe it, or block until it has
//! run.
//!
//! ```text
//! spawn(f) ──────────────► job channel ──► worker 0..n
//! spawn_after(d, f) ──► timer heap ──┘        (catch_unwind per task)
//! spawn_repeating(..) ─► timer heap ──┘ (re-armed each tick)
//! ```
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use karma_sched::Scheduler;
//!
//! let sched = Scheduler::new(2);
//! let counter = Arc::new(AtomicUsize::new(0));
//!
//! let seen = Arc::clone(&counter);
//! let handle = sched.spawn(move || {
//!     seen.fetch_add(1, Ordering::SeqCst);
//! }).unwrap();
//!
//! handle.wait();
//! assert_eq!(counter.load(Ordering::SeqCst), 1);
//! ```
//!
//! # Semantics
//!
//! - Worker panics are caught and logged; the worker keeps serving.
//! - Repeating tasks are fixed-rate: the next deadline derives from the
//!   previous deadline, not from when the body finished. A slow body does not
//!   shift the schedule, but ticks can bunch up after a stall.
//! - [`Scheduler::shutdown`] (and `Drop`) stops the timer, drains jobs that
//!   were already queued, and joins every thread. Pending *delayed* tasks are
//!   dropped.
//! - Cancellation is cooperative at the queue boundary: a task that has
//!   already started cannot be interrupted, but a queued or scheduled one
//!   will not start.

#![warn(missing_docs)]

use std::cmp::{Ordering as CmpOrdering, Reverse};
use std::collections::BinaryHeap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use crossbeam_utils::Backoff;
use thiserror::Error;

/// Error returned when the scheduler can no longer accept tasks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    /// The scheduler has shut down; the task was not queued.
    #[error("scheduler is shut down")]
    Shutdown,
}

// =============================================================================
// Task handles
// =============================================================================

struct HandleState {
    cancelled: AtomicBool,
    ran: AtomicBool,
    lock: Mutex<()>,
    cv: Condvar,
}

impl HandleState {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            cancelled: AtomicBool::new(false),
            ran: AtomicBool::new(false),
            lock: Mutex::new(()),
            cv: Condvar::new(),
        })
    }

    fn settled(&self) -> bool {
        self.ran.load(Ordering::Acquire) || self.cancelled.load(Ordering::Acquire)
    }

    fn mark_ran(&self) {
        self.ran.store(true, Ordering::Release);
        let _guard = self.lock.lock().unwrap();
        self.cv.notify_all();
    }

    fn mark_cancelled(&self) -> bool {
        let first = !self.cancelled.swap(true, Ordering::AcqRel);
        let _guard = self.lock.lock().unwrap();
        self.cv.notify_all();
        first
    }
}

/// Observer and cancellation handle for a spawned task.
///
/// Handles are cheap to clone and independent of the scheduler's lifetime.
#[derive(Clone)]
pub struct TaskHandle {
    state: Arc<HandleState>,
}

impl TaskHandle {
    /// Requests cancellation.
    ///
    /// A queued or scheduled task will not start; a running one completes.
    /// For repeating tasks, no further tick fires. Returns `true` on the
    /// first cancellation.
    pub fn cancel(&self) -> bool {
        self.state.mark_cancelled()
    }

    /// Returns `true` if [`cancel`](TaskHandle::cancel) was called.
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    /// Returns `true` once the task body has run at least once.
    pub fn has_run(&self) -> bool {
        self.state.ran.load(Ordering::Acquire)
    }

    /// Blocks until the task has run at least once or was cancelled.
    ///
    /// Spins briefly before parking, so waits that resolve quickly never
    /// touch the OS.
    pub fn wait(&self) {
        if self.state.settled() {
            return;
        }

        let backoff = Backoff::new();
        while !backoff.is_completed() {
            backoff.snooze();
            if self.state.settled() {
                return;
            }
        }

        let mut guard = self.state.lock.lock().unwrap();
        while !self.state.settled() {
            guard = self.state.cv.wait(guard).unwrap();
        }
    }
}

// =============================================================================
// Jobs and timer entries
// =============================================================================

struct Job {
    run: Box<dyn FnOnce() + Send>,
    handle: Arc<HandleState>,
}

enum TimerKind {
    Once {
        job: Box<dyn FnOnce() + Send>,
    },
    Repeating {
        every: Duration,
        run: Arc<Mutex<dyn FnMut() + Send>>,
    },
}

struct TimerEntry {
    deadline: Instant,
    seq: u64,
    handle: Arc<HandleState>,
    kind: TimerKind,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for TimerEntry {}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.deadline
            .cmp(&other.deadline)
            .then(self.seq.cmp(&other.seq))
    }
}

enum TimerCmd {
    Schedule(TimerEntry),
    Shutdown,
}

// =============================================================================
// Scheduler
// =============================================================================

/// A fixed-size worker pool with a timer for delayed and repeating tasks.
///
/// Dropping the scheduler shuts it down: already-queued jobs drain, pending
/// delayed tasks are discarded, and all threads are joined.
pub struct Scheduler {
    jobs_tx: Option<Sender<Job>>,
    timer_tx: Option<Sender<TimerCmd>>,
    workers: Vec<JoinHandle<()>>,
    timer: Option<JoinHandle<()>>,
    timer_seq: AtomicU64,
}

impl Scheduler {
    /// Spawns a scheduler with `workers` pool threads and one timer thread.
    ///
    /// # Panics
    ///
    /// Panics if `workers` is 0.
    pub fn new(workers: usize) -> Self {
        assert!(workers > 0, "worker count must be > 0");

        let (jobs_tx, jobs_rx) = crossbeam_channel::unbounded::<Job>();
        let (timer_tx, timer_rx) = crossbeam_channel::unbounded::<TimerCmd>();

        let pool = (0..workers)
            .map(|i| {
                let rx = jobs_rx.clone();
                thread::Builder::new()
                    .name(format!("karma-worker-{i}"))
                    .spawn(move || worker_loop(rx))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        let timer_jobs_tx = jobs_tx.clone();
        let timer = thread::Builder::new()
            .name("karma-timer".to_string())
            .spawn(move || timer_loop(timer_rx, timer_jobs_tx))
            .expect("failed to spawn timer thread");

        log::debug!("scheduler started with {workers} workers");

        Self {
            jobs_tx: Some(jobs_tx),
            timer_tx: Some(timer_tx),
            workers: pool,
            timer: Some(timer),
            timer_seq: AtomicU64::new(0),
        }
    }

    /// Queues `f` for immediate execution on the pool.
    pub fn spawn<F>(&self, f: F) -> Result<TaskHandle, ScheduleError>
    where
        F: FnOnce() + Send + 'static,
    {
        let state = HandleState::new();
        let job = Job {
            run: Box::new(f),
            handle: Arc::clone(&state),
        };
        self.jobs_tx
            .as_ref()
            .ok_or(ScheduleError::Shutdown)?
            .send(job)
            .map_err(|_| ScheduleError::Shutdown)?;
        Ok(TaskHandle { state })
    }

    /// Runs `f` once after `delay`.
    pub fn spawn_after<F>(&self, delay: Duration, f: F) -> Result<TaskHandle, ScheduleError>
    where
        F: FnOnce() + Send + 'static,
    {
        let state = HandleState::new();
        self.schedule(TimerEntry {
            deadline: Instant::now() + delay,
            seq: self.next_seq(),
            handle: Arc::clone(&state),
            kind: TimerKind::Once { job: Box::new(f) },
        })?;
        Ok(TaskHandle { state })
    }

    /// Runs `f` after `initial_delay`, then every `every` until cancelled.
    ///
    /// Fixed-rate: each deadline is the previous deadline plus `every`.
    ///
    /// # Panics
    ///
    /// Panics if `every` is zero.
    pub fn spawn_repeating<F>(
        &self,
        initial_delay: Duration,
        every: Duration,
        f: F,
    ) -> Result<TaskHandle, ScheduleError>
    where
        F: FnMut() + Send + 'static,
    {
        assert!(!every.is_zero(), "repeat period must be non-zero");

        let state = HandleState::new();
        self.schedule(TimerEntry {
            deadline: Instant::now() + initial_delay,
            seq: self.next_seq(),
            handle: Arc::clone(&state),
            kind: TimerKind::Repeating {
                every,
                run: Arc::new(Mutex::new(f)),
            },
        })?;
        Ok(TaskHandle { state })
    }

    /// Shuts the scheduler down, draining queued jobs and joining threads.
    ///
    /// Equivalent to dropping, but explicit at the call site.
    pub fn shutdown(mut self) {
        self.shutdown_in_place();
    }

    fn schedule(&self, entry: TimerEntry) -> Result<(), ScheduleError> {
        self.timer_tx
            .as_ref()
            .ok_or(ScheduleError::Shutdown)?
            .send(TimerCmd::Schedule(entry))
            .map_err(|_| ScheduleError::Shutdown)
    }

    fn next_seq(&self) -> u64 {
        self.timer_seq.fetch_add(1, Ordering::Relaxed)
    }

    fn shutdown_in_place(&mut self) {
        let Some(timer_tx) = self.timer_tx.take() else {
            return;
        };

        // Stop the timer first: it holds a job-channel sender, and workers
        // only exit once every sender is gone.
        let _ = timer_tx.send(TimerCmd::Shutdown);
        drop(timer_tx);
        if let Some(timer) = self.timer.take() {
            let _ = timer.join();
        }

        drop(self.jobs_tx.take());
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        log::debug!("scheduler shut down");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown_in_place();
    }
}

// =============================================================================
// Worker and timer loops
// =============================================================================

fn worker_loop(rx: Receiver<Job>) {
    while let Ok(job) = rx.recv() {
        if job.handle.cancelled.load(Ordering::Acquire) {
            continue;
        }
        if panic::catch_unwind(AssertUnwindSafe(job.run)).is_err() {
            log::error!(
                "task panicked on {}",
                thread::current().name().unwrap_or("worker")
            );
        }
        job.handle.mark_ran();
    }
}

fn timer_loop(cmd_rx: Receiver<TimerCmd>, jobs_tx: Sender<Job>) {
    let mut heap: BinaryHeap<Reverse<TimerEntry>> = BinaryHeap::new();

    loop {
        let cmd = match heap.peek() {
            Some(Reverse(next)) => {
                let timeout = next.deadline.saturating_duration_since(Instant::now());
                cmd_rx.recv_timeout(timeout)
            }
            None => cmd_rx
                .recv()
                .map_err(|_| RecvTimeoutError::Disconnected),
        };

        match cmd {
            Ok(TimerCmd::Schedule(entry)) => {
                heap.push(Reverse(entry));
            }
            Ok(TimerCmd::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        let now = Instant::now();
        while heap
            .peek()
            .is_some_and(|Reverse(e)| e.deadline <= now)
        {
            let Reverse(entry) = heap.pop().expect("peeked entry");
            fire(entry, &jobs_tx, &mut heap);
        }
    }
}

fn fire(
    entry: TimerEntry,
    jobs_tx: &Sender<Job>,
    heap: &mut BinaryHeap<Reverse<TimerEntry>>,
) {
    if entry.handle.cancelled.load(Ordering::Acquire) {
        return;
    }

    match entry.kind {
        TimerKind::Once { job } => {
            let _ = jobs_tx.send(Job {
                run: job,
                handle: entry.handle,
            });
        }
        TimerKind::Repeating { every, run } => {
            let tick = Arc::clone(&run);
            let _ = jobs_tx.send(Job {
                run: Box::new(move || {
                    let mut body = tick.lock().unwrap();
                    (*body)();
                }),
                handle: Arc::clone(&entry.handle),
            });
            heap.push(Reverse(TimerEntry {
                deadline: entry.deadline + every,
                seq: entry.seq,
                handle: entry.handle,
                kind: TimerKind::Repeating { every, run },
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    #[test]
    fn spawn_runs_once() {
        let _ = env_logger::builder().is_test(true).try_init();

        let sched = Scheduler::new(2);
        let hits = counter();

        let seen = Arc::clone(&hits);
        let handle = sched
            .spawn(move || {
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        handle.wait();
        assert!(handle.has_run());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn all_queued_jobs_run() {
        let sched = Scheduler::new(4);
        let hits = counter();

        let handles: Vec<_> = (0..64)
            .map(|_| {
                let seen = Arc::clone(&hits);
                sched
                    .spawn(move || {
                        seen.fetch_add(1, Ordering::SeqCst);
                    })
                    .unwrap()
            })
            .collect();

        for h in &handles {
            h.wait();
        }
        assert_eq!(hits.load(Ordering::SeqCst), 64);
    }

    #[test]
    fn shutdown_drains_queue() {
        let sched = Scheduler::new(2);
        let hits = counter();

        for _ in 0..32 {
            let seen = Arc::clone(&hits);
            sched
                .spawn(move || {
                    seen.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        sched.shutdown();
        assert_eq!(hits.load(Ordering::SeqCst), 32);
    }

    #[test]
    fn delayed_task_respects_deadline() {
        let sched = Scheduler::new(1);
        let hits = counter();

        let delay = Duration::from_millis(50);
        let started = Instant::now();
        let seen = Arc::clone(&hits);
        let handle = sched
            .spawn_after(delay, move || {
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        handle.wait();
        assert!(started.elapsed() >= delay);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancelled_delayed_task_never_runs() {
        let sched = Scheduler::new(1);
        let hits = counter();

        let seen = Arc::clone(&hits);
        let handle = sched
            .spawn_after(Duration::from_millis(50), move || {
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        assert!(handle.cancel());
        assert!(!handle.cancel()); // second cancel is a no-op
        handle.wait(); // returns immediately on a cancelled task

        thread::sleep(Duration::from_millis(120));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(!handle.has_run());
    }

    #[test]
    fn repeating_task_ticks_until_cancelled() {
        let sched = Scheduler::new(2);
        let hits = counter();

        let seen = Arc::clone(&hits);
        let handle = sched
            .spawn_repeating(Duration::ZERO, Duration::from_millis(10), move || {
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        // Wait for a few ticks, bounded.
        let deadline = Instant::now() + Duration::from_secs(5);
        while hits.load(Ordering::SeqCst) < 3 {
            assert!(Instant::now() < deadline, "repeating task never ticked");
            thread::sleep(Duration::from_millis(5));
        }

        handle.cancel();
        let settled = hits.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(60));

        // At most one in-flight tick may land after cancellation.
        assert!(hits.load(Ordering::SeqCst) <= settled + 1);
    }

    #[test]
    fn panicking_task_does_not_kill_worker() {
        let sched = Scheduler::new(1);
        let hits = counter();

        let bad = sched.spawn(|| panic!("boom")).unwrap();
        bad.wait();

        let seen = Arc::clone(&hits);
        let good = sched
            .spawn(move || {
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        good.wait();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancelled_queued_task_is_skipped() {
        let sched = Scheduler::new(1);
        let hits = counter();

        // Occupy the single worker so the next job stays queued.
        let gate = Arc::new(AtomicBool::new(false));
        let open = Arc::clone(&gate);
        sched
            .spawn(move || {
                while !open.load(Ordering::Acquire) {
                    thread::yield_now();
                }
            })
            .unwrap();

        let seen = Arc::clone(&hits);
        let queued = sched
            .spawn(move || {
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        queued.cancel();
        gate.store(true, Ordering::Release);

        sched.shutdown();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn handles_outlive_scheduler() {
        let sched = Scheduler::new(1);
        let handle = sched.spawn(|| {}).unwrap();
        sched.shutdown();

        handle.wait();
        assert!(handle.has_run());
    }
}
