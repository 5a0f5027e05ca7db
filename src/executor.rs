// src/executor.rs

//! Task execution gated by a shared limiter.
//!
//! [`ThrottledExecutor`] puts one dedicated gating thread in front of an inner
//! [`Executor`]. The gate takes submissions strictly in arrival order, waits
//! for the limiter to grant, and only then forwards the task. What the inner
//! executor does with forwarded tasks (ordering, parallelism) is up to it.

// dependencies
use crate::blocking::{self, CancellationToken};
use crate::errors::RateLimiterError;
use crate::rate_limiter::RateLimiter;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Unit of work accepted by an [`Executor`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A facility that runs tasks, with a shutdown lifecycle.
pub trait Executor: Send + Sync {
    /// Queues `task`; fails with [`RateLimiterError::Rejected`] after shutdown.
    fn execute(&self, task: Task) -> Result<(), RateLimiterError>;

    /// Stops accepting tasks; already queued tasks still run.
    fn shutdown(&self);

    /// Stops accepting tasks and hands back the ones that never started.
    fn shutdown_now(&self) -> Vec<Task>;

    fn is_shutdown(&self) -> bool;

    /// True once shut down and every worker has exited.
    fn is_terminated(&self) -> bool;

    /// Blocks until terminated or until `timeout` passes; returns whether it
    /// terminated.
    fn await_termination(&self, timeout: Duration) -> bool;
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn execute(&self, task: Task) -> Result<(), RateLimiterError> {
        (**self).execute(task)
    }

    fn shutdown(&self) {
        (**self).shutdown()
    }

    fn shutdown_now(&self) -> Vec<Task> {
        (**self).shutdown_now()
    }

    fn is_shutdown(&self) -> bool {
        (**self).is_shutdown()
    }

    fn is_terminated(&self) -> bool {
        (**self).is_terminated()
    }

    fn await_termination(&self, timeout: Duration) -> bool {
        (**self).await_termination(timeout)
    }
}

// FIFO queue shared between submitters and the worker threads draining it
struct TaskQueue {
    state: Mutex<QueueState>,
    available: Condvar,
    terminated: Condvar,
}

struct QueueState {
    tasks: VecDeque<Task>,
    closed: bool,
    live_workers: usize,
}

impl QueueState {
    fn is_terminated(&self) -> bool {
        self.closed && self.live_workers == 0
    }
}

impl TaskQueue {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(QueueState {
                tasks: VecDeque::new(),
                closed: false,
                live_workers: 0,
            }),
            available: Condvar::new(),
            terminated: Condvar::new(),
        })
    }

    fn push(&self, task: Task) -> Result<(), RateLimiterError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(RateLimiterError::Rejected);
        }
        state.tasks.push_back(task);
        self.available.notify_one();
        Ok(())
    }

    // None once the queue is closed and empty
    fn next(&self) -> Option<Task> {
        let mut state = self.state.lock();
        loop {
            if let Some(task) = state.tasks.pop_front() {
                return Some(task);
            }
            if state.closed {
                return None;
            }
            self.available.wait(&mut state);
        }
    }

    fn close(&self) {
        self.state.lock().closed = true;
        self.available.notify_all();
    }

    fn close_and_drain(&self) -> Vec<Task> {
        let mut state = self.state.lock();
        state.closed = true;
        let pending = state.tasks.drain(..).collect();
        self.available.notify_all();
        pending
    }

    fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn is_terminated(&self) -> bool {
        self.state.lock().is_terminated()
    }

    fn worker_started(&self) {
        self.state.lock().live_workers += 1;
    }

    fn worker_exited(&self) {
        let mut state = self.state.lock();
        state.live_workers -= 1;
        if state.is_terminated() {
            self.terminated.notify_all();
        }
    }

    // no deadline waits for as long as it takes
    fn await_termination(&self, deadline: Option<Instant>) -> bool {
        let mut state = self.state.lock();
        while !state.is_terminated() {
            match deadline {
                Some(deadline) => {
                    if self.terminated.wait_until(&mut state, deadline).timed_out() {
                        return state.is_terminated();
                    }
                }
                None => self.terminated.wait(&mut state),
            }
        }
        true
    }
}

fn spawn_worker<H, X>(
    queue: &Arc<TaskQueue>,
    name: String,
    mut handle: H,
    on_exit: X,
) -> Result<(), RateLimiterError>
where
    H: FnMut(Task) + Send + 'static,
    X: FnOnce() + Send + 'static,
{
    queue.worker_started();
    let worker_queue = Arc::clone(queue);
    let spawned = thread::Builder::new().name(name).spawn(move || {
        while let Some(task) = worker_queue.next() {
            handle(task);
        }
        on_exit();
        worker_queue.worker_exited();
    });

    if let Err(err) = spawned {
        queue.close();
        queue.worker_exited();
        return Err(RateLimiterError::Spawn(err));
    }
    Ok(())
}

fn run_task(task: Task) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        error!(panic = %message, "task panicked, worker keeps running");
    }
}

/// Fixed-size pool of worker threads draining one FIFO queue.
///
/// Dropping the pool shuts it down gracefully: queued tasks still run.
pub struct WorkerPool {
    queue: Arc<TaskQueue>,
    threads: usize,
}

impl WorkerPool {
    pub fn new(threads: usize) -> Result<Self, RateLimiterError> {
        if threads == 0 {
            return Err(RateLimiterError::InvalidWorkerCount);
        }

        let queue = TaskQueue::new();
        for index in 0..threads {
            spawn_worker(&queue, format!("pace-worker-{index}"), run_task, || {})?;
        }
        debug!(threads, "started worker pool");
        Ok(Self { queue, threads })
    }

    pub fn single_thread() -> Result<Self, RateLimiterError> {
        Self::new(1)
    }

    pub fn threads(&self) -> usize {
        self.threads
    }
}

impl Executor for WorkerPool {
    fn execute(&self, task: Task) -> Result<(), RateLimiterError> {
        self.queue.push(task)
    }

    fn shutdown(&self) {
        self.queue.close();
    }

    fn shutdown_now(&self) -> Vec<Task> {
        self.queue.close_and_drain()
    }

    fn is_shutdown(&self) -> bool {
        self.queue.is_closed()
    }

    fn is_terminated(&self) -> bool {
        self.queue.is_terminated()
    }

    fn await_termination(&self, timeout: Duration) -> bool {
        self.queue.await_termination(Instant::now().checked_add(timeout))
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.queue.close();
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads)
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}

/// Executor that forwards each task to `inner` only after `limiter` grants.
///
/// `shutdown` closes intake; the gate keeps draining its backlog through the
/// limiter and shuts `inner` down once the backlog is forwarded, so
/// `is_shutdown` turns true only after that. `shutdown_now` aborts the wait in
/// progress (that task is dropped) and returns every task not yet forwarded,
/// followed by those `inner` never started.
pub struct ThrottledExecutor<E, L>
where
    E: Executor + 'static,
    L: RateLimiter + 'static,
{
    gate: Arc<TaskQueue>,
    inner: Arc<E>,
    limiter: Arc<L>,
    cancel: CancellationToken,
}

impl<L: RateLimiter + 'static> ThrottledExecutor<WorkerPool, L> {
    /// Throttles onto a fresh single-thread pool.
    pub fn new(limiter: L) -> Result<Self, RateLimiterError> {
        Self::with_executor(WorkerPool::single_thread()?, limiter)
    }
}

impl<E, L> ThrottledExecutor<E, L>
where
    E: Executor + 'static,
    L: RateLimiter + 'static,
{
    pub fn with_executor(inner: E, limiter: L) -> Result<Self, RateLimiterError> {
        let inner = Arc::new(inner);
        let limiter = Arc::new(limiter);
        let cancel = CancellationToken::new();
        let gate = TaskQueue::new();

        let forward = {
            let inner = Arc::clone(&inner);
            let limiter = Arc::clone(&limiter);
            let cancel = cancel.clone();
            move |task: Task| match blocking::wait_cancellable(&*limiter, &cancel) {
                Ok(()) => {
                    if let Err(err) = inner.execute(task) {
                        warn!(error = %err, "inner executor refused a throttled task");
                    }
                }
                Err(err) => debug!(error = %err, "throttled task dropped"),
            }
        };
        let finish = {
            let inner = Arc::clone(&inner);
            move || inner.shutdown()
        };
        spawn_worker(&gate, "pace-gate".to_string(), forward, finish)?;

        Ok(Self {
            gate,
            inner,
            limiter,
            cancel,
        })
    }

    pub fn submit<F>(&self, task: F) -> Result<(), RateLimiterError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.gate.push(Box::new(task))
    }

    pub fn limiter(&self) -> &L {
        &self.limiter
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

impl<E, L> Executor for ThrottledExecutor<E, L>
where
    E: Executor + 'static,
    L: RateLimiter + 'static,
{
    fn execute(&self, task: Task) -> Result<(), RateLimiterError> {
        self.gate.push(task)
    }

    fn shutdown(&self) {
        self.gate.close();
    }

    fn shutdown_now(&self) -> Vec<Task> {
        // drain before cancelling so the gate cannot pick up another task
        let mut pending = self.gate.close_and_drain();
        self.cancel.cancel();
        pending.extend(self.inner.shutdown_now());
        pending
    }

    fn is_shutdown(&self) -> bool {
        self.gate.is_closed() && self.inner.is_shutdown()
    }

    fn is_terminated(&self) -> bool {
        self.gate.is_terminated() && self.inner.is_terminated()
    }

    fn await_termination(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let remaining = || match deadline {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
            None => Duration::MAX,
        };
        self.gate.await_termination(deadline) && self.inner.await_termination(remaining())
    }
}

impl<E, L> Drop for ThrottledExecutor<E, L>
where
    E: Executor + 'static,
    L: RateLimiter + 'static,
{
    fn drop(&mut self) {
        self.gate.close();
    }
}

impl<E, L> fmt::Debug for ThrottledExecutor<E, L>
where
    E: Executor + 'static,
    L: RateLimiter + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThrottledExecutor")
            .field("shutdown", &self.is_shutdown())
            .field("terminated", &self.is_terminated())
            .finish()
    }
}
