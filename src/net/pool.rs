//! Fixed-size worker pool
//!
//! Workers take the whole queue in one lock acquisition and run the batch
//! with the lock released. Tasks submitted before [`WorkerPool::stop`] always
//! run; a panicking task is reported and does not take its worker down.

use crate::core::{LoggerError, Result};
use parking_lot::{Condvar, Mutex};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

type Task = Box<dyn FnOnce() + Send + 'static>;

struct PoolState {
    queue: Vec<Task>,
    stopping: bool,
}

struct Inner {
    state: Mutex<PoolState>,
    available: Condvar,
}

/// # Example
///
/// ```
/// use rust_log_relay::net::WorkerPool;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let pool = WorkerPool::new(2).unwrap();
/// let done = Arc::new(AtomicUsize::new(0));
/// for _ in 0..10 {
///     let done = Arc::clone(&done);
///     pool.submit(move || {
///         done.fetch_add(1, Ordering::SeqCst);
///     })
///     .unwrap();
/// }
/// pool.stop();
/// assert_eq!(done.load(Ordering::SeqCst), 10);
/// ```
pub struct WorkerPool {
    inner: Arc<Inner>,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
    size: usize,
}

impl WorkerPool {
    /// Spawn `size` workers named `relay-worker-<n>`
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(LoggerError::config("WorkerPool", "size must be at least 1"));
        }

        let pool = Self {
            inner: Arc::new(Inner {
                state: Mutex::new(PoolState {
                    queue: Vec::new(),
                    stopping: false,
                }),
                available: Condvar::new(),
            }),
            workers: Mutex::new(Vec::with_capacity(size)),
            size,
        };

        for id in 0..size {
            let inner = Arc::clone(&pool.inner);
            let handle = thread::Builder::new()
                .name(format!("relay-worker-{}", id))
                .spawn(move || Self::run_worker(inner))
                .map_err(|e| LoggerError::io_operation("spawning pool worker", id.to_string(), e))?;
            pool.workers.lock().push(handle);
        }

        Ok(pool)
    }

    fn run_worker(inner: Arc<Inner>) {
        loop {
            let batch = {
                let mut state = inner.state.lock();
                while state.queue.is_empty() && !state.stopping {
                    inner.available.wait(&mut state);
                }
                if state.queue.is_empty() {
                    return;
                }
                std::mem::take(&mut state.queue)
            };

            for task in batch {
                if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                    eprintln!(
                        "[LOGGER CRITICAL] Task panicked on {}",
                        thread::current().name().unwrap_or("relay-worker")
                    );
                }
            }
        }
    }

    /// Queue `task` and wake one idle worker
    pub fn submit<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut state = self.inner.state.lock();
            if state.stopping {
                return Err(LoggerError::LoggerStopped);
            }
            state.queue.push(Box::new(task));
        }
        self.inner.available.notify_one();
        Ok(())
    }

    /// Run every queued task, then join the workers. Idempotent.
    pub fn stop(&self) {
        self.inner.state.lock().stopping = true;
        self.inner.available.notify_all();

        let workers = std::mem::take(&mut *self.workers.lock());
        for handle in workers {
            if handle.join().is_err() {
                eprintln!("[LOGGER ERROR] Pool worker exited abnormally");
            }
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.state.lock().stopping
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
    }
}
