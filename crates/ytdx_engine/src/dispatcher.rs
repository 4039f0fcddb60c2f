use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use ytdx_logging::{ytdx_error, ytdx_info, ytdx_job};

use crate::DownloadJob;

const FALLBACK_WORKERS: usize = 4;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Worker count used when none is configured.
pub fn default_worker_count() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(FALLBACK_WORKERS)
}

/// Fixed set of threads draining one FIFO queue.
///
/// At most `workers` tasks run at any instant; the rest wait in submission
/// order. The queue is unbounded. A panicking task is contained and the
/// worker moves on to the next one.
pub struct WorkerPool {
    name: String,
    queue: Option<mpsc::Sender<Task>>,
    workers: Vec<JoinHandle<()>>,
    active: Arc<AtomicUsize>,
    closing: Arc<AtomicBool>,
}

impl WorkerPool {
    pub fn new(name: &str, workers: usize) -> Self {
        let workers = workers.max(1);
        let (tx, rx) = mpsc::channel::<Task>();
        let rx = Arc::new(Mutex::new(rx));
        let active = Arc::new(AtomicUsize::new(0));
        let closing = Arc::new(AtomicBool::new(false));

        let handles = (0..workers)
            .filter_map(|index| {
                let rx = rx.clone();
                let active = active.clone();
                let closing = closing.clone();
                thread::Builder::new()
                    .name(format!("{name}-{index}"))
                    .spawn(move || worker_loop(&rx, &active, &closing))
                    .map_err(|err| ytdx_error!("Failed to spawn {} worker {}: {}", name, index, err))
                    .ok()
            })
            .collect::<Vec<_>>();
        ytdx_info!("{} pool started with {} workers", name, handles.len());

        Self {
            name: name.to_string(),
            queue: Some(tx),
            workers: handles,
            active,
            closing,
        }
    }

    /// Queues a task; it is silently dropped once the pool is shut down.
    pub fn execute(&self, task: impl FnOnce() + Send + 'static) {
        if let Some(queue) = &self.queue {
            let _ = queue.send(Box::new(task));
        }
    }

    /// Number of tasks currently running.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stops intake and discards queued tasks that have not started.
    /// Running tasks are left alone.
    pub fn shutdown(&mut self) {
        self.closing.store(true, Ordering::Release);
        self.queue.take();
    }

    /// Shuts down and waits for running tasks to return.
    pub fn join(mut self) {
        self.shutdown();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
        ytdx_info!("{} pool stopped", self.name);
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(
    queue: &Mutex<mpsc::Receiver<Task>>,
    active: &AtomicUsize,
    closing: &AtomicBool,
) {
    loop {
        // The lock is only held while waiting for the next task.
        let next = queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recv();
        let Ok(task) = next else {
            break;
        };
        if closing.load(Ordering::Acquire) {
            drop(task);
            continue;
        }
        active.fetch_add(1, Ordering::AcqRel);
        if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
            ytdx_error!("A pool task panicked; worker continues");
        }
        active.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Runs download jobs on a bounded [`WorkerPool`].
///
/// Submission is fire-and-forget: completion is only observable through
/// each job's progress channel.
pub struct JobDispatcher {
    pool: WorkerPool,
}

impl JobDispatcher {
    pub fn new(workers: usize) -> Self {
        Self {
            pool: WorkerPool::new("download", workers),
        }
    }

    pub fn submit(&self, job: DownloadJob) {
        ytdx_job!(info, job.id(), "queued {}", job.spec().url);
        self.pool.execute(move || {
            job.execute();
        });
    }

    pub fn active(&self) -> usize {
        self.pool.active()
    }

    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    /// Stops intake; jobs that have not started report a failure outcome
    /// from their channel, running jobs finish on their own.
    pub fn shutdown(&mut self) {
        self.pool.shutdown();
    }

    /// Shuts down and waits for running jobs.
    pub fn join(self) {
        self.pool.join();
    }
}

impl Default for JobDispatcher {
    fn default() -> Self {
        Self::new(default_worker_count())
    }
}
