use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{Notify, oneshot};
use tokio::time::Instant;

use super::name::BucketName;
use super::status::BucketStatus;
use crate::ratelimit::{BucketConfig, SlidingWindow};
use crate::{ErrorKind, Result};

/// Work waiting in a bucket's queue.
///
/// A job is consumed exactly once: either it is admitted and `run`, or the
/// bucket is torn down and it is `reject`ed.
trait Job: Send {
    fn run(self: Box<Self>) -> BoxFuture<'static, ()>;
    fn reject(self: Box<Self>, error: ErrorKind);
}

/// A job together with the channel its caller is waiting on
struct PendingJob<F, T> {
    work: F,
    reply: oneshot::Sender<Result<T>>,
}

impl<F, Fut, T> Job for PendingJob<F, T>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    fn run(self: Box<Self>) -> BoxFuture<'static, ()> {
        let PendingJob { work, reply } = *self;
        Box::pin(async move {
            let result = work().await;
            // Nobody to tell if the caller stopped waiting
            let _ = reply.send(result);
        })
    }

    fn reject(self: Box<Self>, error: ErrorKind) {
        let _ = self.reply.send(Err(error));
    }
}

/// Mutable part of a bucket, only ever touched under its lock
struct BucketState {
    window: SlidingWindow,
    in_flight: usize,
    queue: VecDeque<Box<dyn Job>>,
    draining: bool,
    closed: bool,
}

impl fmt::Debug for BucketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketState")
            .field("window", &self.window)
            .field("in_flight", &self.in_flight)
            .field("queued", &self.queue.len())
            .field("draining", &self.draining)
            .field("closed", &self.closed)
            .finish()
    }
}

/// What the drain loop does next
enum Step {
    /// Nothing left to do for now; `draining` was already reset
    Idle,
    /// No capacity until the oldest admission leaves the window
    Wait(Duration),
    /// These jobs were granted a slot
    Admit(Vec<Box<dyn Job>>),
}

/// A named admission budget with its own sliding window and FIFO queue.
///
/// Each bucket maintains:
/// - the instants of recent admissions
/// - the number of admitted requests that have not completed yet
/// - the queue of requests waiting for a slot
/// - a single drain task that admits queued requests as capacity frees up
#[derive(Debug)]
pub(crate) struct Bucket {
    name: BucketName,

    /// `floor(max_requests * buffer_rate)`
    limit: usize,

    state: Mutex<BucketState>,

    /// Cuts a capacity wait short after a completion or on close
    wake: Notify,
}

impl Bucket {
    pub(crate) fn new(name: BucketName, config: &BucketConfig, default_buffer_rate: f64) -> Self {
        Self {
            name,
            limit: config.effective_max(default_buffer_rate),
            state: Mutex::new(BucketState {
                window: SlidingWindow::new(config.window),
                in_flight: 0,
                queue: VecDeque::new(),
                draining: false,
                closed: false,
            }),
            wake: Notify::new(),
        }
    }

    /// Queue `work` and wait until it was admitted and has completed.
    ///
    /// Fails right away with [`ErrorKind::Destroyed`] if the bucket is closed.
    pub(crate) async fn execute<F, Fut, T>(self: &Arc<Self>, work: F) -> Result<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (reply, response) = oneshot::channel();
        {
            let mut state = self.state();
            if state.closed {
                return Err(ErrorKind::Destroyed);
            }
            state.queue.push_back(Box::new(PendingJob { work, reply }));
        }
        self.trigger_drain();

        response
            .await
            .map_err(|_| ErrorKind::WorkAborted(self.name.clone()))?
    }

    /// Point-in-time snapshot, taken after pruning the window
    pub(crate) fn status(&self) -> BucketStatus {
        let mut state = self.state();
        state.window.prune(Instant::now());
        BucketStatus {
            available: state.window.available(self.limit, state.in_flight),
            queued: state.queue.len(),
            in_flight: state.in_flight,
        }
    }

    /// Permanently close the bucket and fail everything still queued.
    ///
    /// In-flight work is left to settle on its own. Calling this more than
    /// once has no further effect.
    pub(crate) fn close(&self) {
        let rejected: Vec<_> = {
            let mut state = self.state();
            if state.closed {
                return;
            }
            state.closed = true;
            state.queue.drain(..).collect()
        };

        if !rejected.is_empty() {
            log::warn!(
                "Bucket {} destroyed with {} queued request(s)",
                self.name,
                rejected.len()
            );
        }
        for job in rejected {
            job.reject(ErrorKind::Destroyed);
        }
        self.wake.notify_one();
    }

    fn state(&self) -> MutexGuard<'_, BucketState> {
        // No foreign code runs under the lock, so the state is consistent
        // even if another thread panicked while holding it.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a drain task, or nudge the one that is already running
    fn trigger_drain(self: &Arc<Self>) {
        {
            let mut state = self.state();
            if state.closed || state.queue.is_empty() {
                return;
            }
            if state.draining {
                drop(state);
                self.wake.notify_one();
                return;
            }
            state.draining = true;
        }

        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(Arc::clone(self).drain());
            }
            Err(_) => {
                // Runtime is gone; nothing could run the queue anyway
                self.state().draining = false;
            }
        }
    }

    async fn drain(self: Arc<Self>) {
        let mut guard = DrainGuard {
            bucket: &self,
            armed: true,
        };

        loop {
            match self.next_step() {
                Step::Idle => {
                    guard.armed = false;
                    return;
                }
                Step::Wait(delay) => {
                    log::debug!(
                        "Bucket {} at capacity, waiting {}ms for a slot",
                        self.name,
                        delay.as_millis()
                    );
                    self.pause(delay).await;
                }
                Step::Admit(batch) => {
                    log::debug!("Bucket {} admitting {} request(s)", self.name, batch.len());
                    for job in batch {
                        self.launch(job);
                    }
                }
            }
        }
    }

    fn next_step(&self) -> Step {
        let mut state = self.state();
        if state.closed || state.queue.is_empty() {
            state.draining = false;
            return Step::Idle;
        }

        let now = Instant::now();
        state.window.prune(now);
        let capacity = state.window.available(self.limit, state.in_flight);

        if capacity == 0 {
            let wait = state.window.wait_time(now);
            if wait.is_zero() {
                // All slots are held by in-flight work and waiting will not
                // free any; the next completion restarts the drain.
                log::debug!(
                    "Bucket {} blocked on {} in-flight request(s)",
                    self.name,
                    state.in_flight
                );
                state.draining = false;
                return Step::Idle;
            }
            return Step::Wait(wait);
        }

        let take = capacity.min(state.queue.len());
        let batch: Vec<_> = state.queue.drain(..take).collect();
        for _ in 0..take {
            state.window.record(now);
        }
        state.in_flight += take;
        Step::Admit(batch)
    }

    /// Run an admitted job without waiting for it
    fn launch(self: &Arc<Self>, job: Box<dyn Job>) {
        let completion = Completion {
            bucket: Arc::clone(self),
        };
        tokio::spawn(async move {
            let _completion = completion;
            job.run().await;
        });
    }

    async fn pause(&self, delay: Duration) {
        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            () = self.wake.notified() => {}
        }
    }
}

/// Resets the `draining` flag if the drain task ends without doing so itself
struct DrainGuard<'a> {
    bucket: &'a Arc<Bucket>,
    armed: bool,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.bucket.state().draining = false;
        }
    }
}

/// Releases an in-flight slot when admitted work settles, however it settles
struct Completion {
    bucket: Arc<Bucket>,
}

impl Drop for Completion {
    fn drop(&mut self) {
        {
            let mut state = self.bucket.state();
            state.in_flight = state.in_flight.saturating_sub(1);
        }
        self.bucket.trigger_drain();
    }
}
