//! Bounded parallel dispatch with per-item failure isolation
//!
//! Items are split into contiguous chunks, one per thread. Every item runs
//! independently: an error or a panic is recorded against that item and the
//! remaining items still run. Results are merged only after every thread joined.

use std::fmt::Debug;
use std::panic::{catch_unwind, AssertUnwindSafe};

use log::{debug, warn};

use crate::error::Result;

/// A unit of work applied to every dispatched item
///
/// Arguments shared by every item live in the implementing value.
pub trait Worker: Send + Sync {
    type Item: Debug + Send;
    type Output: Send;

    fn process(&self, item: Self::Item) -> Result<Self::Output>;
}

/// Adapter running a closure as a [`Worker`]
struct FnWorker<F, T> {
    func: F,
    _item: std::marker::PhantomData<fn(T)>,
}
impl<F, T, O> Worker for FnWorker<F, T>
where
    F: Fn(T) -> Result<O> + Send + Sync,
    T: Debug + Send,
    O: Send,
{
    type Item = T;
    type Output = O;

    fn process(&self, item: T) -> Result<O> {
        (self.func)(item)
    }
}

/// Aggregated outcome of a dispatch
#[derive(Debug)]
pub struct DispatchReport<O> {
    /// Number of items submitted
    pub total: usize,
    /// Number of items whose job failed or panicked
    pub failures: usize,
    /// One message per failure, tagged with the item
    pub messages: Vec<String>,
    /// Outputs of the successful jobs
    pub outputs: Vec<O>,
}
impl<O> DispatchReport<O> {
    fn new(total: usize) -> Self {
        Self {
            total,
            failures: 0,
            messages: Vec::new(),
            outputs: Vec::with_capacity(total),
        }
    }

    fn record(&mut self, tag: String, outcome: Outcome<O>) {
        match outcome {
            Outcome::Done(output) => self.outputs.push(output),
            Outcome::Failed(reason) => {
                warn!("Job failed for {tag}: {reason}");
                self.failures += 1;
                self.messages.push(format!("{tag}: {reason}"));
            }
        }
    }

    fn merge(&mut self, other: Self) {
        self.failures += other.failures;
        self.messages.extend(other.messages);
        self.outputs.extend(other.outputs);
    }

    /// Number of items that completed
    #[must_use]
    pub fn successes(&self) -> usize {
        self.total - self.failures
    }
}

enum Outcome<O> {
    Done(O),
    Failed(String),
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

/// Runs one item, converting errors and panics into a failure
fn run_item<W: Worker>(worker: &W, item: W::Item) -> (String, Outcome<W::Output>) {
    let tag = format!("{item:?}");
    let outcome = match catch_unwind(AssertUnwindSafe(|| worker.process(item))) {
        Ok(Ok(output)) => Outcome::Done(output),
        Ok(Err(e)) => Outcome::Failed(e.to_string()),
        Err(payload) => Outcome::Failed(panic_message(payload.as_ref())),
    };
    (tag, outcome)
}

fn run_chunk<W: Worker>(worker: &W, items: Vec<W::Item>) -> DispatchReport<W::Output> {
    let mut report = DispatchReport::new(items.len());
    for item in items {
        let (tag, outcome) = run_item(worker, item);
        report.record(tag, outcome);
    }
    report
}

/// Resolves the requested worker count against the number of items
fn thread_count(workers: usize, num_items: usize) -> usize {
    let workers = if workers == 0 { num_cpus::get() } else { workers };
    workers.min(num_items).max(1)
}

/// Applies `worker` to every item using up to `workers` threads
///
/// * `workers == 0` uses one thread per CPU.
/// * `workers == 1` or `debug` runs every item in the calling thread.
///
/// Both paths produce the same counts and the same set of outputs; the order of
/// `outputs` and `messages` is not guaranteed.
pub fn dispatch<W: Worker>(
    worker: &W,
    items: Vec<W::Item>,
    workers: usize,
    debug: bool,
) -> DispatchReport<W::Output> {
    let total = items.len();
    let num_threads = if debug { 1 } else { thread_count(workers, total) };
    debug!("Dispatching {total} items over {num_threads} threads");

    if num_threads == 1 {
        return run_chunk(worker, items);
    }

    let per_thread = total.div_ceil(num_threads);
    let mut chunks = Vec::with_capacity(num_threads);
    let mut items = items.into_iter();
    loop {
        let chunk: Vec<_> = items.by_ref().take(per_thread).collect();
        if chunk.is_empty() {
            break;
        }
        chunks.push(chunk);
    }

    let mut report = DispatchReport::new(total);
    std::thread::scope(|scope| {
        let handles: Vec<_> = chunks
            .into_iter()
            .map(|chunk| {
                let size = chunk.len();
                (size, scope.spawn(move || run_chunk(worker, chunk)))
            })
            .collect();

        for (tid, (size, handle)) in handles.into_iter().enumerate() {
            match handle.join() {
                Ok(partial) => report.merge(partial),
                Err(_) => {
                    // Only reachable if recording itself panicked
                    report.failures += size;
                    report
                        .messages
                        .push(format!("thread {tid}: lost {size} items"));
                }
            }
        }
    });
    report
}

/// Applies a closure to every item, see [`dispatch`]
///
/// ```rust
/// use fast5kit::dispatch::dispatch_fn;
///
/// let report = dispatch_fn(|x: u32| Ok(x * 2), (0..10).collect(), 4, false);
/// assert_eq!(report.total, 10);
/// assert_eq!(report.failures, 0);
/// assert_eq!(report.outputs.iter().sum::<u32>(), 90);
/// ```
pub fn dispatch_fn<T, O, F>(func: F, items: Vec<T>, workers: usize, debug: bool) -> DispatchReport<O>
where
    F: Fn(T) -> Result<O> + Send + Sync,
    T: Debug + Send,
    O: Send,
{
    let worker = FnWorker {
        func,
        _item: std::marker::PhantomData,
    };
    dispatch(&worker, items, workers, debug)
}
