//! Per-class serialization of RPC operations.
//!
//! Free-tier providers tolerate at most one expensive call at a time, so
//! operations sharing a class label (say `"sendTransaction"`) run strictly
//! one after another, system-wide, with a cooldown between completions.
//! Distinct classes are independent.
//!
//! Each class is owned by a single worker task that drains a FIFO channel —
//! the single-writer discipline for the class state. Submitters get a
//! [`OperationHandle`] that resolves when their operation completes.
//! Dropping the handle does not cancel the operation: once queued it will
//! run (chain side effects may not be idempotent, so un-queueing is unsafe).
//! Submission is fire-and-forget once dequeued.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::error::RpcError;
use crate::events::{emit, ProgressEvent, ProgressSink};
use crate::policy::Endpoint;
use crate::retry::{RetryEngine, RetryPolicy};

/// An opaque queued unit of work: given the endpoint chosen for the current
/// attempt, produce the raw JSON result or a classified error.
pub type Operation =
    Arc<dyn Fn(Endpoint) -> BoxFuture<'static, Result<Value, RpcError>> + Send + Sync>;

/// Queue pacing configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Pause between a completed operation and the next dequeue.
    pub cooldown: Duration,
    /// Longer pause applied after a failed operation.
    pub failure_cooldown: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(8),
            failure_cooldown: Duration::from_secs(20),
        }
    }
}

struct Job {
    op: Operation,
    policy: RetryPolicy,
    progress: Option<ProgressSink>,
    done: oneshot::Sender<Result<Value, RpcError>>,
}

struct ClassLane {
    tx: mpsc::UnboundedSender<Job>,
    depth: Arc<AtomicUsize>,
}

/// Resolves with the operation's terminal result.
///
/// Dropping the handle abandons the *result*, never the operation itself.
pub struct OperationHandle {
    rx: oneshot::Receiver<Result<Value, RpcError>>,
}

impl OperationHandle {
    /// Wait for the operation to reach a terminal state.
    pub async fn wait(self) -> Result<Value, RpcError> {
        self.rx.await.unwrap_or_else(|_| {
            Err(RpcError::Fatal { code: 0, message: "operation worker went away".into() })
        })
    }
}

/// Serializes operations per class, running each through the retry engine.
///
/// One instance per process, constructed at startup and passed by reference;
/// tests instantiate isolated queues with their own engines.
pub struct OperationQueue {
    engine: RetryEngine,
    config: QueueConfig,
    default_policy: RetryPolicy,
    lanes: Mutex<HashMap<String, ClassLane>>,
}

impl OperationQueue {
    pub fn new(engine: RetryEngine, config: QueueConfig, default_policy: RetryPolicy) -> Self {
        Self {
            engine,
            config,
            default_policy,
            lanes: Mutex::new(HashMap::new()),
        }
    }

    /// The engine operations are executed through.
    pub fn engine(&self) -> &RetryEngine {
        &self.engine
    }

    /// Submit under the queue's default retry policy, without progress.
    pub fn submit(&self, class: &str, op: Operation) -> OperationHandle {
        self.submit_with(class, op, self.default_policy.clone(), None)
    }

    /// Submit with an explicit policy and optional progress sink.
    ///
    /// Runs immediately if the class is idle; otherwise joins the class FIFO.
    pub fn submit_with(
        &self,
        class: &str,
        op: Operation,
        policy: RetryPolicy,
        progress: Option<ProgressSink>,
    ) -> OperationHandle {
        let (done, rx) = oneshot::channel();
        let job = Job { op, policy, progress, done };

        let mut lanes = self.lanes.lock().unwrap();
        let lane = lanes
            .entry(class.to_string())
            .or_insert_with(|| self.spawn_lane(class));

        let position = lane.depth.fetch_add(1, Ordering::SeqCst);
        if position > 0 {
            emit(job.progress.as_ref(), ProgressEvent::Queued {
                class: class.to_string(),
                position,
            });
            tracing::debug!(class, position, "operation queued behind earlier work");
        }

        // The worker holds the receiver for the process lifetime, so this
        // only fails if the worker task panicked.
        if lane.tx.send(job).is_err() {
            tracing::error!(class, "operation lane worker is gone");
        }
        OperationHandle { rx }
    }

    fn spawn_lane(&self, class: &str) -> ClassLane {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let depth = Arc::new(AtomicUsize::new(0));

        let engine = self.engine.clone();
        let config = self.config.clone();
        let lane_depth = depth.clone();
        let class = class.to_string();
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let op = job.op.clone();
                let result = engine
                    .execute(&job.policy, job.progress.as_ref(), move |ep| op(ep))
                    .await;
                let failed = result.is_err();
                // A dropped handle means nobody is waiting; the work itself
                // already happened.
                let _ = job.done.send(result);

                // The job occupies the lane until it finishes, so a
                // submission made while it is in flight counts it in the
                // reported queue position.
                lane_depth.fetch_sub(1, Ordering::SeqCst);

                let pause = if failed { config.failure_cooldown } else { config.cooldown };
                tracing::debug!(
                    class = %class,
                    failed,
                    cooldown_ms = pause.as_millis(),
                    "operation finished, cooling down"
                );
                tokio::time::sleep(pause).await;
            }
        });

        ClassLane { tx, depth }
    }
}
