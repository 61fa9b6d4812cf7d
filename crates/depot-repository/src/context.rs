//! Storage context: the deferred command queue and its commit path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::Instrument;

use depot_observe::logging::{commit_span, record_commit_result};
use depot_store::DocumentStore;
use depot_types::{Document, Predicate, StoreResult};

use crate::collection::Collection;
use crate::error::RepositoryResult;

/// A deferred write, staged until the owning context commits.
///
/// Commands are plain data rather than closures, so a queue can be inspected
/// and tested without executing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Target collection name.
    pub collection: String,
    /// The write to perform.
    pub operation: Operation,
}

/// The write kinds a context can stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Insert one document.
    Insert { document: Value },
    /// Replace the first document matching the predicate.
    Replace {
        predicate: Predicate,
        document: Value,
    },
    /// Physically delete all documents matching the predicate.
    Delete { predicate: Predicate },
}

/// Owns the deferred command queue and the store handle for one unit of work.
///
/// A context is scoped per logical unit of work and is not meant for
/// concurrent use by several of them; callers serialize access themselves.
/// Enqueued commands never execute until [`commit`], which fans them out
/// concurrently, so commands staged on one context must be independent of
/// each other.
///
/// [`commit`]: StorageContext::commit
pub struct StorageContext {
    store: Arc<dyn DocumentStore>,
    queue: Mutex<Vec<Command>>,
    transactions_enabled: bool,
    in_flight: AtomicBool,
}

impl StorageContext {
    pub fn new(store: Arc<dyn DocumentStore>, transactions_enabled: bool) -> Self {
        Self {
            store,
            queue: Mutex::new(Vec::new()),
            transactions_enabled,
            in_flight: AtomicBool::new(false),
        }
    }

    /// A typed handle to a named collection on this context's store.
    pub fn collection<D: Document>(&self, name: &str) -> Collection<D> {
        Collection::new(Arc::clone(&self.store), name)
    }

    /// Stage a command. Nothing executes until [`commit`](Self::commit).
    pub fn enqueue(&self, command: Command) {
        self.queue.lock().push(command);
    }

    /// Number of staged commands.
    pub fn pending_commands(&self) -> usize {
        self.queue.lock().len()
    }

    /// Snapshot of the staged commands, for inspection.
    pub fn queued(&self) -> Vec<Command> {
        self.queue.lock().clone()
    }

    /// Execute all staged commands and return how many were staged.
    ///
    /// With transactions enabled, a session transaction wraps the concurrent
    /// fan-out; the session commit only happens after every command finished.
    /// Sibling commands are never cancelled mid-flight: every started command
    /// runs to completion or failure, and only then is the first failure
    /// surfaced. If any command fails, the session transaction is never
    /// committed and the queue is retained, so a caller may retry the whole
    /// batch. The returned count is taken before the queue clears.
    pub async fn commit(&self) -> RepositoryResult<usize> {
        let commands = self.queue.lock().clone();
        let count = commands.len();
        if count == 0 {
            return Ok(0);
        }

        let span = commit_span(count);
        let started = Instant::now();

        if self.transactions_enabled {
            let mut session = self.store.start_session().await?;
            self.in_flight.store(true, Ordering::SeqCst);

            let result = async {
                session.start_transaction().await?;
                self.run_all(&commands).await?;
                session.commit_transaction().await
            }
            .instrument(span.clone())
            .await;

            self.in_flight.store(false, Ordering::SeqCst);
            result?;
        } else {
            self.run_all(&commands).instrument(span.clone()).await?;
        }

        self.queue.lock().clear();
        record_commit_result(&span, self.transactions_enabled, started.elapsed().as_millis());
        Ok(count)
    }

    /// Fan all commands out concurrently and wait for every one of them,
    /// then surface the first error in queue order.
    async fn run_all(&self, commands: &[Command]) -> StoreResult<()> {
        let results = join_all(commands.iter().map(|command| self.run(command))).await;
        results.into_iter().collect()
    }

    async fn run(&self, command: &Command) -> StoreResult<()> {
        match &command.operation {
            Operation::Insert { document } => {
                self.store.insert(&command.collection, document.clone()).await
            }
            Operation::Replace {
                predicate,
                document,
            } => {
                self.store
                    .replace(&command.collection, predicate, document.clone())
                    .await
            }
            Operation::Delete { predicate } => {
                self.store.delete(&command.collection, predicate).await
            }
        }
    }

    /// Wait for any in-flight transaction to drain before the context goes
    /// away. The store handle itself is released when the last clone drops.
    pub async fn close(&self) {
        while self.in_flight.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}
