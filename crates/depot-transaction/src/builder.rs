//! Fluent unit-of-work builder.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::transaction::{
    TaskError, Transaction, TransactionError, TransactionRepository, TransactionService,
};

type Task = Box<dyn FnOnce(Transaction) -> BoxFuture<'static, Result<(), TaskError>> + Send>;

/// Composes writes across unrelated repositories into one unit of work.
///
/// Repositories are registered up front, keyed by their `(entity, id)` type
/// pair. Each `create`/`update`/`delete` call captures its value eagerly and
/// appends a deferred task; nothing touches the store until [`commit`].
///
/// Tasks run strictly in enqueue order, one at a time. The first failure
/// aborts the transaction, skips the remaining tasks, and surfaces the
/// original cause. On success the task list is cleared, so the builder can be
/// reused for another unit of work.
///
/// The transaction itself is created lazily, on the first commit or abort,
/// and every task of one unit of work sees the same handle.
///
/// [`commit`]: UnitOfWork::commit
pub struct UnitOfWork {
    service: Arc<dyn TransactionService>,
    handlers: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    tasks: Vec<Task>,
    transaction: Option<Transaction>,
}

impl std::fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("handlers", &self.handlers.len())
            .field("tasks", &self.tasks.len())
            .field("transaction", &self.transaction)
            .finish_non_exhaustive()
    }
}

impl UnitOfWork {
    pub fn new(service: Arc<dyn TransactionService>) -> Self {
        Self {
            service,
            handlers: HashMap::new(),
            tasks: Vec::new(),
            transaction: None,
        }
    }

    /// Register the repository handling entity type `M` with id type `I`.
    ///
    /// Registering a second repository for the same type pair replaces the
    /// first; lookup is by exact type pair, so two repositories for different
    /// entity kinds never collide.
    pub fn register<M, I>(&mut self, repository: Arc<dyn TransactionRepository<M, I>>) -> &mut Self
    where
        M: Send + 'static,
        I: Send + 'static,
    {
        self.handlers
            .insert(TypeId::of::<(M, I)>(), Arc::new(repository));
        self
    }

    fn handler<M, I>(&self) -> Result<Arc<dyn TransactionRepository<M, I>>, TransactionError>
    where
        M: Send + 'static,
        I: Send + 'static,
    {
        self.handlers
            .get(&TypeId::of::<(M, I)>())
            .and_then(|entry| entry.downcast_ref::<Arc<dyn TransactionRepository<M, I>>>())
            .cloned()
            .ok_or(TransactionError::UnknownRepository)
    }

    /// Queue a create for `entity` on its registered repository.
    pub fn create<M, I>(&mut self, entity: M) -> Result<&mut Self, TransactionError>
    where
        M: Send + 'static,
        I: Send + 'static,
    {
        let handler = self.handler::<M, I>()?;
        self.tasks.push(Box::new(move |transaction| {
            Box::pin(async move { handler.create(entity, &transaction).await })
        }));
        Ok(self)
    }

    /// Queue an update for `entity` on its registered repository.
    pub fn update<M, I>(&mut self, entity: M) -> Result<&mut Self, TransactionError>
    where
        M: Send + 'static,
        I: Send + 'static,
    {
        let handler = self.handler::<M, I>()?;
        self.tasks.push(Box::new(move |transaction| {
            Box::pin(async move { handler.update(entity, &transaction).await })
        }));
        Ok(self)
    }

    /// Queue a delete for the entity with id `id`.
    pub fn delete<M, I>(&mut self, id: I) -> Result<&mut Self, TransactionError>
    where
        M: Send + 'static,
        I: Send + 'static,
    {
        let handler = self.handler::<M, I>()?;
        self.tasks.push(Box::new(move |transaction| {
            Box::pin(async move { handler.delete(id, &transaction).await })
        }));
        Ok(self)
    }

    /// Number of tasks currently queued.
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    async fn transaction(&mut self) -> Result<Transaction, TransactionError> {
        match &self.transaction {
            Some(transaction) => Ok(transaction.clone()),
            None => {
                let transaction = self.service.create().await?;
                self.transaction = Some(transaction.clone());
                Ok(transaction)
            }
        }
    }

    /// Run the queued tasks in order, then commit the transaction.
    ///
    /// On the first task failure the transaction is aborted, the remaining
    /// tasks are dropped unrun, and the task's own error is returned. An
    /// abort failure on that path is logged, never surfaced, so the caller
    /// always sees the real cause.
    pub async fn commit(&mut self) -> Result<(), TransactionError> {
        if self.tasks.is_empty() {
            return Ok(());
        }

        let transaction = self.transaction().await?;
        let tasks = std::mem::take(&mut self.tasks);
        let task_count = tasks.len();

        for task in tasks {
            if let Err(cause) = task(transaction.clone()).await {
                if let Err(abort_error) = self.service.abort(&transaction).await {
                    tracing::warn!(
                        transaction_id = %transaction.id(),
                        error = %abort_error,
                        "Transaction abort failed after task failure"
                    );
                }
                self.transaction = None;
                return Err(TransactionError::Task(cause));
            }
        }

        self.service.commit(&transaction).await?;
        self.transaction = None;

        tracing::debug!(
            transaction_id = %transaction.id(),
            task_count,
            "Unit of work committed"
        );
        Ok(())
    }

    /// Abort the transaction without running any queued tasks.
    ///
    /// The queued tasks and the transaction handle are discarded even when
    /// the service abort fails, so the builder is always left ready for a
    /// fresh unit of work.
    pub async fn abort(&mut self) -> Result<(), TransactionError> {
        let result = match self.transaction().await {
            Ok(transaction) => self.service.abort(&transaction).await,
            Err(err) => Err(err),
        };

        self.tasks.clear();
        self.transaction = None;
        result
    }
}

/// Hands out fresh [`UnitOfWork`] builders over a shared transaction service.
pub struct UnitOfWorkFactory {
    service: Arc<dyn TransactionService>,
}

impl UnitOfWorkFactory {
    pub fn new(service: Arc<dyn TransactionService>) -> Self {
        Self { service }
    }

    pub fn begin(&self) -> UnitOfWork {
        UnitOfWork::new(Arc::clone(&self.service))
    }
}
