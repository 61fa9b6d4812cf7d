//! Transaction handles and lifecycle services.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use depot_store::{DocumentStore, StoreSession};
use depot_types::StoreError;

/// Error type carried by unit-of-work tasks.
///
/// Repository write errors cross the crate boundary boxed, so the caller
/// always observes the original cause rather than a wrapper.
pub type TaskError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by the transaction layer.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// No repository was registered for the requested entity type.
    #[error("No repository registered for the requested entity type")]
    UnknownRepository,

    /// A queued task failed. The original failure is forwarded unchanged.
    #[error(transparent)]
    Task(#[from] TaskError),

    /// The store session failed during create, commit, or abort.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// An opaque handle over at most one store session.
///
/// Handles are cheap to clone; clones share the same session. A detached
/// handle carries no session at all, and commit/abort on it are silent
/// no-ops. That is the shape a transaction-less store produces.
#[derive(Clone)]
pub struct Transaction {
    id: Uuid,
    session: Option<Arc<Mutex<Box<dyn StoreSession>>>>,
}

impl Transaction {
    /// A handle without a backing session.
    pub fn detached() -> Self {
        Self {
            id: Uuid::new_v4(),
            session: None,
        }
    }

    fn with_session(session: Box<dyn StoreSession>) -> Self {
        Self {
            id: Uuid::new_v4(),
            session: Some(Arc::new(Mutex::new(session))),
        }
    }

    /// Identity of this transaction, shared by all clones of the handle.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Whether a store session backs this handle.
    pub fn is_transactional(&self) -> bool {
        self.session.is_some()
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("transactional", &self.session.is_some())
            .finish()
    }
}

/// Lifecycle service handing out [`Transaction`] handles.
#[async_trait]
pub trait TransactionService: Send + Sync {
    /// Create a new transaction.
    async fn create(&self) -> Result<Transaction, TransactionError>;

    /// Commit the transaction.
    async fn commit(&self, transaction: &Transaction) -> Result<(), TransactionError>;

    /// Abort the transaction.
    async fn abort(&self, transaction: &Transaction) -> Result<(), TransactionError>;
}

/// Transaction service over a document store's native sessions.
pub struct SessionTransactionService {
    store: Arc<dyn DocumentStore>,
}

impl SessionTransactionService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TransactionService for SessionTransactionService {
    async fn create(&self) -> Result<Transaction, TransactionError> {
        let mut session = self.store.start_session().await?;
        session.start_transaction().await?;

        let transaction = Transaction::with_session(session);
        tracing::debug!(transaction_id = %transaction.id(), "Transaction started");
        Ok(transaction)
    }

    async fn commit(&self, transaction: &Transaction) -> Result<(), TransactionError> {
        if let Some(session) = &transaction.session {
            session.lock().await.commit_transaction().await?;
            tracing::debug!(transaction_id = %transaction.id(), "Transaction committed");
        }
        Ok(())
    }

    async fn abort(&self, transaction: &Transaction) -> Result<(), TransactionError> {
        if let Some(session) = &transaction.session {
            session.lock().await.abort_transaction().await?;
            tracing::debug!(transaction_id = %transaction.id(), "Transaction aborted");
        }
        Ok(())
    }
}

/// Transaction service for stores without transaction support.
///
/// Hands out detached handles; commit and abort do nothing.
#[derive(Default)]
pub struct NoopTransactionService;

impl NoopTransactionService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TransactionService for NoopTransactionService {
    async fn create(&self) -> Result<Transaction, TransactionError> {
        Ok(Transaction::detached())
    }

    async fn commit(&self, _transaction: &Transaction) -> Result<(), TransactionError> {
        Ok(())
    }

    async fn abort(&self, _transaction: &Transaction) -> Result<(), TransactionError> {
        Ok(())
    }
}

/// The transaction-aware write contract a repository offers the unit of work.
///
/// Unlike the repository's own queued writes, these execute immediately; the
/// [`UnitOfWork`](crate::UnitOfWork) supplies the sequencing and the
/// transaction finalization around them.
#[async_trait]
pub trait TransactionRepository<M, I>: Send + Sync
where
    M: Send + 'static,
    I: Send + 'static,
{
    /// Insert the entity within the transaction.
    async fn create(&self, entity: M, transaction: &Transaction) -> Result<(), TaskError>;

    /// Replace the entity by id within the transaction.
    async fn update(&self, entity: M, transaction: &Transaction) -> Result<(), TaskError>;

    /// Delete the entity with the given id within the transaction.
    async fn delete(&self, id: I, transaction: &Transaction) -> Result<(), TaskError>;
}
