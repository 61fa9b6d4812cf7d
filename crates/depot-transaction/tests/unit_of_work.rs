//! Unit-of-work composition scenarios against recording fakes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use depot_transaction::{
    TaskError, Transaction, TransactionError, TransactionRepository, TransactionService,
    UnitOfWork, UnitOfWorkFactory,
};

#[derive(Debug, Clone, PartialEq)]
struct Widget {
    id: i32,
    name: String,
}

fn widget(id: i32, name: &str) -> Widget {
    Widget {
        id,
        name: name.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Create(Widget, Uuid),
    Update(Widget, Uuid),
    Delete(i32, Uuid),
}

#[derive(Default)]
struct RecordingRepository {
    calls: Mutex<Vec<Call>>,
    fail_on_update: bool,
}

impl RecordingRepository {
    fn failing_on_update() -> Self {
        Self {
            fail_on_update: true,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl TransactionRepository<Widget, i32> for RecordingRepository {
    async fn create(&self, entity: Widget, transaction: &Transaction) -> Result<(), TaskError> {
        self.calls
            .lock()
            .push(Call::Create(entity, transaction.id()));
        Ok(())
    }

    async fn update(&self, entity: Widget, transaction: &Transaction) -> Result<(), TaskError> {
        if self.fail_on_update {
            return Err("update failed".into());
        }
        self.calls
            .lock()
            .push(Call::Update(entity, transaction.id()));
        Ok(())
    }

    async fn delete(&self, id: i32, transaction: &Transaction) -> Result<(), TaskError> {
        self.calls.lock().push(Call::Delete(id, transaction.id()));
        Ok(())
    }
}

#[derive(Default)]
struct CountingService {
    created: AtomicUsize,
    committed: AtomicUsize,
    aborted: AtomicUsize,
}

#[async_trait]
impl TransactionService for CountingService {
    async fn create(&self) -> Result<Transaction, TransactionError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Transaction::detached())
    }

    async fn commit(&self, _transaction: &Transaction) -> Result<(), TransactionError> {
        self.committed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn abort(&self, _transaction: &Transaction) -> Result<(), TransactionError> {
        self.aborted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_single_create_commits_once() {
    let service = Arc::new(CountingService::default());
    let repository = Arc::new(RecordingRepository::default());

    let mut uow = UnitOfWork::new(service.clone());
    uow.register::<Widget, i32>(repository.clone());

    let w = widget(1, "bolt");
    uow.create::<Widget, i32>(w.clone()).unwrap();
    uow.commit().await.unwrap();

    assert_eq!(service.created.load(Ordering::SeqCst), 1);
    assert_eq!(service.committed.load(Ordering::SeqCst), 1);
    assert_eq!(service.aborted.load(Ordering::SeqCst), 0);

    let calls = repository.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(&calls[0], Call::Create(entity, _) if *entity == w));
}

#[tokio::test]
async fn test_tasks_run_in_enqueue_order_on_one_transaction() {
    let service = Arc::new(CountingService::default());
    let repository = Arc::new(RecordingRepository::default());

    let mut uow = UnitOfWork::new(service.clone());
    uow.register::<Widget, i32>(repository.clone());

    let w = widget(1, "bolt");
    let renamed = widget(1, "nut");
    uow.create::<Widget, i32>(w.clone())
        .unwrap()
        .update::<Widget, i32>(renamed.clone())
        .unwrap()
        .delete::<Widget, i32>(1)
        .unwrap();
    uow.commit().await.unwrap();

    let calls = repository.calls();
    assert_eq!(calls.len(), 3);

    let txn_id = match &calls[0] {
        Call::Create(entity, id) => {
            assert_eq!(*entity, w);
            *id
        }
        other => panic!("unexpected first call: {other:?}"),
    };
    assert_eq!(calls[1], Call::Update(renamed, txn_id));
    assert_eq!(calls[2], Call::Delete(1, txn_id));

    // One lazy transaction for the whole unit of work.
    assert_eq!(service.created.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failure_skips_later_tasks_and_aborts() {
    let service = Arc::new(CountingService::default());
    let repository = Arc::new(RecordingRepository::failing_on_update());

    let mut uow = UnitOfWork::new(service.clone());
    uow.register::<Widget, i32>(repository.clone());

    uow.create::<Widget, i32>(widget(1, "bolt"))
        .unwrap()
        .update::<Widget, i32>(widget(1, "nut"))
        .unwrap()
        .delete::<Widget, i32>(1)
        .unwrap();

    let err = uow.commit().await.unwrap_err();
    assert!(matches!(err, TransactionError::Task(_)));
    assert_eq!(err.to_string(), "update failed");

    assert_eq!(service.committed.load(Ordering::SeqCst), 0);
    assert_eq!(service.aborted.load(Ordering::SeqCst), 1);

    // The delete after the failing update never ran.
    let calls = repository.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(calls[0], Call::Create(_, _)));
}

#[tokio::test]
async fn test_abort_runs_no_tasks() {
    let service = Arc::new(CountingService::default());
    let repository = Arc::new(RecordingRepository::default());

    let mut uow = UnitOfWork::new(service.clone());
    uow.register::<Widget, i32>(repository.clone());

    uow.create::<Widget, i32>(widget(1, "bolt")).unwrap();
    uow.abort().await.unwrap();

    assert!(repository.calls().is_empty());
    assert_eq!(uow.pending_tasks(), 0);
    // Abort creates the transaction if none exists yet.
    assert_eq!(service.created.load(Ordering::SeqCst), 1);
    assert_eq!(service.aborted.load(Ordering::SeqCst), 1);
    assert_eq!(service.committed.load(Ordering::SeqCst), 0);
}

/// Service whose abort always fails, for the abort cleanup path.
#[derive(Default)]
struct FailingAbortService {
    created: AtomicUsize,
}

#[async_trait]
impl TransactionService for FailingAbortService {
    async fn create(&self) -> Result<Transaction, TransactionError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Transaction::detached())
    }

    async fn commit(&self, _transaction: &Transaction) -> Result<(), TransactionError> {
        Ok(())
    }

    async fn abort(&self, _transaction: &Transaction) -> Result<(), TransactionError> {
        Err(TransactionError::Store(depot_types::StoreError::Database(
            "abort refused".to_string(),
        )))
    }
}

#[tokio::test]
async fn test_failed_abort_still_resets_the_builder() {
    let service = Arc::new(FailingAbortService::default());
    let repository = Arc::new(RecordingRepository::default());

    let mut uow = UnitOfWork::new(service.clone());
    uow.register::<Widget, i32>(repository.clone());

    uow.create::<Widget, i32>(widget(1, "bolt")).unwrap();
    let err = uow.abort().await.unwrap_err();
    assert!(err.to_string().contains("abort refused"));

    // The abort failure must not leave stale tasks or a stale transaction.
    assert_eq!(uow.pending_tasks(), 0);
    uow.create::<Widget, i32>(widget(2, "nut")).unwrap();
    uow.commit().await.unwrap();

    // The second unit of work got its own fresh transaction.
    assert_eq!(service.created.load(Ordering::SeqCst), 2);
    assert_eq!(repository.calls().len(), 1);
}

#[tokio::test]
async fn test_unregistered_type_is_an_error() {
    let service = Arc::new(CountingService::default());
    let mut uow = UnitOfWork::new(service);

    let err = uow.create::<Widget, i32>(widget(1, "bolt")).unwrap_err();
    assert!(matches!(err, TransactionError::UnknownRepository));
}

#[tokio::test]
async fn test_builder_is_reusable_after_commit() {
    let service = Arc::new(CountingService::default());
    let repository = Arc::new(RecordingRepository::default());

    let mut uow = UnitOfWork::new(service.clone());
    uow.register::<Widget, i32>(repository.clone());

    uow.create::<Widget, i32>(widget(1, "bolt")).unwrap();
    uow.commit().await.unwrap();

    uow.create::<Widget, i32>(widget(2, "nut")).unwrap();
    uow.commit().await.unwrap();

    // Each unit of work gets its own transaction.
    assert_eq!(service.created.load(Ordering::SeqCst), 2);
    assert_eq!(service.committed.load(Ordering::SeqCst), 2);
    assert_eq!(repository.calls().len(), 2);
}

#[tokio::test]
async fn test_empty_commit_touches_nothing() {
    let service = Arc::new(CountingService::default());
    let mut uow = UnitOfWork::new(service.clone());

    uow.commit().await.unwrap();

    assert_eq!(service.created.load(Ordering::SeqCst), 0);
    assert_eq!(service.committed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_factory_hands_out_independent_builders() {
    let service = Arc::new(CountingService::default());
    let repository = Arc::new(RecordingRepository::default());
    let factory = UnitOfWorkFactory::new(service.clone());

    let mut first = factory.begin();
    first.register::<Widget, i32>(repository.clone());
    first.create::<Widget, i32>(widget(1, "bolt")).unwrap();

    let mut second = factory.begin();
    second.register::<Widget, i32>(repository.clone());
    second.create::<Widget, i32>(widget(2, "nut")).unwrap();

    first.commit().await.unwrap();
    second.commit().await.unwrap();

    assert_eq!(service.created.load(Ordering::SeqCst), 2);
    assert_eq!(repository.calls().len(), 2);
}
