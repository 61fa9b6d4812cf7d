//! Document repository: deferred writes, soft delete, filtered reads.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::OnceCell;

use depot_store::{FindOptions, Sort};
use depot_transaction::{TaskError, Transaction, TransactionRepository};
use depot_types::{Document, Filter};

use crate::collection::{to_document, Collection};
use crate::context::{Command, Operation, StorageContext};
use crate::error::{RepositoryError, RepositoryResult};
use crate::query;

/// Repository over one document collection.
///
/// Reads go straight to the store. Writes are staged on the owning
/// [`StorageContext`] and execute on [`commit`]; deletes are soft, flipping
/// the document's deleted marker instead of removing the record.
///
/// The repository also offers the [`TransactionRepository`] contract, whose
/// writes execute immediately so a unit of work can sequence them itself.
///
/// [`commit`]: DocumentRepository::commit
pub struct DocumentRepository<D, F>
where
    D: Document,
    F: Filter<D::Id>,
{
    context: Arc<StorageContext>,
    collection_name: String,
    collection: OnceCell<Collection<D>>,
    _filter: PhantomData<fn() -> F>,
}

impl<D, F> DocumentRepository<D, F>
where
    D: Document,
    F: Filter<D::Id>,
{
    pub fn new(context: Arc<StorageContext>, collection_name: impl Into<String>) -> Self {
        Self {
            context,
            collection_name: collection_name.into(),
            collection: OnceCell::new(),
            _filter: PhantomData,
        }
    }

    /// The collection handle, resolved at most once per repository.
    fn collection(&self) -> &Collection<D> {
        self.collection
            .get_or_init(|| self.context.collection::<D>(&self.collection_name))
    }

    /// Fetch the document with the given id, or `None`.
    ///
    /// More than one match means the uniqueness invariant is broken and is
    /// reported as [`RepositoryError::Ambiguous`].
    pub async fn get(&self, id: D::Id) -> RepositoryResult<Option<D>> {
        let mut results = self.get_by_filter(&F::with_id(id)).await?;
        if results.len() > 1 {
            return Err(RepositoryError::Ambiguous(format!(
                "{} documents in '{}' matched one id",
                results.len(),
                self.collection_name
            )));
        }
        Ok(results.pop())
    }

    /// All documents the default filter admits.
    pub async fn get_all(&self) -> RepositoryResult<Vec<D>> {
        self.get_by_filter(&F::default()).await
    }

    /// All documents matching the filter, materialized eagerly.
    pub async fn get_by_filter(&self, filter: &F) -> RepositoryResult<Vec<D>> {
        let predicate = query::build_predicate(filter);
        self.collection()
            .find(&predicate, &FindOptions::default())
            .await
    }

    /// Filtered read with server-side sort, skip, and limit.
    ///
    /// An empty or absent sort field leaves store-defined order.
    pub async fn find(
        &self,
        filter: &F,
        skip: Option<usize>,
        limit: Option<usize>,
        sort_field: Option<&str>,
        ascending: bool,
    ) -> RepositoryResult<Vec<D>> {
        let sort = sort_field
            .filter(|field| !field.is_empty())
            .map(|field| Sort {
                field: field.to_string(),
                ascending,
            });
        let options = FindOptions { skip, limit, sort };

        self.collection()
            .find(&query::build_predicate(filter), &options)
            .await
    }

    /// Filtered read with an extra client-side predicate.
    ///
    /// Pages through the cursor until `limit` matches are collected or the
    /// cursor is exhausted. Strictly more expensive than [`find`]; only for
    /// predicates the store cannot express.
    ///
    /// [`find`]: DocumentRepository::find
    pub async fn find_where<P>(
        &self,
        filter: &F,
        predicate: P,
        limit: usize,
    ) -> RepositoryResult<Vec<D>>
    where
        P: Fn(&D) -> bool,
    {
        const PAGE_SIZE: usize = 100;

        let store_predicate = query::build_predicate(filter);
        let mut results = Vec::new();
        let mut skip = 0;

        loop {
            let options = FindOptions {
                skip: Some(skip),
                limit: Some(PAGE_SIZE),
                sort: None,
            };
            let page = self.collection().find(&store_predicate, &options).await?;
            let exhausted = page.len() < PAGE_SIZE;

            for document in page {
                if predicate(&document) {
                    results.push(document);
                    if results.len() == limit {
                        return Ok(results);
                    }
                }
            }

            if exhausted {
                return Ok(results);
            }
            skip += PAGE_SIZE;
        }
    }

    /// Stage an insert. Executes on [`commit`](Self::commit).
    pub fn create(&self, entity: &D) -> RepositoryResult<()> {
        let document = to_document(entity)?;
        self.context.enqueue(Command {
            collection: self.collection_name.clone(),
            operation: Operation::Insert { document },
        });
        Ok(())
    }

    /// Stage a replace-by-id. Executes on [`commit`](Self::commit).
    pub fn update(&self, entity: &D) -> RepositoryResult<()> {
        let predicate = query::id_predicate(&entity.id());
        let document = to_document(entity)?;
        self.context.enqueue(Command {
            collection: self.collection_name.clone(),
            operation: Operation::Replace {
                predicate,
                document,
            },
        });
        Ok(())
    }

    /// Soft-delete the document with the given id.
    ///
    /// Fetches the document, flips its deleted marker, and stages the update.
    /// A missing document is a quiet no-op.
    pub async fn delete(&self, id: D::Id) -> RepositoryResult<()> {
        match self.get(id).await? {
            Some(mut entity) => {
                entity.set_deleted(true);
                self.update(&entity)
            }
            None => Ok(()),
        }
    }

    /// Commit the owning context's staged commands.
    pub async fn commit(&self) -> RepositoryResult<usize> {
        self.context.commit().await
    }
}

#[async_trait]
impl<D, F> TransactionRepository<D, D::Id> for DocumentRepository<D, F>
where
    D: Document,
    F: Filter<D::Id> + 'static,
{
    async fn create(&self, entity: D, _transaction: &Transaction) -> Result<(), TaskError> {
        self.collection().insert(&entity).await?;
        Ok(())
    }

    async fn update(&self, entity: D, _transaction: &Transaction) -> Result<(), TaskError> {
        let predicate = query::id_predicate(&entity.id());
        self.collection().replace(&predicate, &entity).await?;
        Ok(())
    }

    async fn delete(&self, id: D::Id, _transaction: &Transaction) -> Result<(), TaskError> {
        if let Some(mut entity) = self.get(id).await? {
            entity.set_deleted(true);
            let predicate = query::id_predicate(&entity.id());
            self.collection().replace(&predicate, &entity).await?;
        }
        Ok(())
    }
}
