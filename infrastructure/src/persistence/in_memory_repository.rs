// ./infrastructure/src/persistence/in_memory_repository.rs
use crate::persistence::DocumentStore;
use application::{ApplicationError, DocumentRepository, SearchRequest};
use async_trait::async_trait;
use domain::{Document, DocumentId};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Shared, lock-guarded handle to a [`DocumentStore`].
///
/// A single `RwLock` covers the document map and the id counter, so each
/// `save` mints its id and merges `created` under one write guard.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentRepository {
    store: Arc<RwLock<DocumentStore>>,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(DocumentStore::new())),
        }
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    #[instrument(skip(self, document))]
    async fn save(&self, document: Document) -> Result<Document, ApplicationError> {
        debug!(doc_id = ?document.id, "Saving document to in-memory store");
        Ok(self.store.write().await.save(document))
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &DocumentId) -> Result<Option<Document>, ApplicationError> {
        debug!(doc_id = %id, "Getting document from in-memory store");
        Ok(self.store.read().await.find_by_id(id))
    }

    #[instrument(skip(self, request))]
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Document>, ApplicationError> {
        debug!(?request, "Searching in-memory store");
        Ok(self.store.read().await.search(request))
    }

    async fn count(&self) -> Result<usize, ApplicationError> {
        Ok(self.store.read().await.len())
    }

    /// Saves the whole batch under one write guard.
    #[instrument(skip(self, documents))]
    async fn save_batch(
        &self,
        documents: Vec<Document>,
    ) -> Result<Vec<Document>, ApplicationError> {
        debug!(count = documents.len(), "Saving batch directly to in-memory store");
        let mut store = self.store.write().await;
        Ok(documents.into_iter().map(|doc| store.save(doc)).collect())
    }
}
