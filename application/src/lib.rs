use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{Document, DocumentId, DomainError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

// --- Application Errors ---
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Domain validation error: {0}")]
    DomainError(#[from] DomainError), // Propagate domain errors cleanly
}

// --- Search Request ---

/// Filter specification for [`DocumentRepository::search`].
///
/// Categories combine with AND, entries inside a list combine with OR.
/// An absent or empty list places no constraint on its field. Both
/// `created_from` and `created_to` are inclusive.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub title_prefixes: Option<Vec<String>>,
    #[serde(default)]
    pub contains_contents: Option<Vec<String>>,
    #[serde(default)]
    pub author_ids: Option<Vec<String>>,
    #[serde(default)]
    pub created_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_to: Option<DateTime<Utc>>,
}

impl SearchRequest {
    /// True when no field narrows the result, i.e. every document matches.
    pub fn is_unconstrained(&self) -> bool {
        fn unset(list: &Option<Vec<String>>) -> bool {
            list.as_ref().is_none_or(|values| values.is_empty())
        }
        unset(&self.title_prefixes)
            && unset(&self.contains_contents)
            && unset(&self.author_ids)
            && self.created_from.is_none()
            && self.created_to.is_none()
    }
}

// --- Infrastructure Interfaces (Traits) ---

/// Interface for storing, fetching and searching documents.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Upserts a document and returns it as stored.
    ///
    /// A document without an id gets a freshly minted one. Updating a known
    /// id keeps the creation time of the stored record.
    async fn save(&self, document: Document) -> Result<Document, ApplicationError>;
    /// Retrieves a document by its ID.
    async fn find_by_id(&self, id: &DocumentId) -> Result<Option<Document>, ApplicationError>;
    /// Returns every stored document matching the request, in no particular order.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Document>, ApplicationError>;
    /// Number of stored documents.
    async fn count(&self) -> Result<usize, ApplicationError>;
    /// Saves multiple documents, returning them as stored.
    #[instrument(skip(self, documents))]
    async fn save_batch(
        &self,
        documents: Vec<Document>,
    ) -> Result<Vec<Document>, ApplicationError> {
        debug!(count = documents.len(), "Saving batch via default iteration");
        let mut saved = Vec::with_capacity(documents.len());
        for doc in documents {
            saved.push(self.save(doc).await?);
        }
        Ok(saved)
    }
}

// --- Request/Response Models (Data Transfer Objects - DTOs) ---

#[derive(Serialize, Debug)]
pub struct BatchResponse {
    pub total_processed: usize,
    pub documents: Vec<Document>,
}

#[derive(Serialize, Debug)]
pub struct SearchResponse {
    /// Every matching document.
    pub hits: Vec<Document>,
    /// Number of matching documents.
    pub nb_hits: usize,
    /// Time taken by the search operation in milliseconds.
    pub processing_time_ms: u128,
}

#[derive(Serialize, Debug)]
pub struct StatsResponse {
    pub total_documents: usize,
}

// --- Application Services (Use Cases) ---

/// Largest batch accepted by [`DocumentService::save_batch`].
pub const MAX_BATCH_SIZE: usize = 1000;

/// Service exposing upsert, lookup and search over a document repository.
pub struct DocumentService {
    doc_repo: Arc<dyn DocumentRepository>,
}

impl DocumentService {
    pub fn new(doc_repo: Arc<dyn DocumentRepository>) -> Self {
        Self { doc_repo }
    }

    #[instrument(skip(self, document), fields(doc_id = ?document.id))]
    pub async fn save_document(&self, document: Document) -> Result<Document, ApplicationError> {
        info!("Attempting to save document");
        let saved = self.doc_repo.save(document).await.map_err(|e| {
            error!("Failed to save document to repository: {}", e);
            e
        })?;
        info!(doc_id = ?saved.id, "Document saved successfully");
        Ok(saved)
    }

    /// Saves every document in order. Batches over [`MAX_BATCH_SIZE`] are
    /// rejected before anything is stored.
    #[instrument(skip(self, documents), fields(batch_size = documents.len()))]
    pub async fn save_batch(
        &self,
        documents: Vec<Document>,
    ) -> Result<BatchResponse, ApplicationError> {
        info!("Attempting to save batch of documents");

        if documents.is_empty() {
            warn!("Received an empty batch request.");
            return Ok(BatchResponse {
                total_processed: 0,
                documents: Vec::new(),
            });
        }

        let total_processed = documents.len();
        if total_processed > MAX_BATCH_SIZE {
            warn!(max = MAX_BATCH_SIZE, "Rejected oversized batch");
            return Err(ApplicationError::InvalidInput(format!(
                "Batch of {} documents exceeds the limit of {}",
                total_processed, MAX_BATCH_SIZE
            )));
        }
        let saved = self.doc_repo.save_batch(documents).await.map_err(|e| {
            error!(count = total_processed, "Failed to save document batch: {}", e);
            e
        })?;
        info!(count = saved.len(), "Document batch saved successfully");

        Ok(BatchResponse {
            total_processed,
            documents: saved,
        })
    }

    /// Looks a document up by id. A blank id can never be assigned, so it
    /// resolves to `None` like any other unknown id.
    #[instrument(skip(self))]
    pub async fn find_document(&self, id: &str) -> Result<Option<Document>, ApplicationError> {
        let Ok(doc_id) = DocumentId::parse(id) else {
            debug!("Blank id requested, nothing to look up");
            return Ok(None);
        };
        self.doc_repo.find_by_id(&doc_id).await
    }

    /// Like [`find_document`](Self::find_document) but turns absence into
    /// [`ApplicationError::NotFound`] and a blank id into a domain error.
    #[instrument(skip(self))]
    pub async fn get_document(&self, id: &str) -> Result<Document, ApplicationError> {
        let doc_id = DocumentId::parse(id)?;
        self.doc_repo.find_by_id(&doc_id).await?.ok_or_else(|| {
            warn!(doc_id = %doc_id, "Document not found");
            ApplicationError::NotFound(doc_id.into())
        })
    }

    #[instrument(skip(self, request), fields(unconstrained = request.is_unconstrained()))]
    pub async fn search_documents(
        &self,
        request: SearchRequest,
    ) -> Result<SearchResponse, ApplicationError> {
        info!("Attempting to search documents");
        let start_time = Instant::now();

        match self.doc_repo.search(&request).await {
            Ok(hits) => {
                let processing_time_ms = start_time.elapsed().as_millis();
                info!(
                    total_hits = hits.len(),
                    time_ms = processing_time_ms,
                    "Search successful"
                );
                Ok(SearchResponse {
                    nb_hits: hits.len(),
                    hits,
                    processing_time_ms,
                })
            }
            Err(e) => {
                error!(
                    time_ms = start_time.elapsed().as_millis(),
                    "Search failed: {}", e
                );
                Err(e)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<StatsResponse, ApplicationError> {
        let total_documents = self.doc_repo.count().await?;
        debug!(total_documents, "Engine stats gathered");
        Ok(StatsResponse { total_documents })
    }
}
