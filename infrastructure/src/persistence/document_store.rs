use crate::search::filters;
use application::SearchRequest;
use chrono::Utc;
use domain::{Document, DocumentId};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::{debug, trace};

/// Synchronous in-memory document store.
///
/// Owns every stored document plus the counter used to mint ids. Callers
/// needing shared access wrap the whole store in one lock so that minting
/// and the update merge happen atomically.
#[derive(Debug)]
pub struct DocumentStore {
    documents: HashMap<DocumentId, Document>,
    next_id: u64,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore {
    pub fn new() -> Self {
        Self {
            documents: HashMap::new(),
            next_id: 1,
        }
    }

    /// Upserts `document` and returns the stored copy.
    ///
    /// Without an id (or with a blank one) the document is inserted under
    /// the smallest free numeric id at or above the counter, and `created`
    /// defaults to now. With an unknown id it is inserted as given. With a
    /// known id it replaces the stored record, but `created` always comes
    /// from the record being replaced, even when that value is absent.
    pub fn save(&mut self, mut document: Document) -> Document {
        let id = match document.assigned_id() {
            Some(id) => id.clone(),
            None => {
                let id = self.mint_id();
                document.created.get_or_insert_with(Utc::now);
                debug!(doc_id = %id, "Minted id for new document");
                id
            }
        };
        document.id = Some(id.clone());

        let stored = match self.documents.entry(id) {
            Entry::Occupied(mut entry) => {
                document.created = entry.get().created;
                debug!(doc_id = %entry.key(), "Replacing stored document, keeping creation time");
                entry.insert(document);
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                debug!(doc_id = %entry.key(), "Inserting new document");
                entry.insert(document)
            }
        };
        stored.clone()
    }

    /// Every stored document matching `request`, in map order.
    pub fn search(&self, request: &SearchRequest) -> Vec<Document> {
        let hits: Vec<Document> = self
            .documents
            .values()
            .filter(|doc| filters::matches(doc, request))
            .cloned()
            .collect();
        trace!(total = self.documents.len(), hits = hits.len(), "Searched document store");
        hits
    }

    pub fn find_by_id(&self, id: &DocumentId) -> Option<Document> {
        self.documents.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Smallest numeric id at or above the counter that is not already a key.
    fn mint_id(&mut self) -> DocumentId {
        loop {
            let candidate = DocumentId::new(self.next_id.to_string());
            self.next_id += 1;
            if !self.documents.contains_key(&candidate) {
                return candidate;
            }
            trace!(doc_id = %candidate, "Id already taken, skipping");
        }
    }
}
