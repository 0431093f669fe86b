pub mod document_store;
pub mod in_memory_repository;

pub use document_store::DocumentStore;
pub use in_memory_repository::InMemoryDocumentRepository;
