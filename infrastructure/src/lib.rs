// Module declarations
pub mod persistence;
pub mod search;

// Re-export the storage implementations
pub use persistence::{DocumentStore, InMemoryDocumentRepository};
