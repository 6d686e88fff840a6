//! Result types for query execution

use crate::document::Document;

/// Result of query execution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Matching documents, ordered by id
    pub documents: Vec<Document>,
    /// Ids surviving the intersection, before the primary fetch
    pub candidate_count: usize,
    /// Candidates whose primary document no longer exists
    pub stale_skipped: usize,
}

impl QueryResult {
    /// Creates an empty result
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if no documents matched
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Returns the number of results
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns the ids of the matching documents
    pub fn ids(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.id.as_str()).collect()
    }

    /// Returns an iterator over the documents
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    /// Consumes the result, keeping the documents
    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }
}
