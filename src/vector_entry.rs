use crate::config::Number;
use serde::Serialize;

pub type Embedding = Vec<Number>;

/// One line of an uploaded document, in order of appearance.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub index: usize,
    pub content: String,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub id: u64,
    pub text: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SearchResult {
    pub id: u64,
    pub text: String,
    /// Squared Euclidean distance to the query.
    pub distance: Number,
}
