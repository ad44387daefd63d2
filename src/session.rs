use std::collections::HashMap;

use serde::Serialize;

use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::index::VectorIndex;
use crate::upload::split_lines;
use crate::vector_entry::{Embedding, LogLine};

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct QueryHistoryRecord {
    pub query: String,
    pub response: String,
}

/// Everything one user accumulates: uploaded lines, their index, cached
/// query embeddings and the question/answer history.
pub struct Session {
    logs: Vec<LogLine>,
    index: VectorIndex,
    query_embeddings: HashMap<String, Embedding>,
    history: Vec<QueryHistoryRecord>,
}

impl Session {
    pub fn new(dimension: usize) -> Self {
        Self {
            logs: Vec::new(),
            index: VectorIndex::new(dimension),
            query_embeddings: HashMap::new(),
            history: Vec::new(),
        }
    }

    /// Adds a document's lines to the session and indexes the non-blank ones.
    ///
    /// Nothing is stored unless embedding and insertion both succeed. Blank lines
    /// stay in [`Session::logs`] for frequency counting but are never embedded.
    pub fn ingest<E>(&mut self, text: &str, embedder: &E) -> Result<usize>
    where
        E: EmbeddingProvider + ?Sized,
    {
        let lines = split_lines(text);
        let indexable: Vec<String> = lines
            .iter()
            .filter(|line| !line.trim().is_empty())
            .cloned()
            .collect();

        let vectors = embedder.embed(&indexable)?;
        self.index.insert(vectors, indexable)?;

        let offset = self.logs.len();
        let added = lines.len();
        self.logs.extend(
            lines
                .into_iter()
                .enumerate()
                .map(|(i, content)| LogLine {
                    index: offset + i,
                    content,
                }),
        );

        tracing::debug!(lines = added, indexed = self.index.len(), "ingested document");
        Ok(added)
    }

    pub fn logs(&self) -> &[LogLine] {
        &self.logs
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn history(&self) -> &[QueryHistoryRecord] {
        &self.history
    }

    pub fn cached_query_embedding(&self, query: &str) -> Option<&Embedding> {
        self.query_embeddings.get(query)
    }

    pub fn cache_query_embedding(&mut self, query: &str, embedding: Embedding) {
        self.query_embeddings.insert(query.to_string(), embedding);
    }

    pub fn record(&mut self, query: impl Into<String>, response: impl Into<String>) {
        self.history.push(QueryHistoryRecord {
            query: query.into(),
            response: response.into(),
        });
    }

    /// Ends the session: drops every line, vector, cached embedding and record.
    pub fn reset(&mut self) {
        *self = Session::new(self.index.dimension());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LogsaiError;

    struct LengthEmbedder;

    impl EmbeddingProvider for LengthEmbedder {
        fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32, 0.0]).collect())
        }
    }

    struct WrongDimension;

    impl EmbeddingProvider for WrongDimension {
        fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
            Ok(texts.iter().map(|_| vec![1.0]).collect())
        }
    }

    #[test]
    fn blank_lines_are_kept_but_not_indexed() {
        let mut session = Session::new(2);
        let added = session.ingest("first\n\nsecond", &LengthEmbedder).unwrap();

        assert_eq!(added, 3);
        assert_eq!(session.logs()[1], LogLine { index: 1, content: String::new() });
        let texts: Vec<&str> = session.index().entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn line_positions_continue_across_uploads() {
        let mut session = Session::new(2);
        session.ingest("a\nb", &LengthEmbedder).unwrap();
        session.ingest("c", &LengthEmbedder).unwrap();

        assert_eq!(session.logs()[2].index, 2);
        assert_eq!(session.index().entries()[2].id, 2);
    }

    #[test]
    fn failed_ingest_stores_nothing() {
        let mut session = Session::new(2);
        let err = session.ingest("a\nb", &WrongDimension).unwrap_err();

        assert!(matches!(err, LogsaiError::DimensionMismatch { .. }));
        assert!(session.logs().is_empty());
        assert!(session.index().is_empty());
    }

    #[test]
    fn reset_clears_everything() {
        let mut session = Session::new(2);
        session.ingest("a", &LengthEmbedder).unwrap();
        session.cache_query_embedding("q", vec![0.0, 0.0]);
        session.record("q", "answer");

        session.reset();

        assert!(session.logs().is_empty());
        assert!(session.index().is_empty());
        assert!(session.history().is_empty());
        assert!(session.cached_query_embedding("q").is_none());
        assert_eq!(session.index().dimension(), 2);
    }
}
