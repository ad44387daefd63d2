use serde::{Deserialize, Serialize};

use crate::config::State;
use crate::error::{LogsaiError, Result};
use crate::openai::OpenAiEndpoint;
use crate::vector_entry::Embedding;

const SERVICE: &str = "embedding";

/// Converts text into fixed-dimension vectors.
pub trait EmbeddingProvider {
    /// One vector per input, in input order.
    ///
    /// Empty strings are not filtered here; callers drop them first.
    /// Failures are returned as `RemoteService` and never swallowed.
    fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>>;
}

impl<T: EmbeddingProvider + ?Sized> EmbeddingProvider for &T {
    fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        (**self).embed(texts)
    }
}

impl<T: EmbeddingProvider + ?Sized> EmbeddingProvider for Box<T> {
    fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        (**self).embed(texts)
    }
}

pub struct OpenAiEmbeddingClient {
    endpoint: OpenAiEndpoint,
    model: String,
    batch_size: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Embedding,
}

impl OpenAiEmbeddingClient {
    pub fn new(endpoint: OpenAiEndpoint, model: impl Into<String>, batch_size: usize) -> Self {
        Self {
            endpoint,
            model: model.into(),
            batch_size: batch_size.max(1),
        }
    }

    pub fn from_state(endpoint: OpenAiEndpoint, state: &State) -> Self {
        Self::new(endpoint, &state.embedding_model, state.embed_batch_size)
    }

    fn embed_batch(&self, batch: &[String]) -> Result<Vec<Embedding>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: batch,
        };
        let response: EmbeddingResponse = self.endpoint.post_json(SERVICE, "embeddings", &request)?;

        if response.data.len() != batch.len() {
            return Err(LogsaiError::remote(
                SERVICE,
                format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    response.data.len()
                ),
            ));
        }

        let mut data = response.data;
        data.sort_by_key(|item| item.index);
        if data.iter().enumerate().any(|(position, item)| item.index != position) {
            return Err(LogsaiError::remote(
                SERVICE,
                "response indices do not cover the request",
            ));
        }

        Ok(data.into_iter().map(|item| item.embedding).collect())
    }
}

impl EmbeddingProvider for OpenAiEmbeddingClient {
    fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            embeddings.extend(self.embed_batch(batch)?);
        }
        tracing::debug!(
            model = %self.model,
            count = embeddings.len(),
            "embedded texts"
        );
        Ok(embeddings)
    }
}
