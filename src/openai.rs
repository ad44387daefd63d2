//! Blocking transport shared by the embedding and chat clients.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::State;
use crate::error::{LogsaiError, Result};

/// An OpenAI-compatible API root plus the credentials to call it.
#[derive(Clone)]
pub struct OpenAiEndpoint {
    client: Client,
    api_base: String,
    api_key: String,
}

impl OpenAiEndpoint {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| LogsaiError::remote("http client", err.to_string()))?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn from_state(state: &State) -> anyhow::Result<Self> {
        let api_key = state.require_api_key()?;
        Ok(Self::new(&state.api_base, api_key, state.request_timeout)?)
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// POSTs `body` as JSON to `{api_base}/{path}` and decodes a successful reply.
    /// Transport failures, non-2xx statuses and undecodable bodies all map to `RemoteService`.
    pub fn post_json<B, T>(&self, service: &'static str, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.api_base, path);
        tracing::debug!(%url, service, "sending request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .map_err(|err| LogsaiError::remote(service, err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().unwrap_or_default();
            return Err(LogsaiError::remote(
                service,
                format!("status {status}: {error_text}"),
            ));
        }

        response
            .json::<T>()
            .map_err(|err| LogsaiError::remote(service, format!("malformed response: {err}")))
    }
}
