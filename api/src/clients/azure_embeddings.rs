use async_trait::async_trait;
use govdesk_engine::{CollaboratorError, EmbeddingProvider};
use serde::Deserialize;
use url::Url;

use crate::config::AzureEmbeddingConfig;

/// Embeddings from an Azure OpenAI deployment.
pub struct AzureOpenAiEmbeddings {
    http: reqwest::Client,
    url: Url,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    #[serde(default)]
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    embedding: Vec<f64>,
}

impl AzureOpenAiEmbeddings {
    pub fn new(http: reqwest::Client, config: &AzureEmbeddingConfig) -> Result<Self, url::ParseError> {
        let mut url = config.endpoint.join(&format!(
            "openai/deployments/{}/embeddings",
            config.deployment
        ))?;
        url.query_pairs_mut()
            .append_pair("api-version", &config.api_version);
        Ok(Self {
            http,
            url,
            api_key: config.api_key.clone(),
        })
    }
}

fn first_embedding(response: EmbeddingsResponse) -> Result<Vec<f64>, CollaboratorError> {
    response
        .data
        .into_iter()
        .next()
        .map(|item| item.embedding)
        .filter(|embedding| !embedding.is_empty())
        .ok_or_else(|| CollaboratorError::Embedding("azure openai returned an empty embedding".into()))
}

#[async_trait]
impl EmbeddingProvider for AzureOpenAiEmbeddings {
    fn name(&self) -> &str {
        "azure-openai"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f64>, CollaboratorError> {
        let response = self
            .http
            .post(self.url.clone())
            .header("api-key", &self.api_key)
            .json(&serde_json::json!({ "input": text }))
            .send()
            .await
            .map_err(|err| CollaboratorError::Embedding(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Embedding(format!(
                "azure openai embedding failed: {status} {body}"
            )));
        }

        let parsed = response
            .json::<EmbeddingsResponse>()
            .await
            .map_err(|err| CollaboratorError::Embedding(err.to_string()))?;
        first_embedding(parsed)
    }
}
