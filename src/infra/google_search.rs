use crate::app::ports::{SearchProvider, SearchRequest};
use crate::error::ProviderError;
use crate::infra::http_client::read_json;
use crate::types::SearchHit;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

/// Google Custom Search JSON API.
pub struct GoogleSearchClient {
    client: Client,
    endpoint: String,
    api_key: String,
    engine_id: String,
}

impl GoogleSearchClient {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: impl Into<String>, engine_id: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            engine_id: engine_id.into(),
        }
    }
}

#[async_trait]
impl SearchProvider for GoogleSearchClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, ProviderError> {
        let num = request.page_size.to_string();
        let mut params = vec![
            ("key", self.api_key.as_str()),
            ("cx", self.engine_id.as_str()),
            ("q", request.query.as_str()),
            ("num", num.as_str()),
            ("dateRestrict", request.date_restriction.as_str()),
        ];
        if let Some(language) = request.language.as_deref() {
            params.push(("lr", language));
        }

        let response = self.client.get(&self.endpoint).query(&params).send().await?;
        let body: SearchResponse = read_json(response).await?;
        debug!("Search '{}' returned {} items", request.query, body.items.len());

        Ok(body
            .items
            .into_iter()
            .map(|item| SearchHit {
                title: item.title,
                url: item.link,
                snippet: item.snippet,
            })
            .collect())
    }
}
