// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2025 Centrifuge Network Foundation. All rights reserved.
//  https://centrifuge.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! GraphQL indexer client for off-chain protocol state.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Errors raised by indexer queries.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("Indexer request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Indexer query failed: {0}")]
    Query(String),
    #[error("Failed to parse indexer response: {0}")]
    Parsing(String),
}

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

/// Thin GraphQL POST client against the Centrifuge indexer.
#[derive(Debug, Clone)]
pub struct IndexerClient {
    endpoint: String,
    http_client: reqwest::Client,
}

impl IndexerClient {
    /// Creates a new [`IndexerClient`] for the given GraphQL endpoint.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Executes a GraphQL query and deserializes its `data` payload.
    pub async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, IndexerError> {
        let request = GraphQlRequest { query, variables };
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let body: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|e| IndexerError::Parsing(e.to_string()))?;

        if let Some(errors) = body.errors
            && !errors.is_empty()
        {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(IndexerError::Query(messages.join("; ")));
        }

        body.data
            .ok_or_else(|| IndexerError::Parsing("response carried no data".to_string()))
    }
}
