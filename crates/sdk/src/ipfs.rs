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

//! IPFS gateway client for pool and share-class metadata.

use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

/// Errors raised by IPFS metadata fetches.
#[derive(Debug, Error)]
pub enum IpfsError {
    #[error("Invalid IPFS URI: {0}")]
    InvalidUri(String),
    #[error("IPFS request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Failed to parse IPFS document: {0}")]
    Parsing(String),
}

/// Extracts the content hash from an `ipfs://` URI or a bare CID.
pub fn parse_ipfs_hash(uri: &str) -> Result<&str, IpfsError> {
    let hash = uri.strip_prefix("ipfs://").unwrap_or(uri).trim_matches('/');
    if hash.is_empty() || hash.contains('/') || !hash.chars().all(char::is_alphanumeric) {
        return Err(IpfsError::InvalidUri(uri.to_string()));
    }
    Ok(hash)
}

/// Fetches JSON metadata documents from an IPFS HTTP gateway.
#[derive(Debug, Clone)]
pub struct IpfsClient {
    gateway: Url,
    http_client: reqwest::Client,
}

impl IpfsClient {
    /// Creates a new [`IpfsClient`] against the given gateway base URL.
    pub fn new(gateway_url: &str) -> Result<Self, IpfsError> {
        let gateway =
            Url::parse(gateway_url).map_err(|e| IpfsError::InvalidUri(e.to_string()))?;
        Ok(Self {
            gateway,
            http_client: reqwest::Client::new(),
        })
    }

    /// Fetches and deserializes the JSON document behind an `ipfs://` URI or bare CID.
    pub async fn fetch_json<T: DeserializeOwned>(&self, uri: &str) -> Result<T, IpfsError> {
        let hash = parse_ipfs_hash(uri)?;
        let url = self
            .gateway
            .join(&format!("ipfs/{hash}"))
            .map_err(|e| IpfsError::InvalidUri(e.to_string()))?;

        let response = self
            .http_client
            .get(url)
            .send()
            .await?
            .error_for_status()?;
        response
            .json()
            .await
            .map_err(|e| IpfsError::Parsing(e.to_string()))
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("ipfs://QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG")]
    #[case("QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG")]
    #[case("ipfs://QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG/")]
    fn test_parse_ipfs_hash_accepts_uri_forms(#[case] uri: &str) {
        assert_eq!(
            parse_ipfs_hash(uri).unwrap(),
            "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG",
        );
    }

    #[rstest]
    #[case("")]
    #[case("ipfs://")]
    #[case("ipfs://foo/bar")]
    #[case("https://example.org/QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG")]
    fn test_parse_ipfs_hash_rejects_invalid(#[case] uri: &str) {
        assert!(parse_ipfs_hash(uri).is_err());
    }
}
