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

use alloy_primitives::Address;
use centrifuge_model::{PoolId, ShareClassId};
use serde::Deserialize;

use crate::{
    cache_key,
    client::Centrifuge,
    entities::vault::Vault,
    query::{Query, QueryOptions},
};

const POOL_QUERY: &str = r"
query ($poolId: String!) {
  pool(id: $poolId) {
    id
    currency { decimals }
    metadata
    shareClasses { id }
  }
}";

#[derive(Debug, Deserialize)]
struct PoolResponse {
    pool: Option<PoolNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoolNode {
    id: String,
    currency: CurrencyNode,
    metadata: Option<String>,
    share_classes: Vec<ShareClassNode>,
}

#[derive(Debug, Deserialize)]
struct CurrencyNode {
    decimals: u8,
}

#[derive(Debug, Deserialize)]
struct ShareClassNode {
    id: String,
}

/// Indexed state of one pool.
#[derive(Debug, Clone)]
pub struct PoolDetails {
    pub id: PoolId,
    pub currency_decimals: u8,
    pub metadata_uri: Option<String>,
    pub share_class_ids: Vec<ShareClassId>,
}

/// Pool-level metadata document pinned on IPFS.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub asset_class: Option<String>,
    #[serde(default)]
    pub icon_uri: Option<String>,
}

/// Entity for one pool, giving cached access to its indexed state and metadata.
#[derive(Debug, Clone)]
pub struct Pool {
    client: Centrifuge,
    id: PoolId,
}

impl Pool {
    pub(crate) fn new(client: Centrifuge, id: PoolId) -> Self {
        Self { client, id }
    }

    /// The pool's identifier.
    #[must_use]
    pub fn id(&self) -> PoolId {
        self.id
    }

    /// The pool's indexed details.
    ///
    /// Cached across all consumers of this client; concurrent callers share one indexer round
    /// trip.
    #[must_use]
    pub fn details(&self) -> Query<PoolDetails> {
        let client = self.client.clone();
        let id = self.id;
        let options = QueryOptions {
            value_cache_time: client.config().cache.value_cache_time,
        };

        self.client.cache().query(
            Some(cache_key!("pool", id)),
            move || {
                let client = client.clone();
                Box::pin(async_stream::stream! {
                    yield fetch_details(&client, id).await;
                })
            },
            options,
        )
    }

    /// The pool's metadata document, resolved through the indexed metadata URI.
    #[must_use]
    pub fn metadata(&self) -> Query<Option<PoolMetadata>> {
        let client = self.client.clone();
        let details = self.details();
        let options = QueryOptions {
            value_cache_time: client.config().cache.value_cache_time,
        };

        self.client.cache().query(
            Some(cache_key!("pool-metadata", self.id)),
            move || {
                let client = client.clone();
                let details = details.clone();
                Box::pin(async_stream::stream! {
                    yield fetch_metadata(&client, details.clone()).await;
                })
            },
            options,
        )
    }

    /// Entity for a vault of this pool deployed on the given chain.
    #[must_use]
    pub fn vault(&self, chain_id: u64, address: Address, asset: Address) -> Vault {
        Vault::new(self.client.clone(), self.id, chain_id, address, asset)
    }
}

async fn fetch_details(client: &Centrifuge, id: PoolId) -> anyhow::Result<PoolDetails> {
    let response: PoolResponse = client
        .indexer()
        .query(
            POOL_QUERY,
            serde_json::json!({ "poolId": id.to_string() }),
        )
        .await?;
    let node = response
        .pool
        .ok_or_else(|| anyhow::anyhow!("pool {id} not found"))?;

    Ok(PoolDetails {
        id: node.id.parse()?,
        currency_decimals: node.currency.decimals,
        metadata_uri: node.metadata,
        share_class_ids: node
            .share_classes
            .iter()
            .map(|sc| sc.id.parse())
            .collect::<Result<_, _>>()?,
    })
}

async fn fetch_metadata(
    client: &Centrifuge,
    details: Query<PoolDetails>,
) -> anyhow::Result<Option<PoolMetadata>> {
    let details = details.await?;
    let Some(uri) = details.metadata_uri else {
        return Ok(None);
    };
    let metadata = client.ipfs().fetch_json(&uri).await?;
    Ok(Some(metadata))
}
