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

//! Reactive client SDK for the [Centrifuge](https://centrifuge.io) protocol.
//!
//! The `centrifuge-sdk` crate provides the reactive core every domain entity builds on:
//!
//! - A query cache that deduplicates concurrent reads, replays buffered values to late
//!   subscribers, and tears entries down on a reset delay after the last subscriber detaches.
//! - An event multiplexer maintaining at most one log watcher per chain and fanning decoded
//!   log batches out to any number of client-side filters, driving event-based invalidation of
//!   cached queries.
//! - A transaction pipeline turning multi-step signing and submission flows into ordered,
//!   correlatable status streams, with batching and cross-chain bridge fee estimation.
//!
//! On top of the core sit thin entity types ([`entities::Pool`], [`entities::Vault`]) and the
//! supporting clients for chain JSON-RPC, the GraphQL indexer, and IPFS metadata.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod client;
pub mod config;
pub mod contracts;
pub mod entities;
pub mod events;
pub mod indexer;
pub mod ipfs;
pub mod query;
pub mod rpc;
pub mod tx;

pub use client::Centrifuge;
pub use config::{CacheConfig, Environment, SdkConfig};
pub use query::{CacheKey, Query, QueryCache, QueryError, QueryOptions};
pub use tx::{OperationStatus, TransactionError, TransactionPipeline};
