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

//! Domain model for the [Centrifuge](https://centrifuge.io) client SDK.
//!
//! The `centrifuge-model` crate holds the value objects shared by every layer of the SDK:
//!
//! - Chain definitions for the EVM networks the protocol is deployed on.
//! - Protocol identifiers (pools, share classes, assets, investor accounts).
//! - Cross-chain message payloads and their batching keys.
//! - Fixed-point decimal value types for on-chain amounts, prices and rates.
//!
//! These are deliberately plain data types with no I/O: the reactive query and transaction
//! machinery in `centrifuge-sdk` consumes them as opaque values.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod chain;
pub mod identifiers;
pub mod message;
pub mod types;

pub use chain::{Chain, Network, SharedChain};
pub use identifiers::{AssetId, InvestorAccount, PoolId, ShareClassId};
pub use message::CrossChainMessage;
pub use types::decimal::FixedDecimal;
