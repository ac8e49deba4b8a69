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

//! Transaction pipeline: ordered status streams, batching, and bridge fee estimation.

pub mod context;
pub mod error;
pub mod fees;
pub mod pipeline;
pub mod status;

pub use context::{BatchedTransactionDescriptor, TransactionContext, WrappedCall};
pub use error::TransactionError;
pub use fees::{BridgeFeeEstimator, estimate_batch_bridge_fee};
pub use pipeline::TransactionPipeline;
pub use status::OperationStatus;
