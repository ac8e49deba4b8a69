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

use thiserror::Error;

/// Represents errors that can occur when interacting with a chain RPC client.
#[derive(Debug, Error)]
pub enum RpcClientError {
    /// Occurs when the RPC client encounters a transport-level error, such as connection failures.
    #[error("Client error: {0}")]
    ClientError(String),
    /// Occurs when input parameters to an RPC call are invalid.
    #[error("Invalid RPC parameters: {0}")]
    InvalidParameters(String),
    /// Occurs when decoding contract ABI data fails.
    #[error("Decoding error: {0}")]
    AbiDecodingError(String),
    /// Occurs when parsing an RPC response fails.
    #[error("Parsing error: {0}")]
    ResponseParsingError(String),
    /// Occurs when the node or wallet returns a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    RpcError {
        /// The JSON-RPC error code.
        code: i64,
        /// The JSON-RPC error message.
        message: String,
    },
    /// Occurs when the connected wallet explicitly rejects a request.
    #[error("Rejected by wallet: {0}")]
    Rejected(String),
    /// Occurs when a request targets a chain the client has no endpoint for.
    #[error("Unsupported chain id {0}")]
    UnsupportedChain(u64),
    /// Occurs when a requested capability is not supported by the wallet or node.
    #[error("Capability not supported: {0}")]
    UnsupportedCapability(String),
}
