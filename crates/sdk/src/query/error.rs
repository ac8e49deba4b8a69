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

use std::sync::Arc;

use thiserror::Error;

/// Represents errors surfaced by cached query streams.
///
/// Errors are shared by reference so one upstream failure can fan out to every subscriber of a
/// cache entry.
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    /// Occurs when the query's underlying computation fails; propagates to all current
    /// subscribers and discards the buffered value.
    #[error("Query computation failed: {0}")]
    Factory(Arc<anyhow::Error>),
    /// Occurs when a one-shot await completes without the stream ever emitting a value.
    #[error("Query stream completed without emitting a value")]
    Completed,
    /// Internal marker meaning "buffered value expired, recompute".
    ///
    /// Raised and caught entirely inside the cache's resubscribe path so the retry logic can
    /// distinguish "needs recompute" from a genuine upstream failure; never surfaced to
    /// application code.
    #[error("Cached value expired")]
    StaleValue,
}

impl QueryError {
    /// Wraps an upstream computation failure.
    #[must_use]
    pub fn factory(error: anyhow::Error) -> Self {
        Self::Factory(Arc::new(error))
    }
}
