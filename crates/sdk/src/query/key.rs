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

//! Composite cache keys with canonical serialization.
//!
//! A cache key is an ordered sequence of primitive scalars. Embedded plain objects are held in
//! sorted maps, so two keys built from the same filter object hash identically regardless of
//! property insertion order.

use std::collections::BTreeMap;

use alloy_primitives::Address;
use centrifuge_model::{AssetId, PoolId, ShareClassId};

/// A single scalar component of a [`CacheKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    /// Absent value (`undefined`-style placeholder that still occupies its position).
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Unsigned integer scalar.
    U64(u64),
    /// Signed integer scalar.
    I64(i64),
    /// String scalar.
    Str(String),
    /// Plain object scalar; sorted map so serialization is insertion-order independent.
    Map(BTreeMap<String, KeyValue>),
}

impl KeyValue {
    fn write_canonical(&self, out: &mut String) {
        match self {
            Self::Null => out.push_str("null"),
            Self::Bool(value) => out.push_str(if *value { "true" } else { "false" }),
            Self::U64(value) => out.push_str(&value.to_string()),
            Self::I64(value) => out.push_str(&value.to_string()),
            Self::Str(value) => {
                let escaped = serde_json::to_string(value)
                    .expect("string serialization is infallible");
                out.push_str(&escaped);
            }
            Self::Map(map) => {
                out.push('{');
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    let escaped =
                        serde_json::to_string(key).expect("string serialization is infallible");
                    out.push_str(&escaped);
                    out.push(':');
                    value.write_canonical(out);
                }
                out.push('}');
            }
        }
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for KeyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<u64> for KeyValue {
    fn from(value: u64) -> Self {
        Self::U64(value)
    }
}

impl From<u32> for KeyValue {
    fn from(value: u32) -> Self {
        Self::U64(u64::from(value))
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        Self::I64(value)
    }
}

impl From<Address> for KeyValue {
    fn from(value: Address) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<PoolId> for KeyValue {
    fn from(value: PoolId) -> Self {
        Self::U64(value.raw())
    }
}

impl From<ShareClassId> for KeyValue {
    fn from(value: ShareClassId) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<AssetId> for KeyValue {
    fn from(value: AssetId) -> Self {
        Self::Str(value.to_string())
    }
}

impl<T: Into<KeyValue>> From<Option<T>> for KeyValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for KeyValue {
    /// Ingests a JSON scalar or plain object as a key component.
    ///
    /// Arrays are not valid key scalars and flatten to their canonical JSON string; non-integer
    /// numbers canonicalize via their display form.
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Self::U64(u)
                } else if let Some(i) = n.as_i64() {
                    Self::I64(i)
                } else {
                    Self::Str(n.to_string())
                }
            }
            serde_json::Value::String(s) => Self::Str(s),
            serde_json::Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
            other @ serde_json::Value::Array(_) => Self::Str(other.to_string()),
        }
    }
}

/// An ordered sequence of scalars uniquely identifying a cached computation.
///
/// Constructed fresh on every call site invocation and never mutated; used only for lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CacheKey(pub Vec<KeyValue>);

impl CacheKey {
    /// Creates a new [`CacheKey`] from its components.
    #[must_use]
    pub fn new(components: Vec<KeyValue>) -> Self {
        Self(components)
    }

    /// Returns the canonical string form of the key, stable across semantically equal keys.
    #[must_use]
    pub fn canonical(&self) -> String {
        let mut out = String::with_capacity(16 * self.0.len());
        out.push('[');
        for (i, component) in self.0.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            component.write_canonical(&mut out);
        }
        out.push(']');
        out
    }
}

impl<T: Into<KeyValue>> FromIterator<T> for CacheKey {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Builds a [`CacheKey`] from a comma-separated list of scalar components.
#[macro_export]
macro_rules! cache_key {
    ($($component:expr),* $(,)?) => {
        $crate::query::key::CacheKey::new(vec![$($crate::query::key::KeyValue::from($component)),*])
    };
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_object_key_order_is_irrelevant() {
        let a = cache_key!(
            "a",
            KeyValue::from(serde_json::json!({"x": 1, "y": 2}))
        );
        let b = cache_key!(
            "a",
            KeyValue::from(serde_json::json!({"y": 2, "x": 1}))
        );
        assert_eq!(a.canonical(), b.canonical());
        assert_eq!(a, b);
    }

    #[rstest]
    fn test_component_order_matters() {
        assert_ne!(
            cache_key!("a", 1u64).canonical(),
            cache_key!(1u64, "a").canonical()
        );
    }

    #[rstest]
    fn test_null_occupies_position() {
        let some: Option<u64> = Some(1);
        let none: Option<u64> = None;
        assert_ne!(
            cache_key!("pool", some).canonical(),
            cache_key!("pool", none).canonical()
        );
        assert_eq!(cache_key!("pool", none).canonical(), r#"["pool",null]"#);
    }

    #[rstest]
    fn test_canonical_form() {
        let key = cache_key!(
            "balance",
            42u64,
            true,
            KeyValue::from(serde_json::json!({"b": 2, "a": 1}))
        );
        assert_eq!(key.canonical(), r#"["balance",42,true,{"a":1,"b":2}]"#);
    }

    #[rstest]
    fn test_string_escaping() {
        let key = cache_key!(r#"quo"te"#);
        assert_eq!(key.canonical(), r#"["quo\"te"]"#);
    }

    #[rstest]
    fn test_nested_maps_sorted() {
        let a = KeyValue::from(serde_json::json!({"outer": {"z": 1, "a": 2}}));
        let b = KeyValue::from(serde_json::json!({"outer": {"a": 2, "z": 1}}));
        assert_eq!(
            CacheKey::new(vec![a]).canonical(),
            CacheKey::new(vec![b]).canonical()
        );
    }

    proptest! {
        #[test]
        fn prop_map_insertion_order_never_changes_canonical_form(
            entries in proptest::collection::btree_map("[a-z]{1,8}", 0u64..1000, 1..8),
        ) {
            let forward: BTreeMap<String, KeyValue> = entries
                .iter()
                .map(|(key, value)| (key.clone(), KeyValue::U64(*value)))
                .collect();
            let reverse: BTreeMap<String, KeyValue> = entries
                .iter()
                .rev()
                .map(|(key, value)| (key.clone(), KeyValue::U64(*value)))
                .collect();
            let a = CacheKey::new(vec![KeyValue::Map(forward)]);
            let b = CacheKey::new(vec![KeyValue::Map(reverse)]);
            prop_assert_eq!(a.canonical(), b.canonical());
        }
    }
}
