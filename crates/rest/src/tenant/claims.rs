//! Verified credential claims.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The claim set of a verified bearer token.
///
/// Claims are kept as raw JSON so that namespaced claim names chosen by the
/// identity provider need no schema here. A request without a credential
/// carries an empty claim set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Creates an empty claim set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the claim's value if it is a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Returns the raw claim value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// The `sub` claim.
    pub fn subject(&self) -> Option<&str> {
        self.get_str("sub")
    }

    /// The `exp` claim in epoch seconds.
    pub fn expires_at(&self) -> Option<i64> {
        self.0.get("exp").and_then(Value::as_i64)
    }

    /// Returns `true` if no claims are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Claims {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
