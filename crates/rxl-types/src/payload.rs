use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Content carried by a block.
///
/// Records are string-to-string field maps. A `BTreeMap` keeps keys sorted,
/// which makes the JSON encoding of a record canonical: the same fields
/// always serialize to the same bytes regardless of insertion order.
///
/// On disk a payload is either a JSON object (record) or a JSON string
/// (the genesis sentinel), hence `untagged`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    /// Free text. Only the genesis block uses this.
    Text(String),
    /// Field name to value.
    Record(BTreeMap<String, String>),
}

impl Payload {
    /// Payload of the genesis block.
    pub const GENESIS_TEXT: &'static str = "Genesis Block";

    /// The genesis sentinel payload.
    pub fn genesis() -> Self {
        Self::Text(Self::GENESIS_TEXT.to_string())
    }

    /// Build a record from field/value pairs.
    pub fn record<K, V, I>(fields: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Record(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Returns `true` for the genesis sentinel.
    pub fn is_genesis(&self) -> bool {
        matches!(self, Self::Text(t) if t == Self::GENESIS_TEXT)
    }

    /// The record fields, if this is a record.
    pub fn as_record(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Record(fields) => Some(fields),
            Self::Text(_) => None,
        }
    }

    /// Look up one record field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.as_record()
            .and_then(|fields| fields.get(name))
            .map(String::as_str)
    }
}

impl From<BTreeMap<String, String>> for Payload {
    fn from(fields: BTreeMap<String, String>) -> Self {
        Self::Record(fields)
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Record(fields) => {
                let mut first = true;
                for (k, v) in fields {
                    if !first {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}={v}")?;
                    first = false;
                }
                Ok(())
            }
        }
    }
}
