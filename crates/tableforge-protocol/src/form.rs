//! Rendered configuration forms and the patches that edit them.
//!
//! A room's settings are rendered into a flat list of [`Item`]s. When the
//! room owner asks for the form, every item and option carries an `id`;
//! anyone else gets a readonly copy without ids, so there is nothing they
//! could address in a later update.
//!
//! Patch keys follow the ids:
//!
//! ```text
//! "{item_id}"              → new value of a range item (number or numeric string)
//! "{item_id}.{option_id}"  → checked state of a checkbox/radio option (bool)
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ProtocolError;

/// The kind of a rendered form item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A plain description line.
    Desc,
    /// A group of independent on/off options.
    Checkbox,
    /// A group of mutually exclusive options.
    Radio,
    /// A bounded integer value.
    Range,
}

/// One rendered form item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Address for later updates. `None` in readonly renders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub kind: ItemKind,

    pub label: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tips: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checkboxes: Vec<CheckItem>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub radios: Vec<CheckItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
}

impl Item {
    /// Returns `true` if this item can be targeted by an update.
    pub fn is_addressable(&self) -> bool {
        self.id.is_some()
    }
}

/// A single checkbox or radio option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tips: String,
    pub checked: bool,
}

/// The state of a numeric range item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: i64,
    pub max: i64,
    pub value: i64,
    #[serde(default)]
    pub min_label: String,
    #[serde(default)]
    pub max_label: String,
    /// Extra labels for specific values (e.g. `3 → "classic"`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub value_labels: BTreeMap<i64, String>,
}

// ---------------------------------------------------------------------------
// ConfigPatch
// ---------------------------------------------------------------------------

/// A set of updates keyed by the ids issued in an owner render.
///
/// Values are kept as raw JSON so the transport can forward the request
/// body untouched; the typed accessors do the lenient parsing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigPatch(pub BTreeMap<String, Value>);

impl ConfigPatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a patch from a JSON object body.
    pub fn from_json(body: &str) -> Result<Self, ProtocolError> {
        let value: Value =
            serde_json::from_str(body).map_err(ProtocolError::InvalidPatch)?;
        match value {
            Value::Object(map) => Ok(Self(map.into_iter().collect())),
            Value::Array(_) => Err(ProtocolError::NotAnObject("array")),
            Value::String(_) => Err(ProtocolError::NotAnObject("string")),
            Value::Number(_) => Err(ProtocolError::NotAnObject("number")),
            Value::Bool(_) => Err(ProtocolError::NotAnObject("bool")),
            Value::Null => Err(ProtocolError::NotAnObject("null")),
        }
    }

    /// Adds an entry, builder style.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Returns the boolean at `key`, if present and a JSON bool.
    pub fn bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// Returns the integer at `key`. Accepts JSON integers and numeric
    /// strings such as `"7"`.
    pub fn int(&self, key: &str) -> Option<i64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
