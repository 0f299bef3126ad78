//! The `{type, properties}` document

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value as Json};

use crate::error::{Result, SerializeError};

/// Default pretty-print indent, in spaces
pub const DEFAULT_INDENT: usize = 4;

/// Serialized form of one object
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    /// Registered type name
    #[serde(rename = "type", default)]
    pub type_name: String,
    /// Property values keyed by property name
    pub properties: Map<String, Json>,
}

impl Document {
    /// Create an empty document for a type
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            properties: Map::new(),
        }
    }

    /// Add a property
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Json>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Get a property value
    pub fn get(&self, name: &str) -> Option<&Json> {
        self.properties.get(name)
    }

    /// Check for a property
    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Read a document out of a JSON tree.
    ///
    /// Fails unless `json` holds a `properties` object. A missing `type`
    /// reads as the empty name.
    pub fn from_json(json: &Json) -> Result<Self> {
        let properties = properties_of(json)?;
        let type_name = json.get("type").and_then(Json::as_str).unwrap_or_default();
        Ok(Self {
            type_name: type_name.to_string(),
            properties: properties.clone(),
        })
    }

    /// Convert into a JSON tree
    pub fn into_json(self) -> Json {
        let mut object = Map::new();
        object.insert("type".to_string(), Json::String(self.type_name));
        object.insert("properties".to_string(), Json::Object(self.properties));
        Json::Object(object)
    }

    /// Pretty-print with `indent` spaces per level
    pub fn to_string_pretty(&self, indent: usize) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.to_vec_pretty(indent)?).into_owned())
    }

    /// Pretty-print to bytes with `indent` spaces per level
    pub fn to_vec_pretty(&self, indent: usize) -> Result<Vec<u8>> {
        let indent = vec![b' '; indent];
        let mut bytes = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, PrettyFormatter::with_indent(&indent));
        self.serialize(&mut serializer)?;
        Ok(bytes)
    }
}

impl FromStr for Document {
    type Err = SerializeError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

/// The `properties` object of a document-shaped JSON tree
pub(crate) fn properties_of(json: &Json) -> Result<&Map<String, Json>> {
    json.get("properties")
        .and_then(Json::as_object)
        .ok_or_else(|| SerializeError::MalformedDocument("missing 'properties' object".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_names() {
        let doc = Document::new("game::Player").with_property("health", 100);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json, json!({ "type": "game::Player", "properties": { "health": 100 } }));
        assert_eq!(doc.clone().into_json(), json);
    }

    #[test]
    fn test_from_json_requires_properties() {
        assert!(matches!(
            Document::from_json(&json!({ "type": "game::Player" })),
            Err(SerializeError::MalformedDocument(_))
        ));
        assert!(Document::from_json(&json!({ "properties": [] })).is_err());

        let doc = Document::from_json(&json!({ "properties": { "a": 1 } })).unwrap();
        assert_eq!(doc.type_name, "");
        assert_eq!(doc.get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_pretty_indent() {
        let doc = Document::new("T").with_property("x", true);
        let text = doc.to_string_pretty(4).unwrap();
        assert!(text.contains("\n    \"properties\": {\n        \"x\": true"));

        let parsed: Document = text.parse().unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!("{ not json".parse::<Document>(), Err(SerializeError::Parse(_))));
        assert!(matches!(r#"{ "type": "T" }"#.parse::<Document>(), Err(SerializeError::Parse(_))));
    }
}
