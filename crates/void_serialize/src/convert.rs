//! Conversion between reflected [`Value`]s and JSON
//!
//! Writing is total except for values with no JSON form (`Opaque`,
//! non-finite floats, and arrays containing either); those return `None`
//! and the caller omits the property.
//!
//! Reading is guided by a template: the property's current value says which
//! kind the JSON node must convert into. A `Null` template means "anything",
//! so the kind is inferred from the JSON node instead.

use serde_json::{Map, Number, Value as Json};
use void_core::{ObjectValue, Value};

/// Convert a reflected value into JSON
pub fn to_json(value: &Value) -> Option<Json> {
    match value {
        Value::Null => Some(Json::Null),
        Value::Bool(v) => Some(Json::Bool(*v)),
        Value::Int(v) => Some(Json::Number((*v).into())),
        Value::UInt(v) => Some(Json::Number((*v).into())),
        Value::Float(v) => Number::from_f64(*v).map(Json::Number),
        Value::String(v) => Some(Json::String(v.clone())),
        Value::Array(items) => items.iter().map(to_json).collect::<Option<Vec<_>>>().map(Json::Array),
        Value::Object(object) => Some(object_to_json(object)),
        Value::Opaque(_) => None,
    }
}

/// Embedded objects are written document-shaped; unconvertible nested
/// properties are left out
fn object_to_json(object: &ObjectValue) -> Json {
    let properties: Map<String, Json> = object
        .properties
        .iter()
        .filter_map(|(name, value)| Some((name.clone(), to_json(value)?)))
        .collect();

    let mut document = Map::new();
    document.insert("type".to_string(), Json::String(object.type_name.clone()));
    document.insert("properties".to_string(), Json::Object(properties));
    Json::Object(document)
}

/// Convert a JSON node into the kind of `template`
pub fn from_json(json: &Json, template: &Value) -> Option<Value> {
    if json.is_null() {
        return Some(Value::Null);
    }

    match template {
        Value::Null => Some(infer(json)),
        Value::Bool(_) => json.as_bool().map(Value::Bool),
        Value::Int(_) => json
            .as_i64()
            .or_else(|| integral(json, -INTEGER_BOUND..INTEGER_BOUND).map(|v| v as i64))
            .map(Value::Int),
        Value::UInt(_) => json
            .as_u64()
            .or_else(|| integral(json, 0.0..2.0 * INTEGER_BOUND).map(|v| v as u64))
            .map(Value::UInt),
        Value::Float(_) => json.as_f64().map(Value::Float),
        Value::String(_) => json.as_str().map(|s| Value::String(s.to_string())),
        Value::Array(current) => {
            let element = current.first().cloned().unwrap_or_default();
            json.as_array()?
                .iter()
                .map(|item| from_json(item, &element))
                .collect::<Option<Vec<_>>>()
                .map(Value::Array)
        }
        Value::Object(current) => object_from_json(json, current).map(Value::Object),
        Value::Opaque(_) => None,
    }
}

/// 2^63
const INTEGER_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// A float with no fractional part, within `range`
fn integral(json: &Json, range: std::ops::Range<f64>) -> Option<f64> {
    json.as_f64().filter(|v| v.fract() == 0.0 && range.contains(v))
}

/// Nested documents convert property by property against the current
/// nested values; anything not convertible is dropped so the nested
/// instance keeps it
fn object_from_json(json: &Json, current: &ObjectValue) -> Option<ObjectValue> {
    let properties = json.get("properties")?.as_object()?;

    let mut object = ObjectValue::new(current.type_name.clone());
    for (name, template) in &current.properties {
        let Some(node) = properties.get(name) else {
            continue;
        };
        match from_json(node, template) {
            Some(value) => {
                object.properties.insert(name.clone(), value);
            }
            None => log::debug!("nested property '{}.{}' not convertible", current.type_name, name),
        }
    }
    Some(object)
}

/// Read a JSON node without a template
pub fn infer(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(v) => Value::Bool(*v),
        Json::Number(n) => {
            if let Some(v) = n.as_i64() {
                Value::Int(v)
            } else if let Some(v) = n.as_u64() {
                Value::UInt(v)
            } else {
                Value::Float(n.as_f64().unwrap_or_default())
            }
        }
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => Value::Array(items.iter().map(infer).collect()),
        Json::Object(map) => {
            let (type_name, properties) = match map.get("properties").and_then(Json::as_object) {
                Some(properties) => (map.get("type").and_then(Json::as_str).unwrap_or_default(), properties),
                None => ("", map),
            };
            let mut object = ObjectValue::new(type_name);
            for (name, node) in properties {
                object.properties.insert(name.clone(), infer(node));
            }
            Value::Object(object)
        }
    }
}
