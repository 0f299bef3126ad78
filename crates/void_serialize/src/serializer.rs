//! Reflection-driven JSON serializer
//!
//! [`JsonSerializer`] walks an object's registered properties; it needs no
//! per-type code. Both directions are best effort per property:
//! - serialize omits properties whose value has no JSON form
//! - deserialize skips properties that fail to convert or to set,
//!   ignores document entries the type does not declare, and leaves
//!   declared properties missing from the document untouched
//!
//! The only structural requirement on input is a `properties` object.
//! Embedded structs are walked property by property, and reports name
//! their properties by dotted path (`stats.armor`).

use std::any::Any;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value as Json};
use void_core::{TypeInfo, TypeRegistry};
use void_object::{AnyObjectPtr, Object, ObjectManager, ReflectObject};

use crate::convert;
use crate::document::{properties_of, Document, DEFAULT_INDENT};
use crate::error::{Result, SerializeError};
use crate::file;

/// Serializer configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    /// Spaces per indentation level in files
    pub indent: usize,
    /// Refuse documents whose `type` differs from the target's type
    pub reject_type_mismatch: bool,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            indent: DEFAULT_INDENT,
            reject_type_mismatch: false,
        }
    }
}

impl SerializerConfig {
    /// Set indentation
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Set type mismatch policy
    pub fn with_reject_type_mismatch(mut self, reject: bool) -> Self {
        self.reject_type_mismatch = reject;
        self
    }
}

/// What [`JsonSerializer::serialize_with_report`] left out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializeReport {
    /// Properties with no JSON representation
    pub omitted: Vec<String>,
}

/// Per-property outcome of a deserialize.
///
/// Properties of embedded structs are listed individually by dotted path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeserializeReport {
    /// Written onto the object
    pub applied: Vec<String>,
    /// Declared and present, but not convertible or not settable
    pub skipped: Vec<String>,
    /// Present in the document, not declared on the type
    pub ignored: Vec<String>,
}

impl DeserializeReport {
    /// Whether every declared property found in the document was applied
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Serializer over a type registry
pub struct JsonSerializer<'a> {
    registry: &'a TypeRegistry,
    config: SerializerConfig,
}

impl<'a> JsonSerializer<'a> {
    /// Create a serializer with default configuration
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self {
            registry,
            config: SerializerConfig::default(),
        }
    }

    /// Set configuration
    pub fn with_config(mut self, config: SerializerConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration
    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    /// The registry types are resolved in
    pub fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }

    fn type_info(&self, object: &dyn Object) -> Result<&'a TypeInfo> {
        self.registry
            .type_of(object.as_any())
            .ok_or_else(|| SerializeError::NotRegistered(object.object_type_name().to_string()))
    }

    /// Serialize an object into a document
    pub fn serialize(&self, object: &dyn Object) -> Result<Document> {
        self.serialize_with_report(object).map(|(document, _)| document)
    }

    /// Serialize, also listing the properties that were omitted
    pub fn serialize_with_report(&self, object: &dyn Object) -> Result<(Document, SerializeReport)> {
        let info = self.type_info(object)?;
        let mut document = Document::new(info.name());
        let mut report = SerializeReport::default();
        document.properties = write_properties(info, object.as_any(), "", &mut report);
        Ok((document, report))
    }

    /// Deserialize a JSON document into `object`.
    ///
    /// Returns `false` only if the document is structurally unusable (no
    /// `properties` object) or the object's type is not registered.
    /// Per-property failures are logged but still return `true`.
    pub fn deserialize(&self, json: &Json, object: &mut dyn Object) -> bool {
        match self.deserialize_with_report(json, object) {
            Ok(report) => {
                if !report.is_complete() {
                    log::debug!("deserialize skipped properties {:?}", report.skipped);
                }
                true
            }
            Err(err) => {
                log::warn!("deserialize failed: {}", err);
                false
            }
        }
    }

    /// Deserialize, reporting what happened to each property
    pub fn deserialize_with_report(&self, json: &Json, object: &mut dyn Object) -> Result<DeserializeReport> {
        let properties = properties_of(json)?;
        let type_name = json.get("type").and_then(Json::as_str);
        self.apply(type_name, properties, object)
    }

    /// Apply an already parsed document
    pub fn apply_document(&self, document: &Document, object: &mut dyn Object) -> Result<DeserializeReport> {
        self.apply(Some(document.type_name.as_str()), &document.properties, object)
    }

    fn apply(
        &self,
        type_name: Option<&str>,
        properties: &Map<String, Json>,
        object: &mut dyn Object,
    ) -> Result<DeserializeReport> {
        let info = self.type_info(&*object)?;

        if let Some(found) = type_name.filter(|found| !found.is_empty() && *found != info.name()) {
            if self.config.reject_type_mismatch {
                return Err(SerializeError::TypeMismatch {
                    expected: info.name().to_string(),
                    found: found.to_string(),
                });
            }
            log::warn!("applying '{}' document to a '{}'", found, info.name());
        }

        let mut report = DeserializeReport::default();
        read_properties(info, properties, (*object).as_any_mut(), "", &mut report);
        Ok(report)
    }

    /// Build a new pool object from a document.
    ///
    /// The document's type must be registered with
    /// [`void_object::register_object`].
    pub fn instantiate(&self, document: &Document, manager: &mut ObjectManager) -> Result<AnyObjectPtr> {
        let info = self
            .registry
            .get_by_name(&document.type_name)
            .ok_or_else(|| SerializeError::NotRegistered(document.type_name.clone()))?;
        let reflect = ReflectObject::from_info(info)
            .ok_or_else(|| SerializeError::NotConstructible(document.type_name.clone()))?;

        let mut object = reflect.construct();
        self.apply_document(document, &mut *object)?;
        Ok(manager.create_boxed(object)?)
    }

    /// Serialize an object straight to a file.
    ///
    /// Any failure is logged and reported as `false`.
    pub fn save_object_to_file(&self, object: &dyn Object, path: impl AsRef<Path>) -> bool {
        match self.serialize(object) {
            Ok(document) => file::save_to_file_with_indent(path, &document, self.config.indent),
            Err(err) => {
                log::error!("failed to serialize {} for saving: {}", object.object_type_name(), err);
                false
            }
        }
    }

    /// Load a document file and apply it to `object`
    pub fn load_object_from_file(&self, path: impl AsRef<Path>, object: &mut dyn Object) -> Result<DeserializeReport> {
        let document = file::load_from_file(path)?;
        self.apply_document(&document, object)
    }
}

fn path_of(prefix: &str, name: &str) -> String {
    format!("{prefix}{name}")
}

fn write_properties(
    info: &TypeInfo,
    instance: &dyn Any,
    prefix: &str,
    report: &mut SerializeReport,
) -> Map<String, Json> {
    let mut properties = Map::new();
    for prop in info.properties() {
        let path = path_of(prefix, prop.name());
        let json = match (prop.nested_info(), prop.nested_ref(instance)) {
            (Some(nested), Some(inner)) => {
                let mut document = Document::new(nested.name());
                document.properties = write_properties(nested, inner, &format!("{path}."), report);
                Some(document.into_json())
            }
            _ => prop.get(instance).as_ref().and_then(convert::to_json),
        };
        match json {
            Some(json) => {
                properties.insert(prop.name().to_string(), json);
            }
            None => {
                log::debug!("{}.{} has no JSON form, omitted", info.name(), prop.name());
                report.omitted.push(path);
            }
        }
    }
    properties
}

fn read_properties(
    info: &TypeInfo,
    properties: &Map<String, Json>,
    instance: &mut dyn Any,
    prefix: &str,
    report: &mut DeserializeReport,
) {
    for prop in info.properties() {
        let Some(node) = properties.get(prop.name()) else {
            continue;
        };
        let path = path_of(prefix, prop.name());

        if let Some(nested) = prop.nested_info() {
            let inner_properties = node.get("properties").and_then(Json::as_object);
            if let (Some(inner_properties), Some(inner)) = (inner_properties, prop.nested_mut(&mut *instance)) {
                read_properties(nested, inner_properties, inner, &format!("{path}."), report);
                continue;
            }
        }

        let converted = prop
            .get(&*instance)
            .and_then(|current| convert::from_json(node, &current));
        let applied = match converted {
            Some(value) => prop.set(&mut *instance, value),
            None => false,
        };
        if applied {
            report.applied.push(path);
        } else {
            log::debug!("{}.{} not convertible, skipped", info.name(), prop.name());
            report.skipped.push(path);
        }
    }

    report.ignored.extend(
        properties
            .keys()
            .filter(|name| info.property(name).is_none())
            .map(|name| path_of(prefix, name)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use void_core::{Reflected, TypeBuilder, Value};
    use void_object::ObjectBase;

    #[derive(Debug, Default)]
    struct Player {
        base: ObjectBase,
        health: i32,
        name: String,
        speed: f32,
    }
    void_object::impl_object!(Player);

    impl Reflected for Player {
        fn describe(builder: TypeBuilder<Self>) -> TypeBuilder<Self> {
            builder
                .name("game::Player")
                .property("health", |p| p.health, |p, v| p.health = v)
                .property("name", |p| p.name.clone(), |p, v| p.name = v)
                .property("speed", |p| p.speed, |p, v| p.speed = v)
        }
    }

    #[derive(Debug, Default)]
    struct Unregistered {
        base: ObjectBase,
    }
    void_object::impl_object!(Unregistered);

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        void_object::register_object::<Player>(&mut registry).unwrap();
        registry
    }

    fn hero() -> Player {
        Player {
            health: 100,
            name: "Hero".to_string(),
            speed: 2.5,
            ..Default::default()
        }
    }

    #[test]
    fn test_serialize() {
        let registry = registry();
        let serializer = JsonSerializer::new(&registry);

        let document = serializer.serialize(&hero()).unwrap();
        assert_eq!(document.type_name, "game::Player");
        assert_eq!(document.get("health"), Some(&json!(100)));
        assert_eq!(document.get("name"), Some(&json!("Hero")));
        assert_eq!(document.get("speed"), Some(&json!(2.5)));
    }

    #[test]
    fn test_serialize_unregistered() {
        let registry = registry();
        let serializer = JsonSerializer::new(&registry);
        let err = serializer.serialize(&Unregistered::default()).unwrap_err();
        assert!(matches!(err, SerializeError::NotRegistered(name) if name.ends_with("Unregistered")));
    }

    #[test]
    fn test_round_trip() {
        let registry = registry();
        let serializer = JsonSerializer::new(&registry);
        let json = serializer.serialize(&hero()).unwrap().into_json();

        let mut fresh = Player::default();
        assert!(serializer.deserialize(&json, &mut fresh));
        assert_eq!(fresh.health, 100);
        assert_eq!(fresh.name, "Hero");
        assert_eq!(fresh.speed, 2.5);
    }

    #[test]
    fn test_report() {
        let registry = registry();
        let serializer = JsonSerializer::new(&registry);
        let json = json!({
            "type": "game::Player",
            "properties": { "health": "lots", "name": "Zed", "legacyField": 1 }
        });

        let mut player = hero();
        let report = serializer.deserialize_with_report(&json, &mut player).unwrap();
        assert_eq!(report.applied, vec!["name"]);
        assert_eq!(report.skipped, vec!["health"]);
        assert_eq!(report.ignored, vec!["legacyField"]);
        assert!(!report.is_complete());
        assert_eq!(player.health, 100);
        assert_eq!(player.name, "Zed");
    }

    #[test]
    fn test_out_of_range_float_skipped() {
        let registry = registry();
        let serializer = JsonSerializer::new(&registry);
        let json = json!({ "properties": { "speed": 1e300 } });

        let mut player = hero();
        let report = serializer.deserialize_with_report(&json, &mut player).unwrap();
        assert_eq!(report.skipped, vec!["speed"]);
        assert_eq!(player.speed, 2.5);
        assert!(serializer.serialize(&player).unwrap().contains("speed"));
    }

    #[derive(Debug, Default, PartialEq)]
    struct Stats {
        armor: u32,
        label: String,
    }

    impl Reflected for Stats {
        fn describe(builder: TypeBuilder<Self>) -> TypeBuilder<Self> {
            builder
                .name("game::Stats")
                .property("armor", |s| s.armor, |s, v| s.armor = v)
                .property("label", |s| s.label.clone(), |s, v| s.label = v)
                .read_only("marker", |_| Value::Opaque("Marker".into()))
        }
    }

    #[derive(Debug, Default)]
    struct Knight {
        base: ObjectBase,
        stats: Stats,
    }
    void_object::impl_object!(Knight);

    impl Reflected for Knight {
        fn describe(builder: TypeBuilder<Self>) -> TypeBuilder<Self> {
            builder
                .name("game::Knight")
                .nested("stats", |k| &k.stats, |k| &mut k.stats)
        }
    }

    fn knight() -> Knight {
        Knight {
            stats: Stats {
                armor: 5,
                label: "squire".to_string(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_nested_report_paths() {
        let mut registry = registry();
        void_object::register_object::<Knight>(&mut registry).unwrap();
        let serializer = JsonSerializer::new(&registry);

        let json = json!({
            "type": "game::Knight",
            "properties": {
                "stats": { "type": "game::Stats", "properties": { "armor": "lots", "label": "sir", "bogus": 1 } }
            }
        });
        let mut knight = knight();
        let report = serializer.deserialize_with_report(&json, &mut knight).unwrap();
        assert_eq!(report.applied, vec!["stats.label"]);
        assert_eq!(report.skipped, vec!["stats.armor"]);
        assert_eq!(report.ignored, vec!["stats.bogus"]);
        assert!(!report.is_complete());
        assert_eq!(knight.stats.armor, 5);
        assert_eq!(knight.stats.label, "sir");

        let (document, report) = serializer.serialize_with_report(&knight).unwrap();
        assert_eq!(report.omitted, vec!["stats.marker"]);
        assert_eq!(
            document.get("stats"),
            Some(&json!({ "type": "game::Stats", "properties": { "armor": 5, "label": "sir" } }))
        );
    }

    #[test]
    fn test_nested_not_document_shaped() {
        let mut registry = registry();
        void_object::register_object::<Knight>(&mut registry).unwrap();
        let serializer = JsonSerializer::new(&registry);

        let json = json!({ "properties": { "stats": { "armor": 9 } } });
        let mut knight = knight();
        let report = serializer.deserialize_with_report(&json, &mut knight).unwrap();
        assert_eq!(report.skipped, vec!["stats"]);
        assert_eq!(knight.stats.armor, 5);
    }

    #[test]
    fn test_type_mismatch_policy() {
        let registry = registry();
        let json = json!({ "type": "game::Enemy", "properties": { "health": 1 } });

        let lenient = JsonSerializer::new(&registry);
        let mut player = hero();
        assert!(lenient.deserialize(&json, &mut player));
        assert_eq!(player.health, 1);

        let strict = JsonSerializer::new(&registry).with_config(SerializerConfig::default().with_reject_type_mismatch(true));
        let mut player = hero();
        assert!(matches!(
            strict.deserialize_with_report(&json, &mut player),
            Err(SerializeError::TypeMismatch { .. })
        ));
        assert!(!strict.deserialize(&json, &mut player));
        assert_eq!(player.health, 100);
    }

    #[test]
    fn test_instantiate() {
        let registry = registry();
        let serializer = JsonSerializer::new(&registry);
        let mut manager = ObjectManager::new();

        let document = serializer.serialize(&hero()).unwrap();
        let ptr = serializer.instantiate(&document, &mut manager).unwrap();
        let player = manager.typed::<Player>(ptr).and_then(|p| manager.get(p)).unwrap();
        assert_eq!(player.name, "Hero");
        assert!(player.base.is_bound());

        let unknown = Document::new("game::Nope");
        assert!(matches!(
            serializer.instantiate(&unknown, &mut manager),
            Err(SerializeError::NotRegistered(_))
        ));
    }

    #[test]
    fn test_config_deserialize() {
        let config: SerializerConfig = serde_json::from_str(r#"{ "reject_type_mismatch": true }"#).unwrap();
        assert_eq!(config.indent, 4);
        assert!(config.reject_type_mismatch);
    }

    #[test]
    fn test_instantiate_requires_constructor() {
        let mut registry = TypeRegistry::new();
        registry.register::<Player>().unwrap();
        let serializer = JsonSerializer::new(&registry);
        let mut manager = ObjectManager::new();

        let document = Document::new("game::Player");
        assert!(matches!(
            serializer.instantiate(&document, &mut manager),
            Err(SerializeError::NotConstructible(_))
        ));
        assert!(manager.is_empty());
    }
}
