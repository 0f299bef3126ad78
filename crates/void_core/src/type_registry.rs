//! Dynamic type registry for runtime type information
//!
//! Each registered type is described by a [`TypeInfo`]: its name and an
//! ordered list of properties, each a (name, getter, setter) triple that
//! works on `&dyn Any` and speaks [`Value`]. This is enough to walk any
//! registered object generically without per-type persistence code.
//!
//! Types describe themselves by implementing [`Reflected`]:
//!
//! ```ignore
//! impl Reflected for Player {
//!     fn describe(builder: TypeBuilder<Self>) -> TypeBuilder<Self> {
//!         builder
//!             .name("game::Player")
//!             .property("health", |p| p.health, |p, v| p.health = v)
//!             .property("name", |p| p.name.clone(), |p, v| p.name = v)
//!             .nested("stats", |p| &p.stats, |p| &mut p.stats)
//!     }
//! }
//!
//! let mut registry = TypeRegistry::new();
//! registry.register::<Player>()?;
//! ```

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{ReflectError, Result};
use crate::value::{FromValue, IntoValue, ObjectValue, Value};

type Getter = Box<dyn Fn(&dyn Any) -> Option<Value> + Send + Sync>;
type Setter = Box<dyn Fn(&mut dyn Any, Value) -> bool + Send + Sync>;
type NestedRef = Box<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync>;
type NestedMut = Box<dyn for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Any> + Send + Sync>;

/// Direct access to an embedded reflected struct
struct Nested {
    info: Arc<TypeInfo>,
    get: NestedRef,
    get_mut: NestedMut,
}

/// A named, reflectively accessible property
pub struct PropertyInfo {
    name: String,
    getter: Getter,
    setter: Option<Setter>,
    nested: Option<Nested>,
}

impl PropertyInfo {
    /// Property name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the property from an instance.
    ///
    /// Returns `None` if `instance` is not of the declaring type.
    pub fn get(&self, instance: &dyn Any) -> Option<Value> {
        (self.getter)(instance)
    }

    /// Write the property on an instance.
    ///
    /// Returns `false` when the property is read-only, the instance has the
    /// wrong type, or the value cannot be converted to the property's type.
    pub fn set(&self, instance: &mut dyn Any, value: Value) -> bool {
        match &self.setter {
            Some(setter) => setter(instance, value),
            None => false,
        }
    }

    /// Whether the property has no setter
    pub fn is_read_only(&self) -> bool {
        self.setter.is_none()
    }

    /// Type info of the embedded struct, for properties declared with
    /// [`TypeBuilder::nested`]
    pub fn nested_info(&self) -> Option<&TypeInfo> {
        self.nested.as_ref().map(|nested| &*nested.info)
    }

    /// Borrow the embedded struct of `instance`
    pub fn nested_ref<'a>(&self, instance: &'a dyn Any) -> Option<&'a dyn Any> {
        (self.nested.as_ref()?.get)(instance)
    }

    /// Mutably borrow the embedded struct of `instance`
    pub fn nested_mut<'a>(&self, instance: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        (self.nested.as_ref()?.get_mut)(instance)
    }
}

impl fmt::Debug for PropertyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyInfo")
            .field("name", &self.name)
            .field("read_only", &self.is_read_only())
            .field("nested", &self.nested_info().map(TypeInfo::name))
            .finish()
    }
}

/// Information about a registered type
pub struct TypeInfo {
    type_id: TypeId,
    name: String,
    properties: Vec<PropertyInfo>,
    /// Extension data keyed by its own type (see [`TypeInfo::insert_data`])
    data: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl TypeInfo {
    /// Build the type info of a reflected type
    pub fn of<T: Reflected>() -> Self {
        T::describe(TypeBuilder::new()).build()
    }

    /// The Rust TypeId
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Registered type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Properties in declaration order
    pub fn properties(&self) -> &[PropertyInfo] {
        &self.properties
    }

    /// Look up a property by name
    pub fn property(&self, name: &str) -> Option<&PropertyInfo> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Check whether `instance` is of this type
    pub fn is_instance(&self, instance: &dyn Any) -> bool {
        instance.type_id() == self.type_id
    }

    /// Read every readable property into an [`ObjectValue`]
    pub fn capture(&self, instance: &dyn Any) -> Option<ObjectValue> {
        if !self.is_instance(instance) {
            return None;
        }
        let mut value = ObjectValue::new(self.name.clone());
        for prop in &self.properties {
            if let Some(v) = prop.get(instance) {
                value.properties.insert(prop.name.clone(), v);
            }
        }
        Some(value)
    }

    /// Write the properties present in `value` back onto `instance`.
    ///
    /// Properties missing from `value` keep their current value and
    /// unknown entries are ignored. Returns the number of properties written.
    pub fn apply(&self, instance: &mut dyn Any, value: &ObjectValue) -> usize {
        let mut applied = 0;
        for prop in &self.properties {
            if let Some(v) = value.properties.get(&prop.name) {
                if prop.set(instance, v.clone()) {
                    applied += 1;
                }
            }
        }
        applied
    }

    /// Attach extension data, replacing any previous data of the same type
    pub fn insert_data<D: Any + Send + Sync>(&mut self, data: D) {
        self.data.insert(TypeId::of::<D>(), Box::new(data));
    }

    /// Get extension data of type `D`
    pub fn data<D: Any + Send + Sync>(&self) -> Option<&D> {
        self.data.get(&TypeId::of::<D>())?.downcast_ref()
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("properties", &self.properties)
            .finish()
    }
}

/// Types that can describe their own properties
pub trait Reflected: Any + Sized {
    /// Declare name and properties on the builder
    fn describe(builder: TypeBuilder<Self>) -> TypeBuilder<Self>;
}

/// Builder for a [`TypeInfo`]
pub struct TypeBuilder<T> {
    name: String,
    properties: Vec<PropertyInfo>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any> TypeBuilder<T> {
    /// Start a builder named after the Rust type path
    pub fn new() -> Self {
        Self {
            name: std::any::type_name::<T>().to_string(),
            properties: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Override the registered type name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Declare a read/write property
    pub fn property<V>(self, name: impl Into<String>, get: fn(&T) -> V, set: fn(&mut T, V)) -> Self
    where
        V: IntoValue + FromValue + 'static,
    {
        let getter: Getter = Box::new(move |any: &dyn Any| any.downcast_ref::<T>().map(|t| get(t).into_value()));
        let setter: Setter = Box::new(move |any: &mut dyn Any, value: Value| {
            let Some(target) = any.downcast_mut::<T>() else {
                return false;
            };
            match V::from_value(value) {
                Some(v) => {
                    set(target, v);
                    true
                }
                None => false,
            }
        });
        self.push(name.into(), getter, Some(setter), None)
    }

    /// Declare a property that can be read but never written
    pub fn read_only<V>(self, name: impl Into<String>, get: fn(&T) -> V) -> Self
    where
        V: IntoValue + 'static,
    {
        let getter: Getter = Box::new(move |any: &dyn Any| any.downcast_ref::<T>().map(|t| get(t).into_value()));
        self.push(name.into(), getter, None, None)
    }

    /// Declare an embedded reflected struct.
    ///
    /// Reads capture it as a [`Value::Object`]; writes apply the object's
    /// properties onto the existing instance (partial overwrite). A write
    /// reports success only if every declared property it carries was set.
    pub fn nested<N: Reflected>(
        self,
        name: impl Into<String>,
        get: fn(&T) -> &N,
        get_mut: fn(&mut T) -> &mut N,
    ) -> Self {
        let info = Arc::new(TypeInfo::of::<N>());
        let read_info = Arc::clone(&info);
        let nested_info = Arc::clone(&info);

        let getter: Getter = Box::new(move |any: &dyn Any| {
            let target = any.downcast_ref::<T>()?;
            read_info.capture(get(target)).map(Value::Object)
        });
        let setter: Setter = Box::new(move |any: &mut dyn Any, value: Value| {
            let (Some(target), Value::Object(object)) = (any.downcast_mut::<T>(), value) else {
                return false;
            };
            let declared = object.properties.keys().filter(|key| info.property(key).is_some()).count();
            info.apply(get_mut(target), &object) == declared
        });
        let nested = Nested {
            info: nested_info,
            get: Box::new(project_ref(move |any| any.downcast_ref::<T>().map(|t| get(t) as &dyn Any))),
            get_mut: Box::new(project_mut(move |any| {
                any.downcast_mut::<T>().map(|t| get_mut(t) as &mut dyn Any)
            })),
        };
        self.push(name.into(), getter, Some(setter), Some(nested))
    }

    fn push(mut self, name: String, getter: Getter, setter: Option<Setter>, nested: Option<Nested>) -> Self {
        let prop = PropertyInfo {
            name,
            getter,
            setter,
            nested,
        };
        if let Some(existing) = self.properties.iter_mut().find(|p| p.name == prop.name) {
            log::warn!("property '{}' declared twice on '{}'", prop.name, self.name);
            *existing = prop;
        } else {
            self.properties.push(prop);
        }
        self
    }

    /// Finish the type info
    pub fn build(self) -> TypeInfo {
        TypeInfo {
            type_id: TypeId::of::<T>(),
            name: self.name,
            properties: self.properties,
            data: HashMap::new(),
        }
    }
}

// Pin the higher-ranked signatures so the returned borrow follows the input
fn project_ref<F>(f: F) -> F
where
    F: for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any>,
{
    f
}

fn project_mut<F>(f: F) -> F
where
    F: for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Any>,
{
    f
}

impl<T: Any> Default for TypeBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Central registry for all reflected types
pub struct TypeRegistry {
    /// Map from TypeId to TypeInfo
    by_id: BTreeMap<TypeId, TypeInfo>,
    /// Map from name to TypeId for name-based lookups
    by_name: BTreeMap<String, TypeId>,
}

impl TypeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            by_id: BTreeMap::new(),
            by_name: BTreeMap::new(),
        }
    }

    /// Register a reflected type. Re-registering a type replaces its info.
    pub fn register<T: Reflected>(&mut self) -> Result<&mut TypeInfo> {
        self.register_info(TypeInfo::of::<T>())
    }

    /// Register a prebuilt type info
    pub fn register_info(&mut self, info: TypeInfo) -> Result<&mut TypeInfo> {
        let type_id = info.type_id;
        if let Some(&existing) = self.by_name.get(&info.name) {
            if existing != type_id {
                let existing_name = self
                    .by_id
                    .get(&existing)
                    .map(|i| i.name.clone())
                    .unwrap_or_default();
                return Err(ReflectError::DuplicateName {
                    name: info.name,
                    existing: existing_name,
                });
            }
        }

        if let Some(previous) = self.by_id.remove(&type_id) {
            self.by_name.remove(&previous.name);
        }

        log::debug!("registered type '{}' ({} properties)", info.name, info.properties.len());
        self.by_name.insert(info.name.clone(), type_id);
        Ok(self.by_id.entry(type_id).or_insert(info))
    }

    /// Get type info by TypeId
    pub fn get(&self, type_id: TypeId) -> Option<&TypeInfo> {
        self.by_id.get(&type_id)
    }

    /// Get mutable type info by TypeId (for attaching extension data)
    pub fn get_mut(&mut self, type_id: TypeId) -> Option<&mut TypeInfo> {
        self.by_id.get_mut(&type_id)
    }

    /// Get type info of `T`
    pub fn get_of<T: Any>(&self) -> Option<&TypeInfo> {
        self.get(TypeId::of::<T>())
    }

    /// Get type info by registered name
    pub fn get_by_name(&self, name: &str) -> Option<&TypeInfo> {
        self.by_name.get(name).and_then(|id| self.by_id.get(id))
    }

    /// Get type info for the runtime type of `instance`
    pub fn type_of(&self, instance: &dyn Any) -> Option<&TypeInfo> {
        self.get(instance.type_id())
    }

    /// Check if a type is registered
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.by_id.contains_key(&type_id)
    }

    /// Check if a type is registered by name
    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Iterate over all registered types
    pub fn iter(&self) -> impl Iterator<Item = &TypeInfo> {
        self.by_id.values()
    }

    /// Get the number of registered types
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.by_id.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Stats {
        armor: u32,
        speed: f32,
    }

    impl Reflected for Stats {
        fn describe(builder: TypeBuilder<Self>) -> TypeBuilder<Self> {
            builder
                .name("test::Stats")
                .property("armor", |s| s.armor, |s, v| s.armor = v)
                .property("speed", |s| s.speed, |s, v| s.speed = v)
        }
    }

    #[derive(Default)]
    struct Player {
        health: i32,
        name: String,
        id: u64,
        stats: Stats,
    }

    impl Reflected for Player {
        fn describe(builder: TypeBuilder<Self>) -> TypeBuilder<Self> {
            builder
                .name("test::Player")
                .property("health", |p| p.health, |p, v| p.health = v)
                .property("name", |p| p.name.clone(), |p, v| p.name = v)
                .read_only("id", |p| p.id)
                .nested("stats", |p| &p.stats, |p| &mut p.stats)
        }
    }

    #[test]
    fn test_type_registry() {
        let mut registry = TypeRegistry::new();
        registry.register::<Player>().unwrap();

        assert!(registry.contains(TypeId::of::<Player>()));
        assert!(registry.contains_name("test::Player"));

        let info = registry.get_of::<Player>().unwrap();
        let names: Vec<_> = info.properties().iter().map(|p| p.name()).collect();
        assert_eq!(names, ["health", "name", "id", "stats"]);
    }

    #[test]
    fn test_default_name_is_type_path() {
        let info = TypeBuilder::<Stats>::new().build();
        assert!(info.name().ends_with("Stats"));
        assert!(info.name().contains("::"));
    }

    #[test]
    fn test_property_get_set() {
        let info = TypeInfo::of::<Player>();
        let mut player = Player::default();

        let health = info.property("health").unwrap();
        assert!(health.set(&mut player, Value::Int(100)));
        assert_eq!(health.get(&player), Some(Value::Int(100)));
        assert_eq!(player.health, 100);

        // Wrong kind is rejected without touching the field
        assert!(!health.set(&mut player, Value::String("lots".into())));
        assert_eq!(player.health, 100);
    }

    #[test]
    fn test_read_only_property() {
        let info = TypeInfo::of::<Player>();
        let mut player = Player { id: 9, ..Default::default() };
        let id = info.property("id").unwrap();

        assert!(id.is_read_only());
        assert!(!id.set(&mut player, Value::Int(1)));
        assert_eq!(id.get(&player), Some(Value::UInt(9)));
    }

    #[test]
    fn test_wrong_instance_type() {
        let info = TypeInfo::of::<Player>();
        let mut stats = Stats::default();
        let health = info.property("health").unwrap();

        assert_eq!(health.get(&stats), None);
        assert!(!health.set(&mut stats, Value::Int(1)));
        assert!(info.capture(&stats).is_none());
    }

    #[test]
    fn test_nested_capture_and_partial_apply() {
        let info = TypeInfo::of::<Player>();
        let mut player = Player::default();
        player.stats.armor = 4;
        player.stats.speed = 1.5;

        let captured = info.capture(&player).unwrap();
        let stats = captured.get("stats").and_then(Value::as_object).unwrap();
        assert_eq!(stats.type_name, "test::Stats");
        assert_eq!(stats.get("armor"), Some(&Value::Int(4)));

        let patch = ObjectValue::new("test::Player")
            .with_property("stats", ObjectValue::new("test::Stats").with_property("armor", 10u32));
        assert_eq!(info.apply(&mut player, &patch), 1);
        assert_eq!(player.stats.armor, 10);
        assert_eq!(player.stats.speed, 1.5);
    }

    #[test]
    fn test_nested_set_fails_when_a_field_is_rejected() {
        let info = TypeInfo::of::<Player>();
        let stats = info.property("stats").unwrap();
        let mut player = Player::default();

        let patch = ObjectValue::new("test::Stats")
            .with_property("armor", -1)
            .with_property("speed", 3.0f32);
        assert!(!stats.set(&mut player, Value::Object(patch)));
        assert_eq!(player.stats.armor, 0);
        assert_eq!(player.stats.speed, 3.0);

        let patch = ObjectValue::new("test::Stats")
            .with_property("armor", 2u32)
            .with_property("unknown", true);
        assert!(stats.set(&mut player, Value::Object(patch)));
        assert_eq!(player.stats.armor, 2);
    }

    #[test]
    fn test_nested_access() {
        let info = TypeInfo::of::<Player>();
        let stats = info.property("stats").unwrap();
        assert_eq!(stats.nested_info().map(TypeInfo::name), Some("test::Stats"));
        assert!(info.property("health").unwrap().nested_info().is_none());

        let mut player = Player::default();
        let inner = stats.nested_mut(&mut player).unwrap();
        assert!(info.property("health").unwrap().nested_mut(inner).is_none());
        inner.downcast_mut::<Stats>().unwrap().armor = 7;

        let inner = stats.nested_ref(&player).unwrap();
        assert_eq!(inner.downcast_ref::<Stats>().map(|s| s.armor), Some(7));
        assert!(stats.nested_ref(&Stats::default()).is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        struct Impostor;
        impl Reflected for Impostor {
            fn describe(builder: TypeBuilder<Self>) -> TypeBuilder<Self> {
                builder.name("test::Player")
            }
        }

        let mut registry = TypeRegistry::new();
        registry.register::<Player>().unwrap();
        let err = registry.register::<Impostor>().unwrap_err();
        assert!(matches!(err, ReflectError::DuplicateName { .. }));

        // Re-registering the same type is fine
        assert!(registry.register::<Player>().is_ok());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_extension_data() {
        struct Marker(u8);

        let mut registry = TypeRegistry::new();
        registry.register::<Stats>().unwrap().insert_data(Marker(3));

        let info = registry.get_by_name("test::Stats").unwrap();
        assert_eq!(info.data::<Marker>().map(|m| m.0), Some(3));
        assert!(info.data::<String>().is_none());
    }
}
