//! Dynamically-typed values exchanged through reflective property accessors

use std::collections::BTreeMap;
use std::fmt;

/// A property value whose type is only known at runtime
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value (e.g. an empty `Option`)
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Signed integer value
    Int(i64),
    /// Unsigned integer too large for `Int`
    UInt(u64),
    /// Float value
    Float(f64),
    /// String value
    String(String),
    /// Array of values
    Array(Vec<Value>),
    /// Embedded reflected object
    Object(ObjectValue),
    /// A runtime-only value with no persistent representation, tagged with its type name
    Opaque(String),
}

/// Kind of a [`Value`], without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    UInt,
    Float,
    String,
    Array,
    Object,
    Opaque,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::UInt => "uint",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
            ValueKind::Opaque => "opaque",
        };
        f.write_str(name)
    }
}

/// Property values of an embedded object, keyed by property name
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectValue {
    /// Registered name of the embedded type
    pub type_name: String,
    /// Captured property values
    pub properties: BTreeMap<String, Value>,
}

impl ObjectValue {
    /// Create an empty object value for a type
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Add a property
    pub fn with_property(mut self, name: impl Into<String>, value: impl IntoValue) -> Self {
        self.properties.insert(name.into(), value.into_value());
        self
    }

    /// Get a property value by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

impl Value {
    /// Get the kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::UInt(_) => ValueKind::UInt,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
            Value::Opaque(_) => ValueKind::Opaque,
        }
    }

    /// Check for [`Value::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as signed integer, if representable
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Get as unsigned integer, if representable
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Int(v) => u64::try_from(*v).ok(),
            Value::UInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as float; integers are widened
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            Value::UInt(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    /// Get as array slice
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    /// Get as embedded object
    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Value::Object(v) => Some(v),
            _ => None,
        }
    }
}

/// Conversion of a Rust value into a [`Value`]
pub trait IntoValue {
    fn into_value(self) -> Value;
}

/// Conversion of a [`Value`] back into a Rust value.
///
/// Returns `None` when the value has the wrong kind or does not fit
/// (narrowing integer conversions never truncate).
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Option<Self>;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Option<Self> {
        value.as_bool()
    }
}

macro_rules! impl_signed {
    ($($t:ty),*) => {$(
        impl IntoValue for $t {
            fn into_value(self) -> Value {
                Value::Int(self as i64)
            }
        }

        impl FromValue for $t {
            fn from_value(value: Value) -> Option<Self> {
                <$t>::try_from(value.as_i64()?).ok()
            }
        }
    )*};
}

macro_rules! impl_unsigned {
    ($variant:ident => $($t:ty),*) => {$(
        impl IntoValue for $t {
            fn into_value(self) -> Value {
                Value::$variant(self as _)
            }
        }

        impl FromValue for $t {
            fn from_value(value: Value) -> Option<Self> {
                <$t>::try_from(value.as_u64()?).ok()
            }
        }
    )*};
}

impl_signed!(i8, i16, i32, i64, isize);
impl_unsigned!(Int => u8, u16, u32);
impl_unsigned!(UInt => u64, usize);

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::Float(self as f64)
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Option<Self> {
        let v = value.as_f64()?;
        let narrowed = v as f32;
        (narrowed.is_finite() || !v.is_finite()).then_some(narrowed)
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Option<Self> {
        value.as_f64()
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::String(self.to_string())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl IntoValue for char {
    fn into_value(self) -> Value {
        Value::String(self.to_string())
    }
}

impl FromValue for char {
    fn from_value(value: Value) -> Option<Self> {
        let s = value.as_str()?;
        let mut chars = s.chars();
        let c = chars.next()?;
        chars.next().is_none().then_some(c)
    }
}

impl<V: IntoValue> IntoValue for Vec<V> {
    fn into_value(self) -> Value {
        Value::Array(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<V: FromValue> FromValue for Vec<V> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(items) => items.into_iter().map(V::from_value).collect(),
            _ => None,
        }
    }
}

impl<V: IntoValue> IntoValue for Option<V> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}

impl<V: FromValue> FromValue for Option<V> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => V::from_value(other).map(Some),
        }
    }
}

impl IntoValue for ObjectValue {
    fn into_value(self) -> Value {
        Value::Object(self)
    }
}
