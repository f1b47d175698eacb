use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Number, Value};

pub type EntityRef = Arc<dyn DynEntity>;

/// A value read from an entity through one of its registered capabilities.
#[derive(Clone)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Entity(EntityRef),
    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn entity<T: DynEntity + 'static>(entity: T) -> Self {
        FieldValue::Entity(Arc::new(entity))
    }

    /// Values that stop a nested path walk: null, false, zero, `""` and `"0"`.
    pub fn is_falsy(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Bool(value) => !value,
            FieldValue::Int(value) => *value == 0,
            FieldValue::Float(value) => *value == 0.0,
            FieldValue::Text(value) => value.is_empty() || value == "0",
            FieldValue::List(values) => values.is_empty(),
            FieldValue::Date(_) | FieldValue::DateTime(_) | FieldValue::Entity(_) => false,
        }
    }

    /// Raw JSON form. Entities have no scalar form and serialize as `{}`.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(value) => Value::Bool(*value),
            FieldValue::Int(value) => Value::Number((*value).into()),
            FieldValue::Float(value) => Number::from_f64(*value)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Text(value) => Value::String(value.clone()),
            FieldValue::Date(value) => Value::String(value.format("%Y-%m-%d").to_string()),
            FieldValue::DateTime(value) => {
                Value::String(value.format("%Y-%m-%d %H:%M:%S").to_string())
            }
            FieldValue::Entity(_) => Value::Object(Map::new()),
            FieldValue::List(values) => Value::Array(values.iter().map(Self::to_json).collect()),
        }
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "Null"),
            FieldValue::Bool(value) => write!(f, "Bool({value})"),
            FieldValue::Int(value) => write!(f, "Int({value})"),
            FieldValue::Float(value) => write!(f, "Float({value})"),
            FieldValue::Text(value) => write!(f, "Text({value:?})"),
            FieldValue::Date(value) => write!(f, "Date({value})"),
            FieldValue::DateTime(value) => write!(f, "DateTime({value})"),
            FieldValue::Entity(entity) => write!(f, "Entity({})", entity.type_name()),
            FieldValue::List(values) => f.debug_tuple("List").field(values).finish(),
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(value: NaiveDateTime) -> Self {
        FieldValue::DateTime(value)
    }
}

impl From<EntityRef> for FieldValue {
    fn from(value: EntityRef) -> Self {
        FieldValue::Entity(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Object-safe view of a row the formatter can render.
///
/// `invoke` and `get` return `None` when the entity does not expose the named
/// operation or accessor, which is distinct from exposing it and yielding
/// [`FieldValue::Null`].
pub trait DynEntity: Send + Sync {
    fn type_name(&self) -> &'static str;

    /// Calls a registered zero-argument operation.
    fn invoke(&self, method: &str) -> Option<FieldValue>;

    /// Reads a registered accessor.
    fn get(&self, accessor: &str) -> Option<FieldValue>;

    /// Rows to list directly below this one, if the entity has any notion of
    /// children at all.
    fn children(&self) -> Option<Vec<EntityRef>>;
}

type Handler<T> = fn(&T) -> FieldValue;

/// Registered operations and accessors of one entity type, built once and
/// shared by every instance.
pub struct Capabilities<T> {
    methods: HashMap<&'static str, Handler<T>>,
    accessors: HashMap<&'static str, Handler<T>>,
    children: Option<fn(&T) -> Vec<EntityRef>>,
}

impl<T> Default for Capabilities<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Capabilities<T> {
    pub fn new() -> Self {
        Self {
            methods: HashMap::new(),
            accessors: HashMap::new(),
            children: None,
        }
    }

    pub fn method(mut self, name: &'static str, handler: Handler<T>) -> Self {
        self.methods.insert(name, handler);
        self
    }

    pub fn accessor(mut self, name: &'static str, handler: Handler<T>) -> Self {
        self.accessors.insert(name, handler);
        self
    }

    pub fn children(mut self, handler: fn(&T) -> Vec<EntityRef>) -> Self {
        self.children = Some(handler);
        self
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn has_accessor(&self, name: &str) -> bool {
        self.accessors.contains_key(name)
    }
}

/// Typed entities register their capabilities once, usually behind a
/// `OnceLock`, and get [`DynEntity`] for free.
///
/// ```
/// use std::sync::OnceLock;
///
/// use datatable_list::{Capabilities, DynEntity, Entity, FieldValue};
///
/// struct Tag {
///     label: String,
/// }
///
/// impl Entity for Tag {
///     fn capabilities() -> &'static Capabilities<Self> {
///         static CAPABILITIES: OnceLock<Capabilities<Tag>> = OnceLock::new();
///         CAPABILITIES.get_or_init(|| {
///             Capabilities::<Self>::new().accessor("label", |tag| tag.label.clone().into())
///         })
///     }
/// }
///
/// let tag = Tag { label: "rust".to_string() };
/// assert!(matches!(tag.get("label"), Some(FieldValue::Text(label)) if label == "rust"));
/// ```
pub trait Entity: Send + Sync + Sized + 'static {
    fn capabilities() -> &'static Capabilities<Self>;
}

impl<T: Entity> DynEntity for T {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn invoke(&self, method: &str) -> Option<FieldValue> {
        T::capabilities()
            .methods
            .get(method)
            .map(|handler| handler(self))
    }

    fn get(&self, accessor: &str) -> Option<FieldValue> {
        T::capabilities()
            .accessors
            .get(accessor)
            .map(|handler| handler(self))
    }

    fn children(&self) -> Option<Vec<EntityRef>> {
        T::capabilities().children.map(|handler| handler(self))
    }
}
