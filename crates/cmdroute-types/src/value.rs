//! Type tags and type-erased argument values.
//!
//! A [`TypeTag`] names the Rust type a slot converts into. A [`Value`] is a
//! cloneable, type-erased value carrying its tag, which the handler adapters
//! downcast back into the concrete parameter types.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Identifies the target type of a slot.
///
/// Tags compare by [`TypeId`]; the name is only used in diagnostics.
#[derive(Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    /// The tag for `T`.
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: short_type_name(std::any::type_name::<T>()),
        }
    }

    /// Short display name (`i32`, `String`, `Point`).
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this tag names `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({})", self.name)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Strip the module path from a type name: `alloc::string::String` becomes
/// `String`. Generic names are returned unchanged.
fn short_type_name(full: &'static str) -> &'static str {
    if full.contains('<') {
        return full;
    }
    full.rsplit("::").next().unwrap_or(full)
}

/// A type-erased, cloneable argument value.
#[derive(Clone)]
pub struct Value {
    tag: TypeTag,
    inner: Rc<dyn Any>,
}

impl Value {
    pub fn new<T: Any>(value: T) -> Self {
        Self {
            tag: TypeTag::of::<T>(),
            inner: Rc::new(value),
        }
    }

    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    /// Borrow the inner value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        if !self.tag.is::<T>() {
            return None;
        }
        self.inner.downcast_ref::<T>()
    }

    /// Clone the inner value out if it is a `T`.
    pub fn downcast<T: Any + Clone>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(v) = self.downcast_ref::<i32>() {
            write!(f, "Value({v}: i32)")
        } else if let Some(v) = self.downcast_ref::<f32>() {
            write!(f, "Value({v}: f32)")
        } else if let Some(v) = self.downcast_ref::<f64>() {
            write!(f, "Value({v}: f64)")
        } else if let Some(v) = self.downcast_ref::<String>() {
            write!(f, "Value({v:?}: String)")
        } else {
            write!(f, "Value(<{}>)", self.tag.name())
        }
    }
}

/// What a value flag or a default supplies to a slot.
#[derive(Debug, Clone)]
pub enum ArgValue {
    /// A raw string, converted with the slot's tag at binding time.
    Literal(String),
    /// A value that is already typed; used as-is if its tag matches the slot.
    Typed(Value),
}

impl ArgValue {
    /// Wrap an already-typed value.
    pub fn typed<T: Any>(value: T) -> Self {
        ArgValue::Typed(Value::new(value))
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        ArgValue::Literal(s.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        ArgValue::Literal(s)
    }
}

impl From<Value> for ArgValue {
    fn from(v: Value) -> Self {
        ArgValue::Typed(v)
    }
}
