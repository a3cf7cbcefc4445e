use std::fmt;
use std::rc::{Rc, Weak};

use crate::Reflect;

/// Path naming the target of a soft/deferred reference. The empty path is
/// the unset sentinel; a non-empty path is considered set even if nothing is
/// currently loaded at it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoftPath(pub String);

impl SoftPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn unset() -> Self {
        Self(String::new())
    }

    pub fn is_unset(&self) -> bool {
        self.0.is_empty()
    }
}

/// Live value of a pointer-like field.
#[derive(Clone)]
pub enum PointerValue {
    Object(Option<Rc<dyn Reflect>>),
    Weak(Weak<dyn Reflect>),
    SoftObject(SoftPath),
    SoftClass(SoftPath),
    /// Type reference, carried as the type's name.
    Class(Option<&'static str>),
    /// Interface handle; validity is decided by the underlying object.
    Interface(Option<Rc<dyn Reflect>>),
}

impl fmt::Debug for PointerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointerValue::Object(v) => write!(f, "Object({})", set_or_null(v.is_some())),
            PointerValue::Weak(w) => write!(
                f,
                "Weak({})",
                if w.strong_count() > 0 { "alive" } else { "dead" }
            ),
            PointerValue::SoftObject(p) => write!(f, "SoftObject({:?})", p.0),
            PointerValue::SoftClass(p) => write!(f, "SoftClass({:?})", p.0),
            PointerValue::Class(v) => write!(f, "Class({})", v.unwrap_or("null")),
            PointerValue::Interface(v) => write!(f, "Interface({})", set_or_null(v.is_some())),
        }
    }
}

fn set_or_null(set: bool) -> &'static str {
    if set {
        "set"
    } else {
        "null"
    }
}

/// Live value of a tagged field. `Set` and `Map` carry `Option` slots so
/// sparse containers with tombstone gaps enumerate the way the host stores
/// them; vacant slots are skipped by checkers.
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    /// Identifier; the empty string is the absence sentinel.
    Name(String),
    Pointer(PointerValue),
    Array(Vec<Value>),
    Set(Vec<Option<Value>>),
    Map(Vec<Option<(Value, Value)>>),
    Optional(Option<Box<Value>>),
}

impl Value {
    /// Plain object pointer helper for descriptor builders.
    pub fn object(referent: Option<Rc<dyn Reflect>>) -> Self {
        Value::Pointer(PointerValue::Object(referent))
    }

    pub fn null_object() -> Self {
        Value::Pointer(PointerValue::Object(None))
    }
}
