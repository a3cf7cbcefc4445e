//! Reflective object model consumed by the invariant engine.
//!
//! Objects that want invariant checking implement [`Reflect`] and describe
//! their tagged fields as [`TaggedField`] descriptors: a declared
//! [`FieldKind`], the live [`Value`], and the invariant tag string. The
//! engine never sees concrete field types, only this closed variant set.

mod kind;
mod value;

pub use kind::*;
pub use value::*;

/// Reserved "no id" sentinel for integer identifier fields.
pub const NO_ID: i64 = -1;

/// Descriptor of one invariant-tagged field, produced fresh per validation
/// pass in declaration order.
#[derive(Debug, Clone)]
pub struct TaggedField {
    pub name: String,
    /// Raw invariant tag text, e.g. `MemSafe`, `Range[0,10)`, a method name.
    pub tag: String,
    pub kind: FieldKind,
    pub value: Value,
    /// Declared type name of the referent for `Pointer(Object)` fields.
    /// Needed by the recursive-contract guard even when the value is null.
    pub referent_type: Option<&'static str>,
}

impl TaggedField {
    pub fn new(
        name: impl Into<String>,
        tag: impl Into<String>,
        kind: FieldKind,
        value: Value,
    ) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
            kind,
            value,
            referent_type: None,
        }
    }

    pub fn with_referent(mut self, type_name: &'static str) -> Self {
        self.referent_type = Some(type_name);
        self
    }
}

/// Shape descriptor of a callable predicate method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSpec {
    pub name: String,
    pub params: usize,
    pub returns_bool: bool,
    /// Marks class-level invariant methods checked on every pass, not tied
    /// to a field tag.
    pub invariant: bool,
}

impl MethodSpec {
    /// A well-formed zero-argument bool predicate, reachable via a field tag.
    pub fn predicate(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: 0,
            returns_bool: true,
            invariant: false,
        }
    }

    /// A well-formed predicate tagged as a class-level invariant.
    pub fn class_invariant(name: impl Into<String>) -> Self {
        Self {
            invariant: true,
            ..Self::predicate(name)
        }
    }
}

/// Reflection capability the engine consumes. Descriptors are derived from
/// live state on every call; implementations must not cache them across
/// mutations.
pub trait Reflect {
    fn type_name(&self) -> &'static str;

    /// Tagged fields in declaration order.
    fn invariant_fields(&self) -> Vec<TaggedField>;

    /// Shape descriptors for every method addressable by an invariant tag.
    fn methods(&self) -> Vec<MethodSpec> {
        Vec::new()
    }

    /// Invoke a predicate by name. The engine only calls this after the
    /// matching [`MethodSpec`] passed its shape check.
    fn call_predicate(&self, name: &str) -> bool {
        let _ = name;
        false
    }
}
