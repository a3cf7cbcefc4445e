use serde::{Deserialize, Serialize};

/// The six pointer-like reference subkinds. Validity differs per subkind, so
/// the oracle must see which one it is dealing with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerKind {
    /// Plain strong object reference.
    Object,
    /// Weak reference; only valid while the target is alive.
    Weak,
    /// Deferred object reference by path; the target may be unloaded.
    SoftObject,
    /// Deferred type reference by path.
    SoftClass,
    /// Direct type reference.
    Class,
    /// Interface handle; the underlying object decides validity.
    Interface,
}

/// Declared kind of a field, as one closed variant. Checkers match over this
/// instead of re-deriving the kind from a host type hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Bool,
    Int { signed: bool },
    Float,
    /// Interned identifier; the empty identifier is the absence sentinel.
    Name,
    Pointer(PointerKind),
    Array(Box<FieldKind>),
    Set(Box<FieldKind>),
    Map(Box<FieldKind>, Box<FieldKind>),
    Optional(Box<FieldKind>),
    /// Inline sub-object (struct-valued field).
    Object,
}

impl FieldKind {
    pub fn is_pointer_like(&self) -> bool {
        matches!(self, FieldKind::Pointer(_))
    }

    pub fn is_container(&self) -> bool {
        matches!(
            self,
            FieldKind::Array(_) | FieldKind::Set(_) | FieldKind::Map(_, _) | FieldKind::Optional(_)
        )
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, FieldKind::Int { .. })
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Int { .. } | FieldKind::Float)
    }
}
