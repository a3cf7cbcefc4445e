use serde::Serialize;

use crate::range::RangeExpr;

/// Closed set of invariant rules a tag can name. Derived fresh from the tag
/// text on every pass; dispatch is an exhaustive match, not a string table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Rule {
    /// Pointer-like field must be a valid reference.
    MemSafe,
    /// Container whose pointer-like elements must all be valid.
    MemSafeContainer,
    /// Integer field must not hold the reserved no-id sentinel.
    Id,
    Gte0,
    Gt0,
    Lte0,
    Lt0,
    Range(RangeExpr),
    /// Identifier field must not be the empty sentinel.
    Name,
    True,
    False,
    /// Pointer field must be valid and its referent must itself pass a full
    /// validation pass.
    Contract,
    /// Delegate to a zero-argument bool predicate method on the object.
    Custom(String),
}

impl Rule {
    /// Resolves a tag string. Fixed keywords match case-sensitively; `Range`
    /// is a parametric prefix; `Contract*` names the recursive rule; any
    /// other text is taken as a predicate method name.
    pub fn parse(tag: &str) -> Result<Rule, String> {
        Ok(match tag {
            "MemSafe" => Rule::MemSafe,
            "MemSafeContainer" => Rule::MemSafeContainer,
            "ID" => Rule::Id,
            "Gte0" => Rule::Gte0,
            "Gt0" => Rule::Gt0,
            "Lte0" => Rule::Lte0,
            "Lt0" => Rule::Lt0,
            "Name" => Rule::Name,
            "True" => Rule::True,
            "False" => Rule::False,
            "Contract*" => Rule::Contract,
            _ if tag.starts_with("Range") => Rule::Range(RangeExpr::parse(&tag["Range".len()..])?),
            other => Rule::Custom(other.to_string()),
        })
    }
}
