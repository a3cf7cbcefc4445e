//! Runtime invariant checking over reflected field descriptors.
//!
//! Each tagged field of a [`Reflect`] object names one rule (`MemSafe`,
//! `Range[0,10)`, a predicate method name, ...). [`check_invariants`] walks
//! the fields in declaration order, dispatches each rule, and stops at the
//! first failure. Failures come in two observably distinct tiers: a
//! [`ContractError::Config`] means the rule itself is misdeclared (wrong
//! field shape, malformed range syntax, missing predicate), while a
//! [`ContractError::Violation`] means a correctly declared rule failed
//! against the live value. Both end the pass; there is no partial result.

mod container;
mod engine;
mod macros;
mod oracle;
mod range;
mod rule;

pub use container::validate_container;
pub use engine::{assert_invariants, check_invariants};
pub use oracle::pointer_is_valid;
pub use range::{sanitize_numeric, RangeExpr};
pub use rule::Rule;

pub use vigil_reflect as reflect;
use vigil_reflect::Reflect;

/// First failure found by a validation pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    /// The rule is attached to a field or method of the wrong shape, or its
    /// syntax is malformed. Independent of runtime data.
    #[error("invariant config error on {owner}::{field} (rule `{rule}`): {detail}")]
    Config {
        owner: String,
        field: String,
        rule: String,
        detail: String,
    },
    /// A correctly declared rule failed against the live value.
    #[error("invariant violation on {owner}::{field} (rule `{rule}`): {detail}")]
    Violation {
        owner: String,
        field: String,
        rule: String,
        detail: String,
    },
}

impl ContractError {
    pub fn is_config(&self) -> bool {
        matches!(self, ContractError::Config { .. })
    }

    pub fn is_violation(&self) -> bool {
        matches!(self, ContractError::Violation { .. })
    }

    pub(crate) fn config(
        owner: &str,
        field: &str,
        rule: &str,
        detail: impl Into<String>,
    ) -> Self {
        ContractError::Config {
            owner: owner.to_string(),
            field: field.to_string(),
            rule: rule.to_string(),
            detail: detail.into(),
        }
    }

    pub(crate) fn violation(
        owner: &str,
        field: &str,
        rule: &str,
        detail: impl Into<String>,
    ) -> Self {
        ContractError::Violation {
            owner: owner.to_string(),
            field: field.to_string(),
            rule: rule.to_string(),
            detail: detail.into(),
        }
    }
}

/// Objects that opt into invariant checking at their public boundaries.
/// Blanket-implemented for every [`Reflect`] type.
pub trait CheckedObject: Reflect {
    fn check_invariants(&self) -> Result<(), ContractError>
    where
        Self: Sized,
    {
        check_invariants(self)
    }
}

impl<T: Reflect> CheckedObject for T {}
