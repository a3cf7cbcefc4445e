use std::cmp::Ordering;

use tracing::trace;
use vigil_reflect::{FieldKind, PointerKind, PointerValue, Reflect, TaggedField, Value, NO_ID};

use crate::container::validate_container;
use crate::oracle::pointer_is_valid;
use crate::rule::Rule;
use crate::ContractError;

/// Validates every invariant-tagged field and method of an object, in
/// declaration order, stopping at the first failure.
///
/// The pass is read-only and idempotent: nothing is cached between calls and
/// the same object state always produces the same outcome. `Contract*`
/// fields recurse into their referent's own pass. Only the direct same-type
/// self-reference is rejected up front; a contract cycle through two or more
/// intermediate types is a logic error in the declarations themselves and
/// will recurse until the stack overflows — no well-formed object graph can
/// satisfy such a cycle.
pub fn check_invariants(object: &dyn Reflect) -> Result<(), ContractError> {
    let owner = object.type_name();

    for field in object.invariant_fields() {
        let rule = Rule::parse(&field.tag)
            .map_err(|detail| ContractError::config(owner, &field.name, &field.tag, detail))?;
        check_field(object, owner, &field, &rule)?;
    }

    for spec in object.methods() {
        if !spec.invariant {
            continue;
        }
        // Class-level invariant methods go through the same shape check as
        // field-tagged predicates, attributed to the method's own name.
        invoke_predicate(object, owner, &spec.name, &spec.name)?;
    }

    trace!(owner, "invariants hold");
    Ok(())
}

/// Panicking wrapper for embedders that keep the fatal-abort policy: a
/// violation should halt the current execution context, not be handled.
pub fn assert_invariants(object: &dyn Reflect) {
    if let Err(err) = check_invariants(object) {
        panic!("{err}");
    }
}

fn check_field(
    object: &dyn Reflect,
    owner: &str,
    field: &TaggedField,
    rule: &Rule,
) -> Result<(), ContractError> {
    let config = |detail: &str| ContractError::config(owner, &field.name, &field.tag, detail);
    let violation = |detail: String| ContractError::violation(owner, &field.name, &field.tag, detail);

    match rule {
        Rule::MemSafe => {
            if !field.kind.is_pointer_like() {
                return Err(config("MemSafe used on a non-pointer field"));
            }
            if !pointer_is_valid(&field.value) {
                return Err(violation(format!(
                    "reference is null or invalid ({:?})",
                    field.value
                )));
            }
        }
        Rule::MemSafeContainer => match validate_container(&field.kind, &field.value) {
            Err(detail) => return Err(config(&detail)),
            Ok(false) => {
                return Err(violation(
                    "container holds a null or invalid pointer element".to_string(),
                ))
            }
            Ok(true) => {}
        },
        Rule::Id => match (&field.kind, &field.value) {
            (FieldKind::Int { signed: true }, Value::Int(v)) => {
                if *v == NO_ID {
                    return Err(violation(format!("id holds the no-id sentinel ({NO_ID})")));
                }
            }
            // An unsigned field can never hold the sentinel.
            (FieldKind::Int { signed: false }, Value::UInt(_)) => {}
            _ => return Err(config("ID used on a non-integer field")),
        },
        Rule::Gte0 | Rule::Gt0 | Rule::Lte0 | Rule::Lt0 => {
            let ord = sign_of(&field.kind, &field.value)
                .ok_or_else(|| config("sign comparison used on a non-numeric field"))?;
            // An undefined ordering (NaN) fails every sign rule.
            let ok = match rule {
                Rule::Gte0 => matches!(ord, Some(Ordering::Equal | Ordering::Greater)),
                Rule::Gt0 => ord == Some(Ordering::Greater),
                Rule::Lte0 => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
                Rule::Lt0 => ord == Some(Ordering::Less),
                _ => unreachable!(),
            };
            if !ok {
                return Err(violation(format!(
                    "value {} fails the sign comparison",
                    numeric_text(&field.value)
                )));
            }
        }
        Rule::Range(expr) => match expr.check(&field.kind, &field.value) {
            Err(detail) => return Err(config(&detail)),
            Ok(false) => {
                return Err(violation(format!(
                    "value {} is outside the declared range",
                    numeric_text(&field.value)
                )))
            }
            Ok(true) => {}
        },
        Rule::Name => match (&field.kind, &field.value) {
            (FieldKind::Name, Value::Name(name)) => {
                if name.is_empty() {
                    return Err(violation("identifier is the empty sentinel".to_string()));
                }
            }
            _ => return Err(config("Name used on a non-identifier field")),
        },
        Rule::True | Rule::False => match (&field.kind, &field.value) {
            (FieldKind::Bool, Value::Bool(v)) => {
                let expected = matches!(rule, Rule::True);
                if *v != expected {
                    return Err(violation(format!("expected {expected}, found {v}")));
                }
            }
            _ => return Err(config("boolean invariant used on a non-bool field")),
        },
        Rule::Custom(name) => invoke_predicate(object, owner, &field.name, name)?,
        Rule::Contract => check_contract(object, owner, field)?,
    }
    Ok(())
}

/// `Contract*`: the structural same-type guard comes first and fires even
/// when the reference is null, since a self-typed contract member can never
/// be satisfied regardless of data.
fn check_contract(
    object: &dyn Reflect,
    owner: &str,
    field: &TaggedField,
) -> Result<(), ContractError> {
    if field.kind != FieldKind::Pointer(PointerKind::Object) {
        return Err(ContractError::config(
            owner,
            &field.name,
            &field.tag,
            "Contract* used on a non-object-pointer field",
        ));
    }
    if field.referent_type == Some(object.type_name()) {
        return Err(ContractError::config(
            owner,
            &field.name,
            &field.tag,
            "an object cannot carry a contract member of its own type; \
             the invariant could never hold without an infinite loop",
        ));
    }
    match &field.value {
        Value::Pointer(PointerValue::Object(Some(referent))) => {
            check_invariants(referent.as_ref())
        }
        Value::Pointer(PointerValue::Object(None)) => Err(ContractError::violation(
            owner,
            &field.name,
            &field.tag,
            "contract reference is null",
        )),
        _ => Err(ContractError::config(
            owner,
            &field.name,
            &field.tag,
            "live value does not match the declared pointer kind",
        )),
    }
}

fn invoke_predicate(
    object: &dyn Reflect,
    owner: &str,
    attributed_to: &str,
    method: &str,
) -> Result<(), ContractError> {
    let spec = object
        .methods()
        .into_iter()
        .find(|m| m.name == method)
        .ok_or_else(|| {
            ContractError::config(
                owner,
                attributed_to,
                method,
                format!("invariant method `{method}` not found"),
            )
        })?;
    if spec.params != 0 {
        return Err(ContractError::config(
            owner,
            attributed_to,
            method,
            format!("invariant method `{method}` must take no parameters"),
        ));
    }
    if !spec.returns_bool {
        return Err(ContractError::config(
            owner,
            attributed_to,
            method,
            format!("invariant method `{method}` must return bool"),
        ));
    }
    if !object.call_predicate(method) {
        return Err(ContractError::violation(
            owner,
            attributed_to,
            method,
            format!("custom check `{method}` returned false"),
        ));
    }
    Ok(())
}

/// Ordering of a numeric field's value against zero. Outer `None` means the
/// field is not numeric; inner `None` means the comparison itself is
/// undefined (NaN), which fails every sign rule.
fn sign_of(kind: &FieldKind, value: &Value) -> Option<Option<Ordering>> {
    match (kind, value) {
        (FieldKind::Int { signed: true }, Value::Int(v)) => Some(Some(v.cmp(&0))),
        (FieldKind::Int { signed: false }, Value::UInt(v)) => Some(Some(v.cmp(&0))),
        (FieldKind::Float, Value::Float(v)) => Some(v.partial_cmp(&0.0)),
        _ => None,
    }
}

fn numeric_text(value: &Value) -> String {
    match value {
        Value::Int(v) => v.to_string(),
        Value::UInt(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        other => format!("{other:?}"),
    }
}
