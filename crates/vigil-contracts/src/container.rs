use vigil_reflect::{FieldKind, Value};

use crate::oracle::pointer_is_valid;

/// Walks a container field for the `MemSafeContainer` rule.
///
/// Returns `Ok(true)` if every live pointer-like element is valid,
/// `Ok(false)` on the first invalid element, and `Err(detail)` when the rule
/// is misapplied (non-container kind, or a value that does not match the
/// declared kind). Containers whose element kinds are not pointer-like pass
/// in O(1) without touching elements. Vacant set/map slots are skipped; an
/// unset optional is valid by definition.
pub fn validate_container(kind: &FieldKind, value: &Value) -> Result<bool, String> {
    match (kind, value) {
        (FieldKind::Array(elem), Value::Array(items)) => {
            if !elem.is_pointer_like() {
                return Ok(true);
            }
            Ok(items.iter().all(pointer_is_valid))
        }
        (FieldKind::Set(elem), Value::Set(slots)) => {
            if !elem.is_pointer_like() {
                return Ok(true);
            }
            Ok(slots.iter().flatten().all(pointer_is_valid))
        }
        (FieldKind::Map(key_kind, value_kind), Value::Map(slots)) => {
            let check_keys = key_kind.is_pointer_like();
            let check_values = value_kind.is_pointer_like();
            if !check_keys && !check_values {
                return Ok(true);
            }
            for (key, val) in slots.iter().flatten() {
                if check_keys && !pointer_is_valid(key) {
                    return Ok(false);
                }
                if check_values && !pointer_is_valid(val) {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (FieldKind::Optional(elem), Value::Optional(slot)) => match slot {
            None => Ok(true),
            Some(inner) => {
                if !elem.is_pointer_like() {
                    return Ok(true);
                }
                Ok(pointer_is_valid(inner))
            }
        },
        (kind, _) if !kind.is_container() => {
            Err("MemSafeContainer used on a non-container field".to_string())
        }
        _ => Err("live value does not match the declared container kind".to_string()),
    }
}
