use vigil_reflect::{PointerValue, Value};

/// Decides whether a pointer-like value is a valid reference.
///
/// Plain object, class and interface references are valid iff non-null (for
/// interfaces the underlying object, not the handle, decides). Weak
/// references are valid only while the target is alive. Soft references are
/// valid iff they name anything at all; the target does not have to be
/// loaded. Non-pointer values are vacuously valid, which lets container
/// walks apply this to every element without pre-filtering.
pub fn pointer_is_valid(value: &Value) -> bool {
    match value {
        Value::Pointer(pointer) => match pointer {
            PointerValue::Object(referent) => referent.is_some(),
            PointerValue::Weak(weak) => weak.strong_count() > 0,
            PointerValue::SoftObject(path) | PointerValue::SoftClass(path) => !path.is_unset(),
            PointerValue::Class(class) => class.is_some(),
            PointerValue::Interface(object) => object.is_some(),
        },
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use vigil_reflect::{Reflect, SoftPath, TaggedField};

    struct Unit;

    impl Reflect for Unit {
        fn type_name(&self) -> &'static str {
            "Unit"
        }

        fn invariant_fields(&self) -> Vec<TaggedField> {
            Vec::new()
        }
    }

    fn rc_unit() -> Rc<dyn Reflect> {
        Rc::new(Unit)
    }

    #[test]
    fn plain_and_interface_require_non_null() {
        assert!(pointer_is_valid(&Value::Pointer(PointerValue::Object(
            Some(rc_unit())
        ))));
        assert!(!pointer_is_valid(&Value::null_object()));
        assert!(!pointer_is_valid(&Value::Pointer(PointerValue::Interface(
            None
        ))));
    }

    #[test]
    fn weak_requires_live_target() {
        let strong = rc_unit();
        let weak = Rc::downgrade(&strong);
        assert!(pointer_is_valid(&Value::Pointer(PointerValue::Weak(
            weak.clone()
        ))));
        drop(strong);
        assert!(!pointer_is_valid(&Value::Pointer(PointerValue::Weak(weak))));
    }

    #[test]
    fn soft_requires_only_a_path() {
        assert!(pointer_is_valid(&Value::Pointer(PointerValue::SoftObject(
            SoftPath::new("/game/widget")
        ))));
        assert!(!pointer_is_valid(&Value::Pointer(PointerValue::SoftClass(
            SoftPath::unset()
        ))));
    }

    #[test]
    fn non_pointer_values_are_vacuously_valid() {
        assert!(pointer_is_valid(&Value::Int(-5)));
        assert!(pointer_is_valid(&Value::Name(String::new())));
        assert!(pointer_is_valid(&Value::Bool(false)));
    }
}
