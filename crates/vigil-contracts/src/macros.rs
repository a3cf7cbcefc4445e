//! Labelled contract-check macros for call-site conditions: preconditions,
//! postconditions, and architectural assumptions promised by third parties.
//! All of them halt the current execution context on failure, carrying the
//! failed expression text and location.

/// Checks a condition under a custom label.
#[macro_export]
macro_rules! contract_check {
    ($cond:expr, $label:expr) => {
        if !$cond {
            panic!(
                "Contract violation ({}): [{}] @ [{}:{}]",
                $label,
                stringify!($cond),
                file!(),
                line!()
            );
        }
    };
}

/// Something that must be true at the beginning of a scope.
#[macro_export]
macro_rules! precond {
    ($cond:expr) => {
        $crate::contract_check!($cond, "Precondition")
    };
}

/// Something that must be true at the end of a scope.
#[macro_export]
macro_rules! postcond {
    ($cond:expr) => {
        $crate::contract_check!($cond, "Postcondition")
    };
}

/// Something promised by code we do not control but rely on.
#[macro_export]
macro_rules! archcond {
    ($cond:expr) => {
        $crate::contract_check!($cond, "Architecture")
    };
}

/// Precondition that also runs a full invariant pass on the object.
#[macro_export]
macro_rules! deep_precond {
    ($object:expr) => {
        if let Err(err) = $crate::check_invariants($object) {
            panic!("Contract violation (Precondition): {} @ [{}:{}]", err, file!(), line!());
        }
    };
}
