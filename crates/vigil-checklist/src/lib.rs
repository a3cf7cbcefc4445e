//! Ordered-procedure tracking: named checklists whose steps must complete
//! in declaration order.
//!
//! Multi-phase setups (asset load, then spawn, then wiring, then activation)
//! fail in confusing ways when a phase is skipped. A checklist makes the
//! ordering explicit: register the steps once, tick them off as the code
//! reaches them, and any step checked out of order is an error at the point
//! of the skip rather than a mystery three phases later.
//!
//! Process-wide registry, same shape as the floodlight's. [`StepScope`] is
//! the preferred way to tick a step: it verifies the step may begin on entry
//! and marks it complete when the scope ends.

use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ChecklistError {
    #[error("no checklist named '{0}' is registered")]
    UnknownChecklist(String),
    #[error("checklist '{checklist}' has no step '{step}'")]
    UnknownStep { checklist: String, step: String },
    #[error("checklist '{checklist}' step '{step}' is out of order (expected '{expected}')")]
    OutOfOrder {
        checklist: String,
        step: String,
        expected: String,
    },
    #[error("checklist '{checklist}' is already complete")]
    AlreadyDone { checklist: String },
    #[error("checklist '{checklist}' declares step '{step}' more than once")]
    DuplicateStep { checklist: String, step: String },
    #[error("checklist '{checklist}' has no steps")]
    Empty { checklist: String },
}

#[derive(Debug, Clone)]
struct ChecklistState {
    steps: Vec<String>,
    last_finished: Option<usize>,
    done: bool,
}

static REGISTRY: OnceCell<RwLock<HashMap<String, ChecklistState>>> = OnceCell::new();

fn registry() -> &'static RwLock<HashMap<String, ChecklistState>> {
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Registers (or re-registers, resetting progress) a checklist with the
/// given steps in completion order.
pub fn register(name: &str, steps: &[&str]) -> Result<(), ChecklistError> {
    if steps.is_empty() {
        return Err(ChecklistError::Empty {
            checklist: name.to_string(),
        });
    }
    for (i, step) in steps.iter().enumerate() {
        if steps[..i].contains(step) {
            return Err(ChecklistError::DuplicateStep {
                checklist: name.to_string(),
                step: step.to_string(),
            });
        }
    }
    registry().write().unwrap().insert(
        name.to_string(),
        ChecklistState {
            steps: steps.iter().map(|s| s.to_string()).collect(),
            last_finished: None,
            done: false,
        },
    );
    debug!(checklist = name, steps = steps.len(), "checklist registered");
    Ok(())
}

fn step_index(state: &ChecklistState, checklist: &str, step: &str) -> Result<usize, ChecklistError> {
    state
        .steps
        .iter()
        .position(|s| s == step)
        .ok_or_else(|| ChecklistError::UnknownStep {
            checklist: checklist.to_string(),
            step: step.to_string(),
        })
}

fn next_index(state: &ChecklistState) -> usize {
    state.last_finished.map_or(0, |i| i + 1)
}

/// True if `step` is the next step in line for `name`.
pub fn can_begin_step(name: &str, step: &str) -> bool {
    let reg = registry().read().unwrap();
    match reg.get(name) {
        Some(state) => {
            !state.done
                && matches!(step_index(state, name, step), Ok(i) if i == next_index(state))
        }
        None => false,
    }
}

/// Marks `step` complete. The step must be the next one in declaration
/// order; completing the final step marks the checklist done.
pub fn check_step(name: &str, step: &str) -> Result<(), ChecklistError> {
    let mut reg = registry().write().unwrap();
    let state = reg
        .get_mut(name)
        .ok_or_else(|| ChecklistError::UnknownChecklist(name.to_string()))?;
    if state.done {
        return Err(ChecklistError::AlreadyDone {
            checklist: name.to_string(),
        });
    }
    let index = step_index(state, name, step)?;
    let expected = next_index(state);
    if index != expected {
        return Err(ChecklistError::OutOfOrder {
            checklist: name.to_string(),
            step: step.to_string(),
            expected: state.steps[expected].clone(),
        });
    }
    state.last_finished = Some(index);
    if index + 1 == state.steps.len() {
        state.done = true;
        debug!(checklist = name, "checklist complete");
    } else {
        debug!(checklist = name, step, "checklist step complete");
    }
    Ok(())
}

pub fn is_step_done(name: &str, step: &str) -> bool {
    let reg = registry().read().unwrap();
    match reg.get(name) {
        Some(state) => match step_index(state, name, step) {
            Ok(i) => state.last_finished.is_some_and(|last| i <= last),
            Err(_) => false,
        },
        None => false,
    }
}

pub fn is_done(name: &str) -> bool {
    registry()
        .read()
        .unwrap()
        .get(name)
        .is_some_and(|state| state.done)
}

/// Progress as a display string: "not started", the last completed step's
/// name, or "completed".
pub fn last_completed_step(name: &str) -> String {
    let reg = registry().read().unwrap();
    match reg.get(name) {
        Some(state) if state.done => "completed".to_string(),
        Some(state) => match state.last_finished {
            Some(i) => state.steps[i].clone(),
            None => "not started".to_string(),
        },
        None => "not started".to_string(),
    }
}

/// Forces a checklist complete, skipping any remaining steps.
pub fn set_done(name: &str) -> Result<(), ChecklistError> {
    let mut reg = registry().write().unwrap();
    let state = reg
        .get_mut(name)
        .ok_or_else(|| ChecklistError::UnknownChecklist(name.to_string()))?;
    state.done = true;
    state.last_finished = Some(state.steps.len() - 1);
    Ok(())
}

/// Resets a checklist's progress without unregistering it.
pub fn reset(name: &str) -> Result<(), ChecklistError> {
    let mut reg = registry().write().unwrap();
    let state = reg
        .get_mut(name)
        .ok_or_else(|| ChecklistError::UnknownChecklist(name.to_string()))?;
    state.last_finished = None;
    state.done = false;
    Ok(())
}

pub fn reset_all() {
    for state in registry().write().unwrap().values_mut() {
        state.last_finished = None;
        state.done = false;
    }
}

/// Introspection snapshot.
pub fn snapshot() -> serde_json::Value {
    let reg = registry().read().unwrap();
    let lists: serde_json::Map<String, serde_json::Value> = reg
        .iter()
        .map(|(name, state)| {
            (
                name.clone(),
                serde_json::json!({
                    "steps": state.steps,
                    "progress": state.last_finished.map_or(0, |i| i + 1),
                    "done": state.done,
                }),
            )
        })
        .collect();
    serde_json::Value::Object(lists)
}

#[cfg(test)]
pub fn __test_reset() {
    registry().write().unwrap().clear();
}

/// Scoped step guard: verifies the step may begin on entry and checks it
/// off when dropped.
///
/// A step that turns out to be out of order at drop time halts, unless the
/// thread is already unwinding (a step abandoned by a panic should not mask
/// the original panic with its own).
#[must_use = "the step completes when the scope drops"]
pub struct StepScope {
    checklist: String,
    step: String,
}

impl StepScope {
    pub fn enter(checklist: &str, step: &str) -> Result<Self, ChecklistError> {
        let reg = registry().read().unwrap();
        let state = reg
            .get(checklist)
            .ok_or_else(|| ChecklistError::UnknownChecklist(checklist.to_string()))?;
        if state.done {
            return Err(ChecklistError::AlreadyDone {
                checklist: checklist.to_string(),
            });
        }
        let index = step_index(state, checklist, step)?;
        let expected = next_index(state);
        if index != expected {
            return Err(ChecklistError::OutOfOrder {
                checklist: checklist.to_string(),
                step: step.to_string(),
                expected: state.steps[expected].clone(),
            });
        }
        Ok(Self {
            checklist: checklist.to_string(),
            step: step.to_string(),
        })
    }
}

impl Drop for StepScope {
    fn drop(&mut self) {
        if let Err(err) = check_step(&self.checklist, &self.step) {
            if std::thread::panicking() {
                tracing::error!(%err, "step scope abandoned during unwind");
            } else {
                panic!("{err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn steps_complete_in_order() {
        __test_reset();
        register("boot", &["load", "spawn", "activate"]).unwrap();

        assert!(can_begin_step("boot", "load"));
        assert!(!can_begin_step("boot", "spawn"));
        assert_eq!(last_completed_step("boot"), "not started");

        check_step("boot", "load").unwrap();
        assert!(is_step_done("boot", "load"));
        assert!(!is_step_done("boot", "spawn"));
        assert_eq!(last_completed_step("boot"), "load");

        check_step("boot", "spawn").unwrap();
        check_step("boot", "activate").unwrap();
        assert!(is_done("boot"));
        assert_eq!(last_completed_step("boot"), "completed");
    }

    #[test]
    #[serial]
    fn out_of_order_step_is_rejected() {
        __test_reset();
        register("boot", &["load", "spawn", "activate"]).unwrap();

        let err = check_step("boot", "activate").unwrap_err();
        assert_eq!(
            err,
            ChecklistError::OutOfOrder {
                checklist: "boot".into(),
                step: "activate".into(),
                expected: "load".into(),
            }
        );
        // Progress is untouched after a rejected step.
        assert!(can_begin_step("boot", "load"));
    }

    #[test]
    #[serial]
    fn unknown_names_are_errors() {
        __test_reset();
        assert_eq!(
            check_step("missing", "load").unwrap_err(),
            ChecklistError::UnknownChecklist("missing".into())
        );

        register("boot", &["load"]).unwrap();
        assert_eq!(
            check_step("boot", "warp").unwrap_err(),
            ChecklistError::UnknownStep {
                checklist: "boot".into(),
                step: "warp".into(),
            }
        );
        assert!(!can_begin_step("missing", "load"));
        assert!(!is_step_done("boot", "warp"));
    }

    #[test]
    #[serial]
    fn duplicate_and_empty_registrations_are_rejected() {
        __test_reset();
        assert_eq!(
            register("boot", &["load", "load"]).unwrap_err(),
            ChecklistError::DuplicateStep {
                checklist: "boot".into(),
                step: "load".into(),
            }
        );
        assert_eq!(
            register("boot", &[]).unwrap_err(),
            ChecklistError::Empty {
                checklist: "boot".into(),
            }
        );
    }

    #[test]
    #[serial]
    fn completed_checklist_rejects_further_steps() {
        __test_reset();
        register("boot", &["load"]).unwrap();
        check_step("boot", "load").unwrap();
        assert_eq!(
            check_step("boot", "load").unwrap_err(),
            ChecklistError::AlreadyDone {
                checklist: "boot".into(),
            }
        );
    }

    #[test]
    #[serial]
    fn set_done_and_reset() {
        __test_reset();
        register("boot", &["load", "spawn"]).unwrap();
        set_done("boot").unwrap();
        assert!(is_done("boot"));
        assert!(is_step_done("boot", "spawn"));

        reset("boot").unwrap();
        assert!(!is_done("boot"));
        assert_eq!(last_completed_step("boot"), "not started");
        assert!(can_begin_step("boot", "load"));
    }

    #[test]
    #[serial]
    fn reset_all_keeps_registrations() {
        __test_reset();
        register("a", &["one"]).unwrap();
        register("b", &["one"]).unwrap();
        check_step("a", "one").unwrap();
        reset_all();
        assert!(!is_done("a"));
        assert!(can_begin_step("a", "one"));
        assert!(can_begin_step("b", "one"));
    }

    #[test]
    #[serial]
    fn step_scope_completes_on_drop() {
        __test_reset();
        register("boot", &["load", "spawn"]).unwrap();
        {
            let _scope = StepScope::enter("boot", "load").unwrap();
            assert!(!is_step_done("boot", "load"));
        }
        assert!(is_step_done("boot", "load"));

        assert!(matches!(
            StepScope::enter("boot", "load"),
            Err(ChecklistError::OutOfOrder { .. })
        ));
    }

    #[test]
    #[serial]
    fn snapshot_reflects_progress() {
        __test_reset();
        register("boot", &["load", "spawn"]).unwrap();
        check_step("boot", "load").unwrap();
        let snap = snapshot();
        assert_eq!(snap["boot"]["progress"], 1);
        assert_eq!(snap["boot"]["done"], false);
    }
}
