//! Domain-error floodlight: the soft-failure counterpart to contract checks.
//!
//! Contract violations are programmer errors and halt immediately; domain
//! errors are content/configuration mistakes and get a budget instead. Every
//! warning or error spends points from a configurable budget and stays on an
//! active list until acknowledged; a `Critical` report, or an exhausted
//! budget, fires the exhaustion handler (which halts by default). The point
//! is to make domain errors impossible to ignore without forcing a crash on
//! the first one.
//!
//! Process-wide registry; reports are cheap and thread-safe. Resolution of
//! the invariant engine's own failures never routes through here.

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Spends `warning_cost` budget points.
    Warning,
    /// Spends `error_cost` budget points.
    Error,
    /// Bypasses the budget and fires the exhaustion handler immediately.
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }
}

/// One active domain error. Repeats of the same message/severity bump
/// `occurrences` instead of adding a new entry.
#[derive(Debug, Clone, Serialize)]
pub struct DomainError {
    pub message: String,
    pub context: String,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub occurrences: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub max_budget: u32,
    pub warning_cost: u32,
    pub error_cost: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_budget: 10,
            warning_cost: 1,
            error_cost: 3,
        }
    }
}

#[derive(Default)]
struct FloodlightState {
    initialized: bool,
    config: Config,
    errors: Vec<DomainError>,
    spent: u32,
}

type ExhaustedHandler = Box<dyn Fn(&str) + Send + Sync>;

static STATE: OnceCell<RwLock<FloodlightState>> = OnceCell::new();
static HANDLER: OnceCell<RwLock<ExhaustedHandler>> = OnceCell::new();

fn state_cell() -> &'static RwLock<FloodlightState> {
    STATE.get_or_init(|| RwLock::new(FloodlightState::default()))
}

fn handler_cell() -> &'static RwLock<ExhaustedHandler> {
    HANDLER.get_or_init(|| RwLock::new(Box::new(|msg| panic!("{msg}"))))
}

/// Arms the floodlight. Reports before `init` fall back to plain logging
/// and spend nothing.
pub fn init(config: Config) {
    let mut st = state_cell().write().unwrap();
    if st.initialized {
        warn!("floodlight already initialized");
        return;
    }
    st.config = config;
    st.spent = 0;
    st.errors.clear();
    st.initialized = true;
}

/// Disarms the floodlight and drops all active errors.
pub fn shutdown() {
    let mut st = state_cell().write().unwrap();
    st.initialized = false;
    st.errors.clear();
    st.spent = 0;
}

/// Replaces the budget-exhaustion handler (default: halt the process).
pub fn on_exhausted(handler: impl Fn(&str) + Send + Sync + 'static) {
    *handler_cell().write().unwrap() = Box::new(handler);
}

pub fn report_warning(message: impl Into<String>, context: impl Into<String>) {
    report_internal(message.into(), context.into(), Severity::Warning);
}

pub fn report_error(message: impl Into<String>, context: impl Into<String>) {
    report_internal(message.into(), context.into(), Severity::Error);
}

pub fn report_critical(message: impl Into<String>, context: impl Into<String>) {
    report_internal(message.into(), context.into(), Severity::Critical);
}

fn report_internal(message: String, context: String, severity: Severity) {
    let exhausted: Option<String> = {
        let mut st = state_cell().write().unwrap();
        if !st.initialized {
            error!(%message, %context, "domain error reported before floodlight init");
            return;
        }

        if severity == Severity::Critical {
            error!(%message, %context, "CRITICAL domain error");
            Some(format!("critical domain error: {message} ({context})"))
        } else {
            let cost = match severity {
                Severity::Warning => st.config.warning_cost,
                _ => st.config.error_cost,
            };

            if let Some(existing) = st
                .errors
                .iter_mut()
                .find(|e| e.message == message && e.severity == severity)
            {
                existing.occurrences += 1;
                existing.timestamp = Utc::now();
            } else {
                match severity {
                    Severity::Warning => warn!(
                        %message, %context,
                        budget = st.spent + cost, max = st.config.max_budget,
                        "domain warning"
                    ),
                    _ => error!(
                        %message, %context,
                        budget = st.spent + cost, max = st.config.max_budget,
                        "domain error"
                    ),
                }
                st.errors.push(DomainError {
                    message,
                    context,
                    timestamp: Utc::now(),
                    severity,
                    occurrences: 1,
                });
            }

            // Repeats still spend budget: a noisy error is still an error.
            st.spent += cost;
            if st.spent >= st.config.max_budget {
                Some(format!(
                    "domain error budget exhausted ({}/{})",
                    st.spent, st.config.max_budget
                ))
            } else {
                None
            }
        }
    };

    // Fire outside the lock so a handler that reports or inspects state
    // does not deadlock.
    if let Some(msg) = exhausted {
        (handler_cell().read().unwrap())(&msg);
    }
}

/// Clears the active error list. Spent budget is not refunded; the budget is
/// a lifetime count, not a list size.
pub fn clear_all() {
    state_cell().write().unwrap().errors.clear();
}

/// Removes one active error by index. Out-of-range indices are ignored.
pub fn acknowledge(index: usize) {
    let mut st = state_cell().write().unwrap();
    if index < st.errors.len() {
        st.errors.remove(index);
    }
}

pub fn current_budget() -> u32 {
    state_cell().read().unwrap().spent
}

pub fn max_budget() -> u32 {
    state_cell().read().unwrap().config.max_budget
}

pub fn has_active_errors() -> bool {
    !state_cell().read().unwrap().errors.is_empty()
}

pub fn active_errors() -> Vec<DomainError> {
    state_cell().read().unwrap().errors.clone()
}

/// Introspection snapshot.
pub fn snapshot() -> serde_json::Value {
    let st = state_cell().read().unwrap();
    serde_json::json!({
        "initialized": st.initialized,
        "budget": { "spent": st.spent, "max": st.config.max_budget },
        "errors": &st.errors,
    })
}

#[cfg(test)]
/// Test-only: back to an unarmed registry with the halting handler.
pub fn __test_reset() {
    {
        let mut st = state_cell().write().unwrap();
        *st = FloodlightState::default();
    }
    *handler_cell().write().unwrap() = Box::new(|msg| panic!("{msg}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::{Arc, Mutex};

    fn recording_handler() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) + Send + Sync) {
        let fired: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&fired);
        (fired, move |msg: &str| sink.lock().unwrap().push(msg.to_string()))
    }

    #[test]
    #[serial]
    fn budget_arithmetic_and_exhaustion() {
        __test_reset();
        let (fired, handler) = recording_handler();
        on_exhausted(handler);
        init(Config {
            max_budget: 5,
            warning_cost: 1,
            error_cost: 3,
        });

        report_warning("low ammo", "loadout");
        report_warning("low fuel", "loadout");
        assert_eq!(current_budget(), 2);
        assert!(fired.lock().unwrap().is_empty());

        report_error("missing mesh", "spawner");
        assert_eq!(current_budget(), 5);
        let fired = fired.lock().unwrap();
        assert_eq!(fired.len(), 1);
        assert!(fired[0].contains("exhausted (5/5)"));
    }

    #[test]
    #[serial]
    fn duplicates_coalesce_but_still_spend() {
        __test_reset();
        let (_fired, handler) = recording_handler();
        on_exhausted(handler);
        init(Config::default());

        report_warning("stale handle", "inventory");
        report_warning("stale handle", "inventory");
        report_warning("stale handle", "inventory");

        let errors = active_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].occurrences, 3);
        assert_eq!(current_budget(), 3);
    }

    #[test]
    #[serial]
    fn critical_bypasses_the_budget() {
        __test_reset();
        let (fired, handler) = recording_handler();
        on_exhausted(handler);
        init(Config::default());

        report_critical("save corrupted", "serializer");
        let fired = fired.lock().unwrap();
        assert_eq!(fired.len(), 1);
        assert!(fired[0].contains("save corrupted"));
        // The handler fires before anything lands on the active list.
        assert!(!has_active_errors());
        assert_eq!(current_budget(), 0);
    }

    #[test]
    #[serial]
    fn clear_does_not_refund_budget() {
        __test_reset();
        let (_fired, handler) = recording_handler();
        on_exhausted(handler);
        init(Config::default());

        report_warning("a", "ctx");
        report_error("b", "ctx");
        assert_eq!(current_budget(), 4);

        clear_all();
        assert!(!has_active_errors());
        assert_eq!(current_budget(), 4);
    }

    #[test]
    #[serial]
    fn acknowledge_removes_by_index() {
        __test_reset();
        let (_fired, handler) = recording_handler();
        on_exhausted(handler);
        init(Config::default());

        report_warning("first", "ctx");
        report_warning("second", "ctx");
        acknowledge(0);
        let errors = active_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "second");

        // Out of range is a no-op.
        acknowledge(10);
        assert_eq!(active_errors().len(), 1);
    }

    #[test]
    #[serial]
    fn reports_before_init_spend_nothing() {
        __test_reset();
        report_error("too early", "boot");
        assert!(!has_active_errors());
        assert_eq!(current_budget(), 0);
    }

    #[test]
    #[serial]
    fn snapshot_reflects_state() {
        __test_reset();
        let (_fired, handler) = recording_handler();
        on_exhausted(handler);
        init(Config::default());
        report_warning("w", "ctx");

        let snap = snapshot();
        assert_eq!(snap["budget"]["spent"], 1);
        assert_eq!(snap["budget"]["max"], 10);
        assert_eq!(snap["errors"][0]["message"], "w");
    }
}
