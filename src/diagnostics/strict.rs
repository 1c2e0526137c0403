//! Strict mode: turn diagnostics into panics.
//!
//! Useful in CI to make invalid handle use fatal instead of a logged no-op.
//! The mode is per thread, like the stacks it applies to.

use std::cell::Cell;

use super::kind::DiagnosticKind;

/// Strict mode behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StrictMode {
    /// Just log.
    Warn = 0,
    /// Panic on errors.
    PanicOnError = 1,
    /// Panic on errors and warnings.
    PanicOnWarning = 2,
}

impl From<u8> for StrictMode {
    fn from(val: u8) -> Self {
        match val {
            1 => StrictMode::PanicOnError,
            2 => StrictMode::PanicOnWarning,
            _ => StrictMode::Warn,
        }
    }
}

thread_local! {
    static STRICT_MODE: Cell<u8> = const { Cell::new(0) };
}

/// Set the strict mode for the current thread.
pub fn set_strict_mode(mode: StrictMode) {
    STRICT_MODE.with(|m| m.set(mode as u8));
}

/// Get the current thread's strict mode.
pub fn strict_mode() -> StrictMode {
    StrictMode::from(STRICT_MODE.with(Cell::get))
}

/// Whether a diagnostic of `kind` should panic under the current mode.
pub fn should_panic(kind: DiagnosticKind) -> bool {
    match strict_mode() {
        StrictMode::Warn => false,
        StrictMode::PanicOnError => kind == DiagnosticKind::Error,
        StrictMode::PanicOnWarning => kind >= DiagnosticKind::Warning,
    }
}

/// RAII guard for temporarily setting strict mode.
pub struct StrictModeGuard {
    previous: StrictMode,
}

impl StrictModeGuard {
    pub fn new(mode: StrictMode) -> Self {
        let previous = strict_mode();
        set_strict_mode(mode);
        Self { previous }
    }

    pub fn panic_on_error() -> Self {
        Self::new(StrictMode::PanicOnError)
    }

    pub fn panic_on_warning() -> Self {
        Self::new(StrictMode::PanicOnWarning)
    }
}

impl Drop for StrictModeGuard {
    fn drop(&mut self) {
        set_strict_mode(self.previous);
    }
}

/// Parse a `FRAMESTACK_STRICT` value.
fn parse_mode(val: &str) -> StrictMode {
    match val.to_lowercase().as_str() {
        "1" | "error" | "true" => StrictMode::PanicOnError,
        "2" | "warning" | "all" => StrictMode::PanicOnWarning,
        _ => StrictMode::Warn,
    }
}

/// Initialize the current thread's strict mode from the `FRAMESTACK_STRICT`
/// environment variable.
///
/// - "0" or "warn" -> Warn
/// - "1" or "error" -> PanicOnError
/// - "2" or "warning" -> PanicOnWarning
pub fn init_from_env() {
    if let Ok(val) = std::env::var("FRAMESTACK_STRICT") {
        set_strict_mode(parse_mode(&val));
    }
}
