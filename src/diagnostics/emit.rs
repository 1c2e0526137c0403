//! Diagnostic emission backend.
//!
//! Diagnostics go to the `log` facade and, if one is installed, to the
//! current thread's [`DiagnosticSink`].

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::kind::Diagnostic;
use super::strict::should_panic;

/// Global flag to keep diagnostics out of the log.
static DIAGNOSTICS_SUPPRESSED: AtomicBool = AtomicBool::new(false);

thread_local! {
    static SINK: RefCell<Option<Rc<dyn DiagnosticSink>>> = const { RefCell::new(None) };
}

/// Suppress log output for diagnostics. Sinks still receive them.
pub fn suppress_diagnostics(suppress: bool) {
    DIAGNOSTICS_SUPPRESSED.store(suppress, Ordering::Relaxed);
}

/// Check if diagnostics are suppressed.
pub fn is_suppressed() -> bool {
    DIAGNOSTICS_SUPPRESSED.load(Ordering::Relaxed)
}

/// Emit a diagnostic.
pub fn emit(diag: &Diagnostic) {
    dispatch(diag, None);
}

/// Emit a diagnostic with runtime context, such as the handle involved.
pub fn emit_with_context(diag: &Diagnostic, context: &str) {
    dispatch(diag, Some(context));
}

fn dispatch(diag: &Diagnostic, context: Option<&str>) {
    // Clone out of the slot so a sink can emit without a double borrow.
    let sink = SINK.with(|s| s.borrow().clone());
    if let Some(sink) = sink {
        sink.emit(diag, context);
    }

    if !is_suppressed() {
        write_to_log(diag, context);
    }

    if should_panic(diag.kind) {
        panic!(
            "[framestack][{}] {}{}\nStrict mode enabled - diagnostics are fatal.",
            diag.code,
            diag.message,
            context.map(|c| format!(" ({})", c)).unwrap_or_default()
        );
    }
}

fn write_to_log(diag: &Diagnostic, context: Option<&str>) {
    let level = diag.kind.log_level();
    match context {
        Some(context) => log::log!(
            level,
            "[{}] {}: {} ({})",
            diag.code,
            diag.kind.prefix(),
            diag.message,
            context
        ),
        None => log::log!(level, "[{}] {}: {}", diag.code, diag.kind.prefix(), diag.message),
    }

    if let Some(help) = diag.help {
        log::debug!("[{}]   help: {}", diag.code, help);
    }
}

/// Receives every diagnostic emitted on the thread it is installed on.
pub trait DiagnosticSink {
    /// Handle a diagnostic.
    fn emit(&self, diag: &Diagnostic, context: Option<&str>);
}

/// Install a sink for the current thread, returning the previous one.
pub fn set_thread_sink(sink: Option<Rc<dyn DiagnosticSink>>) -> Option<Rc<dyn DiagnosticSink>> {
    SINK.with(|s| std::mem::replace(&mut *s.borrow_mut(), sink))
}

/// A sink that collects diagnostics.
#[derive(Default)]
pub struct CollectingSink {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all collected diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Codes of the collected diagnostics, in emission order.
    pub fn codes(&self) -> Vec<&'static str> {
        self.diagnostics.borrow().iter().map(|d| d.code).collect()
    }

    /// Clear collected diagnostics.
    pub fn clear(&self) {
        self.diagnostics.borrow_mut().clear();
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, diag: &Diagnostic, _context: Option<&str>) {
        self.diagnostics.borrow_mut().push(diag.clone());
    }
}
