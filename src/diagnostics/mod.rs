//! Diagnostics for tolerated misuse and resource exhaustion.
//!
//! Most failures are already reported through `Result`/`bool` return
//! values. Diagnostics add a code, a message and a hint, written to the
//! `log` facade, so that silent no-ops (an invalid handle passed to
//! `free`, for example) still leave a trace.
//!
//! | Code  | Meaning                    |
//! |-------|----------------------------|
//! | FS0xx | Frame store (push/pop)     |
//! | FS1xx | Block allocation           |
//! | FS2xx | Handles and finalizers     |
//! | FS9xx | Configuration              |

pub mod emit;
pub mod kind;
pub mod macros;
pub mod strict;

pub use emit::{emit, emit_with_context, set_thread_sink, suppress_diagnostics, CollectingSink, DiagnosticSink};
pub use kind::{Diagnostic, DiagnosticKind};
pub use strict::{init_from_env, set_strict_mode, strict_mode, StrictMode, StrictModeGuard};

pub use kind::{FS001, FS002, FS101, FS102, FS103, FS104, FS105, FS201, FS202, FS901};
