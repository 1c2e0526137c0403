//! Diagnostic kinds and predefined codes.

/// The severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    /// A tolerated misuse, such as an invalid handle passed to `free`.
    Warning,
    /// The operation could not be performed.
    Error,
}

impl DiagnosticKind {
    /// Get the display prefix for this kind.
    pub fn prefix(&self) -> &'static str {
        match self {
            DiagnosticKind::Warning => "warning",
            DiagnosticKind::Error => "error",
        }
    }

    /// The `log` level diagnostics of this kind are written at.
    pub fn log_level(&self) -> log::Level {
        match self {
            DiagnosticKind::Warning => log::Level::Warn,
            DiagnosticKind::Error => log::Level::Error,
        }
    }
}

/// A diagnostic message with code and optional help.
///
/// Codes follow the pattern:
/// - `FS0xx` - frame store (push/pop)
/// - `FS1xx` - block allocation
/// - `FS2xx` - handles, lowering and finalizers
/// - `FS9xx` - configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity level.
    pub kind: DiagnosticKind,
    /// Diagnostic code (e.g., "FS001").
    pub code: &'static str,
    /// Primary message.
    pub message: &'static str,
    /// Optional fix suggestion.
    pub help: Option<&'static str>,
}

impl Diagnostic {
    pub const fn error(code: &'static str, message: &'static str) -> Self {
        Self {
            kind: DiagnosticKind::Error,
            code,
            message,
            help: None,
        }
    }

    pub const fn warning(code: &'static str, message: &'static str) -> Self {
        Self {
            kind: DiagnosticKind::Warning,
            code,
            message,
            help: None,
        }
    }

    /// Add a help message to this diagnostic.
    pub const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

// =============================================================================
// FS0xx - Frame store
// =============================================================================

/// FS001: push on a full stack.
pub const FS001: Diagnostic = Diagnostic::warning("FS001", "frame stack is at its maximum depth")
    .with_help("pop frames before pushing, or raise StackConfig::max_depth");

/// FS002: frame storage could not be allocated.
pub const FS002: Diagnostic = Diagnostic::error("FS002", "failed to allocate storage for a new frame");

// =============================================================================
// FS1xx - Blocks
// =============================================================================

/// FS101: allocation or registration with no frame pushed.
pub const FS101: Diagnostic = Diagnostic::error("FS101", "no frame to allocate into")
    .with_help("call push() before allocating or registering");

/// FS102: the system allocator failed.
pub const FS102: Diagnostic = Diagnostic::error("FS102", "out of memory");

/// FS103: realloc on memory the stack does not own.
pub const FS103: Diagnostic = Diagnostic::warning("FS103", "cannot resize a block the stack does not own")
    .with_help("only blocks from alloc/alloc_zeroed/alloc_value can be reallocated");

/// FS104: a frame's slot list could not grow.
pub const FS104: Diagnostic = Diagnostic::error("FS104", "failed to grow frame slot storage");

/// FS105: realloc on a block holding a typed value.
pub const FS105: Diagnostic = Diagnostic::warning("FS105", "cannot resize a block holding a typed value")
    .with_help("free it and place a new value, or use alloc for resizable memory");

// =============================================================================
// FS2xx - Handles
// =============================================================================

/// FS201: invalid or stale handle.
pub const FS201: Diagnostic = Diagnostic::warning("FS201", "handle does not refer to a live block")
    .with_help("the block was freed, lowered, or its frame was popped");

/// FS202: pointer finalizer on a block with no data.
pub const FS202: Diagnostic = Diagnostic::warning("FS202", "block has no data to pass to a pointer finalizer")
    .with_help("use set_void_finalizer for blocks created by register_void");

// =============================================================================
// FS9xx - Configuration
// =============================================================================

/// FS901: configuration field out of range, default used instead.
pub const FS901: Diagnostic = Diagnostic::warning("FS901", "invalid stack configuration, using defaults")
    .with_help("check StackConfig::validate() before constructing the stack");
