//! Diagnostic macros.

/// Emit a predefined diagnostic, optionally with formatted context.
///
/// # Example
///
/// ```rust,ignore
/// fs_emit!(FS101);
/// fs_emit!(FS201, "{}", loc);
/// ```
#[macro_export]
macro_rules! fs_emit {
    ($code:ident) => {
        $crate::diagnostics::emit::emit(&$crate::diagnostics::$code)
    };
    ($code:ident, $($ctx:tt)+) => {
        $crate::diagnostics::emit::emit_with_context(
            &$crate::diagnostics::$code,
            &format!($($ctx)+),
        )
    };
}
