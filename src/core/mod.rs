//! Per-thread state.

pub mod tls;
