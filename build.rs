//! Build script for framestack.
//!
//! Warns about debug features in release builds.

use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_DEBUG");

    let debug_enabled = env::var("CARGO_FEATURE_DEBUG").is_ok();
    let is_release = env::var("PROFILE").map(|p| p == "release").unwrap_or(false);

    if debug_enabled && is_release {
        println!("cargo:warning=[framestack] 'debug' feature enabled in a release build");
        println!("cargo:warning=[framestack]    released memory is poisoned by default; this costs a write per byte");
    }
}
