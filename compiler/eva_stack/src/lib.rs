//! On-demand stack growth for recursive compiler passes.
//!
//! Eva programs are trees of nested lists. The reader, the code generator
//! and the reference interpreter all walk them recursively, so a program
//! with thousands of nested forms (or a deeply recursive Eva function under
//! `--run`) would exhaust the default thread stack.
//!
//! Every recursion point calls [`maybe_grow`], which switches to a freshly
//! allocated segment when the remaining stack falls below [`RED_ZONE`].
//! On `wasm32` the call is a plain passthrough.

/// Remaining stack below which a new segment is allocated.
pub const RED_ZONE: usize = 128 * 1024;

/// Size of each freshly allocated stack segment.
pub const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run `f`, first growing the stack if less than [`RED_ZONE`] bytes remain.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn maybe_grow<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn maybe_grow<R>(f: impl FnOnce() -> R) -> R {
    f()
}
