//! Native stack headroom for the recursive passes.
//!
//! Parsing, resolving and evaluating all recurse once per syntactic nesting
//! level, and evaluation also once per Lox call.  Each of those entry points
//! runs through [`ensure_sufficient_stack`], which moves onto a freshly
//! allocated segment when the current one is nearly exhausted.

/// Run `f`, first growing the stack if less than the red zone is left.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    /// Minimum stack space to keep available (128KB red zone).
    const RED_ZONE: usize = 128 * 1024;

    /// Size of each newly allocated segment (2MB).
    const STACK_PER_RECURSION: usize = 2 * 1024 * 1024;

    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
