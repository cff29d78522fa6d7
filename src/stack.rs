//! Host stack guard for the recursive evaluator and reader.
//!
//! Procedure calls recurse on the host stack. The `stacker` crate grows it
//! on demand so that the configured call depth, not the thread's stack
//! size, decides when recursion fails.

/// Minimum stack space to keep available (100KB red zone).
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
