// ABOUTME: Sealed marker for the runtime capability traits.
// ABOUTME: Keeps implementations inside the crate so the traits can grow freely.

/// Implemented only by `BollardRuntime` and the crate's test host.
pub trait Sealed {}
