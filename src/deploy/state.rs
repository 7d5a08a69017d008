// ABOUTME: Deployment state marker types for the type state pattern.
// ABOUTME: Zero-sized types enforce valid state transitions at compile time.

/// Colors resolved, nothing started yet.
/// Available actions: `launch()`, `abort()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Resolved;

/// Target color's stack is up.
/// Available actions: `await_healthy()`, `abort()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Launched;

/// Target API reported healthy.
/// Available actions: `maintain()`, `abort()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Healthy;

/// Maintenance steps done; the database is on the new schema.
/// Available actions: `cutover()`, `abort()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Maintained;

/// Proxy now routes to the target color.
/// Available actions: `cleanup()`
#[derive(Debug, Clone, Copy, Default)]
pub struct CutOver;

/// Retired colors torn down.
/// Available actions: `finish()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Completed;

/// States from which a failed deployment can still be abandoned without
/// affecting live traffic.
///
/// Once traffic has moved there is nothing left to abort:
///
/// ```compile_fail
/// use switchyard::deploy::{Abortable, CutOver};
///
/// fn abortable<S: Abortable>() {}
/// abortable::<CutOver>();
/// ```
pub trait Abortable: private::Sealed {}

impl Abortable for Resolved {}
impl Abortable for Launched {}
impl Abortable for Healthy {}
impl Abortable for Maintained {}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Resolved {}
    impl Sealed for super::Launched {}
    impl Sealed for super::Healthy {}
    impl Sealed for super::Maintained {}
}
