// ABOUTME: Identifiers for runtime objects, tagged by what they point at.
// ABOUTME: A container ID cannot be passed where an exec ID is expected.

use std::fmt;
use std::marker::PhantomData;

/// Tag for container identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerMarker {}

/// Tag for exec instance identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecMarker {}

/// Runtime-assigned identifier.
///
/// A container ID may hold either the hex ID or the container name; the
/// Docker API resolves both.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[must_use]
pub struct Id<T> {
    value: String,
    kind: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_inner(self) -> String {
        self.value
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

pub type ContainerId = Id<ContainerMarker>;
pub type ExecId = Id<ExecMarker>;
