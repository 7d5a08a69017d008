// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Colors, compose service names, and phantom-typed runtime IDs.

mod color;
mod id;
mod service_name;

pub use color::{Color, ParseColorError};
pub use id::{ContainerId, ExecId};
pub use service_name::{ServiceName, ServiceNameError};
