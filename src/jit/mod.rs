//! In-process execution of compiled units for the interactive session.

mod engine;
mod host;
mod value;

pub use engine::{ExecError, ExecutionEngine, ResourceTracker, Symbol, DEFAULT_MAX_DEPTH};
pub use host::{BufferHost, Host, StdHost};
pub use value::RtValue;
