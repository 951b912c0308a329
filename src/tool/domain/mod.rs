//! Domain model for invocable tools.
//!
//! A tool couples a validated name, a JSON input schema, and an optional
//! executor. Execution is bounded by a per-tool timeout and may be cancelled
//! by the caller; the four outcomes are reported distinctly through
//! [`ToolExecutionError`].

mod error;
mod executor;
mod name;
mod result;
mod tool;

pub use error::{ExecutorError, ToolDomainError, ToolExecutionError};
pub use executor::{FnExecutor, ToolExecutor};
pub use name::ToolName;
pub(crate) use name::{MAX_NAME_LENGTH, matches_name_pattern};
pub use result::{HANDLER_NOT_CONFIGURED, ToolContent, ToolResult};
pub use tool::{DEFAULT_TOOL_TIMEOUT, RateLimit, Tool, ToolDescriptor};
