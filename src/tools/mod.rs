//! Tool system: capability trait, registry, schema builder.

pub mod input;
pub mod registry;
pub mod tool;
pub mod types;

pub use input::ToolInput;
pub use registry::ToolRegistry;
pub use tool::{FnTool, Tool, ToolContext};
pub use types::ToolParameters;
