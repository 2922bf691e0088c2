//! Convenience re-exports for common use.

pub use crate::auth::{AuthedUser, Authorizer, RequestContext};
pub use crate::config::WeirConfig;
pub use crate::error::{Result, WeirError};
pub use crate::model::{ChatModel, ModelDelta, ModelRequest, ToolDefinition};
pub use crate::reconcile::guard::guard_message;
pub use crate::reconcile::ReconcileBuffer;
pub use crate::service::{TurnHandle, TurnRequest, TurnService};
pub use crate::store::MessageStore;
pub use crate::tee::{LiveSink, StreamTee};
pub use crate::tools::{FnTool, Tool, ToolInput, ToolParameters, ToolRegistry};
pub use crate::types::{
    ChatMessage, ContentPart, FinishReason, Role, Thread, ToolState, TurnEvent, Usage,
};
