//! Weir: streaming chat-turn engine.
//!
//! Streams a model's incremental output and tool invocations to a live
//! client while capturing the same event sequence into a reconciliation
//! buffer, so that every turn ends with exactly one durable, replayable
//! message that the strictest downstream provider API will accept.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use weir::prelude::*;
//!
//! # async fn example(model: Arc<dyn weir::model::ChatModel>) -> weir::error::Result<()> {
//! let registry = Arc::new(ToolRegistry::new());
//! let store = Arc::new(weir::store::MemoryStore::new());
//! let service = TurnService::new(
//!     model,
//!     registry,
//!     store,
//!     Arc::new(weir::auth::StaticAuthorizer::new("user-1")),
//!     WeirConfig::default(),
//! );
//!
//! let mut handle = service
//!     .submit(TurnRequest {
//!         context: Default::default(),
//!         thread_id: None,
//!         text: "Hello!".into(),
//!     })
//!     .await?;
//! while let Some(event) = handle.next_event().await {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod emitter;
pub mod error;
pub mod model;
pub mod prelude;
pub mod reconcile;
pub mod service;
pub mod store;
pub mod tee;
pub mod tools;
pub mod types;
