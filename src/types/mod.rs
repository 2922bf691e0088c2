//! Core types for Weir.

pub mod event;
pub mod message;
pub mod usage;

pub use event::*;
pub use message::*;
pub use usage::*;
