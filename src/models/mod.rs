//! Data models for the calendar backend.
//!
//! Wire names are camelCase to match the web client's `Event` and `Task` interfaces.

mod event;
mod subscription;
mod task;

pub use event::*;
pub use subscription::*;
pub use task::*;
