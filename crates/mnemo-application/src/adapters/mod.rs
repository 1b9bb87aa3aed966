//! Entry adapters: the chat and insight front doors, plus reply rendering.

mod insight;
mod interactive;
pub mod render;

pub use insight::{InsightAdapter, InsightRejection};
pub use interactive::{ACCESS_DENIED, GREETING, InteractiveAdapter, InteractiveEvent};
