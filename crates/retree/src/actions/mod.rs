//! Built-in action handlers.
//!
//! Each handler has the [`ActionHandler`](crate::ActionHandler) signature and
//! can be re-registered under another name or wrapped by a custom handler.

mod exclude;
mod replace;
mod transfer;

pub use exclude::exclude;
pub use replace::replace;
pub use transfer::{copy, rename};
