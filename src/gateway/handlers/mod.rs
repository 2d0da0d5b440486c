//! Gateway HTTP handlers.

mod notify;
mod status;

pub use notify::{notify_handler, status_for};
pub use status::status_handler;
