//! API surface and the scheduled auto-assign loop.

pub mod api;
#[cfg(feature = "tokio-runtime")]
pub mod scheduler;

pub use api::{health, ErrorBody, Health};
#[cfg(feature = "tokio-runtime")]
pub use scheduler::AutoAssignLoop;
