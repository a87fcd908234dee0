//! Embassy async tasks
//!
//! The poll task owns the bus side of the link; the link task is the
//! application side and never touches the bus.

pub mod link;
pub mod poll;

pub use link::link_task;
pub use poll::poll_task;
