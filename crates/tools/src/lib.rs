//! The process-wide tool infrastructure: the Active Tool Registry (C10)
//! that tracks in-flight tool executions and can cancel them on demand,
//! and the Background Tool Scheduler (C11) that gives async-tool bodies
//! somewhere to keep running after their synchronous call has returned.

pub mod registry;
pub mod reserve_slot;
pub mod scheduler;

pub use registry::{ActiveToolRegistry, ToolSnapshot};
pub use scheduler::BackgroundToolScheduler;
