//! Task progress broker: a process-resident table of task records with a
//! pull-style HTTP ingress and a push-style WebSocket egress. Every applied
//! update re-broadcasts the full snapshot to all connected observers.

pub mod server;
pub mod state;

pub use server::{router, serve};
pub use state::{Broker, TaskRecord};
