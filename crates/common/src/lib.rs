//! Shared value types used across the seascape workspace.

pub mod types;

pub use types::{NodeId, Transform};
