//! Shared value types used across the starscape crates.

mod types;

pub use types::{Color, NodeId, Transform, Viewport};
