//! # Runline Common
//!
//! Common types, utilities, and shared abstractions for runline.
//!
//! This crate provides foundational types used across all runline subsystems:
//! - Point and forward-axis helpers
//! - ID types (SegmentId, PropId, AssetKey)
//! - The fixed-capacity ring pool used for idle instances
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;
pub mod ids;
pub mod ring_pool;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::ring_pool::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_id_generation() {
        let id1 = SegmentId::next();
        let id2 = SegmentId::next();
        assert_ne!(id1, id2);
        assert!(id1.to_string().starts_with("seg#"));
    }

    #[test]
    fn test_distance_behind_along_forward() {
        let agent = Point3::new(0.0, 0.0, 30.0);
        let segment = Point3::new(2.0, 0.0, 0.0);
        let behind = distance_behind(agent, segment, Point3::Z);
        assert!((behind - 30.0).abs() < 1e-5);
    }
}
