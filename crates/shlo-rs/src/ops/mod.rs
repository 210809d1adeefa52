//! Lowering of StableHLO-style operators onto the portable backend
//! primitives.
//!
//! The index resolvers in [`gather`] and [`scatter`] are pure host-side
//! functions from descriptor plus index data to coordinate pairs; all
//! backend traffic is confined to the batched apply step at the end of
//! each operator, which keeps the resolvers unit-testable without any
//! backend at all.

pub mod common;
pub mod gather;
pub mod index_space;
pub mod scatter;
pub mod sort;

pub use gather::{gather, GatherDimensionNumbers, ResolvedGather};
pub use index_space::{Coordinate, IndexSpace, MAX_RANK};
pub use scatter::{scatter, ResolvedScatter, ScatterDimensionNumbers};
pub use sort::sort;
