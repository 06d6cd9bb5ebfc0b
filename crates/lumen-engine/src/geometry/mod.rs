//! Geometry catalog.
//!
//! A fixed set of named shapes, each producing interleaved `f32` vertices with
//! a declared layout and topology. Everything here is pure CPU data; uploading
//! happens in `resources`.

mod catalog;
mod layout;

pub use catalog::{Geometry, GeometryKind, UnknownShape};
pub use layout::{Topology, VertexAttribute, VertexLayout};
