//! Value model and in-memory labeled property graph store.
//!
//! This crate is the bottom of the stack: a dynamic [`value::Value`], an
//! order-preserving [`property::PropertyMap`], and the [`graph::Graph`]
//! store built on top of them. Nothing here knows about schemas, rules, or
//! expressions — those are layered on by the sibling crates.

pub mod error;
pub mod graph;
pub mod property;
pub mod value;

pub use error::{StoreError, StoreResult};
pub use graph::{Edge, EdgeKey, Graph, GraphStats, Node};
pub use property::PropertyMap;
pub use value::Value;
