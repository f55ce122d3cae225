//! Mixify Core - playlist configuration stacks and the layering engine

pub mod config;
pub mod stack;
pub mod plan;
pub mod snapshot;
pub mod dot;
pub mod store;

pub use stack::{
    build_forest, layer_graph, layer_stacks, AssociationId, ConfigId, ConfigurationSet, Layer,
    PlaylistAssociation, PlaylistConfiguration, StackError, StackGraph, StackNode, StackResult,
};
pub use store::{StackEvent, StackStore};
