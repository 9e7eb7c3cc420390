//! Reusable UI components.

pub mod investigation_graph;
