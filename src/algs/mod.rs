//! Graph structures derived from mesh connectivity.

pub mod adjacency_graph;

pub use adjacency_graph::{ConnectivityTable, CsrGraph, NodalGraph};
