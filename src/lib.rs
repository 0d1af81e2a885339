//! Edge boundary of vertex sets over an edge-cut partitioned graph.
//!
//! Every fragment of the graph runs on its own worker. Each worker resolves the
//! requested vertex lists, scans the out-edges of the vertices it owns, and joins an
//! all-gather; the coordinator merges the gathered boundaries and encodes them as a
//! `(edge_count, 2)` matrix of external ids.

pub mod algorithms;
pub mod comm;
pub mod config;
pub mod error;
pub mod fragment;
pub mod types;
pub mod worker;

pub use algorithms::edge_boundary::{
    EdgeBoundary, EdgeBoundaryAlgo, EdgeBoundaryConfig, EdgeBoundaryController,
};
pub use error::{BoundaryError, Result};
pub use fragment::PartitionedGraph;
pub use types::{Oid, ResultMatrix};
