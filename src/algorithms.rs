pub mod edge_boundary;
