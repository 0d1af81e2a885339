use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use rustc_hash::{FxHashMap, FxHasher};
use tracing::info;

use crate::error::{BoundaryError, Result};
use crate::fragment::csr_fragment::Fragment;
use crate::fragment::loader::GraphFile;
use crate::fragment::vertex_map::VertexMap;
use crate::types::{Fid, Gid, Oid};

pub mod csr_fragment;
pub mod id_parser;
pub mod loader;
pub mod vertex_map;

/// Decides which fragment owns a vertex.
pub trait Partitioner: Sync {
    fn fnum(&self) -> usize;
    fn get_partition_id(&self, oid: &Oid) -> Fid;
}

/// Assigns each vertex to `hash(oid) % fnum`.
///
/// `FxHasher` is unseeded, so the assignment is the same on every run.
#[derive(Clone, Copy, Debug)]
pub struct HashPartitioner {
    fnum: usize,
}

impl HashPartitioner {
    pub fn new(fnum: usize) -> Self {
        Self { fnum }
    }
}

impl Partitioner for HashPartitioner {
    fn fnum(&self) -> usize {
        self.fnum
    }

    fn get_partition_id(&self, oid: &Oid) -> Fid {
        let mut hasher = FxHasher::default();
        oid.hash(&mut hasher);
        (hasher.finish() % self.fnum as u64) as Fid
    }
}

/// Places listed vertices on the given fragments and hashes everything else.
#[derive(Clone, Debug)]
pub struct ExplicitPartitioner {
    assignment: FxHashMap<Oid, Fid>,
    fallback: HashPartitioner,
}

impl ExplicitPartitioner {
    pub fn new<I>(fnum: usize, assignment: I) -> Self
    where
        I: IntoIterator<Item = (Oid, Fid)>,
    {
        Self {
            assignment: assignment.into_iter().collect(),
            fallback: HashPartitioner::new(fnum),
        }
    }
}

impl Partitioner for ExplicitPartitioner {
    fn fnum(&self) -> usize {
        self.fallback.fnum()
    }

    fn get_partition_id(&self, oid: &Oid) -> Fid {
        match self.assignment.get(oid) {
            Some(&fid) if fid < self.fnum() => fid,
            _ => self.fallback.get_partition_id(oid),
        }
    }
}

/// A graph split into edge-cut fragments that share one vertex map.
#[derive(Debug)]
pub struct PartitionedGraph {
    vertex_map: Arc<VertexMap>,
    fragments: Vec<Arc<Fragment>>,
    edge_num: usize,
}

impl PartitionedGraph {
    /// Builds every fragment of the graph.
    ///
    /// Vertices are numbered in the order they first appear in `vertices`, then in
    /// `edges`; edge endpoints that are not listed as vertices are added implicitly.
    /// Fragments are built in parallel.
    pub fn build<P: Partitioner>(
        vertices: &[Oid],
        edges: &[(Oid, Oid)],
        partitioner: &P,
    ) -> Result<Self> {
        let fnum = partitioner.fnum();
        if fnum == 0 {
            return Err(BoundaryError::InvalidConfig(
                "a graph needs at least one fragment".to_string(),
            ));
        }

        // Step 1. Register every vertex with its owning fragment.
        let mut vertex_map = VertexMap::new(fnum);
        let endpoints = edges.iter().flat_map(|(src, dst)| [src, dst]);
        for oid in vertices.iter().chain(endpoints) {
            if vertex_map.get_gid(oid).is_none() {
                let fid = partitioner.get_partition_id(oid);
                vertex_map.add_vertex(fid, oid.clone());
            }
        }
        let max_lid = vertex_map.id_parser().max_local_id() as usize;
        if (0..fnum).any(|fid| vertex_map.inner_vertex_num(fid) > max_lid) {
            return Err(BoundaryError::InvalidConfig(format!(
                "a fragment holds more than {} vertices",
                max_lid
            )));
        }

        // Step 2. Translate the edges into global ids.
        let gid_edges = edges
            .iter()
            .filter_map(|(src, dst)| Some((vertex_map.get_gid(src)?, vertex_map.get_gid(dst)?)))
            .collect::<Vec<(Gid, Gid)>>();

        // Step 3. Build the fragments.
        let vertex_map = Arc::new(vertex_map);
        let fragments = (0..fnum)
            .into_par_iter()
            .map(|fid| Arc::new(Fragment::build(fid, vertex_map.clone(), &gid_edges)))
            .collect::<Vec<_>>();

        info!(
            fnum,
            vertices = vertex_map.total_vertex_num(),
            edges = gid_edges.len(),
            "partitioned graph built"
        );
        Ok(Self {
            vertex_map,
            fragments,
            edge_num: gid_edges.len(),
        })
    }

    /// Builds the graph with a [`HashPartitioner`] over `fnum` fragments.
    pub fn build_hashed(vertices: &[Oid], edges: &[(Oid, Oid)], fnum: usize) -> Result<Self> {
        Self::build(vertices, edges, &HashPartitioner::new(fnum))
    }

    /// Loads a graph file and hash-partitions it into `fnum` fragments.
    pub fn from_graph_file<P: AsRef<Path>>(path: P, fnum: usize) -> Result<Self> {
        let graph = GraphFile::from_path(path)?;
        Self::build_hashed(&graph.vertices, &graph.edges, fnum)
    }

    pub fn fnum(&self) -> usize {
        self.fragments.len()
    }

    pub fn fragment(&self, fid: Fid) -> Option<&Arc<Fragment>> {
        self.fragments.get(fid)
    }

    pub fn fragments(&self) -> &[Arc<Fragment>] {
        &self.fragments
    }

    pub fn vertex_map(&self) -> &Arc<VertexMap> {
        &self.vertex_map
    }

    pub fn total_vertex_num(&self) -> usize {
        self.vertex_map.total_vertex_num()
    }

    pub fn edge_num(&self) -> usize {
        self.edge_num
    }
}
