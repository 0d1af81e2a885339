use std::collections::BTreeSet;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::{debug, info};

use crate::comm::Communicator;
use crate::config::COORDINATOR_FID;
use crate::error::{BoundaryError, Result};
use crate::fragment::PartitionedGraph;
use crate::types::graph_query::FragmentQuery;
use crate::types::{BoundaryEdgeSet, Fid, Gid, Oid, ResultMatrix};
use crate::worker::{run_workers, ParallelApp};

/// Configuration for the edge boundary computation.
///
/// # Fields
///
/// * `coordinator` - The fragment whose worker merges and encodes the result.
#[derive(Clone, Debug)]
pub struct EdgeBoundaryConfig {
    pub coordinator: Fid,
}

impl Default for EdgeBoundaryConfig {
    fn default() -> Self {
        Self {
            coordinator: COORDINATOR_FID,
        }
    }
}

/// The two vertex lists of a boundary request, as JSON arrays of external ids.
///
/// A missing or blank `nbunch2` asks for the edges leaving `nbunch1`; otherwise the
/// request is for the edges going from `nbunch1` into `nbunch2`.
#[derive(Clone, Debug)]
pub struct BoundaryQuery {
    pub nbunch1: String,
    pub nbunch2: Option<String>,
}

impl BoundaryQuery {
    pub fn new(nbunch1: &str, nbunch2: Option<&str>) -> Self {
        Self {
            nbunch1: nbunch1.to_string(),
            nbunch2: nbunch2.map(str::to_string),
        }
    }
}

/// Decodes a JSON array of integer or string vertex ids.
pub fn parse_vertex_list(payload: &str) -> Result<Vec<Oid>> {
    Ok(serde_json::from_str::<Vec<Oid>>(payload)?)
}

/// Translates external ids into a set of global ids. Ids that are not vertices of the
/// graph are dropped.
pub fn resolve_vertex_set<F: FragmentQuery>(frag: &F, oid_list: &[Oid]) -> FxHashSet<Gid> {
    oid_list.iter().filter_map(|oid| frag.oid2gid(oid)).collect()
}

/// Decodes and resolves both vertex lists of a query into `(primary, secondary)`.
/// The secondary set is empty when `nbunch2` is absent or blank.
pub fn resolve_query<F: FragmentQuery>(
    frag: &F,
    query: &BoundaryQuery,
) -> Result<(FxHashSet<Gid>, FxHashSet<Gid>)> {
    let primary = resolve_vertex_set(frag, &parse_vertex_list(&query.nbunch1)?);
    let secondary = match query.nbunch2.as_deref() {
        Some(payload) if !payload.trim().is_empty() => {
            resolve_vertex_set(frag, &parse_vertex_list(payload)?)
        }
        _ => FxHashSet::default(),
    };
    Ok((primary, secondary))
}

/// Collects the boundary edges whose source is an inner vertex of this fragment.
///
/// For every primary vertex owned here, each out-edge `(u, v)` is kept when
/// - `secondary` is empty and `v` is not in `primary`, or
/// - `secondary` is not empty and `v` is in `secondary`.
///
/// Primary vertices owned by other fragments are left to their owners.
pub fn scan_local_boundary<F: FragmentQuery>(
    frag: &F,
    primary: &FxHashSet<Gid>,
    secondary: &FxHashSet<Gid>,
) -> BoundaryEdgeSet {
    let mut boundary = BoundaryEdgeSet::new();
    for &gid in primary {
        let Some(u) = frag.inner_vertex_gid2vertex(gid) else {
            continue;
        };
        for &v in frag.outgoing_adj(u) {
            let v_gid = frag.vertex2gid(v);
            let crosses = if secondary.is_empty() {
                !primary.contains(&v_gid)
            } else {
                secondary.contains(&v_gid)
            };
            if crosses {
                boundary.insert((gid, v_gid));
            }
        }
    }
    boundary
}

/// Gathers every worker's boundary and unions them on the coordinator.
///
/// Every worker must call this, since the gather is a collective.
///
/// # Returns
///
/// The merged boundary on the coordinator, `None` on every other worker.
pub fn merge_boundary<C: Communicator>(
    comm: &mut C,
    local: BoundaryEdgeSet,
    coordinator: Fid,
) -> Result<Option<BoundaryEdgeSet>> {
    let all_boundary = comm.all_gather(&local)?;
    if comm.worker_id() != coordinator {
        return Ok(None);
    }

    let mut merged = local;
    for (fid, remote) in all_boundary.into_iter().enumerate() {
        if fid != coordinator {
            merged.extend(remote);
        }
    }
    Ok(Some(merged))
}

/// Translates a merged boundary into a `(edge_count, 2)` matrix of external ids, in the
/// boundary's iteration order.
///
/// Every global id in the boundary came from the vertex map, so a failed lookup means
/// the ids were corrupted and is reported as [`BoundaryError::UnknownGlobalId`].
pub fn encode_boundary<F: FragmentQuery>(
    frag: &F,
    boundary: &BoundaryEdgeSet,
) -> Result<ResultMatrix> {
    let to_oid = |gid: Gid| frag.gid2oid(gid).ok_or(BoundaryError::UnknownGlobalId(gid));
    let rows = boundary
        .iter()
        .map(|&(src, dst)| -> Result<(Oid, Oid)> { Ok((to_oid(src)?, to_oid(dst)?)) })
        .collect::<Result<Vec<_>>>()?;
    Ok(ResultMatrix::from_rows(rows))
}

/// The edge boundary application.
///
/// All work happens in `peval`: resolve the vertex lists, scan the local out-edges,
/// merge on the coordinator and encode there. `inc_eval` has nothing to do.
pub struct EdgeBoundary {
    query: BoundaryQuery,
    coordinator: Fid,
}

impl EdgeBoundary {
    pub fn new(query: BoundaryQuery, coordinator: Fid) -> Self {
        Self { query, coordinator }
    }
}

impl ParallelApp for EdgeBoundary {
    /// The encoded boundary on the coordinator, `None` elsewhere.
    type Output = Option<ResultMatrix>;

    fn peval<F, C>(&self, frag: &F, comm: &mut C) -> Result<Self::Output>
    where
        F: FragmentQuery,
        C: Communicator,
    {
        let fid = frag.fid();
        let (primary, secondary) = resolve_query(frag, &self.query)?;
        let local = scan_local_boundary(frag, &primary, &secondary);
        debug!(
            fid,
            primary = primary.len(),
            secondary = secondary.len(),
            local_edges = local.len(),
            "local boundary scanned"
        );

        let Some(merged) = merge_boundary(comm, local, self.coordinator)? else {
            return Ok(None);
        };
        let matrix = encode_boundary(frag, &merged)?;
        info!(fid, edges = matrix.edge_count(), "edge boundary merged");
        Ok(Some(matrix))
    }
}

/// Trait for computing the edge boundary of vertex sets in a partitioned graph.
///
/// # Methods
///
/// * `edge_boundary` - Returns the boundary edges as a flat `(edge_count, 2)` matrix.
/// * `edge_boundary_set` - Returns the same edges as a set of external id pairs.
pub trait EdgeBoundaryAlgo {
    fn edge_boundary(
        &self,
        nbunch1: &str,
        nbunch2: Option<&str>,
        config: EdgeBoundaryConfig,
    ) -> Result<ResultMatrix>;

    fn edge_boundary_set(
        &self,
        nbunch1: &str,
        nbunch2: Option<&str>,
        config: EdgeBoundaryConfig,
    ) -> Result<BTreeSet<(Oid, Oid)>> {
        let matrix = self.edge_boundary(nbunch1, nbunch2, config)?;
        Ok(matrix
            .rows()
            .map(|(src, dst)| (src.clone(), dst.clone()))
            .collect())
    }
}

/// Controller for edge boundary operations.
///
/// Runs one worker per fragment of the graph and returns the coordinator's result.
pub struct EdgeBoundaryController {
    graph: Arc<PartitionedGraph>,
}

impl EdgeBoundaryController {
    pub fn new(graph: Arc<PartitionedGraph>) -> Self {
        Self { graph }
    }
}

impl EdgeBoundaryAlgo for EdgeBoundaryController {
    fn edge_boundary(
        &self,
        nbunch1: &str,
        nbunch2: Option<&str>,
        config: EdgeBoundaryConfig,
    ) -> Result<ResultMatrix> {
        let coordinator = config.coordinator;
        if coordinator >= self.graph.fnum() {
            return Err(BoundaryError::InvalidConfig(format!(
                "coordinator {} is not a fragment id below {}",
                coordinator,
                self.graph.fnum()
            )));
        }

        let app = EdgeBoundary::new(BoundaryQuery::new(nbunch1, nbunch2), coordinator);
        let outputs = run_workers(self.graph.as_ref(), &app)?;
        outputs
            .into_iter()
            .nth(coordinator)
            .flatten()
            .ok_or_else(|| BoundaryError::Communication {
                worker: coordinator,
                reason: "coordinator produced no result".to_string(),
            })
    }
}
