use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::fragment::id_parser::IdParser;
use crate::fragment::vertex_map::VertexMap;
use crate::types::graph_query::FragmentQuery;
use crate::types::{Fid, Gid, Oid, Vertex};

/// One partition of an edge-cut graph, stored as a pair of CSR blocks.
///
/// An edge is kept by the fragment owning its source (as an out-edge) and by the
/// fragment owning its target (as an in-edge), so each fragment sees both directions
/// of the adjacency of its inner vertices. Endpoints owned elsewhere become outer
/// vertices: they have local handles and global ids but no adjacency of their own.
#[derive(Debug)]
pub struct Fragment {
    /// The id of this fragment.
    fid: Fid,

    /// Number of inner vertices. Inner vertex `i` has handle `Vertex(i)`.
    ivnum: usize,

    /// The global id translator shared by all fragments of the graph.
    vertex_map: Arc<VertexMap>,

    /// Global ids of the outer vertices, sorted. Outer vertex `i` has handle
    /// `Vertex(ivnum + i)`.
    outer_gids: Vec<Gid>,

    /// Reverse of `outer_gids`, from global id to local handle.
    outer_index: FxHashMap<Gid, u64>,

    /// For inner vertex `i`, its out-neighbors are `out_neighbors[out_offsets[i]..out_offsets[i + 1]]`.
    out_offsets: Vec<usize>,
    out_neighbors: Vec<Vertex>,

    /// Same layout as the out-edges, for in-neighbors.
    in_offsets: Vec<usize>,
    in_neighbors: Vec<Vertex>,
}

impl Fragment {
    /// Builds fragment `fid` from the global edge list, keeping only the edges with at
    /// least one endpoint owned by `fid`.
    ///
    /// Neighbor order follows the order of `edges`. Parallel edges are kept.
    pub fn build(fid: Fid, vertex_map: Arc<VertexMap>, edges: &[(Gid, Gid)]) -> Self {
        let id_parser = *vertex_map.id_parser();
        let ivnum = vertex_map.inner_vertex_num(fid);
        let is_inner = |gid: Gid| id_parser.get_fragment_id(gid) == fid;

        // Step 1. Collect the outer vertices referenced by local edges.
        let mut outer_set = FxHashSet::default();
        for &(src, dst) in edges {
            match (is_inner(src), is_inner(dst)) {
                (true, false) => {
                    outer_set.insert(dst);
                }
                (false, true) => {
                    outer_set.insert(src);
                }
                _ => {}
            }
        }
        let mut outer_gids = outer_set.into_iter().collect::<Vec<_>>();
        outer_gids.sort_unstable();
        let outer_index = outer_gids
            .iter()
            .enumerate()
            .map(|(idx, &gid)| (gid, (ivnum + idx) as u64))
            .collect::<FxHashMap<_, _>>();

        // Every non-inner endpoint of a local edge was collected in step 1.
        let to_vertex = |gid: Gid| -> Vertex {
            if is_inner(gid) {
                Vertex(id_parser.get_local_id(gid))
            } else {
                let idx = outer_gids.binary_search(&gid).unwrap_or_else(|idx| idx);
                Vertex((ivnum + idx) as u64)
            }
        };

        // Step 2. Build the out-edge and in-edge CSR blocks of the inner vertices.
        let out_adj = edges
            .iter()
            .filter(|(src, _)| is_inner(*src))
            .map(|&(src, dst)| (id_parser.get_local_id(src) as usize, to_vertex(dst)))
            .collect::<Vec<_>>();
        let in_adj = edges
            .iter()
            .filter(|(_, dst)| is_inner(*dst))
            .map(|&(src, dst)| (id_parser.get_local_id(dst) as usize, to_vertex(src)))
            .collect::<Vec<_>>();
        let (out_offsets, out_neighbors) = build_csr(ivnum, &out_adj);
        let (in_offsets, in_neighbors) = build_csr(ivnum, &in_adj);

        Self {
            fid,
            ivnum,
            vertex_map,
            outer_gids,
            outer_index,
            out_offsets,
            out_neighbors,
            in_offsets,
            in_neighbors,
        }
    }

    pub fn inner_vertices(&self) -> impl Iterator<Item = Vertex> {
        (0..self.ivnum as u64).map(Vertex)
    }

    pub fn outer_vertices(&self) -> impl Iterator<Item = Vertex> {
        let ivnum = self.ivnum as u64;
        (ivnum..ivnum + self.outer_gids.len() as u64).map(Vertex)
    }

    /// Number of out-edges stored in this fragment.
    pub fn local_edge_num(&self) -> usize {
        self.out_neighbors.len()
    }

    pub fn id_parser(&self) -> &IdParser {
        self.vertex_map.id_parser()
    }
}

/// Lays `(local source, neighbor)` pairs out as CSR offsets and a neighbor list.
fn build_csr(ivnum: usize, adj: &[(usize, Vertex)]) -> (Vec<usize>, Vec<Vertex>) {
    let mut offsets = vec![0usize; ivnum + 1];
    for &(lid, _) in adj {
        offsets[lid + 1] += 1;
    }
    for lid in 0..ivnum {
        offsets[lid + 1] += offsets[lid];
    }

    let mut cursor = offsets.clone();
    let mut neighbors = vec![Vertex(0); adj.len()];
    for &(lid, neighbor) in adj {
        neighbors[cursor[lid]] = neighbor;
        cursor[lid] += 1;
    }
    (offsets, neighbors)
}

impl FragmentQuery for Fragment {
    fn fid(&self) -> Fid {
        self.fid
    }

    fn fnum(&self) -> usize {
        self.vertex_map.fnum()
    }

    fn inner_vertex_num(&self) -> usize {
        self.ivnum
    }

    fn outer_vertex_num(&self) -> usize {
        self.outer_gids.len()
    }

    fn is_inner_vertex(&self, vertex: Vertex) -> bool {
        (vertex.0 as usize) < self.ivnum
    }

    fn oid2gid(&self, oid: &Oid) -> Option<Gid> {
        self.vertex_map.get_gid(oid)
    }

    fn gid2oid(&self, gid: Gid) -> Option<Oid> {
        self.vertex_map.get_oid(gid)
    }

    /// # Panics
    ///
    /// Panics if the handle was not produced by this fragment.
    fn vertex2gid(&self, vertex: Vertex) -> Gid {
        if self.is_inner_vertex(vertex) {
            self.id_parser().generate_global_id(self.fid, vertex.0)
        } else {
            self.outer_gids[vertex.0 as usize - self.ivnum]
        }
    }

    fn inner_vertex_gid2vertex(&self, gid: Gid) -> Option<Vertex> {
        let id_parser = self.id_parser();
        if id_parser.get_fragment_id(gid) != self.fid {
            return None;
        }
        let lid = id_parser.get_local_id(gid);
        if (lid as usize) < self.ivnum {
            Some(Vertex(lid))
        } else {
            None
        }
    }

    fn gid2vertex(&self, gid: Gid) -> Option<Vertex> {
        self.inner_vertex_gid2vertex(gid)
            .or_else(|| self.outer_index.get(&gid).map(|&lid| Vertex(lid)))
    }

    fn outgoing_adj(&self, vertex: Vertex) -> &[Vertex] {
        if !self.is_inner_vertex(vertex) {
            return &[];
        }
        let lid = vertex.0 as usize;
        &self.out_neighbors[self.out_offsets[lid]..self.out_offsets[lid + 1]]
    }

    fn incoming_adj(&self, vertex: Vertex) -> &[Vertex] {
        if !self.is_inner_vertex(vertex) {
            return &[];
        }
        let lid = vertex.0 as usize;
        &self.in_neighbors[self.in_offsets[lid]..self.in_offsets[lid + 1]]
    }
}

#[cfg(test)]
mod test_csr_fragment {
    use std::sync::Arc;

    use crate::fragment::csr_fragment::Fragment;
    use crate::fragment::vertex_map::VertexMap;
    use crate::types::graph_query::FragmentQuery;
    use crate::types::{Oid, Vertex};

    /// Vertices 1 and 2 live on fragment 0, vertices 3 and 4 on fragment 1.
    /// Edges: 1->2, 2->3, 3->4, 1->4.
    fn two_fragments() -> (Fragment, Fragment) {
        let mut vertex_map = VertexMap::new(2);
        for (fid, oid) in [(0, 1), (0, 2), (1, 3), (1, 4)] {
            vertex_map.add_vertex(fid, Oid::Int(oid));
        }
        let gid = |oid: i64| vertex_map.get_gid(&Oid::Int(oid)).unwrap();
        let edges = vec![(gid(1), gid(2)), (gid(2), gid(3)), (gid(3), gid(4)), (gid(1), gid(4))];
        let vertex_map = Arc::new(vertex_map);
        (
            Fragment::build(0, vertex_map.clone(), &edges),
            Fragment::build(1, vertex_map, &edges),
        )
    }

    fn neighbor_oids(frag: &Fragment, adj: &[Vertex]) -> Vec<Oid> {
        adj.iter().map(|&v| frag.get_id(v).unwrap()).collect()
    }

    #[test]
    fn test_inner_and_outer_vertices() {
        let (frag0, frag1) = two_fragments();
        assert_eq!(frag0.inner_vertex_num(), 2);
        assert_eq!(frag0.outer_vertex_num(), 2);
        assert_eq!(frag1.inner_vertex_num(), 2);
        // Fragment 1 sees 2 (via 2->3) and 1 (via 1->4) as outer vertices.
        assert_eq!(frag1.outer_vertex_num(), 2);

        let outer_oids = frag0
            .outer_vertices()
            .map(|v| frag0.get_id(v).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(outer_oids, vec![Oid::Int(3), Oid::Int(4)]);
        assert!(frag0.inner_vertices().all(|v| frag0.is_inner_vertex(v)));
        assert!(frag0.outer_vertices().all(|v| !frag0.is_inner_vertex(v)));
    }

    #[test]
    fn test_adjacency() {
        let (frag0, frag1) = two_fragments();
        let v1 = frag0.inner_vertex_gid2vertex(frag0.oid2gid(&Oid::Int(1)).unwrap()).unwrap();
        assert_eq!(neighbor_oids(&frag0, frag0.outgoing_adj(v1)), vec![Oid::Int(2), Oid::Int(4)]);
        assert!(frag0.incoming_adj(v1).is_empty());

        let v4 = frag1.inner_vertex_gid2vertex(frag1.oid2gid(&Oid::Int(4)).unwrap()).unwrap();
        assert_eq!(neighbor_oids(&frag1, frag1.incoming_adj(v4)), vec![Oid::Int(3), Oid::Int(1)]);
        assert!(frag1.outgoing_adj(v4).is_empty());
        assert_eq!(frag0.local_edge_num() + frag1.local_edge_num(), 4);
    }

    #[test]
    fn test_ownership() {
        let (frag0, frag1) = two_fragments();
        let gid3 = frag0.oid2gid(&Oid::Int(3)).unwrap();
        assert_eq!(frag0.inner_vertex_gid2vertex(gid3), None);
        assert!(frag1.inner_vertex_gid2vertex(gid3).is_some());

        // Outer vertices resolve through gid2vertex but carry no adjacency.
        let outer = frag0.gid2vertex(gid3).unwrap();
        assert!(!frag0.is_inner_vertex(outer));
        assert_eq!(frag0.vertex2gid(outer), gid3);
        assert!(frag0.outgoing_adj(outer).is_empty());
    }
}
