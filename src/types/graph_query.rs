use crate::types::{Fid, Gid, Oid, Vertex};

/// A trait that defines the query operations a fragment exposes to graph applications.
///
/// A fragment owns a disjoint share of the vertices of a partitioned graph (its inner
/// vertices) together with their adjacency. Neighbors owned by other fragments appear
/// as outer vertices: they can be translated to global ids but their own adjacency is
/// not visible here.
///
/// Every id translation is global: `oid2gid` and `gid2oid` resolve any vertex of the
/// graph, not just the inner vertices of this fragment.
pub trait FragmentQuery {
    /// Returns the id of this fragment.
    fn fid(&self) -> Fid;

    /// Returns the total number of fragments the graph is split into.
    fn fnum(&self) -> usize;

    /// Returns the number of vertices owned by this fragment.
    fn inner_vertex_num(&self) -> usize;

    /// Returns the number of vertices referenced by this fragment but owned elsewhere.
    fn outer_vertex_num(&self) -> usize;

    /// Checks whether a local vertex handle refers to an inner vertex.
    fn is_inner_vertex(&self, vertex: Vertex) -> bool;

    /// Translates an external id into a global id.
    ///
    /// # Returns
    ///
    /// `None` if the external id is not a vertex of the graph.
    fn oid2gid(&self, oid: &Oid) -> Option<Gid>;

    /// Translates a global id back into its external id.
    ///
    /// # Returns
    ///
    /// `None` if the global id was not produced by this graph's vertex map.
    fn gid2oid(&self, gid: Gid) -> Option<Oid>;

    /// Translates a local vertex handle (inner or outer) into its global id.
    fn vertex2gid(&self, vertex: Vertex) -> Gid;

    /// Resolves a global id to a local handle, but only if this fragment owns the vertex.
    fn inner_vertex_gid2vertex(&self, gid: Gid) -> Option<Vertex>;

    /// Resolves a global id to a local handle for inner and outer vertices alike.
    fn gid2vertex(&self, gid: Gid) -> Option<Vertex>;

    /// Retrieves the out-neighbors of a local vertex.
    ///
    /// Outer vertices carry no adjacency, so the slice is empty for them. Parallel edges
    /// appear once per edge.
    fn outgoing_adj(&self, vertex: Vertex) -> &[Vertex];

    /// Retrieves the in-neighbors of a local vertex.
    fn incoming_adj(&self, vertex: Vertex) -> &[Vertex];

    /// Returns the external id of a local vertex.
    fn get_id(&self, vertex: Vertex) -> Option<Oid> {
        self.gid2oid(self.vertex2gid(vertex))
    }
}
