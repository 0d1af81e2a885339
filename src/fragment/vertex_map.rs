use rustc_hash::FxHashMap;

use crate::fragment::id_parser::IdParser;
use crate::types::{Fid, Gid, Oid};

/// The global mapping between external ids and global ids.
///
/// Every fragment shares one `VertexMap`, so any vertex of the graph can be translated
/// on any worker. Vertices are numbered densely per owning fragment in insertion order.
#[derive(Debug)]
pub struct VertexMap {
    id_parser: IdParser,
    /// External ids of each fragment's inner vertices, indexed by local id.
    oid_lists: Vec<Vec<Oid>>,
    oid_to_gid: FxHashMap<Oid, Gid>,
}

impl VertexMap {
    pub fn new(fnum: usize) -> Self {
        Self {
            id_parser: IdParser::new(fnum),
            oid_lists: vec![Vec::new(); fnum],
            oid_to_gid: FxHashMap::default(),
        }
    }

    /// Registers a vertex owned by `fid` and returns its global id.
    ///
    /// A vertex that is already registered keeps its first owner and global id.
    pub fn add_vertex(&mut self, fid: Fid, oid: Oid) -> Gid {
        if let Some(&gid) = self.oid_to_gid.get(&oid) {
            return gid;
        }
        let oid_list = &mut self.oid_lists[fid];
        let gid = self.id_parser.generate_global_id(fid, oid_list.len() as u64);
        oid_list.push(oid.clone());
        self.oid_to_gid.insert(oid, gid);
        gid
    }

    pub fn get_gid(&self, oid: &Oid) -> Option<Gid> {
        self.oid_to_gid.get(oid).copied()
    }

    pub fn get_oid(&self, gid: Gid) -> Option<Oid> {
        let fid = self.id_parser.get_fragment_id(gid);
        let lid = self.id_parser.get_local_id(gid) as usize;
        self.oid_lists.get(fid)?.get(lid).cloned()
    }

    pub fn id_parser(&self) -> &IdParser {
        &self.id_parser
    }

    pub fn fnum(&self) -> usize {
        self.oid_lists.len()
    }

    pub fn inner_vertex_num(&self, fid: Fid) -> usize {
        self.oid_lists.get(fid).map_or(0, |oid_list| oid_list.len())
    }

    pub fn total_vertex_num(&self) -> usize {
        self.oid_to_gid.len()
    }

    /// External ids of the vertices owned by `fid`, in local id order.
    pub fn inner_oids(&self, fid: Fid) -> &[Oid] {
        self.oid_lists
            .get(fid)
            .map(|oid_list| oid_list.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod test_vertex_map {
    use crate::fragment::vertex_map::VertexMap;
    use crate::types::Oid;

    #[test]
    fn test_vertex_map_round_trip() {
        let mut vertex_map = VertexMap::new(2);
        let gid_a = vertex_map.add_vertex(0, Oid::Int(10));
        let gid_b = vertex_map.add_vertex(1, Oid::from("b"));
        let gid_c = vertex_map.add_vertex(0, Oid::Int(11));

        assert_eq!(vertex_map.get_gid(&Oid::Int(10)), Some(gid_a));
        assert_eq!(vertex_map.get_oid(gid_b), Some(Oid::from("b")));
        assert_eq!(vertex_map.get_oid(gid_c), Some(Oid::Int(11)));
        assert_eq!(vertex_map.id_parser().get_fragment_id(gid_b), 1);
        assert_eq!(vertex_map.id_parser().get_local_id(gid_c), 1);
        assert_eq!(vertex_map.inner_vertex_num(0), 2);
        assert_eq!(vertex_map.total_vertex_num(), 3);
        assert_eq!(vertex_map.get_gid(&Oid::Int(12)), None);
    }

    #[test]
    fn test_vertex_map_keeps_first_owner() {
        let mut vertex_map = VertexMap::new(2);
        let gid = vertex_map.add_vertex(0, Oid::Int(1));
        assert_eq!(vertex_map.add_vertex(1, Oid::Int(1)), gid);
        assert_eq!(vertex_map.inner_vertex_num(1), 0);
        assert_eq!(vertex_map.total_vertex_num(), 1);
    }

    #[test]
    fn test_unknown_gid() {
        let mut vertex_map = VertexMap::new(2);
        let gid = vertex_map.add_vertex(0, Oid::Int(1));
        assert_eq!(vertex_map.get_oid(gid + 1), None);
        let foreign_gid = vertex_map.id_parser().generate_global_id(1, 0);
        assert_eq!(vertex_map.get_oid(foreign_gid), None);
    }
}
