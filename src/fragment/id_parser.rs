use crate::types::{Fid, Gid};

/// Packs a fragment id and a fragment-local index into one global id.
///
/// The highest `fid_bits` bits of a global id hold the owning fragment, the remaining
/// low bits hold the vertex's index among that fragment's inner vertices. A single
/// fragment still reserves one fid bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdParser {
    fid_offset: u32,
    lid_mask: u64,
}

impl IdParser {
    pub fn new(fnum: usize) -> Self {
        let fid_bits = (usize::BITS - fnum.saturating_sub(1).leading_zeros()).max(1);
        let fid_offset = u64::BITS - fid_bits;
        Self {
            fid_offset,
            lid_mask: (1u64 << fid_offset) - 1,
        }
    }

    pub fn generate_global_id(&self, fid: Fid, lid: u64) -> Gid {
        ((fid as u64) << self.fid_offset) | (lid & self.lid_mask)
    }

    pub fn get_fragment_id(&self, gid: Gid) -> Fid {
        (gid >> self.fid_offset) as Fid
    }

    pub fn get_local_id(&self, gid: Gid) -> u64 {
        gid & self.lid_mask
    }

    /// The largest local index a fragment can hold.
    pub fn max_local_id(&self) -> u64 {
        self.lid_mask
    }
}

#[cfg(test)]
mod test_id_parser {
    use crate::fragment::id_parser::IdParser;

    #[test]
    fn test_fid_bits() {
        assert_eq!(IdParser::new(1).max_local_id(), (1u64 << 63) - 1);
        assert_eq!(IdParser::new(2).max_local_id(), (1u64 << 63) - 1);
        assert_eq!(IdParser::new(3).max_local_id(), (1u64 << 62) - 1);
        assert_eq!(IdParser::new(4).max_local_id(), (1u64 << 62) - 1);
        assert_eq!(IdParser::new(5).max_local_id(), (1u64 << 61) - 1);
    }

    #[test]
    fn test_global_id_layout() {
        let id_parser = IdParser::new(3);
        for fid in 0..3 {
            for lid in [0u64, 1, 17, 1 << 40] {
                let gid = id_parser.generate_global_id(fid, lid);
                assert_eq!(id_parser.get_fragment_id(gid), fid);
                assert_eq!(id_parser.get_local_id(gid), lid);
            }
        }
        assert_eq!(id_parser.generate_global_id(2, 5), (2u64 << 62) | 5);
    }
}
