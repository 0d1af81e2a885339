use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

pub mod graph_query;

/// Fragment identifier, also the index of the worker that runs the fragment.
pub type Fid = usize;

/// Dense global vertex id, unique across every fragment of a graph.
/// Encoded by [`crate::fragment::id_parser::IdParser`] as `(fid << fid_offset) | lid`.
pub type Gid = u64;

/// The set of `(source, target)` global id pairs crossing out of the primary vertex set.
pub type BoundaryEdgeSet = BTreeSet<(Gid, Gid)>;

/// External vertex identifier as it appears in graph files and request payloads.
///
/// Decoded from JSON without a tag, so `7` becomes `Oid::Int(7)` and `"a"` becomes
/// `Oid::Str("a")`. The two variants never compare equal, so `1` and `"1"` are
/// different vertices.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Oid {
    Int(i64),
    Str(String),
}

impl Oid {
    /// Parses a graph file token: integers when they fit in `i64`, strings otherwise.
    pub fn parse_token(token: &str) -> Self {
        match token.parse::<i64>() {
            Ok(value) => Oid::Int(value),
            Err(_) => Oid::Str(token.to_string()),
        }
    }
}

impl From<i64> for Oid {
    fn from(value: i64) -> Self {
        Oid::Int(value)
    }
}

impl From<&str> for Oid {
    fn from(value: &str) -> Self {
        Oid::Str(value.to_string())
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Oid::Int(value) => write!(f, "{}", value),
            Oid::Str(value) => write!(f, "{}", value),
        }
    }
}

/// A fragment-local vertex handle.
///
/// Inner vertices of a fragment occupy `[0, ivnum)`, outer vertices (neighbors owned by
/// another fragment) occupy `[ivnum, ivnum + ovnum)`. A handle means nothing outside the
/// fragment that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Vertex(pub u64);

impl Vertex {
    pub fn local_id(&self) -> u64 {
        self.0
    }
}

/// Flat row-major matrix of external ids with shape `(edge_count, 2)`.
///
/// Row `i` holds the `(source, target)` external ids of the `i`-th boundary edge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultMatrix {
    data: Vec<Oid>,
    shape: [usize; 2],
}

impl ResultMatrix {
    /// An empty matrix with shape `(0, 2)`.
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            shape: [0, 2],
        }
    }

    /// Builds the matrix from `(source, target)` rows, keeping their order.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (Oid, Oid)>,
    {
        let mut data = Vec::new();
        for (src, dst) in rows {
            data.push(src);
            data.push(dst);
        }
        let edge_count = data.len() / 2;
        Self {
            data,
            shape: [edge_count, 2],
        }
    }

    pub fn data(&self) -> &[Oid] {
        &self.data
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.shape[0], self.shape[1])
    }

    pub fn edge_count(&self) -> usize {
        self.shape[0]
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterates the rows as `(source, target)` pairs.
    pub fn rows(&self) -> impl Iterator<Item = (&Oid, &Oid)> + '_ {
        self.data.chunks_exact(2).map(|row| (&row[0], &row[1]))
    }

    pub fn into_data(self) -> Vec<Oid> {
        self.data
    }
}
