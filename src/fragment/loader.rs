use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::config::READ_BUFFER_SIZE;
use crate::error::{BoundaryError, Result};
use crate::types::Oid;

/// The vertices and edges of a graph file, in file order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphFile {
    pub vertices: Vec<Oid>,
    pub edges: Vec<(Oid, Oid)>,
}

impl GraphFile {
    /// Loads a graph from a graph file.
    ///
    /// # Format
    /// - Optional first line: metadata with format "t [vertex_count] [edge_count]"
    /// - Vertex lines: "v [vertex_id] ..." (trailing tokens such as labels are ignored)
    /// - Edge lines: "e [source_id] [destination_id] ..."
    /// - Blank lines and lines starting with '#' are skipped
    ///
    /// Ids are integers when they fit in `i64`, strings otherwise. Edge endpoints do not
    /// need a vertex line of their own.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let graph_file = File::open(path.as_ref())?;
        let graph_reader = BufReader::with_capacity(READ_BUFFER_SIZE, graph_file);
        let graph = Self::from_reader(graph_reader)?;
        info!(
            path = %path.as_ref().display(),
            vertices = graph.vertices.len(),
            edges = graph.edges.len(),
            "graph file loaded"
        );
        Ok(graph)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut graph = GraphFile::default();
        let mut pb: Option<ProgressBar> = None;

        for (line_idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = line_idx + 1;
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let format_error = |reason: &str| BoundaryError::GraphFormat {
                line: line_no,
                reason: reason.to_string(),
            };

            match tokens.first() {
                None => continue,
                Some(token) if token.starts_with('#') => continue,
                Some(&"t") => {
                    if line_no != 1 || tokens.len() != 3 {
                        return Err(format_error("metadata must be the first line: t <vertex_count> <edge_count>"));
                    }
                    let vertex_count = tokens[1]
                        .parse::<usize>()
                        .map_err(|_| format_error("vertex count is not a number"))?;
                    let edge_count = tokens[2]
                        .parse::<usize>()
                        .map_err(|_| format_error("edge count is not a number"))?;
                    graph.vertices.reserve(vertex_count);
                    graph.edges.reserve(edge_count);
                    pb = Some(loading_progress_bar((vertex_count + edge_count) as u64));
                    continue;
                }
                Some(&"v") => {
                    if tokens.len() < 2 {
                        return Err(format_error("vertex line needs an id"));
                    }
                    graph.vertices.push(Oid::parse_token(tokens[1]));
                }
                Some(&"e") => {
                    if tokens.len() < 3 {
                        return Err(format_error("edge line needs a source and a destination"));
                    }
                    graph
                        .edges
                        .push((Oid::parse_token(tokens[1]), Oid::parse_token(tokens[2])));
                }
                Some(token) => {
                    return Err(format_error(&format!("unknown record type '{}'", token)));
                }
            }
            if let Some(pb) = pb.as_ref() {
                pb.inc(1);
            }
        }

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        Ok(graph)
    }
}

fn loading_progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb.set_message("Graph Loading.");
    pb
}

#[cfg(test)]
mod test_loader {
    use std::io::Cursor;

    use crate::error::BoundaryError;
    use crate::fragment::loader::GraphFile;
    use crate::types::Oid;

    #[test]
    fn test_parse_graph() {
        let content = "t 3 2\nv 1 0\nv 2 0\n\n# a comment\nv alice\ne 1 2\ne 2 alice 7\n";
        let graph = GraphFile::from_reader(Cursor::new(content)).unwrap();
        assert_eq!(graph.vertices, vec![Oid::Int(1), Oid::Int(2), Oid::from("alice")]);
        assert_eq!(
            graph.edges,
            vec![(Oid::Int(1), Oid::Int(2)), (Oid::Int(2), Oid::from("alice"))]
        );
    }

    #[test]
    fn test_parse_without_metadata() {
        let graph = GraphFile::from_reader(Cursor::new("e 5 6\n")).unwrap();
        assert!(graph.vertices.is_empty());
        assert_eq!(graph.edges, vec![(Oid::Int(5), Oid::Int(6))]);
    }

    #[test]
    fn test_parse_errors() {
        for (content, bad_line) in [("v 1\ne 1\n", 2), ("v 1\nx 1 2\n", 2), ("v 1\nt 1 0\n", 2), ("t a 0\n", 1)] {
            match GraphFile::from_reader(Cursor::new(content)) {
                Err(BoundaryError::GraphFormat { line, .. }) => assert_eq!(line, bad_line),
                other => panic!("expected a format error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_example_graph_file() {
        let graph = GraphFile::from_path("data/example.graph").unwrap();
        assert_eq!(graph.vertices.len(), 4);
        assert_eq!(graph.edges.len(), 4);
    }
}
