//! k-break rearrangements: replace k adjacencies of one multicolor by k others
//! over the same vertices.

use std::collections::HashMap;

use serde_json::Value;

use crate::breakpoint_graph::GraphError;
use crate::edge::BGEdge;
use crate::multicolor::Multicolor;
use crate::vertices::Vertex;

pub type VertexPair = (Vertex, Vertex);

#[derive(Debug, Clone)]
pub struct KBreak {
    pub start_edges: Vec<VertexPair>,
    pub result_edges: Vec<VertexPair>,
    pub multicolor: Multicolor,
    pub data: Value,
}

impl KBreak {
    pub fn new(
        start_edges: Vec<VertexPair>,
        result_edges: Vec<VertexPair>,
        multicolor: Multicolor,
        data: Option<Value>,
    ) -> Result<Self, GraphError> {
        if start_edges.is_empty() {
            return Err(GraphError::InvalidKBreak("no start edges".to_string()));
        }
        if !Self::valid_kbreak_matchings(&start_edges, &result_edges) {
            return Err(GraphError::InvalidKBreak(
                "start and result edges do not cover the same vertices".to_string(),
            ));
        }
        if multicolor.is_empty() {
            return Err(GraphError::InvalidKBreak("empty multicolor".to_string()));
        }
        Ok(KBreak {
            start_edges,
            result_edges,
            multicolor,
            data: data.unwrap_or_else(BGEdge::default_data),
        })
    }

    /// Both sides touch every vertex the same number of times.
    pub fn valid_kbreak_matchings(start_edges: &[VertexPair], result_edges: &[VertexPair]) -> bool {
        fn degrees(edges: &[VertexPair]) -> HashMap<&str, usize> {
            let mut counts = HashMap::new();
            for (vertex1, vertex2) in edges {
                *counts.entry(vertex1.name()).or_insert(0) += 1;
                *counts.entry(vertex2.name()).or_insert(0) += 1;
            }
            counts
        }
        start_edges.len() == result_edges.len() && degrees(start_edges) == degrees(result_edges)
    }

    pub fn is_a_fusion(&self) -> bool {
        self.result_edges
            .iter()
            .any(|(vertex1, vertex2)| vertex1.is_infinity() && vertex2.is_infinity())
    }
}
