use serde_json::{json, Value};

use crate::breakpoint_graph::GraphError;
use crate::multicolor::Multicolor;
use crate::utils::merge_dicts;
use crate::vertices::Vertex;

/// A multicolored adjacency between two vertices.
///
/// `data` is a free-form JSON object; the GRIMM reader stores fragment
/// information under `data.fragment` and, per genome, under
/// `data.per_genome.<genome>.fragment`.
#[derive(Debug, Clone)]
pub struct BGEdge {
    pub vertex1: Vertex,
    pub vertex2: Vertex,
    pub multicolor: Multicolor,
    pub data: Value,
}

impl BGEdge {
    pub fn new(vertex1: Vertex, vertex2: Vertex, multicolor: Multicolor) -> Self {
        BGEdge {
            vertex1,
            vertex2,
            multicolor,
            data: Self::default_data(),
        }
    }

    pub fn with_data(vertex1: Vertex, vertex2: Vertex, multicolor: Multicolor, data: Value) -> Self {
        BGEdge {
            vertex1,
            vertex2,
            multicolor,
            data,
        }
    }

    pub fn default_data() -> Value {
        json!({"fragment": {"name": null}})
    }

    /// Combine two edges over the same vertex pair. The result keeps `first`'s
    /// orientation and `first`'s value wherever both data objects set a key.
    pub fn merge(first: &BGEdge, second: &BGEdge) -> Result<BGEdge, GraphError> {
        if !first.connects(&second.vertex1, &second.vertex2) {
            return Err(GraphError::MergeMismatch {
                first: format!("{}-{}", first.vertex1, first.vertex2),
                second: format!("{}-{}", second.vertex1, second.vertex2),
            });
        }
        let mut data = first.data.clone();
        merge_dicts(&mut data, &second.data);
        Ok(BGEdge {
            vertex1: first.vertex1.clone(),
            vertex2: first.vertex2.clone(),
            multicolor: &first.multicolor + &second.multicolor,
            data,
        })
    }

    /// Same unordered vertex pair.
    pub fn connects(&self, vertex1: &Vertex, vertex2: &Vertex) -> bool {
        (&self.vertex1 == vertex1 && &self.vertex2 == vertex2)
            || (&self.vertex1 == vertex2 && &self.vertex2 == vertex1)
    }

    pub fn is_infinity_edge(&self) -> bool {
        self.vertex1.is_infinity() || self.vertex2.is_infinity()
    }

    pub fn is_irregular_edge(&self) -> bool {
        self.is_infinity_edge()
    }

    pub fn is_repeat_edge(&self) -> bool {
        self.irregular_vertex().is_some_and(Vertex::is_repeat)
    }

    pub fn is_self_loop(&self) -> bool {
        self.vertex1 == self.vertex2
    }

    /// The infinity end of the edge, if any.
    pub fn irregular_vertex(&self) -> Option<&Vertex> {
        if self.vertex1.is_irregular() {
            Some(&self.vertex1)
        } else if self.vertex2.is_irregular() {
            Some(&self.vertex2)
        } else {
            None
        }
    }

    pub fn to_json(&self) -> Value {
        let multicolor: Vec<u64> = self.multicolor.elements().map(|genome| genome.json_id()).collect();
        json!({
            "vertex1_id": self.vertex1.json_id(),
            "vertex2_id": self.vertex2.json_id(),
            "multicolor": multicolor,
            "data": self.data,
        })
    }
}

impl PartialEq for BGEdge {
    fn eq(&self, other: &Self) -> bool {
        self.connects(&other.vertex1, &other.vertex2) && self.multicolor == other.multicolor
    }
}

impl Eq for BGEdge {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::Genome;

    fn mc(names: &[&str]) -> Multicolor {
        names.iter().map(|name| Genome::new(*name)).collect()
    }

    #[test]
    fn equality_ignores_orientation_but_not_colors() {
        let a = BGEdge::new(Vertex::block("1h"), Vertex::block("2t"), mc(&["red"]));
        let b = BGEdge::new(Vertex::block("2t"), Vertex::block("1h"), mc(&["red"]));
        let c = BGEdge::new(Vertex::block("1h"), Vertex::block("2t"), mc(&["blue"]));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn merge_sums_colors_and_keeps_left_data() {
        let first = BGEdge::with_data(
            Vertex::block("1h"),
            Vertex::block("2t"),
            mc(&["red"]),
            json!({"fragment": {"name": "scaffold1"}}),
        );
        let second = BGEdge::with_data(
            Vertex::block("2t"),
            Vertex::block("1h"),
            mc(&["blue"]),
            json!({"fragment": {"name": "scaffold2"}, "extra": true}),
        );
        let merged = BGEdge::merge(&first, &second).unwrap();
        assert_eq!(merged.vertex1, Vertex::block("1h"));
        assert_eq!(merged.multicolor, mc(&["red", "blue"]));
        assert_eq!(merged.data, json!({"fragment": {"name": "scaffold1"}, "extra": true}));
    }

    #[test]
    fn merge_rejects_different_vertex_pairs() {
        let first = BGEdge::new(Vertex::block("1h"), Vertex::block("2t"), mc(&["red"]));
        let second = BGEdge::new(Vertex::block("1h"), Vertex::block("3t"), mc(&["red"]));
        assert!(BGEdge::merge(&first, &second).is_err());
    }

    #[test]
    fn repeat_edge_needs_tagged_infinity_vertex() {
        let mut infinity = Vertex::infinity("1h");
        let plain = BGEdge::new(Vertex::block("1h"), infinity.clone(), mc(&["red"]));
        assert!(plain.is_infinity_edge());
        assert!(!plain.is_repeat_edge());
        infinity.add_tag("repeat", Some("ALCt"));
        let repeat = BGEdge::new(Vertex::block("1h"), infinity, mc(&["red"]));
        assert!(repeat.is_repeat_edge());

        let mut tagged_block = Vertex::block("2t");
        tagged_block.add_tag("repeat", None);
        let interior = BGEdge::new(Vertex::block("1h"), tagged_block, mc(&["red"]));
        assert!(!interior.is_repeat_edge());
    }

    #[test]
    fn json_lists_genome_ids_by_multiplicity() {
        let edge = BGEdge::new(Vertex::block("1h"), Vertex::block("2t"), mc(&["red", "red"]));
        let value = edge.to_json();
        let red = Genome::new("red").json_id();
        assert_eq!(value["multicolor"], json!([red, red]));
        assert_eq!(value["vertex1_id"], json!(Vertex::block("1h").json_id()));
        assert!(!edge.is_self_loop());
    }
}
