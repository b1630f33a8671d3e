//! Rearrangement distances computed from breakpoint graph components.

use log::debug;

use crate::breakpoint_graph::BreakpointGraph;

fn has_irregular_vertex(component: &BreakpointGraph) -> bool {
    component.nodes().any(|vertex| vertex.is_irregular())
}

/// Components that reach an infinity vertex.
pub fn get_all_paths(graph: &BreakpointGraph) -> Vec<BreakpointGraph> {
    graph
        .connected_components_subgraphs()
        .into_iter()
        .filter(has_irregular_vertex)
        .collect()
}

/// Components made of regular vertices only.
pub fn get_all_cycles(graph: &BreakpointGraph) -> Vec<BreakpointGraph> {
    graph
        .connected_components_subgraphs()
        .into_iter()
        .filter(|component| !has_irregular_vertex(component))
        .collect()
}

/// Two regular vertices joined by at least two adjacencies (counting
/// multiplicity).
fn is_regular_two_cycle(component: &BreakpointGraph) -> bool {
    component.vertex_count() == 2
        && !has_irregular_vertex(component)
        && component
            .edges()
            .iter()
            .map(|edge| edge.multicolor.total_len())
            .sum::<usize>()
            >= 2
}

/// Single-cut-or-join distance: `2 * genes - 2 * two_cycles - paths`.
pub fn scj(graph: &BreakpointGraph) -> usize {
    let genes = graph.nodes().filter(|vertex| vertex.is_regular()).count() / 2;
    let components = graph.connected_components_subgraphs();
    let two_cycles = components.iter().filter(|component| is_regular_two_cycle(component)).count();
    let paths = components.iter().filter(|component| has_irregular_vertex(component)).count();
    debug!(
        "SCJ inputs: {} genes, {} regular two-cycles, {} paths",
        genes, two_cycles, paths
    );
    (2 * genes).saturating_sub(2 * two_cycles).saturating_sub(paths)
}

pub use self::scj as single_cut_and_join_distance;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::Genome;
    use crate::multicolor::Multicolor;
    use crate::vertices::Vertex;

    fn v(name: &str) -> Vertex {
        Vertex::from_name(name).unwrap()
    }

    fn mc(names: &[&str]) -> Multicolor {
        names.iter().map(|name| Genome::new(*name)).collect()
    }

    #[test]
    fn empty_graph_has_zero_distance() {
        assert_eq!(scj(&BreakpointGraph::new()), 0);
    }

    #[test]
    fn shared_adjacency_is_a_two_cycle() {
        let mut graph = BreakpointGraph::new();
        graph.add_edge(v("1h"), v("1t"), mc(&["a"]), false, None);
        graph.add_edge(v("1h"), v("1t"), mc(&["b"]), false, None);
        assert_eq!(get_all_cycles(&graph).len(), 1);
        assert!(get_all_paths(&graph).is_empty());
        assert_eq!(scj(&graph), 0);
    }

    #[test]
    fn merged_edges_count_by_multiplicity() {
        let mut graph = BreakpointGraph::new();
        graph.add_edge(v("1h"), v("1t"), mc(&["a", "b"]), true, None);
        assert_eq!(scj(&graph), 0);
    }

    #[test]
    fn unshared_adjacencies_cost_cuts_and_joins() {
        let mut graph = BreakpointGraph::new();
        graph.add_edge(v("1h"), v("2t"), mc(&["a"]), false, None);
        graph.add_edge(v("2h"), v("1t"), mc(&["a"]), false, None);
        graph.add_edge(v("1h"), v("1t"), mc(&["b"]), false, None);
        graph.add_edge(v("2h"), v("2t"), mc(&["b"]), false, None);
        assert_eq!(get_all_cycles(&graph).len(), 1);
        assert_eq!(scj(&graph), 4);
    }
}
