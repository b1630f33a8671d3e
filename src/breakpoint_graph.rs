//! The breakpoint graph: an undirected multigraph over block extremities whose
//! edges are adjacencies labelled by multicolors.
//!
//! Vertices are stored once per name and looked up through `vertex_index`.
//! Parallel edges are allowed; `merge` on insertion folds a new edge into the
//! first existing edge between the same pair instead.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use log::{debug, trace, warn};
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableUnGraph};
use petgraph::visit::EdgeRef;
use serde_json::{json, Value};
use thiserror::Error;

use crate::edge::BGEdge;
use crate::genome::Genome;
use crate::kbreak::KBreak;
use crate::multicolor::Multicolor;
use crate::utils::{merge_dicts, value_at_path};
use crate::vertices::{Vertex, VertexError};

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("edges {first} and {second} do not connect the same vertices")]
    MergeMismatch { first: String, second: String },

    #[error("invalid k-break: {0}")]
    InvalidKBreak(String),

    #[error("vertex {0} is not in the graph")]
    MissingVertex(String),

    #[error("no edge between {vertex1} and {vertex2}")]
    NoEdge { vertex1: String, vertex2: String },

    #[error("no edge between {vertex1} and {vertex2} with multicolor {multicolor}")]
    NoMatchingEdge {
        vertex1: String,
        vertex2: String,
        multicolor: String,
    },

    #[error("unknown vertex id {0} in graph JSON")]
    UnknownVertexId(u64),

    #[error("unknown genome id {0} in graph JSON")]
    UnknownGenomeId(u64),

    #[error("malformed graph JSON: {0}")]
    MalformedJson(String),

    #[error("Vertex error: {0}")]
    Vertex(#[from] VertexError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChromosomeKind {
    Linear,
    Circular,
}

impl ChromosomeKind {
    pub fn terminator(self) -> char {
        match self {
            ChromosomeKind::Linear => '$',
            ChromosomeKind::Circular => '@',
        }
    }

    pub fn from_terminator(symbol: char) -> Option<Self> {
        match symbol {
            '$' => Some(ChromosomeKind::Linear),
            '@' => Some(ChromosomeKind::Circular),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    pub fn symbol(self) -> char {
        match self {
            Sign::Plus => '+',
            Sign::Minus => '-',
        }
    }
}

/// Signed entries (blocks or fragments) of one chromosome.
pub type Chromosome = (ChromosomeKind, Vec<(Sign, String)>);

#[derive(Debug, Clone)]
pub struct EdgePayload {
    pub multicolor: Multicolor,
    pub data: Value,
}

#[derive(Debug, Clone, Copy)]
struct Step {
    from: NodeIndex,
    to: NodeIndex,
    edge: EdgeIndex,
}

struct Walk {
    kind: ChromosomeKind,
    blocks: Vec<(Sign, String)>,
    steps: Vec<Step>,
}

impl Walk {
    fn new(kind: ChromosomeKind) -> Self {
        Walk {
            kind,
            blocks: Vec::new(),
            steps: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BreakpointGraph {
    graph: StableUnGraph<Vertex, EdgePayload>,
    vertex_index: HashMap<String, NodeIndex>,
}

impl BreakpointGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_vertex(&mut self, vertex: Vertex) -> NodeIndex {
        if let Some(&index) = self.vertex_index.get(vertex.name()) {
            return index;
        }
        let name = vertex.name().to_string();
        let index = self.graph.add_node(vertex);
        self.vertex_index.insert(name, index);
        index
    }

    fn index_of(&self, vertex: &Vertex) -> Option<NodeIndex> {
        self.vertex_index.get(vertex.name()).copied()
    }

    fn require_index(&self, vertex: &Vertex) -> Result<NodeIndex, GraphError> {
        self.index_of(vertex)
            .ok_or_else(|| GraphError::MissingVertex(vertex.name().to_string()))
    }

    /// Edges touching `index` with their far endpoint, in insertion order.
    /// A self-loop is listed once.
    fn incident_edges(&self, index: NodeIndex) -> Vec<(EdgeIndex, NodeIndex)> {
        let mut incident: Vec<(EdgeIndex, NodeIndex)> = self
            .graph
            .edges(index)
            .map(|edge| {
                let other = if edge.source() == index {
                    edge.target()
                } else {
                    edge.source()
                };
                (edge.id(), other)
            })
            .collect();
        incident.sort_by_key(|(id, _)| *id);
        incident.dedup_by_key(|(id, _)| *id);
        incident
    }

    fn edge_ids_between(&self, first: NodeIndex, second: NodeIndex) -> Vec<EdgeIndex> {
        self.incident_edges(first)
            .into_iter()
            .filter(|(_, other)| *other == second)
            .map(|(id, _)| id)
            .collect()
    }

    fn bgedge(&self, id: EdgeIndex, from: NodeIndex) -> Option<BGEdge> {
        let (source, target) = self.graph.edge_endpoints(id)?;
        let to = if source == from { target } else { source };
        let payload = self.graph.edge_weight(id)?;
        Some(BGEdge::with_data(
            self.graph[from].clone(),
            self.graph[to].clone(),
            payload.multicolor.clone(),
            payload.data.clone(),
        ))
    }

    fn remove_if_isolated(&mut self, index: NodeIndex) {
        if self.graph.contains_node(index) && self.graph.edges(index).next().is_none() {
            if let Some(vertex) = self.graph.remove_node(index) {
                trace!("Removing isolated vertex {}", vertex);
                self.vertex_index.remove(vertex.name());
            }
        }
    }

    /// Add an adjacency. With `merge`, the multicolor and data are folded into
    /// the first existing edge between the same vertices.
    pub fn add_edge(
        &mut self,
        vertex1: Vertex,
        vertex2: Vertex,
        multicolor: Multicolor,
        merge: bool,
        data: Option<Value>,
    ) {
        let data = data.unwrap_or_else(BGEdge::default_data);
        let first = self.ensure_vertex(vertex1);
        let second = self.ensure_vertex(vertex2);
        if merge {
            if let Some(&existing) = self.edge_ids_between(first, second).first() {
                if let Some(payload) = self.graph.edge_weight_mut(existing) {
                    payload.multicolor += &multicolor;
                    merge_dicts(&mut payload.data, &data);
                    return;
                }
            }
        }
        self.graph.add_edge(first, second, EdgePayload { multicolor, data });
    }

    pub fn add_bgedge(&mut self, edge: BGEdge, merge: bool) {
        self.add_edge(edge.vertex1, edge.vertex2, edge.multicolor, merge, Some(edge.data));
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Vertex> {
        self.graph.node_indices().map(move |index| &self.graph[index])
    }

    pub fn edges(&self) -> Vec<BGEdge> {
        self.graph
            .edge_indices()
            .filter_map(|id| {
                let (source, _) = self.graph.edge_endpoints(id)?;
                self.bgedge(id, source)
            })
            .collect()
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn get_vertex_by_name(&self, name: &str) -> Option<&Vertex> {
        self.vertex_index.get(name).map(|&index| &self.graph[index])
    }

    pub fn has_edge(&self, vertex1: &Vertex, vertex2: &Vertex) -> bool {
        match (self.index_of(vertex1), self.index_of(vertex2)) {
            (Some(first), Some(second)) => !self.edge_ids_between(first, second).is_empty(),
            _ => false,
        }
    }

    /// All parallel edges between the pair, oriented from `vertex1`.
    pub fn edges_between(&self, vertex1: &Vertex, vertex2: &Vertex) -> Vec<BGEdge> {
        let (Some(first), Some(second)) = (self.index_of(vertex1), self.index_of(vertex2)) else {
            return Vec::new();
        };
        self.edge_ids_between(first, second)
            .into_iter()
            .filter_map(|id| self.bgedge(id, first))
            .collect()
    }

    pub fn get_edge_by_two_vertices(&self, vertex1: &Vertex, vertex2: &Vertex) -> Option<BGEdge> {
        self.edges_between(vertex1, vertex2).into_iter().next()
    }

    /// Every edge touching `vertex`, each with `vertex` as its `vertex1`.
    pub fn get_edges_by_vertex(&self, vertex: &Vertex) -> Vec<BGEdge> {
        let Some(index) = self.index_of(vertex) else {
            return Vec::new();
        };
        self.incident_edges(index)
            .into_iter()
            .filter_map(|(id, _)| self.bgedge(id, index))
            .collect()
    }

    /// One edge standing for all parallel edges between the pair.
    pub fn get_condensed_edge(&self, vertex1: &Vertex, vertex2: &Vertex) -> Option<BGEdge> {
        let mut edges = self.edges_between(vertex1, vertex2).into_iter();
        let first = edges.next()?;
        edges.try_fold(first, |acc, edge| BGEdge::merge(&acc, &edge).ok())
    }

    pub fn get_overall_set_of_colors(&self) -> BTreeSet<Genome> {
        self.graph
            .edge_indices()
            .flat_map(|id| self.graph[id].multicolor.colors().cloned())
            .collect()
    }

    /// Subtract `multicolor` from the most similar edge between the pair.
    /// Emptied edges are removed, and so are vertices they leave isolated.
    pub fn delete_edge(
        &mut self,
        vertex1: &Vertex,
        vertex2: &Vertex,
        multicolor: &Multicolor,
    ) -> Result<(), GraphError> {
        let first = self.require_index(vertex1)?;
        let second = self.require_index(vertex2)?;
        let mut best: Option<(EdgeIndex, usize)> = None;
        for id in self.edge_ids_between(first, second) {
            let score = Multicolor::similarity_score(&self.graph[id].multicolor, multicolor);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((id, score));
            }
        }
        let Some((id, _)) = best else {
            return Err(GraphError::NoEdge {
                vertex1: vertex1.name().to_string(),
                vertex2: vertex2.name().to_string(),
            });
        };
        self.subtract_from_edge(id, multicolor);
        self.remove_if_isolated(first);
        self.remove_if_isolated(second);
        Ok(())
    }

    fn subtract_from_edge(&mut self, id: EdgeIndex, multicolor: &Multicolor) {
        let emptied = match self.graph.edge_weight_mut(id) {
            Some(payload) => {
                payload.multicolor -= multicolor;
                payload.multicolor.is_empty()
            }
            None => false,
        };
        if emptied {
            self.graph.remove_edge(id);
        }
    }

    pub fn delete_bgedge(&mut self, edge: &BGEdge) -> Result<(), GraphError> {
        self.delete_edge(&edge.vertex1, &edge.vertex2, &edge.multicolor)
    }

    pub fn delete_all_edges_by_multicolor(&mut self, multicolor: &Multicolor) {
        let ids: Vec<EdgeIndex> = self.graph.edge_indices().collect();
        for id in ids {
            self.subtract_from_edge(id, multicolor);
        }
        let nodes: Vec<NodeIndex> = self.graph.node_indices().collect();
        for index in nodes {
            self.remove_if_isolated(index);
        }
    }

    fn split_edge_by_id(
        &mut self,
        id: EdgeIndex,
        guidance: Option<&[Multicolor]>,
        account_for_multiplicity: bool,
    ) {
        let Some((source, target)) = self.graph.edge_endpoints(id) else {
            return;
        };
        let Some(payload) = self.graph.remove_edge(id) else {
            return;
        };
        for part in Multicolor::split_colors(&payload.multicolor, guidance, account_for_multiplicity) {
            self.graph.add_edge(
                source,
                target,
                EdgePayload {
                    multicolor: part,
                    data: payload.data.clone(),
                },
            );
        }
    }

    /// Replace the edge carrying exactly `multicolor` by its split parts.
    pub fn split_edge(
        &mut self,
        vertex1: &Vertex,
        vertex2: &Vertex,
        multicolor: &Multicolor,
        guidance: Option<&[Multicolor]>,
        account_for_multiplicity: bool,
    ) -> Result<(), GraphError> {
        let first = self.require_index(vertex1)?;
        let second = self.require_index(vertex2)?;
        let id = self
            .edge_ids_between(first, second)
            .into_iter()
            .find(|&id| &self.graph[id].multicolor == multicolor)
            .ok_or_else(|| GraphError::NoMatchingEdge {
                vertex1: vertex1.name().to_string(),
                vertex2: vertex2.name().to_string(),
                multicolor: format!("{:?}", multicolor.hashable_representation()),
            })?;
        self.split_edge_by_id(id, guidance, account_for_multiplicity);
        Ok(())
    }

    pub fn split_all_edges_between_two_vertices(
        &mut self,
        vertex1: &Vertex,
        vertex2: &Vertex,
        guidance: Option<&[Multicolor]>,
        account_for_multiplicity: bool,
    ) -> Result<(), GraphError> {
        let first = self.require_index(vertex1)?;
        let second = self.require_index(vertex2)?;
        for id in self.edge_ids_between(first, second) {
            self.split_edge_by_id(id, guidance, account_for_multiplicity);
        }
        Ok(())
    }

    pub fn split_all_edges(&mut self, guidance: Option<&[Multicolor]>, account_for_multiplicity: bool) {
        let ids: Vec<EdgeIndex> = self.graph.edge_indices().collect();
        for id in ids {
            self.split_edge_by_id(id, guidance, account_for_multiplicity);
        }
    }

    /// Add every edge of `other` into this graph.
    pub fn update(&mut self, other: &BreakpointGraph, merge_edges: bool) {
        for vertex in other.nodes() {
            self.ensure_vertex(vertex.clone());
        }
        for edge in other.edges() {
            self.add_bgedge(edge, merge_edges);
        }
    }

    pub fn merge(first: &BreakpointGraph, second: &BreakpointGraph, merge_edges: bool) -> BreakpointGraph {
        let mut result = first.clone();
        result.update(second, merge_edges);
        result
    }

    /// Split the graph into independent graphs, one per connected component.
    pub fn connected_components_subgraphs(&self) -> Vec<BreakpointGraph> {
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut components = Vec::new();
        let mut starts: Vec<NodeIndex> = self.graph.node_indices().collect();
        starts.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));

        for start in starts {
            if !visited.insert(start) {
                continue;
            }
            let mut members = vec![start];
            let mut queue = VecDeque::from([start]);
            while let Some(current) = queue.pop_front() {
                for neighbor in self.graph.neighbors(current) {
                    if visited.insert(neighbor) {
                        members.push(neighbor);
                        queue.push_back(neighbor);
                    }
                }
            }

            let mut component = BreakpointGraph::new();
            let mut edge_ids: BTreeSet<EdgeIndex> = BTreeSet::new();
            for &member in &members {
                component.ensure_vertex(self.graph[member].clone());
                edge_ids.extend(self.incident_edges(member).into_iter().map(|(id, _)| id));
            }
            for id in edge_ids {
                if let Some((source, _)) = self.graph.edge_endpoints(id) {
                    if let Some(edge) = self.bgedge(id, source) {
                        component.add_bgedge(edge, false);
                    }
                }
            }
            components.push(component);
        }
        debug!("Found {} connected components", components.len());
        components
    }

    /// Apply a k-break. On error the graph is left as it was.
    pub fn apply_kbreak(&mut self, kbreak: &KBreak, merge: bool) -> Result<(), GraphError> {
        for (vertex1, vertex2) in kbreak.start_edges.iter().chain(&kbreak.result_edges) {
            self.require_index(vertex1)?;
            self.require_index(vertex2)?;
        }
        // A start pair listed twice needs support twice. Deletions land on a
        // staged copy that replaces `self` only once every step succeeded.
        let mut staged = self.clone();
        for (vertex1, vertex2) in &kbreak.start_edges {
            let supported = staged
                .edges_between(vertex1, vertex2)
                .iter()
                .any(|edge| kbreak.multicolor.is_subset_of(&edge.multicolor));
            if !supported {
                return Err(GraphError::NoMatchingEdge {
                    vertex1: vertex1.name().to_string(),
                    vertex2: vertex2.name().to_string(),
                    multicolor: format!("{:?}", kbreak.multicolor.hashable_representation()),
                });
            }
            staged.delete_edge(vertex1, vertex2, &kbreak.multicolor)?;
        }
        for (vertex1, vertex2) in &kbreak.result_edges {
            staged.add_edge(
                vertex1.clone(),
                vertex2.clone(),
                kbreak.multicolor.clone(),
                merge,
                Some(kbreak.data.clone()),
            );
        }
        *self = staged;
        Ok(())
    }

    fn sorted_indices(&self, predicate: impl Fn(&Vertex) -> bool) -> Vec<NodeIndex> {
        let mut indices: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&index| predicate(&self.graph[index]))
            .collect();
        indices.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));
        indices
    }

    fn take_edge(
        &self,
        remaining: &mut HashMap<EdgeIndex, usize>,
        from: NodeIndex,
    ) -> Option<(EdgeIndex, NodeIndex)> {
        for (id, other) in self.incident_edges(from) {
            if let Some(count) = remaining.get_mut(&id) {
                if *count > 0 {
                    *count -= 1;
                    return Some((id, other));
                }
            }
        }
        None
    }

    fn has_remaining(&self, remaining: &HashMap<EdgeIndex, usize>, index: NodeIndex) -> bool {
        self.incident_edges(index)
            .iter()
            .any(|(id, _)| remaining.get(id).is_some_and(|&count| count > 0))
    }

    fn mate_index(&self, index: NodeIndex) -> Option<NodeIndex> {
        let mate = self.graph[index].mate_vertex()?;
        self.vertex_index.get(mate.name()).copied()
    }

    /// Follow adjacencies from `current`, crossing every block to its mate,
    /// until an infinity vertex, a dead end, or `stop_at` is reached.
    fn extend_walk(
        &self,
        remaining: &mut HashMap<EdgeIndex, usize>,
        walk: &mut Walk,
        mut current: NodeIndex,
        stop_at: Option<NodeIndex>,
    ) {
        loop {
            let vertex = &self.graph[current];
            let sign = if vertex.is_tail() { Sign::Plus } else { Sign::Minus };
            walk.blocks.push((sign, vertex.block_label()));
            let Some(mate) = self.mate_index(current) else {
                warn!("Vertex {} has no mate in the graph, chromosome cut short", vertex);
                break;
            };
            let Some((edge, next)) = self.take_edge(remaining, mate) else {
                break;
            };
            walk.steps.push(Step {
                from: mate,
                to: next,
                edge,
            });
            if self.graph[next].is_irregular() || Some(next) == stop_at {
                break;
            }
            current = next;
        }
    }

    fn genome_walks(&self, genome: &Genome) -> Vec<Walk> {
        let mut remaining: HashMap<EdgeIndex, usize> = self
            .graph
            .edge_indices()
            .filter_map(|id| {
                let count = self.graph[id].multicolor.multiplicity(genome);
                (count > 0).then_some((id, count))
            })
            .collect();
        let mut walks = Vec::new();

        for start in self.sorted_indices(Vertex::is_irregular) {
            while let Some((edge, first)) = self.take_edge(&mut remaining, start) {
                if self.graph[first].is_irregular() {
                    continue;
                }
                let mut walk = Walk::new(ChromosomeKind::Linear);
                walk.steps.push(Step {
                    from: start,
                    to: first,
                    edge,
                });
                self.extend_walk(&mut remaining, &mut walk, first, None);
                walks.push(walk);
            }
        }

        for start in self.sorted_indices(Vertex::is_regular) {
            while self.has_remaining(&remaining, start) {
                let Some(entry) = self.mate_index(start) else {
                    warn!("Vertex {} has no mate in the graph", self.graph[start]);
                    break;
                };
                let mut walk = Walk::new(ChromosomeKind::Circular);
                self.extend_walk(&mut remaining, &mut walk, entry, Some(entry));
                walks.push(walk);
            }
        }
        walks
    }

    /// Chromosomes of every genome as signed block lists.
    pub fn get_blocks_order(&self) -> BTreeMap<Genome, Vec<Chromosome>> {
        self.get_overall_set_of_colors()
            .into_iter()
            .map(|genome| {
                let chromosomes = self
                    .genome_walks(&genome)
                    .into_iter()
                    .map(|walk| (walk.kind, walk.blocks))
                    .collect();
                (genome, chromosomes)
            })
            .collect()
    }

    /// The fragment record `genome` left on an edge, falling back to the shared one.
    fn fragment_record<'a>(data: &'a Value, genome: &Genome) -> Option<&'a Value> {
        value_at_path(data, &["per_genome", genome.name(), "fragment"])
            .or_else(|| value_at_path(data, &["fragment"]))
    }

    fn fragment_order(&self, walk: &Walk, genome: &Genome) -> Vec<(Sign, String)> {
        let mut order: Vec<(Sign, String)> = Vec::new();
        for step in &walk.steps {
            let Some(fragment) = Self::fragment_record(&self.graph[step.edge].data, genome) else {
                continue;
            };
            let Some(name) = fragment.get("name").and_then(Value::as_str) else {
                continue;
            };
            let forward = fragment
                .get("forward_orientation")
                .and_then(Value::as_array)
                .and_then(|pair| match pair.as_slice() {
                    [first, second] => Some((first.as_str()?, second.as_str()?)),
                    _ => None,
                });
            let sign = match forward {
                Some((first, second))
                    if first != self.graph[step.from].name()
                        || second != self.graph[step.to].name() =>
                {
                    Sign::Minus
                }
                _ => Sign::Plus,
            };
            let entry = (sign, name.to_string());
            if order.last() != Some(&entry) {
                order.push(entry);
            }
        }
        if walk.kind == ChromosomeKind::Circular && order.len() > 1 && order.first() == order.last() {
            order.pop();
        }
        order
    }

    /// The same walks as `get_blocks_order`, read through edge fragment names.
    pub fn get_fragments_orders(&self) -> BTreeMap<Genome, Vec<Chromosome>> {
        self.get_overall_set_of_colors()
            .into_iter()
            .map(|genome| {
                let chromosomes = self
                    .genome_walks(&genome)
                    .iter()
                    .map(|walk| (walk.kind, self.fragment_order(walk, &genome)))
                    .filter(|(_, order)| !order.is_empty())
                    .collect();
                (genome, chromosomes)
            })
            .collect()
    }

    pub fn to_json(&self, schema_info: bool) -> Value {
        let vertices: Vec<Value> = self.nodes().map(|vertex| vertex.to_json(schema_info)).collect();
        let edges: Vec<Value> = self.edges().iter().map(BGEdge::to_json).collect();
        let genomes: Vec<Value> = self
            .get_overall_set_of_colors()
            .iter()
            .map(Genome::to_json)
            .collect();
        json!({"vertices": vertices, "edges": edges, "genomes": genomes})
    }

    pub fn from_json(value: &Value) -> Result<Self, GraphError> {
        let section = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_array)
                .ok_or_else(|| GraphError::MalformedJson(format!("missing \"{key}\" array")))
        };
        let id_of = |entry: &Value, key: &str| {
            entry
                .get(key)
                .and_then(Value::as_u64)
                .ok_or_else(|| GraphError::MalformedJson(format!("missing \"{key}\"")))
        };

        let mut genomes: HashMap<u64, Genome> = HashMap::new();
        for entry in section("genomes")? {
            let genome = Genome::from_json(entry)
                .ok_or_else(|| GraphError::MalformedJson("genome without a name".to_string()))?;
            let id = entry.get("g_id").and_then(Value::as_u64).unwrap_or_else(|| genome.json_id());
            genomes.insert(id, genome);
        }

        let mut graph = BreakpointGraph::new();
        let mut vertices: HashMap<u64, Vertex> = HashMap::new();
        for entry in section("vertices")? {
            let vertex = Vertex::from_json(entry)?;
            let id = entry.get("v_id").and_then(Value::as_u64).unwrap_or_else(|| vertex.json_id());
            graph.ensure_vertex(vertex.clone());
            vertices.insert(id, vertex);
        }

        for entry in section("edges")? {
            let lookup = |key: &str| -> Result<Vertex, GraphError> {
                let id = id_of(entry, key)?;
                vertices.get(&id).cloned().ok_or(GraphError::UnknownVertexId(id))
            };
            let vertex1 = lookup("vertex1_id")?;
            let vertex2 = lookup("vertex2_id")?;
            let mut multicolor = Multicolor::new();
            for id in entry.get("multicolor").and_then(Value::as_array).into_iter().flatten() {
                let id = id
                    .as_u64()
                    .ok_or_else(|| GraphError::MalformedJson("non-numeric genome id".to_string()))?;
                let genome = genomes.get(&id).cloned().ok_or(GraphError::UnknownGenomeId(id))?;
                multicolor.update([genome]);
            }
            let data = entry.get("data").cloned().unwrap_or_else(BGEdge::default_data);
            graph.add_edge(vertex1, vertex2, multicolor, false, Some(data));
        }
        Ok(graph)
    }

    pub fn from_json_str(text: &str) -> Result<Self, GraphError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json(&value)
    }
}
