//! Graphviz DOT export for breakpoint graphs and phylogenetic trees.
//!
//! Every edge of a breakpoint graph is drawn once per element of its
//! multicolor, so a genome present twice on an adjacency yields two parallel
//! lines of the same color.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::fs::File;
use std::hash::Hash;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{debug, info};
use serde_json::Value;
use thiserror::Error;

use crate::breakpoint_graph::BreakpointGraph;
use crate::edge::BGEdge;
use crate::genome::Genome;
use crate::multicolor::Multicolor;
use crate::tree::{BGTree, NodeId, TreeNode};
use crate::utils::value_at_path;
use crate::vertices::{Vertex, INFINITY_SUFFIX, NAME_SEPARATOR, REPEAT_TAG};

const FONT: &str = "Arial";
const VERTEX_FONT_SIZE: u32 = 12;
const EDGE_FONT_SIZE: u32 = 7;
const TEXT_COLOR: &str = "black";
const REGULAR_PEN_WIDTH: f64 = 1.0;
const IRREGULAR_PEN_WIDTH: f64 = 0.7;
const LEAF_PEN_WIDTH: f64 = 3.0;

#[derive(Error, Debug)]
pub enum DotError {
    #[error("edge {vertex1} -- {vertex2} carries {elements} colors; expected exactly one")]
    MultiElementEdge {
        vertex1: String,
        vertex2: String,
        elements: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelFormat {
    #[default]
    Plain,
    Html,
}

impl LabelFormat {
    fn wrap(self, text: &str) -> String {
        match self {
            LabelFormat::Plain => format!("\"{text}\""),
            LabelFormat::Html => format!("<{text}>"),
        }
    }
}

/// A named Graphviz (X11) color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Color(&'static str);

impl Color {
    pub const BLACK: Color = Color("black");

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Genome colors. Black is reserved for internal tree nodes.
pub const PALETTE: &[Color] = &[
    Color("red"),
    Color("blue"),
    Color("green"),
    Color("orange"),
    Color("purple"),
    Color("brown"),
    Color("cyan"),
    Color("magenta"),
    Color("gold"),
    Color("darkgreen"),
    Color("navy"),
    Color("maroon"),
    Color("olivedrab"),
    Color("teal"),
    Color("pink"),
    Color("gray"),
    Color("coral"),
    Color("orchid"),
    Color("sienna"),
    Color("turquoise"),
    Color("violet"),
    Color("yellowgreen"),
    Color("salmon"),
    Color("steelblue"),
];

/// Assigns palette colors to genomes in first-seen order. Once handed out, a
/// genome keeps its color. The palette wraps around when exhausted.
#[derive(Debug, Clone, Default)]
pub struct ColorSource {
    assigned: HashMap<Genome, Color>,
}

impl ColorSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_color(&mut self, genome: &Genome) -> Color {
        let next = PALETTE[self.assigned.len() % PALETTE.len()];
        *self.assigned.entry(genome.clone()).or_insert(next)
    }

    pub fn get_color_as_string(&mut self, genome: &Genome) -> &'static str {
        self.get_color(genome).as_str()
    }

    /// One color per multicolor element, multiplicity included.
    pub fn get_dot_colors(&mut self, multicolor: &Multicolor) -> Vec<Color> {
        multicolor.elements().map(|genome| self.get_color(genome)).collect()
    }
}

/// Sequential DOT ids starting at 1.
#[derive(Debug, Clone)]
struct IdRegistry<K> {
    ids: HashMap<K, usize>,
}

impl<K: Hash + Eq> Default for IdRegistry<K> {
    fn default() -> Self {
        Self { ids: HashMap::new() }
    }
}

impl<K: Hash + Eq> IdRegistry<K> {
    fn get(&mut self, key: K) -> usize {
        let next = self.ids.len() + 1;
        *self.ids.entry(key).or_insert(next)
    }
}

/// `10t` becomes `10<SUP>t</SUP>`; anything not ending in an extremity
/// suffix is returned unchanged.
fn superscript_extremity(text: &str) -> String {
    match text.char_indices().last() {
        Some((index, suffix @ ('h' | 't'))) if index > 0 => {
            format!("{}<SUP>{}</SUP>", &text[..index], suffix)
        }
        _ => text.to_string(),
    }
}

fn quoted(name: &str, value: impl fmt::Display) -> String {
    format!("{name}=\"{value}\"")
}

fn text_attributes(label: String, size: u32, color: &str) -> Vec<String> {
    vec![
        format!("label={label}"),
        quoted("fontname", FONT),
        quoted("fontsize", size),
        quoted("fontcolor", color),
    ]
}

fn vertex_line(id: usize, attributes: &[String]) -> String {
    format!("\"{}\" [{}];", id, attributes.join(", "))
}

fn edge_line(first: usize, second: usize, attributes: &[String]) -> String {
    format!("\"{}\" -- \"{}\" [{}];", first, second, attributes.join(", "))
}

fn graph_body(edges: &[String], vertices: &[String]) -> String {
    format!("graph {{\n{}\n{}\n}}", edges.join("\n"), vertices.join("\n"))
}

/// Ids, labels and shapes of breakpoint graph vertices.
#[derive(Debug, Clone, Default)]
pub struct VertexProcessor {
    ids: IdRegistry<String>,
}

impl VertexProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Infinity vertices sharing a root share an id, whatever their tags.
    pub fn get_vertex_id(&mut self, vertex: &Vertex) -> usize {
        let key = if vertex.is_irregular() {
            format!("{}{}{}", vertex.root(), NAME_SEPARATOR, INFINITY_SUFFIX)
        } else {
            vertex.name().to_string()
        };
        self.ids.get(key)
    }

    pub fn get_text(&self, vertex: &Vertex, format: LabelFormat) -> String {
        let mut text = match format {
            LabelFormat::Plain => vertex.root().to_string(),
            LabelFormat::Html => superscript_extremity(vertex.root()),
        };
        for (tag, value) in vertex.tags() {
            match value {
                Some(value) => text.push_str(&format!("\n({tag}:{value})")),
                None => text.push_str(&format!("\n({tag})")),
            }
        }
        format.wrap(&text)
    }

    pub fn get_shape(&self, vertex: &Vertex) -> &'static str {
        if vertex.is_irregular() {
            "point"
        } else {
            "oval"
        }
    }

    pub fn get_attributes(&self, vertex: &Vertex, format: LabelFormat) -> Vec<String> {
        let mut attributes = Vec::with_capacity(6);
        if vertex.is_regular() {
            attributes.extend(text_attributes(
                self.get_text(vertex, format),
                VERTEX_FONT_SIZE,
                TEXT_COLOR,
            ));
        }
        attributes.push(quoted("shape", self.get_shape(vertex)));
        attributes.push(quoted("penwidth", REGULAR_PEN_WIDTH));
        attributes
    }

    pub fn export_vertex_as_dot(&mut self, vertex: &Vertex, format: LabelFormat) -> String {
        let id = self.get_vertex_id(vertex);
        vertex_line(id, &self.get_attributes(vertex, format))
    }
}

/// Path into an edge's data object and the key to display from there.
pub type DataAttribute = (Vec<String>, String);

fn data_attribute_text(data: &Value, (path, key): &DataAttribute) -> Option<String> {
    let path: Vec<&str> = path.iter().map(String::as_str).collect();
    match value_at_path(data, &path)?.get(key)? {
        Value::Null => None,
        Value::String(text) => Some(format!("{key}:{text}")),
        other => Some(format!("{key}:{other}")),
    }
}

/// Colors, styles and labels of breakpoint graph edges.
#[derive(Debug, Clone, Default)]
pub struct EdgeProcessor {
    color_source: ColorSource,
}

impl EdgeProcessor {
    pub fn new(color_source: ColorSource) -> Self {
        Self { color_source }
    }

    pub fn color_source(&self) -> &ColorSource {
        &self.color_source
    }

    pub fn color_source_mut(&mut self) -> &mut ColorSource {
        &mut self.color_source
    }

    pub fn get_style(&self, edge: &BGEdge) -> &'static str {
        if edge.is_repeat_edge() {
            "dashed"
        } else if edge.is_irregular_edge() {
            "dotted"
        } else {
            "solid"
        }
    }

    pub fn get_pen_width(&self, edge: &BGEdge) -> f64 {
        if edge.is_irregular_edge() {
            IRREGULAR_PEN_WIDTH
        } else {
            REGULAR_PEN_WIDTH
        }
    }

    /// Label lines: requested data attributes first, then the repeat name.
    pub fn get_text(&self, edge: &BGEdge, format: LabelFormat, displayed: &[DataAttribute]) -> String {
        let mut lines: Vec<String> = displayed
            .iter()
            .filter_map(|attribute| data_attribute_text(&edge.data, attribute))
            .collect();
        if let Some(repeat) = edge
            .irregular_vertex()
            .and_then(|vertex| vertex.tag_value(REPEAT_TAG))
        {
            let repeat = match format {
                LabelFormat::Plain => repeat.to_string(),
                LabelFormat::Html => superscript_extremity(repeat),
            };
            lines.push(format!("r:{repeat}"));
        }
        format.wrap(&lines.join("\n"))
    }

    /// Attributes of an edge with a single-element multicolor.
    pub fn get_attributes(
        &mut self,
        edge: &BGEdge,
        format: LabelFormat,
        displayed: &[DataAttribute],
    ) -> Result<Vec<String>, DotError> {
        let elements = edge.multicolor.total_len();
        let color = match self.color_source.get_dot_colors(&edge.multicolor).as_slice() {
            [color] => *color,
            _ => {
                return Err(DotError::MultiElementEdge {
                    vertex1: edge.vertex1.name().to_string(),
                    vertex2: edge.vertex2.name().to_string(),
                    elements,
                })
            }
        };
        let mut attributes = vec![
            quoted("color", color),
            quoted("style", self.get_style(edge)),
            quoted("penwidth", self.get_pen_width(edge)),
        ];
        let label = self.get_text(edge, format, displayed);
        if label != format.wrap("") {
            attributes.extend(text_attributes(label, EDGE_FONT_SIZE, TEXT_COLOR));
        }
        Ok(attributes)
    }

    /// One DOT line per multicolor element.
    pub fn export_edge_as_dot(
        &mut self,
        edge: &BGEdge,
        vertices: &mut VertexProcessor,
        format: LabelFormat,
        displayed: &[DataAttribute],
    ) -> Result<Vec<String>, DotError> {
        let first = vertices.get_vertex_id(&edge.vertex1);
        let second = vertices.get_vertex_id(&edge.vertex2);
        let mut lines = Vec::with_capacity(edge.multicolor.total_len());
        for genome in edge.multicolor.elements() {
            let single = BGEdge::with_data(
                edge.vertex1.clone(),
                edge.vertex2.clone(),
                Multicolor::from(genome.clone()),
                edge.data.clone(),
            );
            let attributes = self.get_attributes(&single, format, displayed)?;
            lines.push(edge_line(first, second, &attributes));
        }
        Ok(lines)
    }
}

/// Decides whether a connected component is drawn.
pub trait ComponentFilter {
    fn name(&self) -> &str;

    /// `true` keeps the component.
    fn accepts(&self, component: &BreakpointGraph, overall_colors: &BTreeSet<Genome>) -> bool;
}

/// Drops components made of two regular vertices whose adjacency is shared by
/// every genome of the graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompleteMultiEdgeConnectedComponentFilter;

impl ComponentFilter for CompleteMultiEdgeConnectedComponentFilter {
    fn name(&self) -> &str {
        "Complete ME filter"
    }

    fn accepts(&self, component: &BreakpointGraph, overall_colors: &BTreeSet<Genome>) -> bool {
        if component.vertex_count() != 2 || component.nodes().any(Vertex::is_irregular) {
            return true;
        }
        component.get_overall_set_of_colors() != *overall_colors
    }
}

#[derive(Debug, Clone, Default)]
pub struct GraphvizConfig {
    pub label_format: LabelFormat,
    pub filter_complete_multiedges: bool,
    pub displayed_attributes: Vec<DataAttribute>,
}

/// Whole-graph export with optional connected-component filtering.
#[derive(Default)]
pub struct BreakpointGraphProcessor {
    pub vertex_processor: VertexProcessor,
    pub edge_processor: EdgeProcessor,
    pub cc_filters: Vec<Box<dyn ComponentFilter>>,
    pub displayed_attributes: Vec<DataAttribute>,
}

impl BreakpointGraphProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &GraphvizConfig) -> Self {
        let mut processor = Self::new();
        if config.filter_complete_multiedges {
            processor
                .cc_filters
                .push(Box::new(CompleteMultiEdgeConnectedComponentFilter));
        }
        processor.displayed_attributes = config.displayed_attributes.clone();
        processor
    }

    pub fn export_vertices_as_dot(&mut self, graph: &BreakpointGraph, format: LabelFormat) -> Vec<String> {
        let mut vertices: Vec<&Vertex> = graph.nodes().collect();
        vertices.sort();
        let mut seen = BTreeSet::new();
        let mut lines = Vec::with_capacity(vertices.len());
        for vertex in vertices {
            if seen.insert(self.vertex_processor.get_vertex_id(vertex)) {
                lines.push(self.vertex_processor.export_vertex_as_dot(vertex, format));
            }
        }
        lines
    }

    pub fn export_edges_as_dot(
        &mut self,
        graph: &BreakpointGraph,
        format: LabelFormat,
    ) -> Result<Vec<String>, DotError> {
        let mut lines = Vec::new();
        for edge in graph.edges() {
            lines.extend(self.edge_processor.export_edge_as_dot(
                &edge,
                &mut self.vertex_processor,
                format,
                &self.displayed_attributes,
            )?);
        }
        Ok(lines)
    }

    fn filter_summary(&self, counts: &[usize]) -> String {
        let info: Vec<String> = self
            .cc_filters
            .iter()
            .zip(counts)
            .map(|(filter, count)| format!("{}: {}", filter.name(), count))
            .collect();
        format!(
            "\"cc_filters\" [shape=\"square\", penwidth=\"5\", fontname=\"{}\", fontsize=\"15\", label=\"{}\"];",
            FONT,
            info.join("\n")
        )
    }

    pub fn export_graph_as_dot(
        &mut self,
        graph: &BreakpointGraph,
        format: LabelFormat,
    ) -> Result<String, DotError> {
        let mut edges = Vec::new();
        let mut vertices = Vec::new();
        if self.cc_filters.is_empty() {
            edges = self.export_edges_as_dot(graph, format)?;
            vertices = self.export_vertices_as_dot(graph, format);
        } else {
            let overall_colors = graph.get_overall_set_of_colors();
            let mut counts = vec![0usize; self.cc_filters.len()];
            for component in graph.connected_components_subgraphs() {
                let rejected_by = self
                    .cc_filters
                    .iter()
                    .position(|filter| !filter.accepts(&component, &overall_colors));
                match rejected_by {
                    Some(index) => counts[index] += 1,
                    None => {
                        edges.extend(self.export_edges_as_dot(&component, format)?);
                        vertices.extend(self.export_vertices_as_dot(&component, format));
                    }
                }
            }
            debug!("Component filter counts: {:?}", counts);
            vertices.push(self.filter_summary(&counts));
        }
        Ok(graph_body(&edges, &vertices))
    }
}

/// DOT export of a [`BGTree`]: leaves take their genome color, internal
/// nodes and branches are black.
#[derive(Debug, Clone, Default)]
pub struct TreeProcessor {
    color_source: ColorSource,
    ids: IdRegistry<NodeId>,
}

impl TreeProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shares genome colors with an existing graph export.
    pub fn with_color_source(color_source: ColorSource) -> Self {
        Self {
            color_source,
            ids: IdRegistry::default(),
        }
    }

    pub fn get_vertex_id(&mut self, node: NodeId) -> usize {
        self.ids.get(node)
    }

    fn leaf(tree: &BGTree, node: NodeId) -> Option<&TreeNode> {
        tree.node(node).filter(|node| node.is_leaf())
    }

    fn node_color(&mut self, tree: &BGTree, node: NodeId) -> Color {
        match Self::leaf(tree, node) {
            Some(leaf) => self.color_source.get_color(&Genome::new(leaf.name())),
            None => Color::BLACK,
        }
    }

    fn pen_width(tree: &BGTree, node: NodeId) -> f64 {
        if Self::leaf(tree, node).is_some() {
            LEAF_PEN_WIDTH
        } else {
            REGULAR_PEN_WIDTH
        }
    }

    pub fn export_vertex_as_dot(&mut self, tree: &BGTree, node: NodeId, format: LabelFormat) -> String {
        let color = self.node_color(tree, node);
        let label = Self::leaf(tree, node).map_or("", TreeNode::name);
        let mut attributes = text_attributes(format.wrap(label), VERTEX_FONT_SIZE, color.as_str());
        attributes.push(quoted("shape", "oval"));
        attributes.push(quoted("penwidth", Self::pen_width(tree, node)));
        attributes.push(quoted("style", "solid"));
        attributes.push(quoted("color", color));
        vertex_line(self.get_vertex_id(node), &attributes)
    }

    /// Branch from `parent` to `child`, colored after the child.
    pub fn export_edge_as_dot(&mut self, tree: &BGTree, parent: NodeId, child: NodeId) -> String {
        let attributes = [
            quoted("color", self.node_color(tree, child)),
            quoted("style", "solid"),
            quoted("penwidth", Self::pen_width(tree, child)),
        ];
        let first = self.get_vertex_id(parent);
        let second = self.get_vertex_id(child);
        edge_line(first, second, &attributes)
    }

    pub fn export_vertices_as_dot(&mut self, tree: &BGTree, format: LabelFormat) -> Vec<String> {
        tree.nodes()
            .into_iter()
            .map(|node| self.export_vertex_as_dot(tree, node, format))
            .collect()
    }

    pub fn export_edges_as_dot(&mut self, tree: &BGTree) -> Vec<String> {
        let mut lines = Vec::new();
        for parent in tree.nodes() {
            let children = tree.node(parent).map(TreeNode::children).unwrap_or_default();
            for &child in children {
                lines.push(self.export_edge_as_dot(tree, parent, child));
            }
        }
        lines
    }

    pub fn export_tree_as_dot(&mut self, tree: &BGTree, format: LabelFormat) -> String {
        let edges = self.export_edges_as_dot(tree);
        let vertices = self.export_vertices_as_dot(tree, format);
        graph_body(&edges, &vertices)
    }
}

/// Render `graph` with the given settings.
pub fn breakpoint_graph_to_dot(graph: &BreakpointGraph, config: &GraphvizConfig) -> Result<String, DotError> {
    BreakpointGraphProcessor::from_config(config).export_graph_as_dot(graph, config.label_format)
}

pub fn write_dot(dot: &str, path: impl AsRef<Path>) -> Result<(), DotError> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(dot.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    info!("Wrote DOT graph to {}", path.display());
    Ok(())
}
