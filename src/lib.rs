//! bg library
//!
//! Breakpoint graphs for comparative genomics: genomes are read as signed
//! block orders (GRIMM), each adjacency becomes an edge colored by the genomes
//! that share it, and the resulting multigraph supports k-break
//! rearrangements, fragment/block order recovery, SCJ distances, phylogenetic
//! tree consistency checks and Graphviz/JSON export.

pub mod utils;
pub mod genome;
pub mod multicolor;
pub mod vertices;
pub mod edge;
pub mod kbreak;
pub mod breakpoint_graph;
pub mod grimm;
pub mod distances;
pub mod tree;
pub mod graphviz;

pub use genome::Genome;
pub use multicolor::Multicolor;
pub use vertices::{Vertex, VertexError, VertexKind};
pub use edge::BGEdge;
pub use kbreak::KBreak;
pub use breakpoint_graph::{BreakpointGraph, Chromosome, ChromosomeKind, GraphError, Sign};
pub use grimm::{
    get_breakpoint_graph,
    get_blocks_in_grimm_from_breakpoint_graph,
    get_fragments_in_grimm_from_breakpoint_graph,
    print_genomes_as_grimm_blocks_orders,
    GrimmError,
};
pub use distances::{get_all_cycles, get_all_paths, scj, single_cut_and_join_distance};
pub use tree::{BGTree, NodeId, TreeError, TreeNode};
pub use graphviz::{
    breakpoint_graph_to_dot,
    BreakpointGraphProcessor,
    ColorSource,
    CompleteMultiEdgeConnectedComponentFilter,
    ComponentFilter,
    DotError,
    GraphvizConfig,
    LabelFormat,
    TreeProcessor,
};
