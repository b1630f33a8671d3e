use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use flate2::read::MultiGzDecoder;

use bg::graphviz::write_dot;
use bg::{
    breakpoint_graph_to_dot, get_breakpoint_graph, get_fragments_in_grimm_from_breakpoint_graph,
    print_genomes_as_grimm_blocks_orders, scj, BGTree, BreakpointGraph, GraphvizConfig, LabelFormat,
};

/// Breakpoint graph CLI: build a graph from GRIMM genomes and inspect it
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// GRIMM files (optionally gzipped); their genomes are merged into one graph
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Keep one edge per genome instead of merging parallel edges
    #[arg(long)]
    no_merge: bool,

    /// Compute the single-cut-or-join distance of the graph
    #[arg(long)]
    scj: bool,

    /// Newick tree (inline text or a file) to check edge multicolors against
    #[arg(long)]
    tree: Option<String>,

    /// Optional output file for the Graphviz DOT rendering
    #[arg(long)]
    export_dot: Option<PathBuf>,

    /// Use HTML-like labels in the DOT output
    #[arg(long)]
    html_labels: bool,

    /// Hide two-vertex components shared by every genome in the DOT output
    #[arg(long)]
    filter_complete_multiedges: bool,

    /// Optional output file for the graph as JSON
    #[arg(long)]
    export_json: Option<PathBuf>,

    /// Optional output file for the block orders in GRIMM format
    #[arg(long)]
    export_grimm: Option<PathBuf>,

    /// Print fragment (scaffold) orders in GRIMM format
    #[arg(long)]
    fragments: bool,

    /// Verbose/info output (default: quiet)
    #[arg(long, short = 'v', alias = "info")]
    verbose: bool,

    /// Debug output
    #[arg(long)]
    debug: bool,

    /// Trace output
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Clone, Default)]
struct RunOptions {
    inputs: Vec<PathBuf>,
    merge_edges: bool,
    scj: bool,
    tree: Option<String>,
    export_dot: Option<PathBuf>,
    dot: GraphvizConfig,
    export_json: Option<PathBuf>,
    export_grimm: Option<PathBuf>,
    fragments: bool,
}

impl From<Args> for RunOptions {
    fn from(args: Args) -> Self {
        RunOptions {
            inputs: args.inputs,
            merge_edges: !args.no_merge,
            scj: args.scj,
            tree: args.tree,
            export_dot: args.export_dot,
            dot: GraphvizConfig {
                label_format: if args.html_labels {
                    LabelFormat::Html
                } else {
                    LabelFormat::Plain
                },
                filter_complete_multiedges: args.filter_complete_multiedges,
                ..GraphvizConfig::default()
            },
            export_json: args.export_json,
            export_grimm: args.export_grimm,
            fragments: args.fragments,
        }
    }
}

fn main() {
    let args = Args::parse();
    // Set log level based on CLI flags
    let log_level = if args.trace {
        "trace"
    } else if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "error"
    };
    unsafe {
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    info!("bg {}", env!("CARGO_PKG_VERSION"));
    for input in &args.inputs {
        info!("input: {}", input.display());
    }

    if let Err(error) = run_pipeline(&RunOptions::from(args)) {
        eprintln!("bg failed: {error:?}");
        std::process::exit(1);
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz") || ext.eq_ignore_ascii_case("bgz"))
        .unwrap_or(false)
}

fn open_reader(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    if is_gzip(path) {
        let decoder = MultiGzDecoder::new(file);
        Ok(Box::new(BufReader::new(decoder)))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    Ok(())
}

fn load_graph(inputs: &[PathBuf], merge_edges: bool) -> Result<BreakpointGraph> {
    if inputs.is_empty() {
        bail!("No GRIMM input given");
    }
    let mut graph = BreakpointGraph::new();
    for path in inputs {
        let reader = open_reader(path)?;
        let part = get_breakpoint_graph(reader, merge_edges)
            .with_context(|| format!("Failed to parse GRIMM from {}", path.display()))?;
        debug!(
            "{}: {} vertices, {} edges",
            path.display(),
            part.vertex_count(),
            part.edge_count()
        );
        graph.update(&part, merge_edges);
    }
    Ok(graph)
}

/// Inline Newick text, or the contents of the file it names.
fn load_tree(source: &str) -> Result<BGTree> {
    let path = Path::new(source);
    let text = if path.is_file() {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?
    } else {
        source.to_string()
    };
    BGTree::from_newick(text.trim()).with_context(|| format!("Failed to parse Newick tree {source:?}"))
}

fn report_tree_consistency(graph: &BreakpointGraph, tree: &BGTree) {
    let tree_genomes = tree.leaves();
    for genome in graph.get_overall_set_of_colors() {
        if !tree_genomes.contains(&genome) {
            warn!("Genome {} is not a leaf of the tree", genome);
        }
    }
    let edges = graph.edges();
    let tree_consistent = edges.iter().filter(|edge| tree.bgedge_is_tree_consistent(edge)).count();
    let vtree_consistent = edges.iter().filter(|edge| tree.bgedge_is_vtree_consistent(edge)).count();
    println!(
        "Tree-consistent edges: {}/{} (vtree-consistent: {})",
        tree_consistent,
        edges.len(),
        vtree_consistent
    );
}

fn run_pipeline(options: &RunOptions) -> Result<BreakpointGraph> {
    let graph = load_graph(&options.inputs, options.merge_edges)?;
    info!(
        "Breakpoint graph built: {} vertices, {} edges, {} genomes.",
        graph.vertex_count(),
        graph.edge_count(),
        graph.get_overall_set_of_colors().len()
    );

    if options.scj {
        let distance = scj(&graph);
        info!("SCJ distance: {}", distance);
        println!("SCJ distance: {distance}");
    }

    if let Some(source) = &options.tree {
        let tree = load_tree(source)?;
        report_tree_consistency(&graph, &tree);
    }

    if options.fragments {
        for line in get_fragments_in_grimm_from_breakpoint_graph(&graph) {
            println!("{line}");
        }
    }

    if let Some(path) = &options.export_grimm {
        create_parent_dir(path)?;
        print_genomes_as_grimm_blocks_orders(&graph, path)
            .with_context(|| format!("Failed to write GRIMM to {}", path.display()))?;
    }

    if let Some(path) = &options.export_json {
        create_parent_dir(path)?;
        let mut file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        writeln!(file, "{}", serde_json::to_string_pretty(&graph.to_json(true))?)?;
        info!("Graph JSON written to {}", path.display());
    }

    if let Some(path) = &options.export_dot {
        create_parent_dir(path)?;
        let dot = breakpoint_graph_to_dot(&graph, &options.dot).context("Failed to render DOT")?;
        write_dot(&dot, path).with_context(|| format!("Failed to write DOT to {}", path.display()))?;
    }

    Ok(graph)
}

#[cfg(test)]
mod smoke {
    use super::*;

    #[test]
    fn smoke_run() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let input = dir.path().join("genomes.grimm");
        std::fs::write(&input, ">Mouse\n1 2 3 $\n>Human\n1 -2 3 $\n").unwrap();

        let options = RunOptions {
            inputs: vec![input],
            merge_edges: true,
            scj: true,
            tree: Some("(Mouse,Human);".to_string()),
            export_dot: Some(dir.path().join("out/graph.dot")),
            export_json: Some(dir.path().join("out/graph.json")),
            export_grimm: Some(dir.path().join("out/blocks.grimm")),
            ..RunOptions::default()
        };
        let graph = run_pipeline(&options).expect("pipeline");
        assert_eq!(graph.get_overall_set_of_colors().len(), 2);

        let dot = std::fs::read_to_string(dir.path().join("out/graph.dot")).unwrap();
        assert!(dot.starts_with("graph {"));
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("out/graph.json")).unwrap()).unwrap();
        assert_eq!(BreakpointGraph::from_json(&json).unwrap().edge_count(), graph.edge_count());
        let grimm = std::fs::read_to_string(dir.path().join("out/blocks.grimm")).unwrap();
        assert!(grimm.contains(">Mouse"));
    }

    #[test]
    fn gzipped_input_is_decoded() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = tempfile::tempdir().expect("tmpdir");
        let input = dir.path().join("genome.grimm.gz");
        let mut encoder = GzEncoder::new(File::create(&input).unwrap(), Compression::default());
        encoder.write_all(b">Mouse\n1 2 $\n").unwrap();
        encoder.finish().unwrap();

        let graph = load_graph(&[input], true).expect("gzip load");
        assert_eq!(graph.vertex_count(), 6);
    }

    #[test]
    fn missing_input_is_reported() {
        let options = RunOptions {
            inputs: vec![PathBuf::from("/nonexistent/genomes.grimm")],
            ..RunOptions::default()
        };
        assert!(run_pipeline(&options).is_err());
    }
}
