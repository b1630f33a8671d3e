use std::io::BufRead;

use log::{debug, info, warn};
use serde_json::{json, Value};

use super::GrimmError;
use crate::breakpoint_graph::{BreakpointGraph, Chromosome, ChromosomeKind, Sign};
use crate::edge::BGEdge;
use crate::genome::Genome;
use crate::multicolor::Multicolor;
use crate::utils::{add_to_dict_with_path, merge_dicts};
use crate::vertices::{Vertex, NAME_SEPARATOR, REPEAT_TAG, TAG_SEPARATOR};

/// `>name` with a non-empty name; leading and trailing whitespace is allowed.
pub fn is_genome_declaration_string(line: &str) -> bool {
    line.trim()
        .strip_prefix('>')
        .is_some_and(|name| !name.trim().is_empty())
}

pub fn parse_genome_declaration_string(line: &str) -> Genome {
    let trimmed = line.trim();
    Genome::new(trimmed.strip_prefix('>').unwrap_or(trimmed).trim())
}

/// Parse a chromosome line into its kind and signed block names.
///
/// Everything after the first terminator is ignored; blocks without an
/// explicit sign are forward.
pub fn parse_data_string(line: &str) -> Result<Chromosome, GrimmError> {
    let Some((position, kind)) = line
        .char_indices()
        .find_map(|(position, symbol)| ChromosomeKind::from_terminator(symbol).map(|kind| (position, kind)))
    else {
        return Err(GrimmError::MissingTerminator(line.to_string()));
    };
    let body = &line[..position];
    if body.trim().is_empty() {
        return Err(GrimmError::EmptyChromosome(line.to_string()));
    }
    let mut blocks = Vec::new();
    for token in body.split_whitespace() {
        let (sign, name) = if let Some(name) = token.strip_prefix('-') {
            (Sign::Minus, name)
        } else if let Some(name) = token.strip_prefix('+') {
            (Sign::Plus, name)
        } else {
            (Sign::Plus, token)
        };
        if name.is_empty() {
            return Err(GrimmError::LoneSign(line.to_string()));
        }
        blocks.push((sign, name.to_string()));
    }
    Ok((kind, blocks))
}

/// Both extremities of a GRIMM block, ordered as read, plus whether the block
/// is a repeat.
fn block_extremities(sign: Sign, block: &str) -> (Vertex, Vertex, bool) {
    let mut parts = block.split(NAME_SEPARATOR);
    let root = parts.next().unwrap_or_default();
    let mut tail = Vertex::block(format!("{root}t"));
    let mut head = Vertex::block(format!("{root}h"));
    for part in parts {
        let (tag, value) = match part.split_once(TAG_SEPARATOR) {
            Some((tag, value)) => (tag, Some(value)),
            None => (part, None),
        };
        tail.add_tag(tag, value);
        head.add_tag(tag, value);
    }
    let repeat = tail.is_repeat();
    match sign {
        Sign::Plus => (tail, head, repeat),
        Sign::Minus => (head, tail, repeat),
    }
}

fn infinity_next_to(vertex: &Vertex, repeat: Option<&str>) -> Vertex {
    let mut infinity = Vertex::infinity(vertex.root());
    if let Some(repeat) = repeat {
        infinity.add_tag(REPEAT_TAG, Some(repeat));
    }
    infinity
}

/// Adjacencies of one parsed chromosome.
///
/// Linear chromosomes get an infinity vertex at each end. A repeat block
/// flanking a linear chromosome is dropped and remembered as a `repeat` tag on
/// the infinity vertex that replaces it.
pub fn get_edges_from_parsed_data(parsed: &Chromosome) -> Vec<(Vertex, Vertex)> {
    let (kind, blocks) = parsed;
    let mut extremities: Vec<(Vertex, Vertex, bool)> = blocks
        .iter()
        .map(|(sign, block)| block_extremities(*sign, block))
        .collect();

    let mut left_repeat = None;
    let mut right_repeat = None;
    if *kind == ChromosomeKind::Linear {
        if extremities.first().is_some_and(|(_, _, repeat)| *repeat) {
            let (_, inner, _) = extremities.remove(0);
            left_repeat = Some(inner.root().to_string());
        }
        if extremities.last().is_some_and(|(_, _, repeat)| *repeat) {
            if let Some((inner, _, _)) = extremities.pop() {
                right_repeat = Some(inner.root().to_string());
            }
        }
        if extremities.is_empty() {
            warn!("Linear chromosome {:?} holds only flanking repeats, skipped", blocks);
            return Vec::new();
        }
    }

    let mut vertices: Vec<Vertex> = extremities
        .into_iter()
        .flat_map(|(first, second, _)| [first, second])
        .collect();
    match kind {
        ChromosomeKind::Circular => {
            if let Some(last) = vertices.pop() {
                vertices.insert(0, last);
            }
        }
        ChromosomeKind::Linear => {
            if let (Some(first), Some(last)) = (vertices.first(), vertices.last()) {
                let left = infinity_next_to(first, left_repeat.as_deref());
                let right = infinity_next_to(last, right_repeat.as_deref());
                vertices.insert(0, left);
                vertices.push(right);
            }
        }
    }

    let mut edges = Vec::with_capacity(vertices.len() / 2);
    let mut vertices = vertices.into_iter();
    while let (Some(first), Some(second)) = (vertices.next(), vertices.next()) {
        edges.push((first, second));
    }
    edges
}

pub fn is_comment_string(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

/// `#`, optional spaces, `data`, optional spaces, then `::`.
pub fn is_comment_data_string(line: &str) -> bool {
    line.trim_start()
        .strip_prefix('#')
        .and_then(|rest| rest.trim_start().strip_prefix("data"))
        .is_some_and(|rest| rest.trim_start().starts_with("::"))
}

/// Split `# data :: a : b : key = value` into `(["a", "b"], ("key", "value"))`.
pub fn parse_comment_data_string(line: &str) -> (Vec<String>, (String, String)) {
    let content = line.split_once("::").map_or("", |(_, rest)| rest);
    let (left, value) = content.split_once('=').unwrap_or((content, ""));
    let mut path: Vec<String> = left.split(':').map(|part| part.trim().to_string()).collect();
    let key = path.pop().unwrap_or_default();
    (path, (key, value.trim().to_string()))
}

/// Edge data for one adjacency of `genome`. The fragment record is also kept
/// under `per_genome.<genome>` so it survives edge merging across genomes.
fn edge_data(pending: &Value, genome: &Genome, vertex1: &Vertex, vertex2: &Vertex) -> Value {
    let mut data = pending.clone();
    merge_dicts(&mut data, &BGEdge::default_data());
    add_to_dict_with_path(
        &mut data,
        &["fragment"],
        "forward_orientation",
        json!([vertex1.name(), vertex2.name()]),
    );
    if let Some(fragment) = data.get("fragment").cloned() {
        add_to_dict_with_path(&mut data, &["per_genome", genome.name()], "fragment", fragment);
    }
    data
}

/// Build a breakpoint graph from a GRIMM stream.
///
/// Data comments (`# data :: ...`) apply to the next chromosome line of the
/// current genome. Chromosome lines before the first genome are ignored.
pub fn get_breakpoint_graph<R: BufRead>(reader: R, merge_edges: bool) -> Result<BreakpointGraph, GrimmError> {
    let mut graph = BreakpointGraph::new();
    let mut genome: Option<Genome> = None;
    let mut pending = json!({});
    let mut chromosome_count = 0usize;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if is_genome_declaration_string(&line) {
            let declared = parse_genome_declaration_string(&line);
            debug!("Reading genome {}", declared);
            genome = Some(declared);
            pending = json!({});
            continue;
        }
        if is_comment_data_string(&line) {
            if genome.is_some() {
                let (path, (key, value)) = parse_comment_data_string(&line);
                let path: Vec<&str> = path.iter().map(String::as_str).collect();
                add_to_dict_with_path(&mut pending, &path, &key, json!(value));
            }
            continue;
        }
        if is_comment_string(&line) {
            continue;
        }
        let Some(current) = genome.as_ref() else {
            debug!("Skipping line {} before any genome declaration", index + 1);
            continue;
        };
        let parsed = parse_data_string(&line).map_err(|source| GrimmError::AtLine {
            line: index + 1,
            source: Box::new(source),
        })?;
        for (vertex1, vertex2) in get_edges_from_parsed_data(&parsed) {
            let data = edge_data(&pending, current, &vertex1, &vertex2);
            graph.add_edge(vertex1, vertex2, Multicolor::from(current.clone()), merge_edges, Some(data));
        }
        pending = json!({});
        chromosome_count += 1;
    }

    info!(
        "Read {} chromosomes into a graph with {} vertices and {} edges",
        chromosome_count,
        graph.vertex_count(),
        graph.edge_count()
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Cursor;

    fn v(name: &str) -> Vertex {
        Vertex::from_name(name).unwrap()
    }

    fn counted(edges: Vec<(Vertex, Vertex)>) -> HashMap<(String, String), usize> {
        let mut counts = HashMap::new();
        for (first, second) in edges {
            *counts.entry((first.name().to_string(), second.name().to_string())).or_insert(0) += 1;
        }
        counts
    }

    fn read(lines: &[&str], merge_edges: bool) -> BreakpointGraph {
        get_breakpoint_graph(Cursor::new(lines.join("\n")), merge_edges).unwrap()
    }

    #[test]
    fn genome_declarations_need_a_name() {
        assert!(is_genome_declaration_string("  \t  >genome"));
        assert!(is_genome_declaration_string(">genome   \t"));
        assert!(!is_genome_declaration_string("\tt   >genome"));
        assert!(!is_genome_declaration_string("     >   "));
        assert!(!is_genome_declaration_string(">"));
        assert_eq!(parse_genome_declaration_string("  >genome  "), Genome::new("genome"));
        assert_eq!(parse_genome_declaration_string(">genome>genome"), Genome::new("genome>genome"));
    }

    #[test]
    fn malformed_data_strings_are_rejected() {
        for line in [
            "   a b c d e    ",
            "",
            " a -b -c d -e ",
            "$",
            "@",
            "@ a d s d",
            "$a d s d",
            "$-a d s d",
            "@+a d s d",
            "a b - -c d e $",
        ] {
            assert!(parse_data_string(line).is_err(), "{line:?} should fail");
        }
    }

    #[test]
    fn first_terminator_ends_the_chromosome() {
        let (kind, blocks) = parse_data_string("     a -b c -d @ e f $ g -h    ").unwrap();
        assert_eq!(kind, ChromosomeKind::Circular);
        let names: Vec<&str> = blocks.iter().map(|(_, name)| name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
        let signs: Vec<Sign> = blocks.iter().map(|(sign, _)| *sign).collect();
        assert_eq!(signs, vec![Sign::Plus, Sign::Minus, Sign::Plus, Sign::Minus]);

        let (kind, blocks) = parse_data_string("1 2 ALC__repeat$").unwrap();
        assert_eq!(kind, ChromosomeKind::Linear);
        assert_eq!(blocks.len(), 3);
    }

    #[test]
    fn circular_chromosome_closes_on_itself() {
        let parsed = (
            ChromosomeKind::Circular,
            vec![
                (Sign::Plus, "a".to_string()),
                (Sign::Minus, "b".to_string()),
                (Sign::Minus, "a".to_string()),
            ],
        );
        let expected = counted(vec![(v("at"), v("at")), (v("ah"), v("bh")), (v("bt"), v("ah"))]);
        assert_eq!(counted(get_edges_from_parsed_data(&parsed)), expected);
    }

    #[test]
    fn linear_chromosome_gets_infinity_ends() {
        let parsed = (
            ChromosomeKind::Linear,
            vec![(Sign::Minus, "a".to_string()), (Sign::Minus, "a".to_string())],
        );
        let expected = counted(vec![
            (v("ah__infinity"), v("ah")),
            (v("at"), v("ah")),
            (v("at"), v("at__infinity")),
        ]);
        assert_eq!(counted(get_edges_from_parsed_data(&parsed)), expected);
    }

    #[test]
    fn flanking_repeats_move_onto_infinity_vertices() {
        let parsed = (
            ChromosomeKind::Linear,
            vec![
                (Sign::Plus, "a__repeat".to_string()),
                (Sign::Minus, "b".to_string()),
                (Sign::Plus, "c__tag:1:2".to_string()),
                (Sign::Minus, "a__repeat".to_string()),
            ],
        );
        let expected = counted(vec![
            (v("bh__repeat:ah__infinity"), v("bh")),
            (v("bt"), v("ct__tag:1:2")),
            (v("ch__tag:1:2"), v("ch__repeat:ah__infinity")),
        ]);
        assert_eq!(counted(get_edges_from_parsed_data(&parsed)), expected);
    }

    #[test]
    fn circular_repeats_stay_as_tagged_blocks() {
        let parsed = (
            ChromosomeKind::Circular,
            vec![
                (Sign::Plus, "a__repeat".to_string()),
                (Sign::Minus, "b".to_string()),
                (Sign::Plus, "c__tag:1".to_string()),
                (Sign::Minus, "a__repeat".to_string()),
            ],
        );
        let expected = counted(vec![
            (v("ah__repeat:"), v("bh")),
            (v("bt"), v("ct__tag:1")),
            (v("ch__tag:1"), v("ah__repeat:")),
            (v("at__repeat:"), v("at__repeat:")),
        ]);
        assert_eq!(counted(get_edges_from_parsed_data(&parsed)), expected);
    }

    #[test]
    fn repeat_only_chromosome_has_no_edges() {
        let parsed = (ChromosomeKind::Linear, vec![(Sign::Plus, "ALC__repeat".to_string())]);
        assert!(get_edges_from_parsed_data(&parsed).is_empty());
    }

    #[test]
    fn comment_detection() {
        assert!(is_comment_string("     #    "));
        assert!(!is_comment_string("a# "));
        assert!(is_comment_data_string("#data:: "));
        assert!(is_comment_data_string("   #data  :: LALA : LULU=LILI"));
        assert!(!is_comment_data_string("# data"));
        assert!(!is_comment_data_string("# data:"));
        assert!(!is_comment_data_string("# datal:"));
    }

    #[test]
    fn data_comments_split_into_path_key_and_value() {
        let (path, (key, value)) = parse_comment_data_string("# data :: fragment : origin: name = ALLPATHS-LG");
        assert_eq!(path, vec!["fragment", "origin"]);
        assert_eq!((key.as_str(), value.as_str()), ("name", "ALLPATHS-LG"));

        let (path, (key, value)) = parse_comment_data_string("#data:: entry1 : entry2: = value");
        assert_eq!(path, vec!["entry1", "entry2"]);
        assert_eq!((key.as_str(), value.as_str()), ("", "value"));

        let (path, (key, value)) = parse_comment_data_string("#data:: ");
        assert!(path.is_empty());
        assert_eq!((key.as_str(), value.as_str()), ("", ""));
    }

    #[test]
    fn reads_graph_ignoring_noise() {
        let graph = read(
            &[
                "",
                "\t",
                "#comment1",
                ">genome_name_1",
                "      #comment1",
                "a b $",
                "\tc -a @\t",
                "   #comment1   ",
                "\t>genome_name_2",
                "a $",
                "",
            ],
            true,
        );
        assert_eq!(graph.connected_components_subgraphs().len(), 3);
        assert_eq!(graph.edge_count(), 6);
        assert_eq!(graph.vertex_count(), 9);
        let infinity_edges = graph.edges().iter().filter(|edge| edge.is_infinity_edge()).count();
        assert_eq!(infinity_edges, 3);
    }

    #[test]
    fn data_comments_land_on_next_chromosome_edges() {
        let graph = read(
            &[
                ">genome_name_1",
                "# data :: fragment : name = chromosome_X",
                "a b $",
                ">genome_name_2",
                "#data::fragment:name=scaffold111",
                "a $",
            ],
            false,
        );
        assert_eq!(graph.edge_count(), 5);
        assert_eq!(graph.vertex_count(), 7);
        for edge in graph.edges() {
            let name = edge.data["fragment"]["name"].as_str().unwrap();
            assert!(name == "chromosome_X" || name == "scaffold111");
        }
        let edge = graph.get_edge_by_two_vertices(&v("ah"), &v("bt")).unwrap();
        assert_eq!(edge.data["fragment"]["forward_orientation"], json!(["ah", "bt"]));
        assert_eq!(edge.data["per_genome"]["genome_name_1"]["fragment"], edge.data["fragment"]);
        let edge = graph.get_edge_by_two_vertices(&v("ah"), &v("ah__infinity")).unwrap();
        assert_eq!(edge.data["fragment"]["forward_orientation"], json!(["ah", "ah__infinity"]));
    }

    #[test]
    fn parse_errors_report_line_numbers() {
        let result = get_breakpoint_graph(Cursor::new(">g\n1 2 $\n1 2\n"), true);
        match result {
            Err(GrimmError::AtLine { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
