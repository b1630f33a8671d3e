use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;

use super::GrimmError;
use crate::breakpoint_graph::{BreakpointGraph, Chromosome, Sign};
use crate::genome::Genome;

fn chromosome_line((kind, entries): &Chromosome) -> String {
    let mut line = String::new();
    for (sign, name) in entries {
        if *sign == Sign::Minus {
            line.push(sign.symbol());
        }
        line.push_str(name);
        line.push(' ');
    }
    line.push(kind.terminator());
    line
}

fn grimm_lines(orders: &BTreeMap<Genome, Vec<Chromosome>>) -> Vec<String> {
    let mut lines = Vec::new();
    for (genome, chromosomes) in orders {
        lines.push(format!(">{}", genome.name()));
        lines.extend(chromosomes.iter().map(chromosome_line));
    }
    lines
}

pub fn get_blocks_in_grimm_from_breakpoint_graph(graph: &BreakpointGraph) -> Vec<String> {
    grimm_lines(&graph.get_blocks_order())
}

pub fn get_fragments_in_grimm_from_breakpoint_graph(graph: &BreakpointGraph) -> Vec<String> {
    grimm_lines(&graph.get_fragments_orders())
}

pub fn write_genomes_as_grimm_blocks_orders<W: Write>(
    graph: &BreakpointGraph,
    writer: &mut W,
) -> Result<(), GrimmError> {
    for line in get_blocks_in_grimm_from_breakpoint_graph(graph) {
        writeln!(writer, "{line}")?;
    }
    Ok(())
}

pub fn print_genomes_as_grimm_blocks_orders(
    graph: &BreakpointGraph,
    path: impl AsRef<Path>,
) -> Result<(), GrimmError> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write_genomes_as_grimm_blocks_orders(graph, &mut writer)?;
    writer.flush()?;
    info!("Wrote block orders to {}", path.display());
    Ok(())
}
