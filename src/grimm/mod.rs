//! GRIMM text format: genomes as signed block orders, one chromosome per line.
//!
//! ```text
//! >genome_name
//! # data :: fragment : name = scaffold1
//! 1 -2 3 $
//! 4 5 @
//! ```
//!
//! `$` ends a linear chromosome, `@` a circular one.

mod reader;
mod writer;

use thiserror::Error;

pub use self::reader::{
    get_breakpoint_graph, get_edges_from_parsed_data, is_comment_data_string, is_comment_string,
    is_genome_declaration_string, parse_comment_data_string, parse_data_string,
    parse_genome_declaration_string,
};
pub use self::writer::{
    get_blocks_in_grimm_from_breakpoint_graph, get_fragments_in_grimm_from_breakpoint_graph,
    print_genomes_as_grimm_blocks_orders, write_genomes_as_grimm_blocks_orders,
};

#[derive(Error, Debug)]
pub enum GrimmError {
    #[error("no chromosome terminator ($ or @) in {0:?}")]
    MissingTerminator(String),

    #[error("no blocks before the chromosome terminator in {0:?}")]
    EmptyChromosome(String),

    #[error("orientation sign without a block name in {0:?}")]
    LoneSign(String),

    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<GrimmError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
