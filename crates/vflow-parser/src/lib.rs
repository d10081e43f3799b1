/*! Parse text IR into structured data.
 *
 * Front ends hand the analysis a module as text. This parser reads that format into a
 * [`vflow_core::Module`], and `vfg_text` reads a serialized graph dump back into a
 * [`ValueFlowGraph`](vflow_core::analysis::ValueFlowGraph) so results can be sliced or compared
 * across runs.
 */

use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

mod lower;
pub mod vfg_text;

pub use lower::parse_module;
pub use vfg_text::{parse_vfg, VfgTextError};

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct VflowParser;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("syntax error: {0}")]
    Syntax(#[from] Box<pest::error::Error<Rule>>),
    #[error("unknown object `{object}` in function `{function}`")]
    UnknownObject { function: String, object: String },
    #[error("unknown block `{block}` in function `{function}`")]
    UnknownBlock { function: String, block: String },
    #[error("duplicate block `{block}` in function `{function}`")]
    DuplicateBlock { function: String, block: String },
}

pub type ParseResult<T> = Result<T, ParseError>;

pub fn parse(input: &str) -> ParseResult<pest::iterators::Pairs<'_, Rule>> {
    VflowParser::parse(Rule::module, input).map_err(|e| ParseError::Syntax(Box::new(e)))
}

pub fn check(input: &str) -> bool {
    parse(input).is_ok()
}
