//! Domain layer: the decision tree and its text format
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod display;
pub mod error;
pub mod parser;
pub mod token;
pub mod tree;
pub mod writer;

pub use display::ToTermTree;
pub use error::{DomainError, TreeResult};
pub use parser::{
    parse, parse_bytes, parse_bytes_with, parse_with, Diagnostic, ParseOptions, Parsed,
};
pub use token::{Token, Tokenizer};
pub use tree::{Branch, DecisionTree, Node, NodeId, NodeView, Order};
pub use writer::{write, Writer};

/// Expands `~`, `$VAR` and `${VAR}`; returns the input unchanged on failure.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
