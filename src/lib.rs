//! guesstree: a twenty-questions knowledge base
//!
//! A binary decision tree whose internal nodes hold yes/no questions and whose
//! leaves hold answers. Trees are stored in a brace-delimited text format,
//! grow by splitting a leaf when a guess was wrong, and can be rendered with
//! Graphviz.
//!
//! Layers, inner to outer:
//! - [`domain`]: tree storage, tokenizer, parser and writer
//! - [`application`]: knowledge-base and session services
//! - [`infrastructure`]: I/O traits, graph rendering, service wiring
//! - [`cli`]: argument parsing and command dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
