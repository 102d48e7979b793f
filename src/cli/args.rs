//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum, ValueHint};

use crate::domain::{Branch, Order};

/// Twenty-questions knowledge base: play, learn, inspect and render decision trees
#[derive(Parser, Debug)]
#[command(name = "guesstree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output on stderr (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a knowledge base in canonical format
    Show {
        /// Knowledge-base file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Spaces per nesting level (default from config)
        #[arg(long)]
        indent: Option<usize>,
        /// Draw as a tree with yes/no branch labels
        #[arg(long)]
        pretty: bool,
    },

    /// Parse a knowledge base and report problems and statistics
    Check {
        /// Knowledge-base file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// List node values in traversal order
    Traverse {
        /// Knowledge-base file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Traversal order
        #[arg(short, long, value_enum, default_value_t = OrderArg::Pre)]
        order: OrderArg,
    },

    /// List all answers (leaves)
    Leaves {
        /// Knowledge-base file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Teach a new answer by splitting the leaf at a yes/no path
    Learn {
        /// Knowledge-base file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Answers leading to the leaf, e.g. yes,no,yes (empty: the root)
        #[arg(long, value_delimiter = ',', num_args = 0..)]
        path: Vec<Branch>,
        /// New answer (reached by answering yes to the question)
        #[arg(long)]
        answer: String,
        /// Question telling the new answer apart from the current one
        #[arg(long)]
        question: String,
        /// Write to this file instead of updating FILE
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Play interactively and learn from wrong guesses
    Play {
        /// Knowledge-base file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Do not save what was learned
        #[arg(long)]
        no_save: bool,
    },

    /// Render the tree with Graphviz
    Graph {
        /// Knowledge-base file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Image file (default from config)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        image: Option<PathBuf>,
        /// Also write the HTML log page
        #[arg(long)]
        html: bool,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show {
        /// Knowledge-base directory for local config
        #[arg(value_hint = ValueHint::DirPath)]
        dir: Option<PathBuf>,
    },
    /// Print a commented config template
    Template,
    /// Show the global config file location
    Path,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderArg {
    /// Node before its children
    Pre,
    /// Left subtree, node, right subtree
    In,
    /// Children before the node
    Post,
}

impl From<OrderArg> for Order {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Pre => Order::Pre,
            OrderArg::In => Order::In,
            OrderArg::Post => Order::Post,
        }
    }
}
