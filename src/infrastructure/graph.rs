//! Graphviz rendering of a decision tree
//!
//! Builds a DOT description from the tree's read-only node views, writes it
//! to the configured file and hands it to the `dot` executable. The tree is
//! never modified, and a failing renderer leaves it intact.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::config::GraphConfig;
use crate::domain::{DecisionTree, NodeId};
use crate::infrastructure::traits::{CommandRunner, FileSystem};
use crate::infrastructure::{InfraError, InfraResult};

const NODE_COLOR: &str = "\"#2e7d32\"";
const NODE_FILL: &str = "\"#c8e6c9\"";
const EDGE_COLOR: &str = "\"#6a1b9a\"";
const YES_COLOR: &str = "\"#2e7d32\"";
const NO_COLOR: &str = "\"#c62828\"";

fn node_name(id: NodeId) -> String {
    let (slot, generation) = id.raw_parts();
    format!("node_{slot}_{generation}")
}

fn slot_label(id: Option<NodeId>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "-".into())
}

/// Escape a value for use inside a record label.
fn escape_record(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '{' | '}' | '|' | '<' | '>') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// DOT description of `tree`: one record per node, YES/NO labelled edges.
pub fn to_dot(tree: &DecisionTree) -> String {
    let mut dot = String::from("digraph TREE {\n    rankdir=TB;\n");

    for view in tree.nodes() {
        let _ = writeln!(
            dot,
            "    {}[shape=\"record\", color={NODE_COLOR}, fillcolor={NODE_FILL}, \
             style=\"rounded, filled\", \
             label=\"{{{} | {{{{YES | {}}} | {{ID | {}}} | {{NO | {}}}}}}}\"];",
            node_name(view.id),
            escape_record(view.value),
            slot_label(view.left),
            view.id,
            slot_label(view.right),
        );
    }
    for view in tree.nodes() {
        if let Some(left) = view.left {
            let _ = writeln!(
                dot,
                "    {}->{}[label=\"YES\", color={EDGE_COLOR}, fontcolor={YES_COLOR}];",
                node_name(view.id),
                node_name(left)
            );
        }
        if let Some(right) = view.right {
            let _ = writeln!(
                dot,
                "    {}->{}[label=\"NO\", color={EDGE_COLOR}, fontcolor={NO_COLOR}];",
                node_name(view.id),
                node_name(right)
            );
        }
    }

    dot.push_str("}\n");
    dot
}

/// HTML log page embedding a rendered image.
pub fn dump_html(image_file: &Path) -> String {
    format!("<pre>\n<img src=\"{}\" />\n</pre>\n", image_file.display())
}

/// Renders trees to images through an external Graphviz binary.
pub struct GraphRenderer {
    fs: Arc<dyn FileSystem>,
    cmd: Arc<dyn CommandRunner>,
    config: GraphConfig,
}

impl GraphRenderer {
    pub fn new(fs: Arc<dyn FileSystem>, cmd: Arc<dyn CommandRunner>, config: GraphConfig) -> Self {
        Self { fs, cmd, config }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Write the DOT file and run `dot` to produce the image.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn render(&self, tree: &DecisionTree) -> InfraResult<()> {
        let dot_file = &self.config.dot_file;
        let image_file = &self.config.image_file;

        self.fs
            .ensure_parent(dot_file)
            .and_then(|_| self.fs.write(dot_file, &to_dot(tree)))
            .map_err(|e| InfraError::io(format!("write {}", dot_file.display()), e))?;
        self.fs
            .ensure_parent(image_file)
            .map_err(|e| InfraError::io(format!("create directory for {}", image_file.display()), e))?;

        let dot_arg = dot_file.to_string_lossy();
        let image_arg = image_file.to_string_lossy();
        let args: [&str; 5] = [&dot_arg, "-T", &self.config.format, "-o", &image_arg];
        debug!("running {} {:?}", self.config.dot_command, args);

        let output = self
            .cmd
            .run(&self.config.dot_command, &args)
            .map_err(|e| InfraError::Render {
                message: format!("cannot run {}: {e}", self.config.dot_command),
                exit_code: None,
            })?;

        if !output.status.success() {
            return Err(InfraError::Render {
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                exit_code: output.status.code(),
            });
        }
        Ok(())
    }

    /// Render, then write the HTML log page pointing at the image.
    pub fn dump(&self, tree: &DecisionTree) -> InfraResult<()> {
        self.render(tree)?;
        let html_file = &self.config.html_file;
        self.fs
            .ensure_parent(html_file)
            .and_then(|_| self.fs.write(html_file, &dump_html(&self.config.image_file)))
            .map_err(|e| InfraError::io(format!("write {}", html_file.display()), e))
    }
}
