//! Renders a [`DecisionTree`] back into the brace-delimited text format.

use std::fmt;

use crate::domain::tree::{DecisionTree, NodeId};

pub const DEFAULT_INDENT: usize = 4;

/// Pretty-printer for the tree format.
///
/// Output is one node per line, indented by `indent` spaces per level.
/// Indentation carries no meaning for the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Writer {
    indent: usize,
}

impl Default for Writer {
    fn default() -> Self {
        Self {
            indent: DEFAULT_INDENT,
        }
    }
}

enum Frame {
    Open(NodeId, usize),
    Close(usize),
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indent(mut self, width: usize) -> Self {
        self.indent = width;
        self
    }

    pub fn write(&self, tree: &DecisionTree) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.write_into(tree, &mut out);
        out
    }

    pub fn write_into(&self, tree: &DecisionTree, out: &mut impl fmt::Write) -> fmt::Result {
        let mut stack: Vec<Frame> = tree.root().map(|r| Frame::Open(r, 0)).into_iter().collect();

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Open(id, depth) => {
                    let Ok(node) = tree.get(id) else { continue };
                    let pad = depth * self.indent;
                    if node.is_leaf() {
                        writeln!(out, "{:pad$}{{ {} }}", "", quote(node.value()))?;
                        continue;
                    }
                    writeln!(out, "{:pad$}{{ {}", "", quote(node.value()))?;
                    stack.push(Frame::Close(depth));
                    stack.extend(node.right().map(|c| Frame::Open(c, depth + 1)));
                    stack.extend(node.left().map(|c| Frame::Open(c, depth + 1)));
                }
                Frame::Close(depth) => {
                    writeln!(out, "{:pad$}}}", "", pad = depth * self.indent)?;
                }
            }
        }
        Ok(())
    }
}

/// Wraps values whose edges the parser would otherwise strip.
fn quote(value: &str) -> std::borrow::Cow<'_, str> {
    let needs_quotes = value.starts_with(|c: char| c == '"' || c.is_ascii_whitespace())
        || value.ends_with(|c: char| c == '"' || c.is_ascii_whitespace());
    if needs_quotes {
        format!("\"{value}\"").into()
    } else {
        value.into()
    }
}

/// Renders with the default indentation.
pub fn write(tree: &DecisionTree) -> String {
    Writer::default().write(tree)
}

impl fmt::Display for DecisionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Writer::default().write_into(self, f)
    }
}
